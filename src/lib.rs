use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub mod boxfile;
pub mod error;
pub mod font;
pub mod layout;
pub mod logging;
pub mod pages;
pub mod pipeline;
pub mod settings;

pub use error::TrainingError;
pub use pipeline::{CommandRunner, Trainer, TrainingJob};

#[derive(Debug, Clone)]
pub struct Config {
    pub tesseract_lang: String,
    pub training_text: PathBuf,
    pub font_path: PathBuf,
    pub font_name: String,
    pub experience_number: u32,
    pub font_properties: Option<PathBuf>,
    pub font_size: Option<f32>,
    pub tessdata_path: Option<PathBuf>,
    pub word_list: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub settings_path: Option<PathBuf>,
    pub boxfile_only: bool,
    pub keep_files: bool,
    pub no_install: bool,
}

/// Builds the job from CLI values layered over the settings files.
pub fn build_job(config: &Config, settings: &settings::Settings) -> TrainingJob {
    TrainingJob {
        dictionary_name: config.tesseract_lang.clone(),
        training_text: config.training_text.clone(),
        font_path: config.font_path.clone(),
        font_name: config.font_name.clone(),
        exp_number: config.experience_number,
        font_properties: config
            .font_properties
            .clone()
            .unwrap_or_else(|| settings.font_properties.clone()),
        font_size: config.font_size.unwrap_or(settings.font_size),
        tessdata_path: config
            .tessdata_path
            .clone()
            .unwrap_or_else(|| settings.tessdata_path.clone()),
        word_list: config.word_list.clone(),
        work_dir: config.work_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
        geometry: settings.geometry,
        tools: settings.tools.clone(),
    }
}

pub fn run(config: Config) -> Result<String> {
    let settings = settings::load_settings(config.settings_path.as_deref())?;
    let job = build_job(&config, &settings);
    pipeline::validate(&job)?;
    ensure_dir(&job.work_dir)?;

    let trainer = Trainer::new(job, CommandRunner);
    if config.boxfile_only {
        let summary = trainer.generate_boxfile()?;
        return Ok(format!(
            "Generated {} ({} page(s)) and {} ({} boxes)",
            summary.tif.display(),
            summary.pages,
            summary.boxfile.display(),
            summary.characters
        ));
    }

    let traineddata = trainer.training()?;
    if !config.keep_files {
        trainer.clean()?;
    }
    if config.no_install {
        return Ok(format!(
            "The {} file has been generated !",
            traineddata.display()
        ));
    }
    let installed = trainer.install()?;
    Ok(format!(
        "The {} file has been generated and installed to {}",
        traineddata.display(),
        installed.display()
    ))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create working directory: {}", dir.display()))
}
