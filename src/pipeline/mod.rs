mod tools;
mod validate;

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::boxfile;
use crate::error::TrainingError;
use crate::font::{GlyphSource, TrueTypeFont, load_font};
use crate::layout::{self, PageGeometry};
use crate::pages;
use crate::settings::ToolNames;

pub use tools::{CommandRunner, Invocation, ToolOutput, ToolRunner};
pub use validate::validate;

/// Files the training tools write under fixed names; they get the dictionary prefix after clustering.
pub const GENERATED_DURING_TRAINING: [&str; 5] =
    ["unicharset", "pffmtable", "Microfeat", "inttemp", "normproto"];

/// Everything one training run needs. All artifacts land in `work_dir`.
#[derive(Debug, Clone)]
pub struct TrainingJob {
    pub dictionary_name: String,
    pub training_text: PathBuf,
    pub font_path: PathBuf,
    pub font_name: String,
    pub exp_number: u32,
    pub font_properties: PathBuf,
    pub font_size: f32,
    pub tessdata_path: PathBuf,
    pub word_list: Option<PathBuf>,
    pub work_dir: PathBuf,
    pub geometry: PageGeometry,
    pub tools: ToolNames,
}

impl TrainingJob {
    /// `<dictionary>.<font>.exp<N>`, shared by the tif, box and tr files.
    pub fn prefix(&self) -> String {
        format!(
            "{}.{}.exp{}",
            self.dictionary_name, self.font_name, self.exp_number
        )
    }

    fn prefixed(&self, extension: &str) -> String {
        format!("{}.{}", self.prefix(), extension)
    }

    fn dictionary_file(&self, name: &str) -> String {
        format!("{}.{}", self.dictionary_name, name)
    }

    fn in_work_dir(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    pub fn traineddata_path(&self) -> PathBuf {
        self.in_work_dir(&self.dictionary_file("traineddata"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxfileSummary {
    pub tif: PathBuf,
    pub boxfile: PathBuf,
    pub pages: usize,
    pub characters: usize,
}

/// Drives the training stages in order; every stage reads what the previous one wrote.
pub struct Trainer<R: ToolRunner> {
    job: TrainingJob,
    runner: R,
}

impl<R: ToolRunner> Trainer<R> {
    pub fn new(job: TrainingJob, runner: R) -> Self {
        Self { job, runner }
    }

    pub fn generate_boxfile(&self) -> Result<BoxfileSummary> {
        let font = self.load_font()?;
        self.generate_boxfile_with(&font)
    }

    /// Renders the training text to `<prefix>.tif` and writes the matching `<prefix>.box`.
    pub fn generate_boxfile_with<G: GlyphSource + ?Sized>(
        &self,
        font: &G,
    ) -> Result<BoxfileSummary> {
        let text = fs::read_to_string(&self.job.training_text).with_context(|| {
            format!(
                "failed to read training text: {}",
                self.job.training_text.display()
            )
        })?;
        let tokens = layout::tokenize(&text);
        let result = layout::layout(&tokens, self.job.geometry, font);

        let page_paths = pages::write_pages(&result.pages, &self.job.work_dir)?;
        let page_names: Vec<PathBuf> = result
            .pages
            .iter()
            .map(|page| PathBuf::from(pages::page_file_name(page.index)))
            .collect();
        let tif_name = self.job.prefixed("tif");
        let merged = pages::merge_pages(
            &self.runner,
            &self.job.tools.merge_pages,
            &page_names,
            Path::new(&tif_name),
            &self.job.work_dir,
        );
        info!("Removing all individual tif images");
        pages::remove_pages(&page_paths)?;
        merged?;
        let tif = self.expect_artifact("page merge", &tif_name)?;

        let lines = boxfile::emit(&result.placed, self.job.geometry.height)?;
        let boxfile_path = self.in_work_dir(&self.job.prefixed("box"));
        info!("Generating boxfile {}", boxfile_path.display());
        boxfile::write_boxfile(&boxfile_path, &lines)?;

        Ok(BoxfileSummary {
            tif,
            boxfile: boxfile_path,
            pages: result.pages.len(),
            characters: lines.len(),
        })
    }

    pub fn train_on_boxfile(&self) -> Result<()> {
        let prefix = self.job.prefix();
        self.invoke(
            "box training",
            &self.job.tools.tesseract,
            vec![
                self.job.prefixed("tif"),
                prefix,
                "nobatch".to_string(),
                "box.train".to_string(),
            ],
        )?;
        self.expect_artifact("box training", &self.job.prefixed("tr"))?;
        Ok(())
    }

    pub fn compute_character_set(&self) -> Result<()> {
        self.invoke(
            "character set extraction",
            &self.job.tools.unicharset_extractor,
            vec![self.job.prefixed("box")],
        )?;
        self.expect_artifact("character set extraction", "unicharset")?;
        Ok(())
    }

    pub fn clustering(&self) -> Result<()> {
        let properties = absolute(&self.job.font_properties)?;
        self.invoke(
            "clustering",
            &self.job.tools.mftraining,
            vec![
                "-F".to_string(),
                properties,
                "-U".to_string(),
                "unicharset".to_string(),
                self.job.prefixed("tr"),
            ],
        )?;
        self.expect_artifact("clustering", "inttemp")?;
        Ok(())
    }

    pub fn normalize(&self) -> Result<()> {
        self.invoke(
            "normalization",
            &self.job.tools.cntraining,
            vec![self.job.prefixed("tr")],
        )?;
        self.expect_artifact("normalization", "normproto")?;
        Ok(())
    }

    pub fn rename_files(&self) -> Result<()> {
        for generated in GENERATED_DURING_TRAINING {
            let from = self.expect_artifact("rename", generated)?;
            let to = self.in_work_dir(&self.job.dictionary_file(generated));
            debug!("renaming {} to {}", from.display(), to.display());
            fs::rename(&from, &to).with_context(|| {
                format!("failed to rename {} to {}", from.display(), to.display())
            })?;
        }
        Ok(())
    }

    /// Packs the frequent-word list into a DAWG; a no-op without a word list.
    pub fn dictionary_data(&self) -> Result<()> {
        let Some(word_list) = &self.job.word_list else {
            return Ok(());
        };
        let freq_dawg = self.job.dictionary_file("freq-dawg");
        self.invoke(
            "dictionary packing",
            &self.job.tools.wordlist2dawg,
            vec![
                absolute(word_list)?,
                freq_dawg.clone(),
                self.job.dictionary_file("unicharset"),
            ],
        )?;
        self.expect_artifact("dictionary packing", &freq_dawg)?;
        Ok(())
    }

    pub fn combine_data(&self) -> Result<PathBuf> {
        self.invoke(
            "combine",
            &self.job.tools.combine_tessdata,
            vec![format!("{}.", self.job.dictionary_name)],
        )?;
        self.expect_artifact("combine", &self.job.dictionary_file("traineddata"))
    }

    pub fn training(&self) -> Result<PathBuf> {
        let font = self.load_font()?;
        self.training_with(&font)
    }

    /// Runs every stage from box-file generation to `<dictionary>.traineddata`.
    pub fn training_with<G: GlyphSource + ?Sized>(&self, font: &G) -> Result<PathBuf> {
        self.generate_boxfile_with(font)?;
        self.train_on_boxfile()?;
        self.compute_character_set()?;
        self.clustering()?;
        self.normalize()?;
        self.rename_files()?;
        self.dictionary_data()?;
        let traineddata = self.combine_data()?;
        info!("The {} file has been generated !", traineddata.display());
        Ok(traineddata)
    }

    /// Removes intermediates, leaving only `<dictionary>.traineddata` and the tif.
    pub fn clean(&self) -> Result<()> {
        info!("cleaning...");
        let mut names = vec![
            self.job.prefixed("tr"),
            self.job.prefixed("txt"),
            self.job.prefixed("box"),
            "mfunicharset".to_string(),
        ];
        for generated in GENERATED_DURING_TRAINING {
            names.push(self.job.dictionary_file(generated));
        }
        if self.job.word_list.is_some() {
            names.push(self.job.dictionary_file("freq-dawg"));
        }
        for name in names {
            let path = self.in_work_dir(&name);
            match fs::remove_file(&path) {
                Ok(()) => debug!("removed {}", path.display()),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!("{} already absent", path.display())
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to remove {}", path.display()));
                }
            }
        }
        Ok(())
    }

    /// Copies `<dictionary>.traineddata` into the tessdata directory.
    pub fn install(&self) -> Result<PathBuf> {
        let name = self.job.dictionary_file("traineddata");
        let source = self.in_work_dir(&name);
        let target = self.job.tessdata_path.join(&name);
        info!("Copying {} to {}.", name, self.job.tessdata_path.display());
        match fs::copy(&source, &target) {
            Ok(_) => Ok(target),
            Err(err) if err.kind() == ErrorKind::PermissionDenied => {
                Err(TrainingError::PermissionDenied {
                    file: source,
                    dir: self.job.tessdata_path.clone(),
                }
                .into())
            }
            Err(err) => Err(err).with_context(|| {
                format!("failed to copy {} to {}", source.display(), target.display())
            }),
        }
    }

    fn load_font(&self) -> Result<TrueTypeFont> {
        let font = load_font(&self.job.font_path, self.job.font_size)?;
        info!(
            "Using font {} ({}) at {} px",
            self.job.font_name,
            font.family().unwrap_or("unnamed family"),
            font.size_px()
        );
        Ok(font)
    }

    fn invoke(&self, stage: &'static str, program: &str, args: Vec<String>) -> Result<ToolOutput> {
        let invocation = Invocation::new(program, args, self.job.work_dir.clone());
        info!("{}: {}", stage, invocation.command_line());
        self.runner
            .run(&invocation)
            .with_context(|| format!("{} failed", stage))
    }

    fn expect_artifact(&self, stage: &'static str, name: &str) -> Result<PathBuf> {
        let path = self.in_work_dir(name);
        if path.exists() {
            Ok(path)
        } else {
            Err(TrainingError::MissingArtifact { stage, path }.into())
        }
    }

    fn in_work_dir(&self, name: &str) -> PathBuf {
        self.job.in_work_dir(name)
    }
}

fn absolute(path: &Path) -> Result<String> {
    let path = std::path::absolute(path)
        .with_context(|| format!("failed to resolve path: {}", path.display()))?;
    Ok(path.to_string_lossy().to_string())
}
