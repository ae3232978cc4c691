use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "tesseract-trainer",
    version,
    about = "Generate a training image and box file, then train a tesseract dictionary"
)]
struct Cli {
    /// Tesseract language (dictionary) to create, e.g. eng
    #[arg(short = 'l', long = "tesseract-lang")]
    tesseract_lang: String,

    /// Path of the training text
    #[arg(short = 't', long = "training-text")]
    training_text: PathBuf,

    /// Path of the TrueType/OpenType file of the training font
    #[arg(short = 'F', long = "font-path")]
    font_path: PathBuf,

    /// Name of the training font, as listed in font_properties (no spaces)
    #[arg(short = 'n', long = "font-name")]
    font_name: String,

    /// Number of the training experience
    #[arg(short = 'e', long = "experience-number", default_value_t = 0)]
    experience_number: u32,

    /// Path of the font properties file (default: ./font_properties)
    #[arg(short = 'f', long = "font-properties")]
    font_properties: Option<PathBuf>,

    /// Font size of the training font, in px (default: 25)
    #[arg(short = 's', long = "font-size")]
    font_size: Option<f32>,

    /// Path of the tessdata directory (default: /usr/local/share/tessdata)
    #[arg(short = 'p', long = "tessdata-path")]
    tessdata_path: Option<PathBuf>,

    /// Path of a file containing a list of frequent words
    #[arg(short = 'w', long = "word-list")]
    word_list: Option<PathBuf>,

    /// Directory where every intermediate file is written (default: current directory)
    #[arg(short = 'd', long = "work-dir")]
    work_dir: Option<PathBuf>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<PathBuf>,

    /// Only generate the multipage tif and the box file
    #[arg(long = "boxfile-only")]
    boxfile_only: bool,

    /// Keep intermediate training files
    #[arg(long = "keep-files")]
    keep_files: bool,

    /// Do not copy the traineddata file into the tessdata directory
    #[arg(long = "no-install")]
    no_install: bool,

    /// Log to stderr; repeat (-vv) for per-file detail
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tesseract_trainer::logging::init(cli.verbose)?;

    let output = tesseract_trainer::run(tesseract_trainer::Config {
        tesseract_lang: cli.tesseract_lang,
        training_text: cli.training_text,
        font_path: cli.font_path,
        font_name: cli.font_name,
        experience_number: cli.experience_number,
        font_properties: cli.font_properties,
        font_size: cli.font_size,
        tessdata_path: cli.tessdata_path,
        word_list: cli.word_list,
        work_dir: cli.work_dir,
        settings_path: cli.read_settings,
        boxfile_only: cli.boxfile_only,
        keep_files: cli.keep_files,
        no_install: cli.no_install,
    })?;

    println!("{}", output);
    Ok(())
}
