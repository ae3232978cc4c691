use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a training run.
#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("The {} directory does not exist. Aborting.", .0.display())]
    MissingTessdata(PathBuf),

    #[error("The {} file does not exist. Aborting.", .0.display())]
    MissingFile(PathBuf),

    #[error("The --font-name / -n argument must not contain any spaces. Aborting.")]
    FontNameHasWhitespace,

    #[error("The --font-size / -s argument must be a positive number (got {0}). Aborting.")]
    InvalidFontSize(f32),

    #[error("The font properties of {font} have not been defined in {}. Aborting.", .properties.display())]
    FontNotInProperties { font: String, properties: PathBuf },

    #[error("Permission denied. Super-user rights are required to copy {} to {}.", .file.display(), .dir.display())]
    PermissionDenied { file: PathBuf, dir: PathBuf },

    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{stage} did not produce {}", .path.display())]
    MissingArtifact { stage: &'static str, path: PathBuf },

    #[error("character {0:?} cannot be written to a box file")]
    MalformedGlyph(char),
}
