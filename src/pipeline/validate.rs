use std::fs;

use super::TrainingJob;
use crate::error::TrainingError;

/// Pre-flight checks; any failure aborts the run before a single artifact is written.
pub fn validate(job: &TrainingJob) -> Result<(), TrainingError> {
    if !job.tessdata_path.is_dir() {
        return Err(TrainingError::MissingTessdata(job.tessdata_path.clone()));
    }
    if !job.font_path.is_file() {
        return Err(TrainingError::MissingFile(job.font_path.clone()));
    }
    if job.font_name.is_empty() || job.font_name.chars().any(char::is_whitespace) {
        return Err(TrainingError::FontNameHasWhitespace);
    }
    if !(job.font_size.is_finite() && job.font_size > 0.0) {
        return Err(TrainingError::InvalidFontSize(job.font_size));
    }
    let properties = fs::read_to_string(&job.font_properties)
        .map_err(|_| TrainingError::MissingFile(job.font_properties.clone()))?;
    if !font_in_properties(&properties, &job.font_name) {
        return Err(TrainingError::FontNotInProperties {
            font: job.font_name.clone(),
            properties: job.font_properties.clone(),
        });
    }
    if !job.training_text.is_file() {
        return Err(TrainingError::MissingFile(job.training_text.clone()));
    }
    if let Some(word_list) = &job.word_list {
        if !word_list.is_file() {
            return Err(TrainingError::MissingFile(word_list.clone()));
        }
    }
    Ok(())
}

pub(crate) fn font_in_properties(properties: &str, font_name: &str) -> bool {
    properties.split_whitespace().any(|token| token == font_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageGeometry;
    use crate::settings::ToolNames;
    use std::path::Path;

    fn job_in(dir: &Path) -> TrainingJob {
        fs::write(dir.join("font.ttf"), b"font").expect("write font");
        fs::write(dir.join("text.txt"), "hello world").expect("write text");
        fs::write(dir.join("font_properties"), "helveticanarrow 0 0 0 0 0\n").expect("write props");
        fs::create_dir_all(dir.join("tessdata")).expect("tessdata");
        TrainingJob {
            dictionary_name: "eng".to_string(),
            training_text: dir.join("text.txt"),
            font_path: dir.join("font.ttf"),
            font_name: "helveticanarrow".to_string(),
            exp_number: 0,
            font_properties: dir.join("font_properties"),
            font_size: 25.0,
            tessdata_path: dir.join("tessdata"),
            word_list: None,
            work_dir: dir.to_path_buf(),
            geometry: PageGeometry::default(),
            tools: ToolNames::default(),
        }
    }

    #[test]
    fn accepts_complete_job() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(validate(&job_in(dir.path())).is_ok());
    }

    #[test]
    fn rejects_missing_tessdata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut job = job_in(dir.path());
        job.tessdata_path = dir.path().join("nope");
        assert!(matches!(validate(&job), Err(TrainingError::MissingTessdata(_))));
    }

    #[test]
    fn rejects_missing_font_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut job = job_in(dir.path());
        job.font_path = dir.path().join("invalid-font-path");
        assert!(matches!(validate(&job), Err(TrainingError::MissingFile(path)) if path.ends_with("invalid-font-path")));
    }

    #[test]
    fn rejects_font_name_with_spaces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut job = job_in(dir.path());
        job.font_name = "helvetica narrow".to_string();
        assert!(matches!(validate(&job), Err(TrainingError::FontNameHasWhitespace)));
    }

    #[test]
    fn rejects_non_positive_or_nan_font_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut job = job_in(dir.path());
        for size in [0.0, -12.0, f32::NAN, f32::INFINITY] {
            job.font_size = size;
            assert!(matches!(validate(&job), Err(TrainingError::InvalidFontSize(_))));
        }
    }

    #[test]
    fn rejects_font_absent_from_properties() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut job = job_in(dir.path());
        job.font_name = "helvetica".to_string();
        let err = validate(&job).unwrap_err();
        assert!(matches!(err, TrainingError::FontNotInProperties { .. }));
        assert!(err.to_string().contains("font properties of helvetica"));
    }

    #[test]
    fn rejects_missing_word_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut job = job_in(dir.path());
        job.word_list = Some(dir.path().join("words"));
        assert!(matches!(validate(&job), Err(TrainingError::MissingFile(_))));
    }

    #[test]
    fn properties_match_whole_tokens_only() {
        let properties = "helveticanarrow 0 0 0 0 0\narial 1 0 0 0 0\n";
        assert!(font_in_properties(properties, "arial"));
        assert!(!font_in_properties(properties, "helvetica"));
    }
}
