use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::layout::PageGeometry;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

/// Names (or paths) of the external programs the pipeline invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolNames {
    pub tesseract: String,
    pub unicharset_extractor: String,
    pub mftraining: String,
    pub cntraining: String,
    pub wordlist2dawg: String,
    pub combine_tessdata: String,
    pub merge_pages: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            tesseract: "tesseract".to_string(),
            unicharset_extractor: "unicharset_extractor".to_string(),
            mftraining: "mftraining".to_string(),
            cntraining: "cntraining".to_string(),
            wordlist2dawg: "wordlist2dawg".to_string(),
            combine_tessdata: "combine_tessdata".to_string(),
            merge_pages: "convert".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub geometry: PageGeometry,
    pub font_size: f32,
    pub font_properties: PathBuf,
    pub tessdata_path: PathBuf,
    pub tools: ToolNames,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            font_size: 25.0,
            font_properties: PathBuf::from("./font_properties"),
            tessdata_path: PathBuf::from("/usr/local/share/tessdata"),
            tools: ToolNames::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    page: Option<PageSettings>,
    training: Option<TrainingSettings>,
    tools: Option<ToolSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct PageSettings {
    width: Option<u32>,
    height: Option<u32>,
    start_x: Option<u32>,
    start_y: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct TrainingSettings {
    font_size: Option<f32>,
    font_properties: Option<String>,
    tessdata_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolSettings {
    tesseract: Option<String>,
    unicharset_extractor: Option<String>,
    mftraining: Option<String>,
    cntraining: Option<String>,
    wordlist2dawg: Option<String>,
    combine_tessdata: Option<String>,
    merge_pages: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse built-in settings")?;
    settings.merge(defaults);

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(page) = incoming.page {
            if let Some(width) = page.width.filter(|value| *value > 0) {
                self.geometry.width = width;
            }
            if let Some(height) = page.height.filter(|value| *value > 0) {
                self.geometry.height = height;
            }
            if let Some(start_x) = page.start_x {
                self.geometry.start_x = start_x;
            }
            if let Some(start_y) = page.start_y {
                self.geometry.start_y = start_y;
            }
        }
        if let Some(training) = incoming.training {
            if let Some(size) = training.font_size {
                if size > 0.0 {
                    self.font_size = size;
                }
            }
            if let Some(path) = non_blank(training.font_properties) {
                self.font_properties = PathBuf::from(path);
            }
            if let Some(path) = non_blank(training.tessdata_path) {
                self.tessdata_path = PathBuf::from(path);
            }
        }
        if let Some(tools) = incoming.tools {
            let targets = [
                (tools.tesseract, &mut self.tools.tesseract),
                (tools.unicharset_extractor, &mut self.tools.unicharset_extractor),
                (tools.mftraining, &mut self.tools.mftraining),
                (tools.cntraining, &mut self.tools.cntraining),
                (tools.wordlist2dawg, &mut self.tools.wordlist2dawg),
                (tools.combine_tessdata, &mut self.tools.combine_tessdata),
                (tools.merge_pages, &mut self.tools.merge_pages),
            ];
            for (incoming, target) in targets {
                if let Some(value) = non_blank(incoming) {
                    *target = value;
                }
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".tesseract-trainer"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_defaults_match_documented_geometry() {
        let parsed: SettingsFile = toml::from_str(DEFAULT_SETTINGS_TOML).expect("parse");
        let mut settings = Settings::default();
        settings.merge(parsed);
        assert_eq!(settings.geometry, PageGeometry::default());
        assert_eq!(settings.font_size, 25.0);
        assert_eq!(settings.tools, ToolNames::default());
    }

    #[test]
    fn merge_overrides_only_present_values() {
        let mut settings = Settings::default();
        let incoming: SettingsFile = toml::from_str(
            r#"
            [page]
            width = 1024
            start_y = 5

            [training]
            font_size = -3.0
            tessdata_path = "/opt/tessdata"

            [tools]
            merge_pages = "magick"
            tesseract = "  "
            "#,
        )
        .expect("parse");
        settings.merge(incoming);
        assert_eq!(settings.geometry.width, 1024);
        assert_eq!(settings.geometry.height, 600);
        assert_eq!(settings.geometry.start_y, 5);
        assert_eq!(settings.font_size, 25.0);
        assert_eq!(settings.tessdata_path, PathBuf::from("/opt/tessdata"));
        assert_eq!(settings.tools.merge_pages, "magick");
        assert_eq!(settings.tools.tesseract, "tesseract");
    }

    #[test]
    fn missing_extra_settings_file_is_an_error() {
        let err = load_settings(Some(Path::new("/nonexistent/settings.toml"))).unwrap_err();
        assert!(err.to_string().contains("settings file not found"));
    }

    #[test]
    fn extra_settings_file_is_applied_last() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[page]\nheight = 1200\n").expect("write");
        let settings = load_settings(Some(&path)).expect("load");
        assert_eq!(settings.geometry.height, 1200);
    }
}
