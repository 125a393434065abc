//! Configuration: settings file handling and capability detection.

mod capabilities;
mod settings;

pub use capabilities::{effective_elevenlabs_key, Capabilities};
pub use settings::{
    PathSettings, RunSettings, Settings, SpeechSettings, SubtitleSettings, ToolSettings,
    VideoSettings,
};

use std::fs;
use std::path::Path;

use crate::orchestrator::errors::PipelineError;

/// Load settings from a TOML file; missing sections fall back to defaults.
pub fn load_settings(path: &Path) -> Result<Settings, PipelineError> {
    let text = fs::read_to_string(path)
        .map_err(|e| PipelineError::io_error(format!("reading {}", path.display()), e))?;
    toml::from_str(&text)
        .map_err(|e| PipelineError::configuration(format!("invalid settings file: {}", e)))
}

/// Write settings back to a TOML file.
pub fn save_settings(settings: &Settings, path: &Path) -> Result<(), PipelineError> {
    let text = toml::to_string_pretty(settings)
        .map_err(|e| PipelineError::configuration(format!("serializing settings: {}", e)))?;
    fs::write(path, text)
        .map_err(|e| PipelineError::io_error(format!("writing {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.paths.output_dir = "out".to_string();
        save_settings(&settings, &path).unwrap();

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded.paths.output_dir, "out");
        assert_eq!(loaded.video.fps, 30);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_settings(Path::new("/nonexistent/settings.toml")).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
