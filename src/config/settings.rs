//! Application settings and paths.
//!
//! Settings live in an XDG-compliant config directory. A missing settings
//! file means defaults; nothing is created on disk.

use crate::cli::OutputFormat;
use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/scanreport)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Resolve paths using XDG directories.
    pub fn resolve() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "scanreport", "scanreport")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Suffix of service detection files.
    pub detection_extension: String,
    /// Suffix of per-run summary CSVs picked up by `summarize`.
    pub summary_extension: String,
    /// Order reports by network address instead of declaration order.
    pub sort_by_network: bool,
    /// Show a progress bar while reading scan files.
    pub progress: bool,
    /// Default report format.
    pub default_format: OutputFormat,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            detection_extension: ".gnmap".to_string(),
            summary_extension: ".csv".to_string(),
            sort_by_network: true,
            progress: false,
            default_format: OutputFormat::Plain,
        }
    }
}

impl AppSettings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let file = Paths::resolve()?.settings_file();
                if !file.exists() {
                    return Ok(Self::default());
                }
                Self::load_from(&file)
            }
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.detection_extension, ".gnmap");
        assert_eq!(settings.summary_extension, ".csv");
        assert!(settings.sort_by_network);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"detection_extension": ".nmap-grep", "default_format": "json"}"#,
        )
        .unwrap();

        let settings = AppSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.detection_extension, ".nmap-grep");
        assert_eq!(settings.default_format, OutputFormat::Json);
        assert_eq!(settings.summary_extension, ".csv");
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppSettings::load(Some(&path)),
            Err(ConfigError::InvalidFormat(_))
        ));
        assert!(matches!(
            AppSettings::load(Some(&dir.path().join("missing.json"))),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
