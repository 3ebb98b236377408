//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (TOML/YAML/JSON)
//! - Command-line arguments, applied by the handlers on top of the file

use crate::cli::ConfigFormat;
use crate::error::{Error, Result};
use gazprep_core::StageParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Written by `gazprep config init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# gazprep configuration

[stage]
# Categories to keep. Omit to keep every record, or use "all".
include_category = ["general"]

# Field holding the record category
category_field = "SplitCategory"

# Records without a category: "default" treats them as "general",
# "include" always keeps them.
missing_category = "default"

# Country codes to keep. Omit to keep every country.
# countries = ["FR", "BE"]

# Names shorter than this are marked search_only = "true"
short_name_threshold = 2
flag_short_names = true

# Mark short codes such as "ab 123" search-only, except for places and
# administrative areas (feat_class P or A)
flag_short_alphanumeric = false

# Drop lat/lon once geo has been written
remove_source_lat_lon = false

# Names matching one of these terms are marked search-only. The file is
# either a CSV with an "exclusion" column or one term per line.
# stop_terms = ["hotel", "airport"]
# stop_terms_file = "stop_terms.csv"

# Copy names into name_ar / name_cjk according to the script field
expand_scripts = false

[output]
progress = true

[logging]
# level = "info"
# format = "compact"
# file = "gazprep.log"
"#;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initialization parameters for the processing stage
    pub stage: StageParams,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LogSettings,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Show a spinner while processing on a terminal
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { progress: true }
    }
}

/// Logging settings from the configuration file
///
/// Verbosity flags and `GAZPREP_LOG_*` variables take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Log format (compact, full, json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Log file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file, picking the parser by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let mut config: Config = match extension(path).as_deref() {
            Some("toml") => toml::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(Error::InvalidFormat {
                    path: path.to_path_buf(),
                    expected: "toml, yaml or json".to_string(),
                })
            }
        };

        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.is_file() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".gazprep.toml"),
            PathBuf::from("gazprep.toml"),
            PathBuf::from(".gazprep.yaml"),
            PathBuf::from(".gazprep.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let gazprep_dir = config_dir.join("gazprep");
            paths.push(gazprep_dir.join("config.toml"));
            paths.push(gazprep_dir.join("config.yaml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".gazprep.toml"));
        }

        paths
    }

    /// Relative paths inside a config file are relative to that file
    fn resolve_paths(&mut self, base: &Path) {
        if let Some(file) = &self.stage.stop_terms_file {
            if file.is_relative() {
                self.stage.stop_terms_file = Some(base.join(file));
            }
        }
        if let Some(file) = &self.logging.file {
            if file.is_relative() {
                self.logging.file = Some(base.join(file));
            }
        }
    }

    /// Render the configuration in the requested format
    pub fn render(&self, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
            }
            ConfigFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ConfigFormat::Yaml => Ok(serde_yaml::to_string(self)?),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazprep_core::{IncludePolicy, StageConfig};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        let stage = StageConfig::from_params(&config.stage).unwrap();
        assert_eq!(stage.category_field(), "SplitCategory");
        assert!(matches!(stage.include_policy(), IncludePolicy::Set(set) if set.contains("general")));
        assert!(config.output.progress);
    }

    #[test]
    fn test_load_toml_resolves_stop_terms_relative_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gazprep.toml");
        fs::write(
            &path,
            "[stage]\ninclude_category = \"A,B\"\nstop_terms_file = \"terms.txt\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(
            config.stage.include_category,
            Some(vec!["A,B".to_string()])
        );
        assert_eq!(config.stage.stop_terms_file, Some(dir.path().join("terms.txt")));
    }

    #[test]
    fn test_load_yaml_and_json() {
        let dir = TempDir::new().unwrap();

        let yaml = dir.path().join("c.yaml");
        fs::write(&yaml, "stage:\n  include_category: [A, all]\n").unwrap();
        let config = Config::from_file(&yaml).unwrap();
        assert_eq!(
            config.stage.include_category,
            Some(vec!["A".to_string(), "all".to_string()])
        );

        let json = dir.path().join("c.json");
        fs::write(&json, r#"{"stage": {"remove_source_lat_lon": true}}"#).unwrap();
        let config = Config::from_file(&json).unwrap();
        assert_eq!(config.stage.remove_source_lat_lon, Some(true));
    }

    #[test]
    fn test_unknown_extension_and_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.ini");
        fs::write(&path, "").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(Error::InvalidFormat { .. })
        ));
        assert!(matches!(
            Config::from_file(&dir.path().join("absent.toml")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_stage_key_is_rejected() {
        let result: std::result::Result<Config, _> =
            toml::from_str("[stage]\ninclude_categroy = [\"A\"]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_render_round_trips_through_toml() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        let rendered = config.render(ConfigFormat::Toml).unwrap();
        let reparsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed, config);
    }
}
