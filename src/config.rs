//! Audit configuration
//!
//! Loaded from the `check:` section of an optional `abi-audit.yaml` file.
//! Every knob has a default so the tool runs with no configuration at all.

use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a compatibility audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Report functions present only in the new revision (informational)
    #[serde(default)]
    pub include_added: bool,
    /// Native extraction settings
    #[serde(default)]
    pub native: NativeConfig,
}

/// Settings for the native (libclang) extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeConfig {
    /// C++ language standard passed to the parser
    #[serde(default = "default_std")]
    pub std: String,
    /// Compilation database consulted for per-file compiler arguments
    #[serde(default = "default_compile_db")]
    pub compile_db: PathBuf,
    /// Extra compiler arguments appended to the defaults
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_std() -> String {
    "c++20".to_string()
}

fn default_compile_db() -> PathBuf {
    PathBuf::from("compile_commands.json")
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            include_added: false,
            native: NativeConfig::default(),
        }
    }
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            std: default_std(),
            compile_db: default_compile_db(),
            extra_args: Vec::new(),
        }
    }
}

impl CheckConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AuditError::Extraction {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct ConfigFile {
            check: Option<CheckConfig>,
        }

        let config_file: ConfigFile = serde_yaml::from_str(yaml)?;
        Ok(config_file.check.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CheckConfig::default();
        assert!(!config.include_added);
        assert_eq!(config.native.std, "c++20");
        assert_eq!(
            config.native.compile_db,
            PathBuf::from("compile_commands.json")
        );
    }

    #[test]
    fn test_yaml_section_parsing() {
        let yaml = r#"
check:
  include_added: true
  native:
    std: c++17
    extra_args: ["-DNDEBUG"]
"#;
        let config = CheckConfig::from_yaml_str(yaml).expect("valid yaml");
        assert!(config.include_added);
        assert_eq!(config.native.std, "c++17");
        assert_eq!(config.native.extra_args, vec!["-DNDEBUG"]);
        // Unset keys keep their defaults.
        assert_eq!(
            config.native.compile_db,
            PathBuf::from("compile_commands.json")
        );
    }

    #[test]
    fn test_missing_section_defaults() {
        let config = CheckConfig::from_yaml_str("other: {}\n").expect("valid yaml");
        assert!(!config.include_added);
    }
}
