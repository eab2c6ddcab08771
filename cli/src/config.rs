//! YAML configuration for the CLI.
//!
//! # Example YAML
//!
//! ```yaml
//! options:
//!   is_strict: false
//!   throw_error: true
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use schema_check_core::CheckOptions;
use serde::{Deserialize, Serialize};

/// Top-level CLI configuration. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Options applied to every schema check.
    pub options: CheckOptions,
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|err| format!("Failed to open config '{}': {err}", path.display()))?;
        serde_yaml::from_reader(BufReader::new(file))
            .map_err(|err| format!("Failed to parse config '{}': {err}", path.display()))
    }

    /// Applies command-line overrides on top of the file's options.
    pub fn resolve(self, silent: bool, strict: bool) -> CheckOptions {
        let mut options = self.options;
        if silent {
            options.throw_error = false;
        }
        if strict {
            options.is_strict = true;
        }
        options
    }
}
