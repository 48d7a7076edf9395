//! Configuration types for photo-date

use crate::time::DateOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Files or directories to process; directories are walked recursively
    pub paths: Vec<PathBuf>,

    /// Shift applied to every file's capture time
    pub offset: DateOffset,

    /// Rename patched files to IMG_YYYYMMDD_HHMMSS.<ext>
    pub date_prefix: bool,

    /// Verify and report changes without writing anything
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,

    /// Directories to exclude from scanning (can be absolute paths or folder names)
    pub exclude_dirs: Vec<PathBuf>,

    /// File extensions to process; empty means every file
    pub extensions: Vec<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# photo-date configuration file
# This file uses TOML format (https://toml.io)

# Files or directories to process (directories are walked recursively)
paths = [
    "D:/Photos/2020-holiday",
]

# Offset added to each photo's capture time.
# A signed number of milliseconds, or suffix with
# 'd' for days, 'h' for hours, 'm' for minutes, 's' for seconds.
offset = "-2h"

# Rename patched files to IMG_YYYYMMDD_HHMMSS.<ext>
date_prefix = false

# Verify and report changes without modifying any file
dry_run = false

# Verbose output - show detailed processing information
verbose = false

# Directories to exclude from scanning
# Can be absolute paths or folder names (will match any folder with that name)
exclude_dirs = [
    ".thumbnails",
    "@eaDir",
]

# Only process these extensions (empty = every file)
extensions = ["jpg", "jpeg", "tif", "tiff", "heic"]
"#
        .to_string()
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}
