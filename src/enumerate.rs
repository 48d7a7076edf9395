//! Expanding input paths into the files to process

use crate::config::Config;
use crate::error::{Error, Result};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Expands one input path into files
pub trait FileEnumerator {
    /// A file yields itself; a directory yields every file below it
    fn enumerate(&self, root: &Path) -> Result<Vec<PathBuf>>;
}

/// Recursive directory walk with exclusions and an extension filter
#[derive(Debug, Clone, Default)]
pub struct WalkDirEnumerator {
    exclude_dirs: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl WalkDirEnumerator {
    pub fn new(config: &Config) -> Self {
        Self {
            exclude_dirs: config.exclude_dirs.clone(),
            extensions: config.extensions.clone(),
        }
    }

    fn is_supported(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext_lower = ext.to_lowercase();
        self.extensions
            .iter()
            .any(|e| e.trim_start_matches('.').to_lowercase() == ext_lower)
    }

    /// Check if a path should be excluded based on the exclude_dirs configuration
    fn is_excluded_dir(&self, path: &Path) -> bool {
        for exclude in &self.exclude_dirs {
            if exclude.is_absolute() {
                if path.starts_with(exclude) {
                    debug!(?path, ?exclude, "Excluding directory (absolute path match)");
                    return true;
                }
            } else if let Some(exclude_name) = exclude.file_name() {
                let matched = path
                    .components()
                    .any(|c| matches!(c, Component::Normal(name) if name == exclude_name));
                if matched {
                    debug!(?path, ?exclude, "Excluding directory (folder name match)");
                    return true;
                }
            }
        }

        false
    }
}

impl FileEnumerator for WalkDirEnumerator {
    fn enumerate(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", root.display()),
            )));
        }

        // Explicitly named files are always processed
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !e.file_type().is_dir() || !self.is_excluded_dir(e.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = ?root, error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_file() && self.is_supported(path) {
                files.push(path.to_path_buf());
            }
        }

        debug!(?root, count = files.len(), "Enumerated files");
        Ok(files)
    }
}
