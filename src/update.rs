//! File system updates after patching: modified time and date-prefixed names

use crate::error::{Error, Result};
use crate::time::{PREFIX_DATE_FORMAT, Timestamp};
use chrono::{Local, TimeZone};
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Interpret a naive EXIF timestamp in the local time zone
pub fn local_system_time(timestamp: &Timestamp) -> Result<SystemTime> {
    Local
        .from_local_datetime(timestamp)
        .earliest()
        .map(SystemTime::from)
        .ok_or_else(|| Error::Timestamp {
            timestamp: timestamp.to_string(),
            message: "no such local time".to_string(),
        })
}

/// Set the last-modified time of `path`, keeping its access time
pub fn set_modified(path: &Path, timestamp: &Timestamp) -> Result<()> {
    let mtime = local_system_time(timestamp)?;
    filetime::set_file_mtime(path, FileTime::from_system_time(mtime))?;
    debug!(?path, %timestamp, "Set modified time");
    Ok(())
}

/// `IMG_YYYYMMDD_HHMMSS` plus the original extension
pub fn date_prefixed_name(path: &Path, timestamp: &Timestamp) -> String {
    let stem = timestamp.format(PREFIX_DATE_FORMAT).to_string();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

/// Rename `path` to its date-prefixed name in the same directory
///
/// Returns `None` when the file already has that name.
pub fn rename_with_date_prefix(path: &Path, timestamp: &Timestamp) -> Result<Option<PathBuf>> {
    let target = path.with_file_name(date_prefixed_name(path, timestamp));
    if target == path {
        return Ok(None);
    }

    let target = resolve_filename_conflict(target)?;
    fs::rename(path, &target)?;
    debug!(from = ?path, to = ?target, "Renamed file");
    Ok(Some(target))
}

/// Highest numeric suffix tried before giving up on a free name
const MAX_CONFLICT_SUFFIX: u32 = 10000;

/// Resolve filename conflicts by adding a numeric suffix
fn resolve_filename_conflict(path: PathBuf) -> Result<PathBuf> {
    resolve_filename_conflict_within(path, MAX_CONFLICT_SUFFIX)
}

fn resolve_filename_conflict_within(mut path: PathBuf, max_suffix: u32) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path);
    }

    let rename_error = |path: &Path, message: &str| Error::Rename {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| rename_error(&path, "file name is not valid UTF-8"))?
        .to_string();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let parent = path.parent().map(|p| p.to_path_buf()).unwrap_or_default();
    let wanted = path.clone();

    for i in 1..max_suffix {
        path = parent.join(format!("{}_{}{}", stem, i, extension));
        if !path.exists() {
            return Ok(path);
        }
    }

    Err(rename_error(
        &wanted,
        &format!("every name up to suffix _{} is taken", max_suffix - 1),
    ))
}
