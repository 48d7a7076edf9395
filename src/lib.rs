//! photo-date - Shift the capture date of photos in place
//!
//! This library provides functionality for correcting camera clock drift
//! and timezone mistakes with support for:
//! - EXIF date extraction (DateTimeOriginal, DateTimeDigitized, DateTime)
//! - Locating every `YYYY:MM:DD HH:MM:SS` string in a file's raw bytes
//! - Verified, length-preserving in-place patching of matching dates
//! - Setting modified times and date-prefixed file names

pub mod cli;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod patch;
pub mod process;
pub mod scan;
pub mod time;
pub mod update;

pub use cli::Cli;
pub use config::{Config, ConfigError};
pub use enumerate::{FileEnumerator, WalkDirEnumerator};
pub use error::{Error, Result};
pub use process::{FileResult, ProcessingStatus, Processor, Stage};
pub use time::exif::{ExifMetadataSource, MetadataSource};
pub use time::{CandidateSet, DateOffset, Timestamp};
