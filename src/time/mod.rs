//! Timestamp handling
//!
//! This module provides:
//! - The fixed-width EXIF date/time text form shared by the scanner and patcher
//! - The candidate timestamps read from a file's metadata
//! - Date offsets applied to the effective capture time

pub mod exif;
pub mod offset;

use chrono::NaiveDateTime;

pub use offset::{DateOffset, OffsetUnit};

/// EXIF date/time format: "YYYY:MM:DD HH:MM:SS"
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Width in characters of every EXIF date/time string
pub const EXIF_DATE_LEN: usize = 19;

/// File name prefix format used by `--date-prefix`
pub const PREFIX_DATE_FORMAT: &str = "IMG_%Y%m%d_%H%M%S";

/// Naive local time, as EXIF records it
pub type Timestamp = NaiveDateTime;

/// Format a timestamp in the EXIF text form
pub fn format_exif(timestamp: &Timestamp) -> String {
    timestamp.format(EXIF_DATE_FORMAT).to_string()
}

/// Parse text in the EXIF text form, rejecting every other shape
pub fn parse_exif(text: &str) -> Result<Timestamp, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, EXIF_DATE_FORMAT)
}

/// Which metadata field a candidate timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    /// DateTimeOriginal: when the photo was taken
    Original,
    /// DateTimeDigitized: when the image was digitized
    Digitized,
    /// DateTime: generic file change time
    DateTime,
}

/// Capture timestamps read from one file's metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateSet {
    pub date_time: Option<Timestamp>,
    pub digitized: Option<Timestamp>,
    pub original: Option<Timestamp>,
}

impl CandidateSet {
    /// The effective original date: original, then digitized, then generic
    pub fn effective(&self) -> Option<(DateField, Timestamp)> {
        self.original
            .map(|t| (DateField::Original, t))
            .or_else(|| self.digitized.map(|t| (DateField::Digitized, t)))
            .or_else(|| self.date_time.map(|t| (DateField::DateTime, t)))
    }

    /// Whether `timestamp` equals any candidate present in the set
    pub fn contains(&self, timestamp: &Timestamp) -> bool {
        [self.date_time, self.digitized, self.original]
            .iter()
            .flatten()
            .any(|candidate| candidate == timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.date_time.is_none() && self.digitized.is_none() && self.original.is_none()
    }
}
