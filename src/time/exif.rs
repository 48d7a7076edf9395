//! EXIF date extraction for images

use super::{CandidateSet, Timestamp};
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// Source of the candidate capture timestamps of a file
pub trait MetadataSource {
    /// Read the DateTime, DateTimeDigitized and DateTimeOriginal values
    ///
    /// Fails when the file cannot be read or its container is unsupported.
    /// A readable file without date tags yields an empty set.
    fn read_dates(&self, path: &Path) -> Result<CandidateSet>;
}

/// Reads dates from the EXIF block of JPEG, TIFF, HEIF, PNG and WebP files
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifMetadataSource;

impl MetadataSource for ExifMetadataSource {
    fn read_dates(&self, path: &Path) -> Result<CandidateSet> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let exif = Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| Error::ExifRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let dates = CandidateSet {
            date_time: read_date_tag(&exif, Tag::DateTime),
            digitized: read_date_tag(&exif, Tag::DateTimeDigitized),
            original: read_date_tag(&exif, Tag::DateTimeOriginal),
        };
        trace!(?path, ?dates, "Read EXIF dates");
        Ok(dates)
    }
}

fn read_date_tag(exif: &Exif, tag: Tag) -> Option<Timestamp> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match field.value {
        Value::Ascii(ref values) => values
            .first()
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .and_then(parse_exif_datetime),
        _ => parse_exif_datetime(&field.display_value().to_string()),
    }
}

/// Parse an EXIF datetime value: "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    // Values may be NUL padded or quoted
    let s = s.trim_end_matches('\0').trim().trim_matches('"');

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, super::EXIF_DATE_FORMAT) {
        return Some(dt);
    }

    // Some writers append subseconds
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S%.f") {
        return Some(dt);
    }

    let formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    None
}
