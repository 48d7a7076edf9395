//! Locating EXIF date text inside raw file bytes
//!
//! The file is viewed as ISO-8859-1 text: every byte is exactly one
//! character, so a match offset in the text is the byte offset in the file.
//! The patcher depends on that equality for its random-access writes.

use crate::error::{Error, Result};
use crate::time::{CandidateSet, EXIF_DATE_LEN, Timestamp, parse_exif};
use regex::bytes::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

static EXIF_DATE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn exif_date_pattern() -> &'static Regex {
    EXIF_DATE_PATTERN.get_or_init(|| {
        Regex::new(r"(?-u)[0-9]{4}:[0-9]{2}:[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}").unwrap()
    })
}

/// Decode bytes as ISO-8859-1: one byte, one character
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Whole-file content with a one-byte-per-character text view
#[derive(Debug, Clone)]
pub struct SingleByteText {
    bytes: Vec<u8>,
}

impl SingleByteText {
    /// Read the file fully and check every byte on disk was read
    pub fn read(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let expected = file.metadata()?.len();

        let mut bytes = Vec::with_capacity(expected as usize);
        file.read_to_end(&mut bytes)?;

        Self::from_bytes(path, bytes, expected)
    }

    /// Wrap bytes already read, given the length the file reported
    pub fn from_bytes(path: &Path, bytes: Vec<u8>, expected: u64) -> Result<Self> {
        let text = Self { bytes };
        let actual = text.char_len() as u64;
        if actual != expected {
            return Err(Error::Encoding {
                path: path.to_path_buf(),
                expected,
                actual,
            });
        }
        Ok(text)
    }

    /// Length of the text view in characters, equal to the byte length
    pub fn char_len(&self) -> usize {
        self.bytes.len()
    }

    /// Lazily find every EXIF date/time string, left to right
    pub fn occurrences(&self) -> impl Iterator<Item = TextOccurrence> + '_ {
        exif_date_pattern()
            .find_iter(&self.bytes)
            .map(|m| TextOccurrence {
                start: m.start(),
                end: m.end(),
                text: decode_latin1(m.as_bytes()),
            })
    }
}

/// A date-shaped string found in a file's bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOccurrence {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TextOccurrence {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// What to do with one occurrence
#[derive(Debug)]
pub enum MatchOutcome {
    /// Equal to one of the file's candidate timestamps
    Accepted(Timestamp),
    /// A valid date that is not one of the candidates
    Rejected(Timestamp),
    /// Date-shaped but not a real date, e.g. month 13
    Unparseable(chrono::ParseError),
}

/// Decide whether an occurrence is one of the file's metadata dates
pub fn match_occurrence(occurrence: &TextOccurrence, candidates: &CandidateSet) -> MatchOutcome {
    debug_assert_eq!(occurrence.len(), EXIF_DATE_LEN);

    match parse_exif(&occurrence.text) {
        Ok(timestamp) if candidates.contains(&timestamp) => MatchOutcome::Accepted(timestamp),
        Ok(timestamp) => MatchOutcome::Rejected(timestamp),
        Err(e) => MatchOutcome::Unparseable(e),
    }
}
