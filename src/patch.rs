//! Verified in-place patching of date text
//!
//! Every write is preceded by a re-read of the target range. If the bytes on
//! disk no longer match what the scan found, the patch fails with
//! [`Error::Integrity`] and nothing is written at that offset.

use crate::error::{Error, Result};
use crate::scan::{TextOccurrence, decode_latin1};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// An accepted occurrence and the text that replaces it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOperation {
    occurrence: TextOccurrence,
    replacement: String,
}

impl PatchOperation {
    /// Pair an occurrence with its replacement; both must be the same byte length
    pub fn new(occurrence: TextOccurrence, replacement: &str) -> Result<Self> {
        if replacement.len() != occurrence.len() || !replacement.is_ascii() {
            return Err(Error::LengthMismatch {
                original: occurrence.text.clone(),
                replacement: replacement.to_string(),
                expected: occurrence.len(),
                actual: replacement.len(),
            });
        }
        Ok(Self {
            occurrence,
            replacement: replacement.to_string(),
        })
    }
}

/// A change written to (or, in a dry run, verified in) a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub offset: u64,
    pub original: String,
    pub adjusted: String,
}

/// Random-access handle that verifies before it overwrites
pub struct Patcher {
    path: PathBuf,
    file: File,
    expected_len: u64,
    dry_run: bool,
}

impl Patcher {
    /// Open `path` for read+write without truncating
    ///
    /// `expected_len` is the length the file had when it was scanned.
    pub fn open(path: &Path, expected_len: u64) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            expected_len,
            dry_run: false,
        })
    }

    /// Open read-only; `apply` verifies but never writes
    pub fn open_dry_run(path: &Path, expected_len: u64) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            expected_len,
            dry_run: true,
        })
    }

    /// Re-read the target range, compare it to the scan, then overwrite it
    pub fn apply(&mut self, op: &PatchOperation) -> Result<Change> {
        let occurrence = &op.occurrence;
        let offset = occurrence.start as u64;

        self.file.seek(SeekFrom::Start(offset))?;
        let mut buffer = Vec::with_capacity(occurrence.len());
        (&mut self.file)
            .take(occurrence.len() as u64)
            .read_to_end(&mut buffer)?;

        // A file cut short since the scan no longer holds the date
        if buffer.len() < occurrence.len() {
            return Err(Error::Integrity {
                path: self.path.clone(),
                offset,
                expected: occurrence.text.clone(),
                found: format!("{} bytes before end of file", buffer.len()),
            });
        }

        let found = decode_latin1(&buffer);
        if found != occurrence.text {
            return Err(Error::Integrity {
                path: self.path.clone(),
                offset,
                expected: occurrence.text.clone(),
                found,
            });
        }
        trace!(path = ?self.path, offset, "Verified date text before write");

        let replacement = op.replacement.as_bytes();
        if replacement.len() != buffer.len() {
            return Err(Error::LengthMismatch {
                original: occurrence.text.clone(),
                replacement: op.replacement.clone(),
                expected: buffer.len(),
                actual: replacement.len(),
            });
        }

        if !self.dry_run {
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.write_all(replacement)?;
            debug!(path = ?self.path, offset, "Patched date text");
        }

        Ok(Change {
            offset,
            original: occurrence.text.clone(),
            adjusted: op.replacement.clone(),
        })
    }

    /// Flush writes and check the file length did not change
    pub fn finish(self) -> Result<()> {
        if !self.dry_run {
            self.file.sync_data()?;
        }
        let actual = self.file.metadata()?.len();
        if actual != self.expected_len {
            return Err(Error::Integrity {
                path: self.path,
                offset: actual.min(self.expected_len),
                expected: format!("{} bytes", self.expected_len),
                found: format!("{} bytes", actual),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::SingleByteText;
    use std::fs;

    const ORIGINAL: &str = "2020:01:15 10:00:00";
    const ADJUSTED: &str = "2020:01:16 10:00:00";

    fn sample_bytes() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x10];
        bytes.extend_from_slice(ORIGINAL.as_bytes());
        bytes.push(0x00);
        bytes.extend((0u8..=255).rev());
        bytes
    }

    fn first_occurrence(path: &Path) -> TextOccurrence {
        SingleByteText::read(path)
            .unwrap()
            .occurrences()
            .next()
            .unwrap()
    }

    #[test]
    fn test_patch_preserves_length_and_locality() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        let before = sample_bytes();
        fs::write(&path, &before).unwrap();

        let occurrence = first_occurrence(&path);
        let (start, end) = (occurrence.start, occurrence.end);
        let op = PatchOperation::new(occurrence, ADJUSTED).unwrap();

        let mut patcher = Patcher::open(&path, before.len() as u64).unwrap();
        let change = patcher.apply(&op).unwrap();
        patcher.finish().unwrap();

        assert_eq!(change.offset, 6);
        assert_eq!(change.original, ORIGINAL);
        assert_eq!(change.adjusted, ADJUSTED);

        let after = fs::read(&path).unwrap();
        assert_eq!(after.len(), before.len());
        assert_eq!(&after[start..end], ADJUSTED.as_bytes());
        assert_eq!(&after[..start], &before[..start]);
        assert_eq!(&after[end..], &before[end..]);
    }

    #[test]
    fn test_patch_unmodified_file_succeeds_repeatedly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, sample_bytes()).unwrap();

        let op = PatchOperation::new(first_occurrence(&path), ORIGINAL).unwrap();
        let mut patcher = Patcher::open(&path, sample_bytes().len() as u64).unwrap();
        patcher.apply(&op).unwrap();
        patcher.apply(&op).unwrap();
        patcher.finish().unwrap();

        assert_eq!(fs::read(&path).unwrap(), sample_bytes());
    }

    #[test]
    fn test_patch_detects_external_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, sample_bytes()).unwrap();

        let occurrence = first_occurrence(&path);
        let op = PatchOperation::new(occurrence, ADJUSTED).unwrap();

        // Another writer touches the date between scan and patch
        let mut tampered = sample_bytes();
        tampered[6..25].copy_from_slice(b"1999:09:09 09:09:09");
        fs::write(&path, &tampered).unwrap();

        let mut patcher = Patcher::open(&path, tampered.len() as u64).unwrap();
        let err = patcher.apply(&op).unwrap_err();

        match &err {
            Error::Integrity {
                offset,
                expected,
                found,
                ..
            } => {
                assert_eq!(*offset, 6);
                assert_eq!(expected, ORIGINAL);
                assert_eq!(found, "1999:09:09 09:09:09");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_integrity());
        assert_eq!(fs::read(&path).unwrap(), tampered);
    }

    #[test]
    fn test_patch_detects_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, sample_bytes()).unwrap();

        let op = PatchOperation::new(first_occurrence(&path), ADJUSTED).unwrap();
        fs::write(&path, &sample_bytes()[..10]).unwrap();

        let mut patcher = Patcher::open(&path, sample_bytes().len() as u64).unwrap();
        let err = patcher.apply(&op).unwrap_err();
        match &err {
            Error::Integrity { offset, found, .. } => {
                assert_eq!(*offset, 6);
                assert_eq!(found, "4 bytes before end of file");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_integrity());
        assert!(patcher.finish().unwrap_err().is_integrity());
        assert_eq!(fs::read(&path).unwrap(), &sample_bytes()[..10]);
    }

    #[test]
    fn test_patch_detects_truncation_after_earlier_patch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        let mut before = sample_bytes();
        before.extend_from_slice(ORIGINAL.as_bytes());
        before.push(0x00);
        fs::write(&path, &before).unwrap();

        let ops: Vec<_> = SingleByteText::read(&path)
            .unwrap()
            .occurrences()
            .map(|occ| PatchOperation::new(occ, ADJUSTED).unwrap())
            .collect();
        assert_eq!(ops.len(), 2);

        let mut patcher = Patcher::open(&path, before.len() as u64).unwrap();
        patcher.apply(&ops[0]).unwrap();

        // Cut the file inside the second date
        let second = ops[1].occurrence.start;
        fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(second as u64 + 5)
            .unwrap();

        let err = patcher.apply(&ops[1]).unwrap_err();
        assert!(err.is_integrity(), "{err}");
        assert!(err.to_string().contains("5 bytes before end of file"));

        let after = fs::read(&path).unwrap();
        assert_eq!(&after[6..25], ADJUSTED.as_bytes());
        assert_eq!(&after[second..], &ORIGINAL.as_bytes()[..5]);
    }

    #[test]
    fn test_patch_stops_at_changed_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        let mut before = Vec::new();
        for _ in 0..3 {
            before.extend_from_slice(b"\xFF\xE1\x00");
            before.extend_from_slice(ORIGINAL.as_bytes());
        }
        before.extend_from_slice(b"\xFF\xD9");
        fs::write(&path, &before).unwrap();

        let ops: Vec<_> = SingleByteText::read(&path)
            .unwrap()
            .occurrences()
            .map(|occ| PatchOperation::new(occ, ADJUSTED).unwrap())
            .collect();
        let starts: Vec<usize> = ops.iter().map(|op| op.occurrence.start).collect();
        assert_eq!(starts, vec![3, 25, 47]);

        let mut patcher = Patcher::open(&path, before.len() as u64).unwrap();
        let mut changes = Vec::new();
        let mut failure = None;
        for op in &ops {
            match patcher.apply(op) {
                Ok(change) => changes.push(change),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
            if changes.len() == 1 {
                // Another writer touches the second date after the first patch
                let mut on_disk = fs::read(&path).unwrap();
                on_disk[25..44].copy_from_slice(b"1999:09:09 09:09:09");
                fs::write(&path, &on_disk).unwrap();
            }
        }

        assert_eq!(changes.len(), 1);
        assert!(failure.unwrap().is_integrity());

        let after = fs::read(&path).unwrap();
        assert_eq!(after.len(), before.len());
        assert_eq!(&after[3..22], ADJUSTED.as_bytes());
        assert_eq!(&after[25..44], b"1999:09:09 09:09:09");
        assert_eq!(&after[47..66], ORIGINAL.as_bytes());
    }

    #[test]
    fn test_patch_operation_rejects_width_change() {
        let occurrence = TextOccurrence {
            start: 0,
            end: 19,
            text: ORIGINAL.to_string(),
        };
        let err = PatchOperation::new(occurrence.clone(), "+10000:01:16 10:00:00").unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 19,
                actual: 21,
                ..
            }
        ));
        assert!(PatchOperation::new(occurrence, "2020:01:16 10:00:0é").is_err());
    }

    #[test]
    fn test_dry_run_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, sample_bytes()).unwrap();

        let op = PatchOperation::new(first_occurrence(&path), ADJUSTED).unwrap();
        let mut patcher = Patcher::open_dry_run(&path, sample_bytes().len() as u64).unwrap();
        let change = patcher.apply(&op).unwrap();
        patcher.finish().unwrap();

        assert_eq!(change.adjusted, ADJUSTED);
        assert_eq!(fs::read(&path).unwrap(), sample_bytes());
    }
}
