//! Sequential processing of photos
//!
//! Each file runs through:
//! - Reading candidate dates from metadata
//! - Resolving the effective original date and applying the offset
//! - Scanning the raw bytes for date text and matching it against the candidates
//! - Verified in-place patching of every match
//! - Updating the modified time and, optionally, renaming the file

use crate::config::Config;
use crate::enumerate::{FileEnumerator, WalkDirEnumerator};
use crate::error::{Error, Result};
use crate::patch::{Change, PatchOperation, Patcher};
use crate::scan::{MatchOutcome, SingleByteText, match_occurrence};
use crate::time::exif::{ExifMetadataSource, MetadataSource};
use crate::time::{CandidateSet, DateOffset, Timestamp, format_exif};
use crate::update::{rename_with_date_prefix, set_modified};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};

/// Step of the per-file pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    MetadataRead,
    DateResolved,
    Scanning,
    Matching,
    Patching,
    TimestampUpdate,
    Rename,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::MetadataRead => "metadata read",
            Stage::DateResolved => "date resolution",
            Stage::Scanning => "scanning",
            Stage::Matching => "matching",
            Stage::Patching => "patching",
            Stage::TimestampUpdate => "timestamp update",
            Stage::Rename => "rename",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Status of file processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    /// File was patched (possibly with zero matching occurrences)
    Success,
    /// Processing failed
    Failed,
    /// Dry run - changes were verified but not written
    DryRun,
}

/// Result of processing a single file
#[derive(Debug, Clone)]
pub struct FileResult {
    /// Source file path
    pub source: PathBuf,
    /// New path after `--date-prefix`
    pub renamed_to: Option<PathBuf>,
    /// Effective original date from metadata
    pub original: Option<Timestamp>,
    /// Original date with the offset applied
    pub adjusted: Option<Timestamp>,
    /// Date text rewritten in the file, in file order
    pub changes: Vec<Change>,
    /// Date-shaped text that failed to parse
    pub unparseable: usize,
    /// Non-fatal problems (modified time, rename)
    pub warnings: Vec<String>,
    /// Processing status
    pub status: ProcessingStatus,
    /// Stage at which processing stopped
    pub stage: Stage,
    /// Error message (if failed)
    pub error: Option<String>,
    /// The file changed on disk between scan and patch
    pub integrity_failure: bool,
}

impl FileResult {
    fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            renamed_to: None,
            original: None,
            adjusted: None,
            changes: Vec::new(),
            unparseable: 0,
            warnings: Vec::new(),
            status: ProcessingStatus::Success,
            stage: Stage::Start,
            error: None,
            integrity_failure: false,
        }
    }

    fn fail(mut self, error: &Error) -> Self {
        error!(path = ?self.source, stage = %self.stage, %error, "Processing failed");
        self.status = ProcessingStatus::Failed;
        self.error = Some(error.to_string());
        self.integrity_failure = error.is_integrity();
        self
    }

    fn warn(&mut self, message: String) {
        warn!(path = ?self.source, stage = %self.stage, "{}", message);
        self.warnings.push(message);
    }
}

/// Processing statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_files: usize,
    pub processed: usize,
    pub failed: usize,
    pub patched_occurrences: usize,
    pub skipped_occurrences: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {}, Processed: {}, Failed: {}, Dates patched: {}, Unparseable dates: {}",
            self.total_files,
            self.processed,
            self.failed,
            self.patched_occurrences,
            self.skipped_occurrences
        )
    }
}

/// Per-file options derived once per run
#[derive(Debug, Clone, Copy)]
pub struct FileOptions {
    pub offset: DateOffset,
    pub date_prefix: bool,
    pub dry_run: bool,
}

impl From<&Config> for FileOptions {
    fn from(config: &Config) -> Self {
        Self {
            offset: config.offset,
            date_prefix: config.date_prefix,
            dry_run: config.dry_run,
        }
    }
}

/// Main processor: walks the inputs and patches one file at a time
pub struct Processor<M = ExifMetadataSource, E = WalkDirEnumerator> {
    config: Config,
    metadata: M,
    enumerator: E,
    stats: ProcessingStats,
}

impl Processor {
    /// Create a processor reading EXIF metadata and walking directories
    pub fn new(config: Config) -> Self {
        let enumerator = WalkDirEnumerator::new(&config);
        Self::with_collaborators(config, ExifMetadataSource, enumerator)
    }
}

impl<M: MetadataSource, E: FileEnumerator> Processor<M, E> {
    pub fn with_collaborators(config: Config, metadata: M, enumerator: E) -> Self {
        Self {
            config,
            metadata,
            enumerator,
            stats: ProcessingStats::new(),
        }
    }

    /// Run the processing pipeline
    pub fn run(&mut self) -> Vec<FileResult> {
        self.run_with(|_| {})
    }

    /// Run the pipeline, handing each result to `on_result` as soon as it is known
    pub fn run_with<F: FnMut(&FileResult)>(&mut self, mut on_result: F) -> Vec<FileResult> {
        let _span = span!(Level::INFO, "processor_run").entered();
        let options = FileOptions::from(&self.config);
        info!(offset = %options.offset, dry_run = options.dry_run, "Processing files");

        let mut results = Vec::new();
        for root in self.config.paths.clone() {
            let files = match self.enumerator.enumerate(&root) {
                Ok(files) => files,
                Err(e) => {
                    let result = FileResult::new(&root).fail(&e);
                    self.record(&result);
                    on_result(&result);
                    results.push(result);
                    continue;
                }
            };

            for path in files {
                let result = process_file(&path, &self.metadata, options);
                self.record(&result);
                on_result(&result);
                results.push(result);
            }
        }

        info!("{}", self.stats.summary());
        results
    }

    fn record(&mut self, result: &FileResult) {
        self.stats.total_files += 1;
        match result.status {
            ProcessingStatus::Success | ProcessingStatus::DryRun => self.stats.processed += 1,
            ProcessingStatus::Failed => self.stats.failed += 1,
        }
        self.stats.patched_occurrences += result.changes.len();
        self.stats.skipped_occurrences += result.unparseable;
    }

    /// Get processing statistics reference
    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }
}

/// Patch every occurrence in `text` that matches a candidate date
///
/// Stops at the first occurrence that fails to patch. Changes made before it
/// are already in `result.changes` and on disk.
fn patch_matches(
    path: &Path,
    text: &SingleByteText,
    candidates: &CandidateSet,
    replacement: &str,
    dry_run: bool,
    result: &mut FileResult,
) -> Result<()> {
    let file_len = text.char_len() as u64;
    let mut patcher = if dry_run {
        Patcher::open_dry_run(path, file_len)?
    } else {
        Patcher::open(path, file_len)?
    };

    for occurrence in text.occurrences() {
        result.stage = Stage::Matching;
        match match_occurrence(&occurrence, candidates) {
            MatchOutcome::Accepted(_) => {}
            MatchOutcome::Rejected(found) => {
                debug!(offset = occurrence.start, %found, "Date text is not a metadata date");
                continue;
            }
            MatchOutcome::Unparseable(e) => {
                warn!(offset = occurrence.start, text = %occurrence.text, error = %e, "Failed to parse date");
                result.unparseable += 1;
                continue;
            }
        }

        result.stage = Stage::Patching;
        let op = PatchOperation::new(occurrence, replacement)?;
        let change = patcher.apply(&op)?;
        info!(offset = change.offset, original = %change.original, adjusted = %change.adjusted, "Date text updated");
        result.changes.push(change);
    }

    result.stage = Stage::Patching;
    patcher.finish()
}

/// Process a single file through every stage
pub fn process_file<M: MetadataSource + ?Sized>(
    path: &Path,
    metadata: &M,
    options: FileOptions,
) -> FileResult {
    let _file_span = span!(Level::DEBUG, "process_file", ?path).entered();
    let mut result = FileResult::new(path);

    result.stage = Stage::MetadataRead;
    let candidates = match metadata.read_dates(path) {
        Ok(candidates) => candidates,
        Err(e) => return result.fail(&e),
    };

    result.stage = Stage::DateResolved;
    let Some((field, original)) = candidates.effective() else {
        return result.fail(&Error::NoDate {
            path: path.to_path_buf(),
        });
    };
    let adjusted = options.offset.apply(original);
    result.original = Some(original);
    result.adjusted = Some(adjusted);
    debug!(?field, %original, %adjusted, "Resolved capture date");

    result.stage = Stage::Scanning;
    let replacement = format_exif(&adjusted);
    let text = match SingleByteText::read(path) {
        Ok(text) => text,
        Err(e) => return result.fail(&e),
    };

    result.stage = Stage::Patching;
    if let Err(e) = patch_matches(path, &text, &candidates, &replacement, options.dry_run, &mut result) {
        // Earlier patches stay on disk; there is no rollback
        return result.fail(&e);
    }

    if options.dry_run {
        result.status = ProcessingStatus::DryRun;
        result.stage = Stage::Done;
        return result;
    }

    result.stage = Stage::TimestampUpdate;
    if let Err(e) = set_modified(path, &adjusted) {
        result.warn(format!("Failed to set last modified time: {}", e));
    }

    if options.date_prefix {
        result.stage = Stage::Rename;
        match rename_with_date_prefix(path, &adjusted) {
            Ok(renamed) => result.renamed_to = renamed,
            Err(e) => result.warn(format!("Failed to rename: {}", e)),
        }
    }

    result.stage = Stage::Done;
    result
}
