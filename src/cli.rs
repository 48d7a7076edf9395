//! CLI argument parsing with clap

use crate::config::Config;
use crate::time::DateOffset;
use clap::Parser;
use std::path::PathBuf;

/// photo-date - Shift the capture date of photos in place
///
/// Adds an offset to each photo's EXIF capture date and rewrites every
/// matching date string inside the file without changing its size, then
/// sets the file's modified time to the adjusted date.
#[derive(Parser, Debug)]
#[command(name = "photo-date")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Image files or directories (directories are processed recursively)
    #[arg(value_name = "FILE")]
    pub paths: Vec<PathBuf>,

    /// Date offset to apply, in milliseconds. Or suffix the offset with
    /// 'd' for days, 'h' for hours, 'm' for minutes, 's' for seconds.
    #[arg(long, value_name = "OFFSET", allow_hyphen_values = true)]
    pub offset: Option<DateOffset>,

    /// Prefix file names with the image date/time (IMG_YYYYMMDD_HHMMSS)
    #[arg(long)]
    pub date_prefix: bool,

    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Directory names or paths to skip while walking directories
    #[arg(long = "exclude", value_name = "DIR")]
    pub exclude_dirs: Vec<PathBuf>,

    /// Dry run mode - show what would be changed without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Write the log to this file as well
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Output log file format as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if !self.paths.is_empty() {
            config.paths = self.paths.clone();
        }
        if let Some(offset) = self.offset {
            config.offset = offset;
        }
        if self.date_prefix {
            config.date_prefix = true;
        }
        if !self.exclude_dirs.is_empty() {
            config.exclude_dirs.extend(self.exclude_dirs.iter().cloned());
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
