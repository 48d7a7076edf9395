//! photo-date - Shift the capture date of photos in place
//!
//! Adds an offset to the EXIF capture date of each photo, rewrites the
//! matching date text inside the file and updates its modified time.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use photo_date::{Cli, Config, FileResult, ProcessingStatus, Processor};
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Styled progress lines on stdout, problems on stderr

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::{stderr, stdout};

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    /// Print a rewritten date: `<file>: <old> -> <new>`
    pub fn print_change(source: &str, original: &str, adjusted: &str, dry_run: bool) {
        let mut out = stdout();
        if dry_run {
            let _ = out.execute(Print(style("(dry run) ").with(CliTheme::HINT)));
        }
        let _ = out.execute(Print(format!("{}: ", source)));
        let _ = out.execute(Print(style(original).with(CliTheme::WARNING)));
        let _ = out.execute(Print(" -> "));
        let _ = out.execute(Print(style(adjusted).with(CliTheme::SUCCESS).bold()));
        let _ = out.execute(Print("\n"));
    }

    /// Print the new name of a renamed file
    pub fn print_renamed(name: &str) {
        let _ = stdout().execute(Print(format!(" - renamed to {}\n", name)));
    }

    /// Print a hint line
    pub fn print_hint(msg: &str) {
        let _ = stdout().execute(Print(style("→ ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print a statistics line
    pub fn print_stat(key: &str, value: &str, color: Color) {
        let key_styled = style(key).with(CliTheme::HINT);
        let value_styled = style(value).with(color).bold();
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print a warning to stderr
    pub fn print_warning(source: &str, msg: &str) {
        let _ = stderr().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stderr().execute(Print(format!("{}: {}\n", source, msg)));
    }

    /// Print an error to stderr
    pub fn print_error(source: &str, msg: &str) {
        let _ = stderr().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stderr().execute(Print(format!("{}: {}\n", source, msg)));
    }
}

fn main() -> Result<()> {
    // Prints help and exits non-zero on no arguments or a malformed offset
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let _guard = setup_logging(&cli, config.verbose)?;

    info!(version = env!("CARGO_PKG_VERSION"), "photo-date starting");
    if let Some(config_path) = &cli.config {
        info!(config_file = %config_path.display(), "Loaded configuration from file");
    }
    if config.paths.is_empty() {
        cli_output::print_error("photo-date", "no files or directories given");
        let _ = Cli::command().print_help();
        std::process::exit(1);
    }

    if config.verbose {
        info!(?config, "Configuration loaded");
    }

    let verbose = config.verbose;
    let dry_run = config.dry_run;
    let mut processor = Processor::new(config);
    processor.run_with(|result| report(result, verbose));

    if verbose || dry_run {
        use cli_output::*;

        let stats = processor.stats();
        print_stat("Files", &stats.total_files.to_string(), CliTheme::ACCENT);
        print_stat("Processed", &stats.processed.to_string(), CliTheme::SUCCESS);
        print_stat("Failed", &stats.failed.to_string(), CliTheme::ERROR);
        print_stat(
            "Dates patched",
            &stats.patched_occurrences.to_string(),
            CliTheme::SUCCESS,
        );
        if dry_run {
            print_hint("Dry run: no file was modified");
        }
    }

    // Per-file failures were reported above and do not change the exit code
    Ok(())
}

/// Report one file's outcome as soon as it is processed
fn report(result: &FileResult, verbose: bool) {
    let source = result.source.display().to_string();
    let dry_run = result.status == ProcessingStatus::DryRun;

    for change in &result.changes {
        cli_output::print_change(&source, &change.original, &change.adjusted, dry_run);
    }

    if let Some(renamed) = &result.renamed_to {
        let name = renamed
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| renamed.display().to_string());
        cli_output::print_renamed(&name);
    }

    for warning in &result.warnings {
        cli_output::print_warning(&source, warning);
    }

    match result.status {
        ProcessingStatus::Failed => {
            let error = result.error.as_deref().unwrap_or("unknown error");
            cli_output::print_error(&source, &format!("{} (during {})", error, result.stage));
            if result.integrity_failure {
                cli_output::print_hint(&format!(
                    "{}: file changed while it was being patched, {} date(s) already rewritten",
                    source,
                    result.changes.len()
                ));
            }
        }
        _ if verbose && result.changes.is_empty() => {
            cli_output::print_hint(&format!("{}: no embedded date matched", source));
        }
        _ => {}
    }
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        let file_config = Config::load_from_file(config_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    Ok(config)
}

/// Console logging when verbose or with `RUST_LOG`, plus an optional log file
///
/// `verbose` is the merged setting, so the config file can turn it on too.
fn setup_logging(cli: &Cli, verbose: bool) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if verbose || std::env::var_os("RUST_LOG").is_some() {
        let level = if verbose {
            Level::DEBUG
        } else {
            Level::INFO
        };
        let env_filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter)
                .boxed(),
        );
    }

    let mut guard = None;
    if let Some(log_path) = &cli.log_file {
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(open_log_file(log_path)?);
        let env_filter = EnvFilter::builder()
            .with_default_directive(Level::INFO.into())
            .from_env_lossy();

        let layer = if cli.json_log {
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(env_filter)
                .boxed()
        } else {
            fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(env_filter)
                .boxed()
        };
        layers.push(layer);
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry().with(layers).init();

    Ok(guard)
}

fn open_log_file(log_path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    Ok(file)
}
