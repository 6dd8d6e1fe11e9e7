//! Minimal demonstration harness for the import core (§1.1, §6): wires a
//! `clap`-derived CLI onto `mobilecombackup::orchestrator::Orchestrator`. The
//! command-line surface itself is out of scope for the library; this binary
//! exists to exercise it, in the same spirit as the teacher's `main.rs`
//! sitting on top of its own `lib.rs`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use mobilecombackup::config::{EntityFilter, ImportOptions, LoggingProgressSink};
use mobilecombackup::orchestrator::Orchestrator;

#[derive(Parser)]
#[command(name = "mobilecombackup", about = "Import mobile call/SMS backups into a deduplicating repository")]
struct Cli {
    /// Destination repository root.
    repo_root: PathBuf,

    /// Source backup files or directories to import.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Compute statistics without writing anything.
    #[arg(long)]
    dry_run: bool,

    /// Restrict the import to one entity kind.
    #[arg(long, value_enum)]
    filter: Option<CliFilter>,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,

    /// Per-document byte limit for source XML files.
    #[arg(long)]
    max_xml_size: Option<u64>,

    /// Per-record byte limit.
    #[arg(long)]
    max_message_size: Option<u64>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliFilter {
    Calls,
    Sms,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Warn
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new().filter(None, level).init();

    let mut options = ImportOptions::new(cli.repo_root, cli.paths).dry_run(cli.dry_run);
    if let Some(filter) = cli.filter {
        options = options.filter(match filter {
            CliFilter::Calls => EntityFilter::Calls,
            CliFilter::Sms => EntityFilter::Sms,
        });
    }
    if let Some(max_xml_size) = cli.max_xml_size {
        options = options.max_xml_size(max_xml_size);
    }
    if let Some(max_message_size) = cli.max_message_size {
        options = options.max_message_size(max_message_size);
    }

    match Orchestrator::run(&options, &LoggingProgressSink) {
        Ok(summary) => {
            log::info!("{summary}");
            ExitCode::from(0)
        }
        Err(e) => {
            let code = e.downcast_ref::<mobilecombackup::error::ImportErrorKind>().map_or(3, |kind| kind.exit_code());
            log::error!("import failed: {e:#}");
            ExitCode::from(code as u8)
        }
    }
}
