//! # CLI Module
//!
//! Command-line interface for the smart file mover.
//!
//! ## Usage
//! ```bash
//! # Organize a folder by file type
//! file-mover organize ~/Downloads --dest ~/Organized
//!
//! # Route by a structure model instead of the built-in table
//! file-mover organize ~/Downloads --dest ~/Organized --structure folders.json
//!
//! # Continue a cancelled run
//! file-mover organize ~/Downloads --dest ~/Organized --resume
//!
//! # Inspect or forget the saved progress
//! file-mover status
//! file-mover discard
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use smart_file_mover::core::audit::AuditLog;
use smart_file_mover::core::classifier::StructureModel;
use smart_file_mover::core::engine::{CancellationToken, Engine, LayoutMode, OperationMode};
use smart_file_mover::core::progress::{JsonProgressStore, ProgressStore, RunProgress};
use smart_file_mover::core::transform::RecompressConfig;
use smart_file_mover::error::{MoverError, Result};
use smart_file_mover::events::{Event, EventChannel, OutcomeKind, RunState, RunSummary};
use std::path::{Path, PathBuf};
use std::thread;

/// Smart File Mover - Sort files into folders without losing any
#[derive(Parser, Debug)]
#[command(name = "file-mover")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy or move files into a classified destination tree
    Organize(OrganizeArgs),

    /// Show the saved progress of an interrupted run
    Status {
        /// Progress file location
        #[arg(long)]
        progress_file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Forget the saved progress of an interrupted run
    Discard {
        /// Progress file location
        #[arg(long)]
        progress_file: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct OrganizeArgs {
    /// Source directories, processed in this order
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Destination root
    #[arg(short, long)]
    dest: PathBuf,

    /// JSON structure model: {"Folder": ["*.ext", ...], ...}
    #[arg(long, conflicts_with = "structure_dir")]
    structure: Option<PathBuf>,

    /// Template directory whose subfolders define the structure model
    #[arg(long)]
    structure_dir: Option<PathBuf>,

    /// Destination layout
    #[arg(long, default_value = "categorized")]
    layout: Layout,

    /// Copy (keep sources) or move
    #[arg(short, long, default_value = "copy")]
    mode: Mode,

    /// Continue the saved run
    #[arg(long)]
    resume: bool,

    /// Copy images byte for byte
    #[arg(long)]
    no_recompress: bool,

    /// Maximum image width after recompression
    #[arg(long, default_value = "1920", value_parser = clap::value_parser!(u32).range(1..))]
    max_width: u32,

    /// Maximum image height after recompression
    #[arg(long, default_value = "1080", value_parser = clap::value_parser!(u32).range(1..))]
    max_height: u32,

    /// JPEG quality (1-100)
    #[arg(long, default_value = "85", value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Ignore hidden files and folders
    #[arg(long)]
    skip_hidden: bool,

    /// Maximum directory depth below each source
    #[arg(long)]
    max_depth: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Progress file location
    #[arg(long)]
    progress_file: Option<PathBuf>,

    /// Audit log location
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Layout {
    /// One folder per category
    Categorized,
    /// Keep each file's path relative to its source
    Mirrored,
}

impl From<Layout> for LayoutMode {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Categorized => LayoutMode::Categorized,
            Layout::Mirrored => LayoutMode::Mirrored,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Leave sources in place
    Copy,
    /// Remove sources after a verified write
    Move,
}

impl From<Mode> for OperationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Copy => OperationMode::Copy,
            Mode::Move => OperationMode::Move,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Organize(args) => run_organize(args),
        Commands::Status {
            progress_file,
            output,
        } => run_status(progress_file, output),
        Commands::Discard { progress_file } => run_discard(progress_file),
    }
}

fn progress_store(path: Option<PathBuf>) -> JsonProgressStore {
    JsonProgressStore::open(path.unwrap_or_else(JsonProgressStore::default_path))
}

/// What the event thread collected
#[derive(Default)]
struct Report {
    failures: Vec<(String, String)>,
    log_error: Option<String>,
}

fn run_organize(args: OrganizeArgs) -> Result<()> {
    smart_file_mover::init_tracing(if args.verbose { "debug" } else { "warn" });

    let term = Term::stderr();
    let pretty = matches!(args.output, OutputFormat::Pretty);

    // Print header
    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Smart File Mover").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let structure = match (&args.structure, &args.structure_dir) {
        (Some(file), _) => Some(StructureModel::from_json_file(file)?),
        (None, Some(dir)) => Some(StructureModel::from_template_dir(dir)?),
        (None, None) => None,
    };

    let log_path = args.log_file.clone().unwrap_or_else(AuditLog::default_path);
    let mut audit = AuditLog::open(&log_path).map_err(|e| {
        MoverError::Config(format!("cannot open log file {}: {}", log_path.display(), e))
    })?;

    // Build engine
    let mut builder = Engine::builder()
        .sources(args.sources.clone())
        .destination(&args.dest)
        .layout(args.layout.into())
        .operation(args.mode.into())
        .resume(args.resume)
        .include_hidden(!args.skip_hidden)
        .max_depth(args.max_depth)
        .progress_store(Box::new(progress_store(args.progress_file.clone())));

    builder = if args.no_recompress {
        builder.no_recompress()
    } else {
        builder.recompress(RecompressConfig {
            max_width: args.max_width,
            max_height: args.max_height,
            jpeg_quality: args.quality,
        })
    };

    if let Some(model) = structure {
        builder = builder.structure(model);
    }

    let engine = builder.build();

    // Set up event handling
    let (sender, receiver) = EventChannel::new();
    let cancel = CancellationToken::new();

    // Progress bar for pretty output
    let progress = if pretty {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    if pretty && console::user_attended_stderr() {
        term.write_line(&format!(
            "{}",
            style("Type q and press Enter to stop after the current file.").dim()
        ))
        .ok();
        listen_for_cancel(cancel.clone());
    }

    let progress_clone = progress.clone();
    let verbose = args.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let mut report = Report::default();

        for event in receiver.iter() {
            if report.log_error.is_none() {
                if let Err(e) = audit.record(&event) {
                    report.log_error = Some(e.to_string());
                }
            }

            match &event {
                Event::PhaseChanged { phase } => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_message(format!("{}", phase));
                    }
                }
                Event::Progress { percent, file_name } => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_position(u64::from(*percent));
                        pb.set_message(file_name.clone());
                    }
                }
                Event::FileResult {
                    file_name,
                    outcome,
                    message,
                } => {
                    if *outcome == OutcomeKind::Error {
                        report.failures.push((file_name.clone(), message.clone()));
                    }
                    if let Some(ref pb) = progress_clone {
                        match outcome {
                            OutcomeKind::Error => pb.println(format!(
                                "  {} {}",
                                style("✗").red().bold(),
                                message
                            )),
                            OutcomeKind::Skipped if verbose => pb.println(format!(
                                "  {} {} {}",
                                style("=").dim(),
                                file_name,
                                style(message).dim()
                            )),
                            OutcomeKind::Success if verbose => pb.println(format!(
                                "  {} {} {}",
                                style("✓").green(),
                                file_name,
                                style(message).dim()
                            )),
                            _ => {}
                        }
                    }
                }
                Event::StatusText { message } => {
                    if let Some(ref pb) = progress_clone {
                        pb.println(format!("  {}", style(message).dim()));
                    }
                }
                Event::Error { message } => {
                    if let Some(ref pb) = progress_clone {
                        pb.println(format!("  {} {}", style("!").red().bold(), message));
                    }
                }
                Event::Finished { .. } => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
            }
        }

        report
    });

    // Run the engine
    let result = engine.run_with_events(&sender, &cancel);

    // Drop sender to signal event thread to finish
    drop(sender);
    let report = event_thread.join().unwrap_or_default();

    if let Some(e) = &report.log_error {
        term.write_line(&format!(
            "{} audit log {} could not be written: {}",
            style("warning:").yellow().bold(),
            log_path.display(),
            e
        ))
        .ok();
    }

    let summary = result?;

    // Output results
    match args.output {
        OutputFormat::Pretty => print_pretty_summary(&term, &summary, &report, &log_path),
        OutputFormat::Json => print_json_summary(&summary, &report)?,
    }

    Ok(())
}

/// Cancel once the user types `q` (or `quit`) on stdin
fn listen_for_cancel(cancel: CancellationToken) {
    thread::spawn(move || {
        let term = Term::stdout();
        while let Ok(line) = term.read_line() {
            let line = line.trim().to_lowercase();
            if line == "q" || line == "quit" {
                cancel.cancel();
                break;
            }
        }
    });
}

fn print_pretty_summary(term: &Term, summary: &RunSummary, report: &Report, log_path: &Path) {
    term.write_line("").ok();

    let headline = match summary.state {
        Some(RunState::Cancelled) => format!(
            "{} Cancelled. Run again with --resume to continue.",
            style("■").yellow().bold()
        ),
        _ => format!("{} Done", style("✓").green().bold()),
    };
    term.write_line(&headline).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files organized in {:.1}s",
        style(summary.succeeded).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicates skipped",
        style(summary.skipped).cyan()
    ))
    .ok();

    if summary.resumed_from > 0 {
        term.write_line(&format!(
            "  {} already handled by the previous run",
            style(summary.resumed_from).dim()
        ))
        .ok();
    }

    term.write_line(&format!(
        "  {} written to {}",
        style(format_bytes(summary.bytes_written)).yellow(),
        summary.destination.display()
    ))
    .ok();

    if !report.failures.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!(
            "{}",
            style(format!("{} files failed:", report.failures.len())).red().bold()
        ))
        .ok();
        for (_, message) in &report.failures {
            term.write_line(&format!("    {}", message)).ok();
        }
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "{}",
        style(format!("Log: {}", log_path.display())).dim()
    ))
    .ok();
}

fn print_json_summary(summary: &RunSummary, report: &Report) -> Result<()> {
    let output = serde_json::json!({
        "summary": summary,
        "failures": report.failures.iter().map(|(file, message)| {
            serde_json::json!({ "file": file, "message": message })
        }).collect::<Vec<_>>(),
    });

    print_json(&output)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| MoverError::Config(format!("cannot render JSON: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn run_status(progress_file: Option<PathBuf>, output: OutputFormat) -> Result<()> {
    let store = progress_store(progress_file);
    let saved = store.load()?;

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({ "saved": saved })),
        OutputFormat::Pretty => {
            let term = Term::stdout();
            match saved {
                Some(progress) => print_saved(&term, &progress),
                None => {
                    term.write_line(&format!(
                        "No saved progress at {}",
                        store.path().display()
                    ))
                    .ok();
                }
            }
            Ok(())
        }
    }
}

fn print_saved(term: &Term, progress: &RunProgress) {
    term.write_line(&format!(
        "{} {}",
        style("Saved run").bold(),
        style(progress.run_id).dim()
    ))
    .ok();
    term.write_line(&format!(
        "  {} of {} files handled ({}%)",
        style(progress.completed).cyan(),
        progress.total,
        progress.percent()
    ))
    .ok();
    for source in &progress.sources {
        term.write_line(&format!("  from {}", source.display())).ok();
    }
    term.write_line(&format!("  into {}", progress.destination.display()))
        .ok();
    if let Some(last) = &progress.last_completed {
        term.write_line(&format!("  last file {}", last.display())).ok();
    }
    term.write_line(&format!(
        "  saved {}",
        progress.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
    ))
    .ok();
}

fn run_discard(progress_file: Option<PathBuf>) -> Result<()> {
    let store = progress_store(progress_file);
    store.clear()?;

    Term::stdout()
        .write_line(&format!(
            "{} Saved progress discarded",
            style("✓").green().bold()
        ))
        .ok();
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
