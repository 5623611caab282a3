//! CLI binary for pdf2sheet.
//!
//! A thin shim over the library crate that maps CLI flags to `BatchConfig`
//! or an `InteractiveSession` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2sheet::pipeline::input::is_pdf_name;
use pdf2sheet::{
    convert_dir, inspect, BatchConfig, BatchReport, ConversionProgressCallback, Dialogs,
    ExtractionOptions, FileStatus, InteractiveSession, OutputFormat, PageSelection,
    PdfiumTableExtractor, ProgressCallback,
};
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the batch plus a log line per
/// file.
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} PDF files…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, path: &Path) {
        self.bar.set_message(file_name(path));
    }

    fn on_file_complete(&self, index: usize, total: usize, path: &Path, rows: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}",
            green("✓"),
            index,
            total,
            file_name(path),
            dim(&format!("{rows} rows")),
        ));
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, index: usize, total: usize, path: &Path, reason: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}",
            yellow("–"),
            index,
            total,
            file_name(path),
            dim(reason),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, path: &Path, error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        let first_line = error.lines().next().unwrap_or(error);
        let msg = if first_line.chars().count() > 80 {
            format!("{}\u{2026}", first_line.chars().take(79).collect::<String>())
        } else {
            first_line.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}",
            red("✗"),
            index,
            total,
            file_name(path),
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        self.bar.finish_and_clear();
        let skipped = self.skipped.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        let mark = if converted == total_files {
            green("✔")
        } else if converted == 0 {
            red("✘")
        } else {
            cyan("⚠")
        };
        eprintln!(
            "{} {}",
            mark,
            completion_line(total_files, converted, skipped, failed)
        );
    }
}

/// "2/4 files converted  (1 skipped, 1 failed)"; counts that are zero are left out.
fn completion_line(total: usize, converted: usize, skipped: usize, failed: usize) -> String {
    if converted == total {
        return format!("{converted} files converted");
    }
    let mut parts = Vec::new();
    if skipped > 0 {
        parts.push(format!("{skipped} skipped"));
    }
    if failed > 0 {
        parts.push(format!("{failed} failed"));
    }
    if parts.is_empty() {
        format!("{converted}/{total} files converted")
    } else {
        format!("{converted}/{total} files converted  ({})", parts.join(", "))
    }
}

// ── Terminal dialogs for the interactive mode ────────────────────────────────

/// Line-oriented stand-in for message boxes and a file-open dialog.
struct TerminalDialogs;

impl TerminalDialogs {
    fn prompt(&self, question: &str) -> Option<String> {
        eprint!("{} ", bold(question));
        io::stderr().flush().ok();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Dialogs for TerminalDialogs {
    fn pick_pdf(&self) -> Option<PathBuf> {
        let answer = self.prompt("PDF file (*.pdf):")?;
        let cleaned = answer.trim_matches(|c| c == '"' || c == '\'');
        if cleaned.is_empty() {
            return None;
        }
        if !is_pdf_name(cleaned) {
            self.warning("Not a PDF", "Only *.pdf files can be selected.");
            return None;
        }
        Some(PathBuf::from(cleaned))
    }

    fn info(&self, title: &str, message: &str) {
        eprintln!("{} {}  {}", cyan("ℹ"), bold(title), message);
    }

    fn warning(&self, title: &str, message: &str) {
        eprintln!("{} {}  {}", yellow("⚠"), bold(title), message);
    }

    fn error(&self, title: &str, message: &str) {
        eprintln!("{} {}  {}", red("✗"), bold(title), message);
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert every PDF in a directory to XLSX
  pdf2sheet batch ./statements ./sheets

  # CSV output, first five pages only, no log file
  pdf2sheet batch ./statements ./sheets --format csv --pages 1-5 --no-log-file

  # JSON report of the run on stdout
  pdf2sheet batch ./statements ./sheets --json > report.json

  # Pick a file and a format interactively
  pdf2sheet interactive

  # Convert one file, writing report.csv next to report.pdf
  pdf2sheet interactive report.pdf --format csv

  # List the tables pdf2sheet can see, without writing anything
  pdf2sheet inspect report.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to an existing libpdfium
  RUST_LOG          Override the stderr log filter (e.g. pdf2sheet=debug)
"#;

/// Convert tables in PDF files to XLSX or CSV spreadsheets.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2sheet",
    version,
    about = "Convert tables in PDF files to XLSX or CSV spreadsheets",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2SHEET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2SHEET_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert every PDF in a directory.
    Batch(BatchArgs),
    /// Choose one PDF and a format, then convert it next to the source.
    Interactive(InteractiveArgs),
    /// List detected tables without writing anything.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct ExtractionArgs {
    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2SHEET_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2SHEET_PASSWORD")]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Directory scanned for *.pdf files.
    #[arg(env = "PDF2SHEET_INPUT_DIR")]
    input_dir: PathBuf,

    /// Directory receiving one spreadsheet per PDF.
    #[arg(env = "PDF2SHEET_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Output format: xlsx or csv.
    #[arg(short, long, env = "PDF2SHEET_FORMAT", default_value = "xlsx")]
    format: String,

    /// Append log lines to this file.
    #[arg(long, env = "PDF2SHEET_LOG_FILE", default_value = pdf2sheet::config::DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Do not write a log file.
    #[arg(long, env = "PDF2SHEET_NO_LOG_FILE")]
    no_log_file: bool,

    /// Keep existing output files instead of replacing them.
    #[arg(long, env = "PDF2SHEET_NO_OVERWRITE")]
    no_overwrite: bool,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "PDF2SHEET_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2SHEET_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    extraction: ExtractionArgs,
}

#[derive(Args, Debug)]
struct InteractiveArgs {
    /// Pre-select this PDF instead of prompting for one.
    pdf: Option<PathBuf>,

    /// Output format: xlsx or csv. Prompted for when omitted (empty answer keeps xlsx).
    #[arg(short, long, env = "PDF2SHEET_FORMAT")]
    format: Option<String>,

    #[command(flatten)]
    extraction: ExtractionArgs,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// PDF file to scan.
    pdf: PathBuf,

    /// Print the detected tables as JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    extraction: ExtractionArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Batch(ref args) => run_batch(&cli, args).await,
        Command::Interactive(ref args) => run_interactive(&cli, args).await,
        Command::Inspect(ref args) => run_inspect(&cli, args).await,
    }
}

// ── Logging setup ────────────────────────────────────────────────────────────

/// Install the stderr layer and, when `log_file` is set, a plain-text
/// appending file layer that always records INFO and above.
fn init_logging(stderr_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(stderr_filter)),
        );

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::INFO),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

fn stderr_filter(cli: &Cli, progress_active: bool) -> &'static str {
    // The progress bar provides all the feedback that matters; keep INFO
    // lines out of its way unless asked for.
    if cli.verbose {
        "debug"
    } else if cli.quiet || progress_active {
        "error"
    } else {
        "info"
    }
}

// ── Subcommands ──────────────────────────────────────────────────────────────

async fn run_batch(cli: &Cli, args: &BatchArgs) -> Result<()> {
    let show_progress = !cli.quiet && !args.no_progress && !args.json;
    let log_file = (!args.no_log_file).then(|| args.log_file.clone());
    init_logging(stderr_filter(cli, show_progress), log_file.as_deref())?;

    let config = match build_batch_config(args, log_file, show_progress) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Error processing PDF files: {:#}", e);
            return Err(e);
        }
    };

    let report = match convert_dir(&config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Error processing PDF files: {}", e);
            return Err(e).context("Batch conversion failed");
        }
    };

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_batch_summary(&report, &config.output_dir, show_progress);
    }
    Ok(())
}

fn build_batch_config(
    args: &BatchArgs,
    log_file: Option<PathBuf>,
    show_progress: bool,
) -> Result<BatchConfig> {
    let format: OutputFormat = args.format.parse().context("Invalid --format")?;

    let mut builder = BatchConfig::builder()
        .input_dir(&args.input_dir)
        .output_dir(&args.output_dir)
        .format(format)
        .log_file(log_file)
        .overwrite(!args.no_overwrite)
        .extraction(build_extraction(&args.extraction)?);

    if show_progress {
        builder = builder.progress_callback(CliProgressCallback::new() as ProgressCallback);
    }

    builder.build().context("Invalid configuration")
}

fn print_batch_summary(report: &BatchReport, output_dir: &Path, progress_shown: bool) {
    let stats = &report.stats;
    if stats.pdf_files == 0 {
        eprintln!("{} No PDF files found for processing.", cyan("ℹ"));
        return;
    }
    if !progress_shown {
        for file in &report.files {
            let mark = match file.status {
                FileStatus::Converted => green("✓"),
                FileStatus::Skipped => yellow("–"),
                FileStatus::Failed => red("✗"),
            };
            let detail = match (&file.output_path, &file.error) {
                (Some(out), _) => format!("→ {} ({} rows)", out.display(), file.rows),
                (None, Some(err)) => err.to_string(),
                (None, None) => String::new(),
            };
            eprintln!("  {} {}  {}", mark, file_name(&file.pdf_path), dim(&detail));
        }
    }
    eprintln!(
        "{}  {}/{} converted  {} skipped  {} failed  {} rows  {}ms  →  {}",
        if stats.failed == 0 { green("✔") } else { cyan("⚠") },
        stats.converted,
        stats.pdf_files,
        stats.skipped,
        stats.failed,
        stats.total_rows,
        stats.total_duration_ms,
        bold(&output_dir.display().to_string()),
    );
}

async fn run_interactive(cli: &Cli, args: &InteractiveArgs) -> Result<()> {
    init_logging(if cli.verbose { "debug" } else { "error" }, None)?;

    let dialogs = TerminalDialogs;
    let mut session = InteractiveSession::new(build_extraction(&args.extraction)?);

    if let Some(ref format) = args.format {
        session.set_format(format.parse().context("Invalid --format")?);
    }
    if let Some(ref pdf) = args.pdf {
        if args.format.is_none() {
            let Some(answer) = dialogs.prompt("Format (xlsx/csv) [xlsx]:") else {
                return Ok(());
            };
            session.set_format(format_answer(&answer).context("Invalid format")?);
        }
        session.select_file(pdf);
        let _ = session.convert(&dialogs).await;
        return Ok(());
    }

    loop {
        let current = session
            .selected_file()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string());
        eprintln!(
            "\n{} file: {}   format: {}",
            cyan("◆"),
            bold(&current),
            bold(session.format().extension())
        );
        let Some(choice) =
            dialogs.prompt("[o]pen PDF  [f]ormat xlsx/csv  [c]onvert  [q]uit >")
        else {
            return Ok(());
        };

        match choice.to_lowercase().as_str() {
            "o" | "open" => {
                session.choose_file(&dialogs);
            }
            "f" | "format" => {
                if let Some(answer) = dialogs.prompt("Format (xlsx/csv):") {
                    match answer.parse::<OutputFormat>() {
                        Ok(format) => session.set_format(format),
                        Err(e) => dialogs.warning("Format", &e.to_string()),
                    }
                }
            }
            "xlsx" | "csv" => {
                if let Ok(format) = choice.parse::<OutputFormat>() {
                    session.set_format(format);
                }
            }
            "c" | "convert" => {
                let _ = session.convert(&dialogs).await;
            }
            "q" | "quit" | "exit" => return Ok(()),
            "" => {}
            other => dialogs.warning("Unknown choice", other),
        }
    }
}

async fn run_inspect(cli: &Cli, args: &InspectArgs) -> Result<()> {
    init_logging(stderr_filter(cli, false), None)?;

    let extractor = Arc::new(PdfiumTableExtractor::new(build_extraction(&args.extraction)?));
    let tables = inspect(&args.pdf, extractor)
        .await
        .context("Failed to inspect PDF")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tables).context("Failed to serialise tables")?
        );
        return Ok(());
    }

    println!("File:    {}", args.pdf.display());
    println!("Tables:  {}", tables.len());
    for (i, table) in tables.iter().enumerate() {
        println!(
            "  #{:<3} page {:<4} {} cols × {} rows   {}",
            i + 1,
            table.page,
            table.column_count(),
            table.row_count(),
            dim(&table.headers.join(" | ")),
        );
    }
    Ok(())
}

// ── Argument parsing helpers ─────────────────────────────────────────────────

/// A prompted format; an empty answer keeps the default.
fn format_answer(answer: &str) -> Result<OutputFormat, pdf2sheet::Pdf2SheetError> {
    if answer.trim().is_empty() {
        Ok(OutputFormat::default())
    } else {
        answer.parse()
    }
}

fn build_extraction(args: &ExtractionArgs) -> Result<ExtractionOptions> {
    let options = ExtractionOptions {
        pages: parse_pages(&args.pages)?,
        password: args.password.clone(),
        ..ExtractionOptions::default()
    };
    options.validate().context("Invalid extraction options")?;
    Ok(options)
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pages_variants() {
        assert_eq!(parse_pages("all").unwrap(), PageSelection::All);
        assert_eq!(parse_pages(" 5 ").unwrap(), PageSelection::Single(5));
        assert_eq!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15));
        assert_eq!(
            parse_pages("1,3,5").unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
    }

    #[test]
    fn parse_pages_rejects_bad_input() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("9-2").is_err());
        assert!(parse_pages("1,x").is_err());
        assert!(parse_pages("0,2").is_err());
    }

    #[test]
    fn completion_line_separates_skips_from_failures() {
        assert_eq!(completion_line(2, 2, 0, 0), "2 files converted");
        assert_eq!(
            completion_line(2, 1, 1, 0),
            "1/2 files converted  (1 skipped)"
        );
        assert_eq!(
            completion_line(4, 2, 1, 1),
            "2/4 files converted  (1 skipped, 1 failed)"
        );
        assert_eq!(completion_line(3, 0, 0, 3), "0/3 files converted  (3 failed)");
    }

    #[test]
    fn format_answer_defaults_to_xlsx() {
        assert_eq!(format_answer("").unwrap(), OutputFormat::Xlsx);
        assert_eq!(format_answer("  ").unwrap(), OutputFormat::Xlsx);
        assert_eq!(format_answer("CSV").unwrap(), OutputFormat::Csv);
        assert!(format_answer("pdf").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn batch_args_parse() {
        let cli = Cli::try_parse_from([
            "pdf2sheet", "batch", "in", "out", "--format", "csv", "--no-log-file",
        ])
        .unwrap();
        match cli.command {
            Command::Batch(args) => {
                assert_eq!(args.input_dir, PathBuf::from("in"));
                assert_eq!(args.format, "csv");
                assert!(args.no_log_file);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
