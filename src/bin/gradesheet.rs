//! CLI binary for edgequake-gradesheet.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `IngestConfig`, opens the SQLite store and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_gradesheet::{
    extract, ingest, student_report, subject_averages, topper, GradesheetError, IngestConfig,
    IngestProgressCallback, PageSelection, PageStatus, ProgressCallback, SqliteStore, TieBreak,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar with one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    /// Starts as a spinner; `on_ingest_start` turns it into a bar.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
        })
    }
}

impl IngestProgressCallback for CliProgressCallback {
    fn on_ingest_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Extracting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Scanning {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_extracted(&self, page_num: usize, total: usize, roll_no: &str, subjects: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            page_num,
            total,
            roll_no,
            dim(&format!("{subjects} subjects")),
        ));
        self.bar.set_position(page_num as u64);
    }

    fn on_page_skipped(&self, page_num: usize, total: usize, reason: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        let msg = if reason.chars().count() > 80 {
            format!("{}\u{2026}", reason.chars().take(79).collect::<String>())
        } else {
            reason.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            dim("–"),
            page_num,
            total,
            dim(&msg)
        ));
        self.bar.set_position(page_num as u64);
    }

    fn on_ingest_complete(&self, total_pages: usize, records_extracted: usize) {
        self.bar.finish_and_clear();
        let skipped = self.skipped.load(Ordering::SeqCst);
        eprintln!(
            "{} {} records from {} pages  {}",
            if records_extracted == 0 { red("✘") } else { green("✔") },
            bold(&records_extracted.to_string()),
            total_pages,
            dim(&format!("({skipped} skipped)")),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ingest a result sheet into ./gradesheet.sqlite
  gradesheet ingest results-sem5.pdf

  # Only pages 3-40, break SGPA ties by roll number
  gradesheet ingest --pages 3-40 --tie-break roll-number results.pdf

  # Dry run: show what would be extracted, as JSON
  gradesheet --json extract results.pdf

  # Queries
  gradesheet topper
  gradesheet averages 5
  gradesheet student 2101234

ENVIRONMENT VARIABLES:
  GRADESHEET_DB      SQLite database path (default: gradesheet.sqlite)
  PDFIUM_LIB_PATH    pdfium library file or the directory containing it
  RUST_LOG           Override log filtering (e.g. edgequake_gradesheet=debug)
"#;

/// Extract student results from PDF result sheets and rank them.
#[derive(Parser, Debug)]
#[command(
    name = "gradesheet",
    version,
    about = "Extract student results from PDF result sheets and rank them",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SQLite database file.
    #[arg(long, global = true, env = "GRADESHEET_DB", default_value = "gradesheet.sqlite")]
    db: PathBuf,

    /// Print JSON instead of text.
    #[arg(long, global = true, env = "GRADESHEET_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "GRADESHEET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "GRADESHEET_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, store and rank the students of a result sheet.
    Ingest(ExtractionArgs),
    /// Extract without storing anything.
    Extract(ExtractionArgs),
    /// Show one stored student with their subjects.
    Student {
        /// Roll number.
        roll_no: String,
    },
    /// Show the top-ranked student.
    Topper,
    /// Average grade point per subject for a semester.
    Averages {
        /// Semester number (1-based).
        semester: u32,
    },
}

#[derive(Args, Debug)]
struct ExtractionArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "GRADESHEET_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "GRADESHEET_PASSWORD")]
    password: Option<String>,

    /// Maximum student records per page.
    #[arg(long, env = "GRADESHEET_RECORDS_PER_PAGE", default_value_t = 1)]
    records_per_page: usize,

    /// Order of students with equal SGPA.
    #[arg(long, env = "GRADESHEET_TIE_BREAK", value_enum, default_value = "insertion-order")]
    tie_break: TieBreakArg,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "GRADESHEET_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "GRADESHEET_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TieBreakArg {
    InsertionOrder,
    RollNumber,
}

impl From<TieBreakArg> for TieBreak {
    fn from(v: TieBreakArg) -> Self {
        match v {
            TieBreakArg::InsertionOrder => TieBreak::InsertionOrder,
            TieBreakArg::RollNumber => TieBreak::RollNumber,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would interleave with the progress bar, so they are muted
    // while it is shown.
    let show_progress = match &cli.command {
        Command::Ingest(a) | Command::Extract(a) => !cli.quiet && !a.no_progress && !cli.json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Ingest(args) => run_ingest(&cli, args, show_progress).await,
        Command::Extract(args) => run_extract(&cli, args, show_progress).await,
        Command::Student { roll_no } => run_student(&cli, roll_no),
        Command::Topper => run_topper(&cli),
        Command::Averages { semester } => run_averages(&cli, *semester),
    }
}

// ── Subcommands ──────────────────────────────────────────────────────────────

async fn run_ingest(cli: &Cli, args: &ExtractionArgs, show_progress: bool) -> Result<()> {
    let config = build_config(args, show_progress)?;
    let mut store = open_store(cli)?;

    let output = ingest(&args.input, &config, &mut store)
        .await
        .context("Ingestion failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output).context("Failed to serialise output")?);
        return Ok(());
    }

    let s = &output.stats;
    println!(
        "{} {} records extracted  ({} new, {} already stored)",
        green("✔"),
        bold(&output.records_extracted.to_string()),
        s.students_inserted,
        s.duplicates_skipped
    );
    if !cli.quiet {
        eprintln!(
            "   {}",
            dim(&format!(
                "{} subjects stored, {} rows dropped, {}/{} pages used, {}ms",
                s.subjects_inserted, s.subject_rows_dropped, s.pages_extracted, s.total_pages, s.total_duration_ms
            ))
        );
        if let Some(first) = output.standings.first() {
            eprintln!("   top: {} (SGPA {:.2})", bold(&first.roll_no), first.sgpa);
        }
    }
    Ok(())
}

async fn run_extract(cli: &Cli, args: &ExtractionArgs, show_progress: bool) -> Result<()> {
    let config = build_config(args, show_progress)?;
    let output = extract(&args.input, &config).await.context("Extraction failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output).context("Failed to serialise output")?);
        return Ok(());
    }

    for r in &output.records {
        println!(
            "{:<12} {:<28} {:<10} sem {:<2} SGPA {:>5.2}  {} subjects",
            r.roll_no,
            r.name,
            r.branch,
            r.semester,
            r.sgpa,
            r.subjects.len()
        );
    }
    if !cli.quiet {
        for p in &output.pages {
            if let PageStatus::Skipped { miss } = &p.status {
                eprintln!("  {} {}", dim("–"), dim(&miss.to_string()));
            }
        }
        eprintln!(
            "{} records from {}/{} pages",
            output.records.len(),
            output.stats.pages_extracted,
            output.stats.total_pages
        );
    }
    Ok(())
}

fn run_student(cli: &Cli, roll_no: &str) -> Result<()> {
    let store = open_store(cli)?;
    let report = student_report(&store, roll_no)?.ok_or_else(|| GradesheetError::StudentNotFound {
        roll_no: roll_no.to_string(),
    })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let s = &report.student;
    println!("Roll No.       {}", bold(&s.roll_no));
    println!("Name           {}", s.name);
    println!("Father's Name  {}", s.father_name);
    println!("Branch         {}", s.branch);
    println!("Semester       {}", s.semester);
    println!("SGPA           {:.2}", s.sgpa);
    println!("CGPA           {}", s.cgpa.map_or("-".to_string(), |c| format!("{c:.2}")));
    println!("Rank           {}", s.rank.map_or("-".to_string(), |r| r.to_string()));
    println!();
    for sub in &report.subjects {
        println!(
            "  {:<10} {:<36} {:>4.1} cr  {:<3} {:>2} gp  {:>5.1}",
            sub.subject_code, sub.subject_name, sub.credits, sub.grade, sub.grade_point, sub.credit_points
        );
    }
    Ok(())
}

fn run_topper(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let best = topper(&store)?.ok_or(GradesheetError::NoTopper)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&best)?);
    } else {
        println!(
            "{} {}  {}  CGPA {}  SGPA {:.2}",
            cyan("★"),
            bold(&best.roll_no),
            best.name,
            best.cgpa.map_or("-".to_string(), |c| format!("{c:.2}")),
            best.sgpa
        );
    }
    Ok(())
}

fn run_averages(cli: &Cli, semester: u32) -> Result<()> {
    let store = open_store(cli)?;
    let averages = subject_averages(&store, semester)?;
    if averages.is_empty() {
        return Err(GradesheetError::NoSubjectData { semester }.into());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&averages)?);
    } else {
        for a in &averages {
            println!(
                "{:<10} {:<36} {:>5.2}  {}",
                a.subject_code,
                a.subject_name,
                a.average_grade_point,
                dim(&format!("n={}", a.students))
            );
        }
    }
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn open_store(cli: &Cli) -> Result<SqliteStore> {
    SqliteStore::open(&cli.db).with_context(|| format!("Failed to open database {:?}", cli.db))
}

/// Map CLI args to `IngestConfig`.
fn build_config(args: &ExtractionArgs, show_progress: bool) -> Result<IngestConfig> {
    let mut builder = IngestConfig::builder()
        .pages(parse_pages(&args.pages)?)
        .records_per_page(args.records_per_page)
        .tie_break(args.tie_break.into())
        .download_timeout_secs(args.download_timeout);

    if let Some(pwd) = &args.password {
        builder = builder.password(pwd.clone());
    }
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new_dynamic();
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();
    if s == "all" {
        return Ok(PageSelection::All);
    }

    let page = |p: &str| -> Result<usize> {
        let n: usize = p
            .trim()
            .parse()
            .with_context(|| format!("Invalid page number: '{}'", p.trim()))?;
        if n < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {n})");
        }
        Ok(n)
    };

    if let Some((start, end)) = s.split_once('-') {
        let (start, end) = (page(start)?, page(end)?);
        if start > end {
            anyhow::bail!("Invalid page range '{start}-{end}': start must be <= end");
        }
        return Ok(PageSelection::Range(start, end));
    }

    if s.contains(',') {
        let pages = s.split(',').map(page).collect::<Result<Vec<_>>>()?;
        return Ok(PageSelection::Set(pages));
    }

    Ok(PageSelection::Single(page(&s)?))
}
