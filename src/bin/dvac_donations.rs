//! CLI binary for dvac-donations.
//!
//! A thin shim over the library crate that expands the input file list,
//! chunks it into protocol-sized batches, and prints JSON or writes CSV.

use anyhow::{Context, Result};
use clap::Parser;
use dvac_donations::{
    extract_batch_with_progress, save_results_to_csv, BatchProgressCallback, BatchStats,
    DocumentOutcome, ExtractionConfig, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar across all batches, with a log line
/// per document. `offset` carries the document count of earlier batches so
/// positions stay monotonic when the input spans several batch calls.
struct CliProgressCallback {
    bar: ProgressBar,
    offset: AtomicUsize,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new(total_documents: usize) -> Arc<Self> {
        let bar = ProgressBar::new(total_documents as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Extracting");
        Arc::new(Self {
            bar,
            offset: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        })
    }

    fn advance_offset(&self, batch_len: usize) {
        self.offset.fetch_add(batch_len, Ordering::SeqCst);
    }

    fn finish(&self, total: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} files extracted successfully",
                green("✔"),
                bold(&total.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files extracted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&(total - failed).to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_document_start(&self, _index: usize, _total: usize, filename: &str) {
        self.bar.set_message(filename.to_string());
    }

    fn on_document_complete(&self, index: usize, _total: usize, filename: &str) {
        let pos = self.offset.load(Ordering::SeqCst) + index;
        self.bar.println(format!(
            "  {} {:>3}  {}",
            green("✓"),
            pos,
            dim(filename)
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, _total: usize, filename: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let pos = self.offset.load(Ordering::SeqCst) + index;

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}  {}  {}",
            red("✗"),
            pos,
            filename,
            red(&msg)
        ));
        self.bar.inc(1);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a handful of scans, print JSON
  dvac-donations scans/donation_001.pdf scans/donation_002.pdf

  # Extract a whole directory of PDFs into a CSV
  dvac-donations scans/ --csv out/donations.csv

  # Multi-page documents
  dvac-donations scans/ --max-pages 2 --csv out/donations.csv

  # A different vision model via OpenRouter
  dvac-donations scans/ --model google/gemini-2.5-pro --csv out.csv

Files are processed in batches of --batch-size (default 5, matching the
tool-protocol timeout budget); results are merged across batches before
output, so batch boundaries are invisible in the CSV or JSON.

ENVIRONMENT VARIABLES:
  OPENROUTER_API_KEY   Extraction credential (read at call time)
  PDFIUM_LIB_PATH      Path to an existing libpdfium
"#;

/// Extract donation records from scanned PDFs using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "dvac-donations",
    version,
    about = "Extract donation records (name, address, amount, date) from scanned PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files, directories of PDFs, or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write results to this CSV file instead of printing JSON.
    #[arg(short, long, env = "DVAC_CSV")]
    csv: Option<PathBuf>,

    /// Maximum pages rendered per document.
    #[arg(long, env = "DVAC_MAX_PAGES", default_value_t = 1)]
    max_pages: usize,

    /// Documents per batch call.
    #[arg(long, env = "DVAC_BATCH_SIZE", default_value_t = 5)]
    batch_size: usize,

    /// Vision model ID (OpenRouter naming, e.g. google/gemini-2.5-flash).
    #[arg(long, env = "DVAC_MODEL")]
    model: Option<String>,

    /// Provider name for ProviderFactory (default: openrouter).
    #[arg(long, env = "DVAC_PROVIDER")]
    provider: Option<String>,

    /// Retries per document on provider failure.
    #[arg(long, env = "DVAC_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Disable the progress bar.
    #[arg(long, env = "DVAC_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DVAC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "DVAC_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Expand inputs ────────────────────────────────────────────────────
    let files = expand_inputs(&cli.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No PDF files found in the given inputs");
    }
    if !cli.quiet {
        eprintln!(
            "{} {} files to process",
            cyan("◆"),
            bold(&files.len().to_string())
        );
    }

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ExtractionConfig::builder()
        .max_pages(cli.max_pages)
        .max_batch_size(cli.batch_size)
        .max_retries(cli.max_retries);
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run batches sequentially and merge outcomes ──────────────────────
    let progress = if show_progress {
        Some(CliProgressCallback::new(files.len()))
    } else {
        None
    };

    let mut outcomes: Vec<DocumentOutcome> = Vec::with_capacity(files.len());
    let mut stats = BatchStats::default();

    for chunk in files.chunks(config.max_batch_size) {
        let cb: Option<ProgressCallback> = progress
            .as_ref()
            .map(|p| Arc::clone(p) as Arc<dyn BatchProgressCallback>);

        let report = extract_batch_with_progress(chunk, &config, cb)
            .await
            .context("Batch extraction failed")?;

        if let Some(ref p) = progress {
            p.advance_offset(chunk.len());
        }

        outcomes.extend(report.outcomes);
        stats.documents += report.stats.documents;
        stats.extracted += report.stats.extracted;
        stats.failed += report.stats.failed;
        stats.render_duration_ms += report.stats.render_duration_ms;
        stats.llm_duration_ms += report.stats.llm_duration_ms;
        stats.total_duration_ms += report.stats.total_duration_ms;
    }

    if let Some(ref p) = progress {
        p.finish(files.len());
    }

    // ── Output ───────────────────────────────────────────────────────────
    if let Some(ref csv_path) = cli.csv {
        let message = save_results_to_csv(&outcomes, csv_path);
        println!("{message}");
        if message.starts_with("Error") {
            std::process::exit(1);
        }
    } else {
        let json =
            serde_json::to_string_pretty(&outcomes).context("Failed to serialise outcomes")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(json.as_bytes()).ok();
        handle.write_all(b"\n").ok();
    }

    if !cli.quiet {
        eprintln!(
            "   {} render  /  {} model  —  {}ms total",
            dim(&format!("{}ms", stats.render_duration_ms)),
            dim(&format!("{}ms", stats.llm_duration_ms)),
            stats.total_duration_ms,
        );
    }

    Ok(())
}

/// Expand file, directory, and URL inputs into an ordered document list.
///
/// Directories contribute their `.pdf` entries in sorted order; files and
/// URLs pass through as given.
fn expand_inputs(inputs: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for input in inputs {
        let path = PathBuf::from(input);
        if path.is_dir() {
            let mut entries: Vec<String> = std::fs::read_dir(&path)
                .with_context(|| format!("Cannot read directory {}", path.display()))?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
                })
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}
