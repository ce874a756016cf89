//! CLI binary for pdf2json.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`,
//! renders batch progress, and translates fatal errors into exit codes.

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2json::{
    run_batch, BatchProgressCallback, BatchSummary, DocumentOutcome, DocumentStatus,
    Pdf2JsonError, ProgressCallback, RunConfig, DEFAULT_MODEL,
};
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

/// Terminal progress callback: one live bar at the bottom plus a log line
/// per finished document. Durations come from the outcome itself, so no
/// bookkeeping is needed here.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically by
    /// `on_batch_start` (called after the input directory has been scanned).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning input folder…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        // Switch from spinner-only style to the full bar now that we know
        // how many documents the batch holds.
        self.activate_bar(total_documents);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_documents} PDF documents…"))
        ));
    }

    fn on_document_start(&self, index: usize, total_documents: usize, name: &str) {
        self.bar
            .set_message(format!("{name} ({index}/{total_documents})"));
    }

    fn on_document_complete(&self, _index: usize, _total: usize, outcome: &DocumentOutcome) {
        let name = outcome
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let secs = format!("{:.1}s", outcome.duration_ms as f64 / 1000.0);

        let line = match outcome.status {
            DocumentStatus::Written => {
                format!("  {} {:<28}  {}", green("✓"), name, dim(&secs))
            }
            DocumentStatus::RawSaved => format!(
                "  {} {:<28}  {}  {}",
                cyan("⚠"),
                name,
                dim("raw reply saved"),
                dim(&secs)
            ),
            DocumentStatus::Skipped => {
                let why = outcome
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                format!("  {} {:<28}  {}", red("✗"), name, red(&truncate(&why, 80)))
            }
            DocumentStatus::Exhausted => format!(
                "  {} {:<28}  {}  {}",
                red("✗"),
                name,
                red("no response from the service"),
                dim(&secs)
            ),
        };
        self.bar.println(line);
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        self.bar.finish_and_clear();

        if summary.total() == 0 {
            eprintln!("{} no PDF files found", cyan("⚠"));
        } else if summary.is_clean() {
            eprintln!(
                "{} {} documents extracted successfully",
                green("✔"),
                bold(&summary.written().to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents extracted  ({} raw, {} skipped, {} exhausted)",
                if summary.written() == 0 {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&summary.written().to_string()),
                summary.total(),
                summary.raw_saved(),
                summary.skipped(),
                summary.exhausted(),
            );
        }
    }
}

/// Truncate long error messages so log lines stay on one row.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}\u{2026}")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract every PDF in ./input using a template, keys from api_key.txt
  pdf2json --json-template invoice_template.json

  # Let the model design the JSON structure itself
  pdf2json --no-json-template

  # Explicit keys (rotated on failure) and custom folders
  pdf2json --api AIza...one,AIza...two \
           --inputPDF statements --outputJSON extracted --no-json-template

  # A different Gemini model and more attempts per document
  pdf2json --model-name gemini-2.5-pro --max-attempts 5 \
           --json-template template.json

OUTPUT:
  For every input/name.pdf the tool writes output/name.json (4-space indent).
  When a reply cannot be parsed as JSON the raw text is saved next to it as
  output/name.json.error.txt, so no model output is ever lost.

CREDENTIALS:
  Keys are merged from --api flags (first) and the key file (one key per
  line, duplicates dropped). When a call fails the pool advances to the
  next key and the request is retried on a fresh session; with a single
  key the same session simply retries up to --max-attempts.

ENVIRONMENT VARIABLES:
  PDF2JSON_MODEL            Override the model ID
  PDF2JSON_KEY_FILE         Path to the key file (default: api_key.txt)
  PDF2JSON_MAX_ATTEMPTS     Attempts per document (default: 3)
  PDF2JSON_REQUEST_TIMEOUT  HTTP timeout per call in seconds (default: 120)
  PDFIUM_LIB_PATH           Path to an existing pdfium shared library

SETUP:
  1. Put one or more Gemini API keys in api_key.txt (one per line)
  2. Drop PDF files into ./input
  3. Run:  pdf2json --json-template template.json
"#;

/// Extract structured JSON from folders of PDF documents using Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2json",
    version,
    about = "Extract structured JSON from PDF documents using Gemini",
    long_about = "Extract the embedded text of every PDF in a folder and turn it into \
structured JSON using Google's Gemini models. Populates a caller-supplied JSON template \
(or lets the model design the structure), rotating through a pool of API keys when \
calls fail so long batches survive quota exhaustion.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Gemini API key. Comma-separate or repeat the flag to build a
    /// rotation pool.
    #[arg(long = "api", value_name = "KEY", value_delimiter = ',')]
    api: Vec<String>,

    /// Gemini model ID.
    #[arg(
        long = "model-name",
        env = "PDF2JSON_MODEL",
        default_value = DEFAULT_MODEL
    )]
    model_name: String,

    /// Folder containing the PDF files to process.
    #[arg(long = "inputPDF", value_name = "DIR", default_value = "input")]
    input_pdf: PathBuf,

    /// Folder that receives the extracted JSON files.
    #[arg(long = "outputJSON", value_name = "DIR", default_value = "output")]
    output_json: PathBuf,

    /// JSON template file whose structure the model must populate.
    #[arg(long = "json-template", value_name = "FILE")]
    json_template: Option<PathBuf>,

    /// No template: the model designs the JSON structure itself.
    #[arg(long = "no-json-template")]
    no_json_template: bool,

    /// File holding additional API keys, one per line.
    #[arg(
        long = "key-file",
        env = "PDF2JSON_KEY_FILE",
        value_name = "FILE",
        default_value = "api_key.txt"
    )]
    key_file: PathBuf,

    /// Attempts per document before giving up.
    #[arg(long, env = "PDF2JSON_MAX_ATTEMPTS", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: u32,

    /// HTTP timeout per service call, in seconds.
    #[arg(long, env = "PDF2JSON_REQUEST_TIMEOUT", default_value_t = 120)]
    request_timeout: u64,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2JSON_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2JSON_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.quiet || show_progress { "error" } else { "info" };
    // In verbose mode we always want all logs regardless of progress.
    let filter = if cli.verbose { "debug" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let config = match build_config(&cli, progress) {
        Ok(config) => config,
        Err(e) => return fail(&e),
    };

    // ── Run the batch ────────────────────────────────────────────────────
    match run_batch(&config).await {
        Ok(summary) => {
            // The callback already printed the verdict when the bar was on.
            if !cli.quiet && !show_progress {
                report(&summary);
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Map CLI args to `RunConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RunConfig, Pdf2JsonError> {
    let mut builder = RunConfig::builder()
        .input_dir(&cli.input_pdf)
        .output_dir(&cli.output_json)
        .model(cli.model_name.as_str())
        .api_keys(&cli.api)
        .key_file(&cli.key_file)
        .max_attempts(cli.max_attempts)
        .request_timeout_secs(cli.request_timeout);

    if cli.no_json_template {
        builder = builder.infer_template(true);
    } else if let Some(ref template) = cli.json_template {
        builder = builder.template_path(template);
    }
    // Neither flag given: run_batch reports the missing template decision.

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build()
}

/// Plain-text summary for runs without a progress bar.
fn report(summary: &BatchSummary) {
    if summary.total() == 0 {
        eprintln!("No PDF files found");
    } else if summary.is_clean() {
        eprintln!(
            "Extracted {}/{} documents in {}ms",
            summary.written(),
            summary.total(),
            summary.duration_ms
        );
    } else {
        eprintln!(
            "Extracted {}/{} documents in {}ms  ({} raw, {} skipped, {} exhausted)",
            summary.written(),
            summary.total(),
            summary.duration_ms,
            summary.raw_saved(),
            summary.skipped(),
            summary.exhausted(),
        );
    }
}

/// Print the error chain and pick the exit code for a fatal failure.
fn fail(err: &Pdf2JsonError) -> ExitCode {
    eprintln!("{} {err}", red("error:"));
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  {} {cause}", dim("caused by:"));
        source = cause.source();
    }

    match err {
        Pdf2JsonError::NoCredentials { .. } => ExitCode::from(2),
        Pdf2JsonError::InputDirMissing { .. } => ExitCode::from(3),
        Pdf2JsonError::TemplateRequired => ExitCode::from(4),
        _ => ExitCode::FAILURE,
    }
}
