//! Batch driver: walk the input directory and process one document at a time.
//!
//! Documents are strictly sequential. Each one runs the full journey
//! (extract, prompt, service call, parse, persist) before the next begins,
//! and each gets a fresh conversation context that is closed before moving
//! on, so no state crosses document boundaries except the credential
//! cursor itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::client::{ChatBroker, GeminiClient, KeyPool, SessionFactory, SharedBackend};
use crate::config::RunConfig;
use crate::error::{DocError, Pdf2JsonError};
use crate::output::{to_pretty_json, BatchSummary, DocumentOutcome, DocumentStatus};
use crate::pipeline::extract::{PdfiumExtractor, SharedExtractor};
use crate::pipeline::postprocess::extract_json;
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::prompts::build_prompt;

/// One unit of batch work: an input PDF and its derived output path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DocumentJob {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// How the prompt's structure section is decided for every document.
enum TemplateMode {
    /// The model designs its own structure.
    Freeform,
    /// Populate the structure read from this file (re-read per document).
    File(PathBuf),
}

/// Run a whole batch according to `config`.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(BatchSummary)` once every document reached a terminal state, even
/// when some of them failed (check the per-document outcomes).
///
/// # Errors
/// Returns `Err(Pdf2JsonError)` only for failures that make the whole run
/// pointless: no template configured, missing input directory, no
/// credentials, the very first bind rejected, or an output write failure.
pub async fn run_batch(config: &RunConfig) -> Result<BatchSummary, Pdf2JsonError> {
    let batch_start = Instant::now();

    // ── Step 1: Resolve the template mode ────────────────────────────────
    let template_mode = if config.infer_template {
        debug!("no template: the model will design the JSON structure");
        TemplateMode::Freeform
    } else {
        match &config.template_path {
            Some(path) => TemplateMode::File(path.clone()),
            None => return Err(Pdf2JsonError::TemplateRequired),
        }
    };

    // ── Step 2: Validate directories ─────────────────────────────────────
    if !config.input_dir.is_dir() {
        return Err(Pdf2JsonError::InputDirMissing {
            path: config.input_dir.clone(),
        });
    }
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| Pdf2JsonError::OutputDirFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;

    // ── Step 3: Collect jobs ─────────────────────────────────────────────
    let jobs = collect_jobs(&config.input_dir, &config.output_dir).await?;
    let progress = resolve_progress(config);
    if jobs.is_empty() {
        info!("No PDF files found in '{}'", config.input_dir.display());
        let summary = BatchSummary {
            outcomes: Vec::new(),
            duration_ms: batch_start.elapsed().as_millis() as u64,
        };
        progress.on_batch_complete(&summary);
        return Ok(summary);
    }
    info!("Found {} PDF files to process", jobs.len());

    // ── Step 4: Credentials, backend, initial bind ───────────────────────
    let pool = KeyPool::load(&config.api_keys, config.key_file.as_deref())?;
    let backend = resolve_backend(config)?;
    let factory = SessionFactory::new(backend, config.model.as_str());
    let mut broker = ChatBroker::new(pool, factory);
    broker
        .bind_initial()
        .await
        .map_err(|source| Pdf2JsonError::InitialBindFailed {
            model: config.model.clone(),
            source,
        })?;
    let extractor = resolve_extractor(config);

    // ── Step 5: Process documents, one at a time ─────────────────────────
    let total = jobs.len();
    progress.on_batch_start(total);
    let mut outcomes = Vec::with_capacity(total);

    for (i, job) in jobs.iter().enumerate() {
        let name = job
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        progress.on_document_start(i + 1, total, &name);

        let outcome = process_document(
            job,
            &template_mode,
            config.max_attempts,
            &mut broker,
            &extractor,
        )
        .await?;

        progress.on_document_complete(i + 1, total, &outcome);
        outcomes.push(outcome);
    }

    let summary = BatchSummary {
        outcomes,
        duration_ms: batch_start.elapsed().as_millis() as u64,
    };
    info!(
        "Batch complete: {}/{} written, {} raw, {} skipped, {} exhausted in {}ms",
        summary.written(),
        summary.total(),
        summary.raw_saved(),
        summary.skipped(),
        summary.exhausted(),
        summary.duration_ms
    );
    progress.on_batch_complete(&summary);
    Ok(summary)
}

/// Take one document from source PDF to its terminal state.
///
/// Per-document failures come back as an `Ok` outcome carrying the
/// [`DocError`]; only output write failures propagate as `Err`.
async fn process_document(
    job: &DocumentJob,
    template_mode: &TemplateMode,
    max_attempts: u32,
    broker: &mut ChatBroker,
    extractor: &SharedExtractor,
) -> Result<DocumentOutcome, Pdf2JsonError> {
    let start = Instant::now();
    info!("Processing '{}'", job.source.display());

    // ── Extract text ─────────────────────────────────────────────────────
    let text = match extractor.extract(&job.source).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Skipping '{}': {}", job.source.display(), e);
            return Ok(outcome(
                job,
                DocumentStatus::Skipped,
                Some(DocError::Extract {
                    path: job.source.display().to_string(),
                    detail: e.to_string(),
                }),
                start,
            ));
        }
    };

    // ── Template contents (re-read for every document) ──────────────────
    let template = match template_mode {
        TemplateMode::Freeform => None,
        TemplateMode::File(path) => match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                debug!("Using JSON structure from template '{}'", path.display());
                Some(contents)
            }
            Err(e) => {
                warn!(
                    "Template file '{}' unavailable ({}), skipping '{}'",
                    path.display(),
                    e,
                    job.source.display()
                );
                return Ok(outcome(
                    job,
                    DocumentStatus::Skipped,
                    Some(DocError::TemplateUnavailable {
                        path: path.display().to_string(),
                        detail: e.to_string(),
                    }),
                    start,
                ));
            }
        },
    };

    // ── One isolated conversation per document ───────────────────────────
    let prompt = build_prompt(&text, template.as_deref());
    let reply = broker.start_chat(&prompt, max_attempts).await;
    broker.end_chat();

    let Some(reply) = reply else {
        warn!("No response from the service for '{}'", job.source.display());
        return Ok(outcome(
            job,
            DocumentStatus::Exhausted,
            Some(DocError::ServiceExhausted {
                attempts: max_attempts,
            }),
            start,
        ));
    };

    // ── Parse and persist ────────────────────────────────────────────────
    match extract_json(&reply) {
        Some(value) => {
            let pretty = to_pretty_json(&value)?;
            write_atomic(&job.target, pretty.as_bytes()).await?;
            info!("JSON written to '{}'", job.target.display());
            Ok(outcome(job, DocumentStatus::Written, None, start))
        }
        None => {
            let artifact = error_artifact_path(&job.target);
            write_atomic(&artifact, reply.as_bytes()).await?;
            warn!(
                "Response for '{}' was not valid JSON; raw text saved to '{}'",
                job.source.display(),
                artifact.display()
            );
            Ok(outcome(job, DocumentStatus::RawSaved, None, start))
        }
    }
}

/// Scan `input_dir` for `.pdf` files (case-insensitive) and pair each with
/// its output path. Sorted by source path so runs are reproducible.
async fn collect_jobs(input_dir: &Path, output_dir: &Path) -> Result<Vec<DocumentJob>, Pdf2JsonError> {
    let mut entries = tokio::fs::read_dir(input_dir)
        .await
        .map_err(|e| Pdf2JsonError::Internal(format!("failed to read input directory: {e}")))?;

    let mut jobs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Pdf2JsonError::Internal(format!("failed to read input directory: {e}")))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| Pdf2JsonError::Internal(format!("failed to stat input entry: {e}")))?;
        if !file_type.is_file() {
            continue;
        }

        let source = entry.path();
        let is_pdf = source
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            continue;
        }

        let mut target_name = source.file_stem().unwrap_or_default().to_os_string();
        target_name.push(".json");
        jobs.push(DocumentJob {
            source,
            target: output_dir.join(target_name),
        });
    }

    jobs.sort();
    Ok(jobs)
}

/// Side-car path for unparseable responses: `name.json` → `name.json.error.txt`.
fn error_artifact_path(target: &Path) -> PathBuf {
    let mut os = target.as_os_str().to_os_string();
    os.push(".error.txt");
    PathBuf::from(os)
}

/// Atomic write: temp file in the same directory, then rename.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Pdf2JsonError> {
    let mut tmp_os = path.as_os_str().to_os_string();
    tmp_os.push(".tmp");
    let tmp_path = PathBuf::from(tmp_os);

    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| Pdf2JsonError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Pdf2JsonError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

fn outcome(
    job: &DocumentJob,
    status: DocumentStatus,
    error: Option<DocError>,
    start: Instant,
) -> DocumentOutcome {
    DocumentOutcome {
        source: job.source.clone(),
        target: job.target.clone(),
        status,
        error,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

fn resolve_backend(config: &RunConfig) -> Result<SharedBackend, Pdf2JsonError> {
    if let Some(backend) = &config.backend {
        return Ok(Arc::clone(backend));
    }
    Ok(Arc::new(GeminiClient::new(config.request_timeout_secs)?))
}

fn resolve_extractor(config: &RunConfig) -> SharedExtractor {
    config
        .extractor
        .as_ref()
        .map(Arc::clone)
        .unwrap_or_else(|| Arc::new(PdfiumExtractor))
}

fn resolve_progress(config: &RunConfig) -> ProgressCallback {
    config
        .progress_callback
        .as_ref()
        .map(Arc::clone)
        .unwrap_or_else(|| Arc::new(NoopProgressCallback))
}
