//! Error types for the pdf2json library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`Pdf2JsonError`] — **Fatal**: the batch cannot proceed at all (no
//!   credentials, missing input directory, no template configured, first
//!   bind rejected). Returned as `Err(Pdf2JsonError)` from [`crate::run_batch`]
//!   before any document output is written.
//!
//! * [`DocError`] — **Non-fatal**: a single document failed (unreadable PDF,
//!   missing template file, service exhausted after rotation) but the rest of
//!   the batch is fine. Stored inside [`crate::output::DocumentOutcome`] so
//!   callers can inspect partial success rather than losing the whole batch
//!   to one bad document.
//!
//! * [`ServiceError`] — the tagged result of a single wire call. Consumed by
//!   the retry/rotation loop, which decides whether to rotate, retry, or give
//!   up; it never crosses the library boundary on its own.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! document failure, log and continue, or collect all outcomes for a report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2json library.
///
/// Document-level failures use [`DocError`] and are stored in
/// [`crate::output::DocumentOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2JsonError {
    // ── Credential errors ─────────────────────────────────────────────────
    /// Neither the explicit list nor the backing file yielded a credential.
    #[error(
        "No API credentials found.\n\
         Pass --api KEY[,KEY...] or put one key per line in '{}'.",
        key_file.display()
    )]
    NoCredentials { key_file: PathBuf },

    /// The very first credential/model bind was rejected by the service.
    ///
    /// Later bind failures (during rotation) are handled inside the retry
    /// loop; only the initial one aborts the run, before any document is
    /// touched.
    #[error("Initial bind for model '{model}' failed: {source}")]
    InitialBindFailed {
        model: String,
        #[source]
        source: BindError,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input directory was not found at the given path.
    #[error(
        "Input directory not found: '{}'\nCreate it or pass --inputPDF <DIR>.",
        path.display()
    )]
    InputDirMissing { path: PathBuf },

    /// Template mode is ambiguous: no template path and no explicit opt-out.
    #[error(
        "No JSON template configured.\n\
         Pass --json-template <FILE> to pin the output structure, or\n\
         --no-json-template to let the model choose one."
    )]
    TemplateRequired,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{}': {source}", path.display())]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{}': {source}", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// Stored in [`crate::output::DocumentOutcome`] when a document fails.
/// The batch always continues to the next document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocError {
    /// Text extraction failed (corrupt or unreadable PDF).
    #[error("'{path}': text extraction failed: {detail}")]
    Extract { path: String, detail: String },

    /// The configured template file could not be read for this document.
    #[error("'{path}': template file unavailable: {detail}")]
    TemplateUnavailable { path: String, detail: String },

    /// The service never produced a response within the attempt bound.
    #[error("service exhausted after {attempts} attempts")]
    ServiceExhausted { attempts: u32 },
}

/// Failure of a single call to the generative-language service.
///
/// Tagged so the retry loop can log the category; every variant is treated
/// as retryable (the rotation policy does not distinguish between them).
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// Non-success HTTP status from the service.
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// Transport-level failure (DNS, TLS, connection reset).
    #[error("network error: {detail}")]
    Network { detail: String },

    /// The request exceeded the configured deadline.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// HTTP success but no candidate text in the body.
    #[error("service returned an empty response")]
    EmptyResponse,

    /// The response body did not match the expected shape.
    #[error("malformed response body: {detail}")]
    Malformed { detail: String },
}

/// A credential/model pair was rejected at bind time.
///
/// `credential` carries the masked form (see
/// [`crate::client::KeyPool::mask`]), never the secret itself.
#[derive(Debug, Clone, Error)]
#[error("cannot bind credential {credential} to model '{model}': {source}")]
pub struct BindError {
    pub credential: String,
    pub model: String,
    #[source]
    pub source: ServiceError,
}
