//! # pdf2json
//!
//! Turn folders of PDF documents into structured JSON using a generative
//! language model.
//!
//! ## Why this crate?
//!
//! Pulling raw text out of a PDF is mechanical; turning that text into a
//! well-formed JSON record (invoice fields, dates, totals, line items) is
//! not. This crate extracts the embedded text with pdfium and delegates the
//! structuring to a Gemini-style generative service under strict output
//! rules, optionally populating a caller-supplied JSON template. Because
//! free-tier credentials exhaust quickly, the service layer runs on a
//! rotating pool of API keys: when a call fails, the next key is bound and
//! the attempt repeats, so a long batch survives individual key failures.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input/*.pdf
//!  │
//!  ├─ 1. Scan      collect the PDF jobs, sorted for reproducible runs
//!  ├─ 2. Extract   embedded text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Prompt    extraction rules + optional JSON template + document text
//!  ├─ 4. Generate  one isolated chat per document, keys rotated on failure
//!  ├─ 5. Parse     dig the JSON payload out of the reply (fences, braces)
//!  └─ 6. Output    pretty 4-space JSON, or a .error.txt side-car
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2json::{run_batch, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Keys are read from api_key.txt unless supplied explicitly.
//!     let config = RunConfig::builder()
//!         .input_dir("input")
//!         .output_dir("output")
//!         .template_path("invoice_template.json")
//!         .build()?;
//!
//!     let summary = run_batch(&config).await?;
//!     println!("{}/{} documents extracted", summary.written(), summary.total());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2json` binary (clap + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2json = { version = "0.3", default-features = false }
//! ```
//!
//! ## Credential Rotation
//!
//! All keys (explicit ones first, then the key file, duplicates dropped) sit
//! in a [`KeyPool`] with a single cursor. A batch binds one session on the
//! current key and keeps it until a call fails; the pool then advances
//! cyclically and a fresh session is bound on the next key. With a single
//! key there is nothing to rotate to, so the same session simply retries up
//! to the attempt limit. Failed keys are never blacklisted: quota errors
//! are usually transient, so a key that failed an hour ago deserves another
//! chance when the cursor comes back around.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{run_batch, DocumentJob};
pub use client::{
    ChatBroker, GeminiClient, GenerativeBackend, KeyPool, Role, SessionFactory, SessionHandle,
    SharedBackend, Turn,
};
pub use config::{RunConfig, RunConfigBuilder, DEFAULT_MODEL};
pub use error::{BindError, DocError, Pdf2JsonError, ServiceError};
pub use output::{BatchSummary, DocumentOutcome, DocumentStatus};
pub use pipeline::extract::{PdfiumExtractor, SharedExtractor, TextExtractor};
pub use pipeline::postprocess::extract_json;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::build_prompt;
