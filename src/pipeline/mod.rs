//! Pipeline stages around the service call.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations (e.g. a canned-text extractor in tests) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ prompts ──▶ client ──▶ postprocess
//! (pdfium)   (assembly)  (Gemini)   (JSON digging)
//! ```
//!
//! 1. [`extract`] — pull plain text out of the PDF; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 2. [`crate::prompts`] — deterministic prompt assembly
//! 3. [`crate::client`] — the retry/rotation broker and the wire call; the
//!    only stage with network I/O
//! 4. [`postprocess`] — ordered-candidate JSON payload extraction from the
//!    raw reply

pub mod extract;
pub mod postprocess;
