//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events
//! as the batch works through its documents.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a channel, a WebSocket, a database record, or a
//! terminal progress bar without the library knowing anything about how the
//! host application communicates.
//!
//! # Example
//!
//! ```rust
//! use pdf2json::{BatchProgressCallback, DocumentOutcome};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, _index: usize, total: usize, outcome: &DocumentOutcome) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}/{total}: {:?}", outcome.status);
//!     }
//! }
//!
//! let callback: Arc<dyn BatchProgressCallback> = Arc::new(CountingCallback {
//!     completed: AtomicUsize::new(0),
//! });
//! ```

use std::sync::Arc;

use crate::output::{BatchSummary, DocumentOutcome};

/// Called by the batch driver as it processes each document.
///
/// Documents are processed strictly one at a time, so the methods are never
/// called concurrently; `Send + Sync` is still required because the callback
/// crosses the async driver's await points. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the input directory has been scanned, if the scan
    /// found any documents. An empty scan skips straight to
    /// [`on_batch_complete`](Self::on_batch_complete).
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document's extraction begins.
    ///
    /// `index` is 1-based; `name` is the input file name.
    fn on_document_start(&self, index: usize, total_documents: usize, name: &str) {
        let _ = (index, total_documents, name);
    }

    /// Called when a document reaches a terminal state, whatever it is.
    fn on_document_complete(
        &self,
        index: usize,
        total_documents: usize,
        outcome: &DocumentOutcome,
    ) {
        let _ = (index, total_documents, outcome);
    }

    /// Called once after the last document, with the full summary.
    fn on_batch_complete(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
