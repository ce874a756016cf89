//! PDF text extraction behind the [`TextExtractor`] seam.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto the blocking
//! thread pool so Tokio worker threads never stall on CPU-bound parsing.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pdfium_render::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Errors emitted while extracting text from a PDF document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to load pdfium runtime: {0}")]
    Library(#[from] PdfiumError),

    #[error("failed to load PDF document: {0}")]
    Document(#[source] PdfiumError),

    #[error("failed to extract text for page {page_index}: {source}")]
    PageText {
        page_index: usize,
        #[source]
        source: PdfiumError,
    },

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Seam for turning a PDF file into plain text.
///
/// The batch driver only ever sees this trait; tests substitute an in-memory
/// implementation through [`crate::config::RunConfig`].
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Full document text, pages concatenated in page order.
    async fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Shared handle to an extractor implementation.
pub type SharedExtractor = std::sync::Arc<dyn TextExtractor>;

/// Default extractor: pdfium, one text block per page, joined with newlines.
#[derive(Debug, Default)]
pub struct PdfiumExtractor;

#[async_trait]
impl TextExtractor for PdfiumExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_blocking(&path))
            .await
            .map_err(|e| ExtractError::Task(format!("extraction task panicked: {e}")))?
    }
}

fn extract_blocking(path: &Path) -> Result<String, ExtractError> {
    let pdfium = load_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(ExtractError::Document)?;

    let mut pages_text = Vec::with_capacity(document.pages().len() as usize);
    for (page_index, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|source| ExtractError::PageText { page_index, source })?;
        pages_text.push(text.all());
    }

    debug!(
        path = %path.display(),
        pages = pages_text.len(),
        "extracted document text"
    );
    Ok(pages_text.join("\n"))
}

/// Bind a pdfium library: `PDFIUM_LIB_PATH` (file or directory), then a copy
/// next to the executable's working directory, then the system library.
fn load_pdfium() -> Result<Pdfium, PdfiumError> {
    if let Some(value) = std::env::var_os("PDFIUM_LIB_PATH") {
        let path = PathBuf::from(value);
        let lib_path = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&path)
        } else {
            path
        };
        return Pdfium::bind_to_library(lib_path).map(Pdfium::new);
    }

    match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./")) {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(primary_err) => match Pdfium::bind_to_system_library() {
            Ok(bindings) => Ok(Pdfium::new(bindings)),
            Err(_) => Err(primary_err),
        },
    }
}
