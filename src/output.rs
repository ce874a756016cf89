//! Batch result types and output-file formatting.
//!
//! One [`DocumentOutcome`] per input file, collected into a
//! [`BatchSummary`]. Outcomes are serialisable so embedding callers can dump
//! a machine-readable run report; the CLI only pretty-prints the counters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DocError, Pdf2JsonError};

/// How one document's journey through the batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Structured JSON written to the target path.
    Written,
    /// The response never parsed; the raw text went to a `.error.txt`
    /// side-car instead and no `.json` file exists.
    RawSaved,
    /// Skipped before any service call (unreadable PDF, missing template
    /// file).
    Skipped,
    /// Every service attempt failed; nothing was written.
    Exhausted,
}

/// Outcome of a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// The input PDF.
    pub source: PathBuf,
    /// Where the JSON landed (or would have landed).
    pub target: PathBuf,
    pub status: DocumentStatus,
    /// Present for `Skipped` and `Exhausted`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DocError>,
    pub duration_ms: u64,
}

/// Aggregate view over a finished batch, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub outcomes: Vec<DocumentOutcome>,
    pub duration_ms: u64,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn written(&self) -> usize {
        self.count(DocumentStatus::Written)
    }

    pub fn raw_saved(&self) -> usize {
        self.count(DocumentStatus::RawSaved)
    }

    pub fn skipped(&self) -> usize {
        self.count(DocumentStatus::Skipped)
    }

    pub fn exhausted(&self) -> usize {
        self.count(DocumentStatus::Exhausted)
    }

    /// True when every document produced structured JSON.
    pub fn is_clean(&self) -> bool {
        self.written() == self.total()
    }

    fn count(&self, status: DocumentStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Serialise a value the way output files are written: 4-space indentation,
/// non-ASCII characters verbatim, no trailing newline.
///
/// `serde_json` is built with `preserve_order`, so keys come out in the
/// order the model produced them and identical responses yield identical
/// bytes.
pub fn to_pretty_json(value: &serde_json::Value) -> Result<String, Pdf2JsonError> {
    use serde::Serialize as _;

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| Pdf2JsonError::Internal(format!("JSON serialisation failed: {e}")))?;
    String::from_utf8(buf)
        .map_err(|e| Pdf2JsonError::Internal(format!("JSON output was not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(status: DocumentStatus) -> DocumentOutcome {
        DocumentOutcome {
            source: PathBuf::from("input/doc.pdf"),
            target: PathBuf::from("output/doc.json"),
            status,
            error: None,
            duration_ms: 10,
        }
    }

    #[test]
    fn summary_counters() {
        let summary = BatchSummary {
            outcomes: vec![
                outcome(DocumentStatus::Written),
                outcome(DocumentStatus::Written),
                outcome(DocumentStatus::RawSaved),
                outcome(DocumentStatus::Skipped),
                outcome(DocumentStatus::Exhausted),
            ],
            duration_ms: 0,
        };
        assert_eq!(summary.total(), 5);
        assert_eq!(summary.written(), 2);
        assert_eq!(summary.raw_saved(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.exhausted(), 1);
        assert!(!summary.is_clean());
    }

    #[test]
    fn empty_summary_is_clean() {
        assert!(BatchSummary::default().is_clean());
    }

    #[test]
    fn pretty_json_uses_four_space_indent() {
        let text = to_pretty_json(&json!({"a": {"b": 1}})).unwrap();
        assert_eq!(text, "{\n    \"a\": {\n        \"b\": 1\n    }\n}");
    }

    #[test]
    fn pretty_json_keeps_non_ascii_verbatim() {
        let text = to_pretty_json(&json!({"città": "Perugia"})).unwrap();
        assert!(text.contains("città"));
        assert!(!text.contains("\\u"), "got: {text}");
    }

    #[test]
    fn pretty_json_preserves_key_arrival_order() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let text = to_pretty_json(&value).unwrap();
        let zeta = text.find("zeta").unwrap();
        let alpha = text.find("alpha").unwrap();
        let mid = text.find("mid").unwrap();
        assert!(zeta < alpha && alpha < mid, "got: {text}");
    }

    #[test]
    fn status_serialises_snake_case() {
        let json = serde_json::to_value(DocumentStatus::RawSaved).unwrap();
        assert_eq!(json, "raw_saved");
    }
}
