//! Response cleanup: dig the JSON payload out of raw model text.
//!
//! The prompt demands bare JSON, but models still wrap replies in markdown
//! fences or surround them with prose. Rather than trusting a single
//! pattern, payload candidates are tried in a fixed order and the first one
//! that actually parses wins:
//!
//! 1. the inside of a ```` ```json … ``` ```` fence
//! 2. the span from the first `{` to the last `}`
//! 3. the raw text itself
//!
//! Each candidate is trimmed before parsing. A reply that defeats all three
//! yields `None`; the driver then persists the raw text as a side-car error
//! artifact instead of a `.json` file, so nothing is ever silently dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_FENCED: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").unwrap());

/// Greedy span: first `{` to last `}`, so nested objects stay whole.
static RE_BRACE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

/// Extract the first parseable JSON payload from `raw`.
pub fn extract_json(raw: &str) -> Option<Value> {
    for candidate in candidates(raw) {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            return Some(value);
        }
    }
    None
}

/// Payload candidates in priority order.
fn candidates(raw: &str) -> Vec<&str> {
    let mut found = Vec::with_capacity(3);
    if let Some(caps) = RE_FENCED.captures(raw) {
        if let Some(inner) = caps.get(1) {
            found.push(inner.as_str());
        }
    }
    if let Some(span) = RE_BRACE_SPAN.find(raw) {
        found.push(span.as_str());
    }
    found.push(raw);
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_block_wins() {
        let raw = "Here is the data:\n```json\n{\"invoice\": 42}\n```\nLet me know!";
        assert_eq!(extract_json(raw), Some(json!({"invoice": 42})));
    }

    #[test]
    fn brace_span_with_surrounding_prose() {
        let raw = "The extracted record is {\"invoice\": 42} as requested.";
        assert_eq!(extract_json(raw), Some(json!({"invoice": 42})));
    }

    #[test]
    fn bare_object_parses_directly() {
        assert_eq!(
            extract_json("{\"invoice\": 42}"),
            Some(json!({"invoice": 42}))
        );
    }

    #[test]
    fn all_three_shapes_agree_on_equivalent_content() {
        let fenced = "```json\n{\"a\": [1, 2]}\n```";
        let prose = "sure thing: {\"a\": [1, 2]} hope that helps";
        let bare = "  {\"a\": [1, 2]}  ";

        let expected = json!({"a": [1, 2]});
        assert_eq!(extract_json(fenced), Some(expected.clone()));
        assert_eq!(extract_json(prose), Some(expected.clone()));
        assert_eq!(extract_json(bare), Some(expected));
    }

    #[test]
    fn unparseable_fence_falls_through_to_brace_span() {
        let raw = "```json\nnot quite json\n```\nBut here: {\"ok\": true}";
        assert_eq!(extract_json(raw), Some(json!({"ok": true})));
    }

    #[test]
    fn greedy_span_keeps_nested_objects_whole() {
        let raw = "prefix {\"a\": {\"b\": 2}} suffix";
        assert_eq!(extract_json(raw), Some(json!({"a": {"b": 2}})));
    }

    #[test]
    fn two_separate_objects_defeat_every_candidate() {
        // The greedy span covers both objects plus the filler between them;
        // neither it nor the raw text parses.
        assert_eq!(extract_json("{\"a\": 1} and {\"b\": 2}"), None);
    }

    #[test]
    fn plain_prose_yields_none() {
        assert_eq!(extract_json("not json at all"), None);
        assert_eq!(extract_json(""), None);
        assert_eq!(extract_json("   \n  "), None);
    }

    #[test]
    fn top_level_array_survives_via_raw_candidate() {
        assert_eq!(extract_json("[1, 2, 3]"), Some(json!([1, 2, 3])));
    }

    #[test]
    fn non_ascii_content_is_untouched() {
        let raw = "```json\n{\"città\": \"Perugia\", \"importo\": \"120,50 €\"}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["città"], "Perugia");
        assert_eq!(value["importo"], "120,50 €");
    }

    #[test]
    fn fence_interior_is_trimmed() {
        let raw = "```json   \n\n  {\"a\": 1}\n\n   ```";
        assert_eq!(extract_json(raw), Some(json!({"a": 1})));
    }
}
