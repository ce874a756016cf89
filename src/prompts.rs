//! Prompt text for JSON extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the extraction behaviour (e.g.
//!    tightening a rule) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the assembled prompt without
//!    calling a real model, making prompt regressions easy to catch.
//!
//! [`build_prompt`] is deterministic: the same document text and template
//! always produce byte-identical prompts, which keeps re-runs reproducible.

/// Task framing, sent at the top of every prompt.
pub const PROMPT_PREAMBLE: &str = "\
You are an expert assistant for extracting data from financial documents and structuring it as JSON.
Analyse the following text and extract the key information.";

/// Rules used when the caller supplies a JSON template to populate.
pub const TEMPLATE_RULES: &str = "\
IMPORTANT RULES:
1. **Exact Structure**: Your response MUST follow the defined JSON structure exactly. Do not add or remove keys.
2. **Data Types**: Respect the specified data types (string, number). Do not put numbers in quotes.
3. **Missing Data**: If a piece of information is not present in the text, use the value `null` for the corresponding key (not the string \"null\").
4. **Date Format**: Where required, format dates as YYYY-MM-DD when possible.";

/// Rules used when the model is asked to invent its own structure.
pub const FREEFORM_RULES: &str = "\
IMPORTANT RULES:
1. **Create a Logical Structure**: Define a clear, hierarchical JSON structure that organises the document's information sensibly.
2. **Missing Data**: If a piece of information is not present in the text, use the value `null` for the corresponding key.
3. **Date Format**: Where possible, format dates as YYYY-MM-DD.";

/// Appended after the rules block in both modes.
pub const CLEAN_OUTPUT_RULE: &str = "\
5. **Clean Response**: Your reply must contain ONLY the JSON code, nothing else. Do not include explanations, comments, or the ```json markup.";

/// Assemble the full extraction prompt for one document.
///
/// With a template, the rules demand the exact given structure and the
/// template text is embedded verbatim between `---` markers. Without one,
/// the model is told to design its own structure. The document text always
/// comes last, closed by a final `---`.
pub fn build_prompt(document_text: &str, template: Option<&str>) -> String {
    let rules = match template {
        Some(_) => TEMPLATE_RULES,
        None => FREEFORM_RULES,
    };
    let template_section = template
        .map(|t| format!("\n---\nJSON STRUCTURE TO POPULATE:\n{t}\n---"))
        .unwrap_or_default();

    format!(
        "{PROMPT_PREAMBLE}\n{rules}\n{CLEAN_OUTPUT_RULE}{template_section}\nDOCUMENT TEXT TO ANALYSE:\n{document_text}\n---\n"
    )
}
