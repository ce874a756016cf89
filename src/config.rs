//! Configuration types for batch extraction runs.
//!
//! All run behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. Keeping every knob in one struct makes it trivial to
//! share configs, log them, and diff two runs to understand why their
//! outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use std::fmt;
use std::path::PathBuf;

use crate::client::SharedBackend;
use crate::error::Pdf2JsonError;
use crate::pipeline::extract::SharedExtractor;
use crate::progress::ProgressCallback;

/// Default model identifier when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for one batch run.
///
/// Built via [`RunConfig::builder()`] or [`RunConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2json::RunConfig;
///
/// let config = RunConfig::builder()
///     .input_dir("invoices")
///     .output_dir("records")
///     .api_keys(["key-one", "key-two"])
///     .infer_template(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.5-flash");
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Directory scanned (non-recursively) for `.pdf` files. Default: `input`.
    pub input_dir: PathBuf,

    /// Directory receiving `.json` and `.json.error.txt` files. Created if
    /// missing. Default: `output`.
    pub output_dir: PathBuf,

    /// Model identifier sent to the service. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Credentials supplied directly (CLI `--api`). Merged ahead of the
    /// backing file, first occurrence winning on duplicates.
    pub api_keys: Vec<String>,

    /// Backing credential file, one key per line. `None` disables the file
    /// source entirely. Default: `api_key.txt`.
    pub key_file: Option<PathBuf>,

    /// File whose contents are embedded verbatim in the prompt as the
    /// structure to populate. Read once per document, so it can change
    /// between documents of a long batch.
    pub template_path: Option<PathBuf>,

    /// Let the model design its own JSON structure instead of populating a
    /// template. When set, `template_path` is ignored. Default: false.
    pub infer_template: bool,

    /// Attempts per document before giving up, rotation included. Default: 3.
    pub max_attempts: u32,

    /// Per-request deadline applied by the wire client, in seconds.
    /// Default: 120.
    pub request_timeout_secs: u64,

    /// Pre-constructed service backend. Defaults to the Gemini client;
    /// tests inject a scripted backend here.
    pub backend: Option<SharedBackend>,

    /// Pre-constructed text extractor. Defaults to pdfium.
    pub extractor: Option<SharedExtractor>,

    /// Receiver for per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            model: DEFAULT_MODEL.to_string(),
            api_keys: Vec::new(),
            key_file: Some(PathBuf::from(crate::client::keypool::DEFAULT_KEY_FILE)),
            template_path: None,
            infer_template: false,
            max_attempts: 3,
            request_timeout_secs: 120,
            backend: None,
            extractor: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("model", &self.model)
            .field("api_keys", &format!("<{} redacted>", self.api_keys.len()))
            .field("key_file", &self.key_file)
            .field("template_path", &self.template_path)
            .field("infer_template", &self.infer_template)
            .field("max_attempts", &self.max_attempts)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn GenerativeBackend>"))
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn TextExtractor>"))
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.api_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.key_file = Some(path.into());
        self
    }

    /// Disable the backing credential file; only explicit keys are used.
    pub fn without_key_file(mut self) -> Self {
        self.config.key_file = None;
        self
    }

    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.template_path = Some(path.into());
        self
    }

    pub fn infer_template(mut self, v: bool) -> Self {
        self.config.infer_template = v;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn backend(mut self, backend: SharedBackend) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn extractor(mut self, extractor: SharedExtractor) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, Pdf2JsonError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(Pdf2JsonError::InvalidConfig(
                "model name must not be empty".into(),
            ));
        }
        if c.max_attempts == 0 {
            return Err(Pdf2JsonError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let config = RunConfig::default();
        assert_eq!(config.input_dir, PathBuf::from("input"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.key_file, Some(PathBuf::from("api_key.txt")));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.request_timeout_secs, 120);
        assert!(!config.infer_template);
        assert!(config.template_path.is_none());
    }

    #[test]
    fn builder_clamps_attempts_to_at_least_one() {
        let config = RunConfig::builder().max_attempts(0).build().unwrap();
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn empty_model_fails_validation() {
        let err = RunConfig::builder().model("  ").build().unwrap_err();
        assert!(matches!(err, Pdf2JsonError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_credentials() {
        let config = RunConfig::builder()
            .api_keys(["very-secret-key"])
            .build()
            .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret-key"));
        assert!(debug.contains("<1 redacted>"));
    }

    #[test]
    fn without_key_file_clears_the_source() {
        let config = RunConfig::builder().without_key_file().build().unwrap();
        assert!(config.key_file.is_none());
    }
}
