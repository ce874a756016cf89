//! Ordered credential pool with a cyclic cursor.
//!
//! Keys come from two sources, merged in a fixed order: the explicit list
//! (CLI `--api`, comma-separated or repeated) first, then the backing file
//! (one key per line). Duplicates keep their first occurrence; entries are
//! trimmed and blanks dropped. The pool is immutable after loading — only
//! the cursor moves.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Pdf2JsonError;

/// Default backing file, read from the working directory.
pub const DEFAULT_KEY_FILE: &str = "api_key.txt";

/// An ordered, deduplicated set of service credentials.
///
/// Never empty: construction fails with [`Pdf2JsonError::NoCredentials`]
/// instead, so `current()` is total.
#[derive(Debug, Clone)]
pub struct KeyPool {
    keys: Vec<String>,
    index: usize,
}

impl KeyPool {
    /// Merge explicit keys and the backing file into a pool.
    ///
    /// A missing backing file contributes nothing and is not an error; an
    /// empty merged result is.
    pub fn load(explicit: &[String], key_file: Option<&Path>) -> Result<Self, Pdf2JsonError> {
        let mut keys: Vec<String> = Vec::new();
        for key in explicit {
            push_unique(&mut keys, key);
        }

        if let Some(path) = key_file {
            match std::fs::read_to_string(path) {
                Ok(contents) => {
                    for line in contents.lines() {
                        push_unique(&mut keys, line);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "credential file not found, skipping");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not read credential file");
                }
            }
        }

        if keys.is_empty() {
            return Err(Pdf2JsonError::NoCredentials {
                key_file: key_file
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE)),
            });
        }

        info!(count = keys.len(), "loaded credential pool");
        Ok(Self { keys, index: 0 })
    }

    /// Build a pool from an in-memory list (tests, embedding callers).
    pub fn from_keys<I, S>(keys: I) -> Result<Self, Pdf2JsonError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut merged = Vec::new();
        for key in keys {
            push_unique(&mut merged, key.as_ref());
        }
        if merged.is_empty() {
            return Err(Pdf2JsonError::NoCredentials {
                key_file: PathBuf::from(DEFAULT_KEY_FILE),
            });
        }
        Ok(Self {
            keys: merged,
            index: 0,
        })
    }

    /// The credential the cursor points at.
    pub fn current(&self) -> &str {
        &self.keys[self.index]
    }

    /// Zero-based cursor position.
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Move the cursor to the next credential, wrapping at the end.
    ///
    /// Returns `None` without touching the cursor when the pool holds a
    /// single key: there is nothing to rotate to, and the caller must decide
    /// whether to keep retrying on the same key.
    pub fn advance(&mut self) -> Option<&str> {
        if self.keys.len() <= 1 {
            debug!("credential pool has one entry, nothing to rotate to");
            return None;
        }
        self.index = (self.index + 1) % self.keys.len();
        info!(
            index = self.index,
            key = %Self::mask(&self.keys[self.index]),
            "rotated to next credential"
        );
        Some(&self.keys[self.index])
    }

    /// Move the cursor one step back, wrapping at the start.
    ///
    /// Used to restore the previous credential after a failed rebind.
    pub fn retreat(&mut self) -> &str {
        self.index = (self.index + self.keys.len() - 1) % self.keys.len();
        debug!(
            index = self.index,
            key = %Self::mask(&self.keys[self.index]),
            "reverted to previous credential"
        );
        &self.keys[self.index]
    }

    /// Loggable form of a credential: its last four characters.
    ///
    /// Full keys must never reach log output.
    pub fn mask(key: &str) -> String {
        let skip = key.chars().count().saturating_sub(4);
        let tail: String = key.chars().skip(skip).collect();
        format!("...{tail}")
    }
}

fn push_unique(keys: &mut Vec<String>, candidate: &str) {
    let candidate = candidate.trim();
    if candidate.is_empty() || keys.iter().any(|k| k == candidate) {
        return;
    }
    keys.push(candidate.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let pool =
            KeyPool::from_keys(["alpha", "beta", "alpha", "gamma", "beta"]).unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.current(), "alpha");
        let mut p = pool;
        assert_eq!(p.advance(), Some("beta"));
        assert_eq!(p.advance(), Some("gamma"));
    }

    #[test]
    fn explicit_keys_come_before_file_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from-file-1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  from-file-2  ").unwrap();
        writeln!(file, "explicit-1").unwrap();

        let pool = KeyPool::load(
            &["explicit-1".into(), "explicit-2".into()],
            Some(file.path()),
        )
        .unwrap();
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.current(), "explicit-1");
        assert_eq!(pool.current_index(), 0);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let pool = KeyPool::load(
            &["only-key".into()],
            Some(Path::new("/nonexistent/api_key.txt")),
        )
        .unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn empty_merge_is_fatal() {
        let err = KeyPool::load(&[], Some(Path::new("/nonexistent/api_key.txt")))
            .unwrap_err();
        assert!(matches!(err, Pdf2JsonError::NoCredentials { .. }));
    }

    #[test]
    fn advance_cycles_back_to_start() {
        let mut pool = KeyPool::from_keys(["a", "b", "c"]).unwrap();
        pool.advance();
        pool.advance();
        assert_eq!(pool.current(), "c");
        assert_eq!(pool.advance(), Some("a"));
        assert_eq!(pool.current_index(), 0);
    }

    #[test]
    fn advance_on_singleton_reports_failure_and_keeps_cursor() {
        let mut pool = KeyPool::from_keys(["only"]).unwrap();
        assert_eq!(pool.advance(), None);
        assert_eq!(pool.current_index(), 0);
        assert_eq!(pool.current(), "only");
    }

    #[test]
    fn retreat_undoes_advance_and_wraps() {
        let mut pool = KeyPool::from_keys(["a", "b", "c"]).unwrap();
        pool.advance();
        assert_eq!(pool.retreat(), "a");
        // Wrap backwards from index 0.
        assert_eq!(pool.retreat(), "c");
        assert_eq!(pool.current_index(), 2);
    }

    #[test]
    fn mask_shows_only_the_tail() {
        assert_eq!(KeyPool::mask("AIzaSyExample1234"), "...1234");
        assert_eq!(KeyPool::mask("abc"), "...abc");
    }
}
