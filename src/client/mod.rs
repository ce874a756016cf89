//! Service client layer: credentials, sessions, and the retry/rotation broker.
//!
//! Each submodule owns exactly one concern of the orchestration core.
//! Keeping them separate makes each independently testable and lets us swap
//! the wire transport (e.g. a mock backend in tests) without touching the
//! rotation logic.
//!
//! ## Ownership chain
//!
//! ```text
//! KeyPool ──▶ SessionFactory ──▶ SessionHandle ──▶ ChatContext
//! (which key)  (bind key+model)   (one live bind)   (one exchange)
//!                      ▲
//!                 ChatBroker drives all four
//! ```
//!
//! 1. [`keypool`] — ordered, deduplicated credential pool with a cyclic
//!    cursor
//! 2. [`session`] — binds the current credential to a model and opens
//!    single-use conversation contexts
//! 3. [`broker`]  — the attempt loop: retry, rotate, rebind, give up; the
//!    only place that decides failure policy
//! 4. [`gemini`]  — the production [`GenerativeBackend`] speaking the
//!    Gemini REST API
//!
//! Everything network-facing goes through the [`GenerativeBackend`] trait so
//! tests can script outcomes per credential.

pub mod broker;
pub mod gemini;
pub mod keypool;
pub mod session;

use async_trait::async_trait;

use crate::error::ServiceError;

/// Role of one turn in a conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Wire name used by the generative-language API.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Transport seam to the generative-language service.
///
/// `probe` is a cheap credential/model validation used at bind time;
/// `generate` runs one completion over the full conversation so far. Both
/// take the credential explicitly — implementations hold no key state, which
/// is what makes rotation a pure pool-side operation.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Check that `credential` can address `model` at all.
    async fn probe(&self, credential: &str, model: &str) -> Result<(), ServiceError>;

    /// Run one generation over `turns` and return the reply text.
    async fn generate(
        &self,
        credential: &str,
        model: &str,
        turns: &[Turn],
    ) -> Result<String, ServiceError>;
}

/// Shared handle to a backend implementation.
pub type SharedBackend = std::sync::Arc<dyn GenerativeBackend>;

pub use broker::ChatBroker;
pub use gemini::GeminiClient;
pub use keypool::KeyPool;
pub use session::{ChatContext, SessionFactory, SessionHandle};
