//! Credential/model binding and single-use conversation contexts.
//!
//! A [`SessionHandle`] is the unit of rotation: it owns exactly one
//! credential and one model name, and is rebuilt (never mutated) when the
//! active credential changes. It is deliberately not `Clone` — the broker
//! owns at most one live handle at a time, and handing copies around would
//! let a stale credential outlive a rotation.
//!
//! A [`ChatContext`] scopes one document's exchange. It records the turns it
//! has seen; a failed send leaves no trace in that history, so a retry on a
//! fresh context starts clean.

use std::fmt;

use tracing::debug;

use crate::client::{KeyPool, SharedBackend, Turn};
use crate::error::{BindError, ServiceError};

/// Binds credentials to model sessions through the backend's probe call.
pub struct SessionFactory {
    backend: SharedBackend,
    model: String,
}

impl SessionFactory {
    pub fn new(backend: SharedBackend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// The model every session from this factory will address.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Validate `credential` against the service and wrap it in a handle.
    ///
    /// The service is consulted once per bind; a handle that comes back `Ok`
    /// has really authenticated, so later send failures are request-level,
    /// not configuration-level.
    pub async fn bind(&self, credential: &str) -> Result<SessionHandle, BindError> {
        match self.backend.probe(credential, &self.model).await {
            Ok(()) => {
                debug!(
                    model = %self.model,
                    key = %KeyPool::mask(credential),
                    "session bound"
                );
                Ok(SessionHandle {
                    backend: self.backend.clone(),
                    model: self.model.clone(),
                    credential: credential.to_string(),
                })
            }
            Err(source) => Err(BindError {
                credential: KeyPool::mask(credential),
                model: self.model.clone(),
                source,
            }),
        }
    }
}

/// A live binding of one credential to one model.
pub struct SessionHandle {
    backend: SharedBackend,
    model: String,
    credential: String,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("model", &self.model)
            .field("credential", &KeyPool::mask(&self.credential))
            .field("backend", &"<dyn GenerativeBackend>")
            .finish()
    }
}

impl SessionHandle {
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Loggable identity of the bound credential.
    pub fn masked_credential(&self) -> String {
        KeyPool::mask(&self.credential)
    }

    /// Open a conversation context with no prior history.
    pub fn open_chat(&self) -> ChatContext {
        self.open_chat_with_history(Vec::new())
    }

    /// Open a conversation context seeded with earlier turns.
    ///
    /// Used when a rotation happens mid-conversation: the new session takes
    /// over the transcript so the model keeps its context.
    pub fn open_chat_with_history(&self, history: Vec<Turn>) -> ChatContext {
        ChatContext {
            backend: self.backend.clone(),
            model: self.model.clone(),
            credential: self.credential.clone(),
            history,
        }
    }
}

/// One conversation: an append-only turn history plus the send operation.
pub struct ChatContext {
    backend: SharedBackend,
    model: String,
    credential: String,
    history: Vec<Turn>,
}

impl ChatContext {
    /// Send one user message and return the model's reply.
    ///
    /// On success both the user turn and the reply are appended to the
    /// history. On failure the history is exactly as it was before the call.
    pub async fn send(&mut self, message: impl Into<String>) -> Result<String, ServiceError> {
        self.history.push(Turn::user(message));
        match self
            .backend
            .generate(&self.credential, &self.model, &self.history)
            .await
        {
            Ok(reply) => {
                self.history.push(Turn::model(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }

    /// Turns exchanged so far, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Consume the context, keeping its transcript for a successor.
    pub fn into_history(self) -> Vec<Turn> {
        self.history
    }
}
