//! Retry/rotation controller: the only place that decides failure policy.
//!
//! The broker owns the credential pool, the session factory, at most one
//! live [`SessionHandle`] and at most one open [`ChatContext`]. Drivers ask
//! it for responses; everything about attempts, rotation and rebinding stays
//! internal.
//!
//! ## Attempt loop
//!
//! Every attempt opens a fresh conversation context (no history), so a
//! failed attempt can never leak turns into the next one. The first success
//! short-circuits the loop. After a failure the pool rotates to the next
//! credential and the session is rebuilt, but only when the pool holds more
//! than one key and more attempts remain; a single-key pool simply retries
//! on the same session up to the bound. Retries are immediate, with no
//! backoff. When the rebind after a rotation is itself rejected, the pool
//! reverts to the previous credential, the previous session stays live, and
//! the loop terminates early.

use tracing::{debug, error, warn};

use crate::client::{ChatContext, KeyPool, SessionFactory, SessionHandle};
use crate::error::BindError;

/// Drives chat attempts against the service, rotating credentials on failure.
pub struct ChatBroker {
    pool: KeyPool,
    factory: SessionFactory,
    session: Option<SessionHandle>,
    chat: Option<ChatContext>,
}

impl ChatBroker {
    pub fn new(pool: KeyPool, factory: SessionFactory) -> Self {
        Self {
            pool,
            factory,
            session: None,
            chat: None,
        }
    }

    /// Bind the pool's current credential before the first request.
    ///
    /// Callers treat a failure here as fatal: if the very first credential
    /// cannot address the model, no document can be processed.
    pub async fn bind_initial(&mut self) -> Result<(), BindError> {
        let handle = self.factory.bind(self.pool.current()).await?;
        debug!(
            model = %handle.model(),
            key = %handle.masked_credential(),
            "initial session bound"
        );
        self.session = Some(handle);
        Ok(())
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn has_open_chat(&self) -> bool {
        self.chat.is_some()
    }

    /// Read access to the pool, for progress reporting and assertions.
    pub fn pool(&self) -> &KeyPool {
        &self.pool
    }

    /// Open a fresh conversation and send `prompt`, retrying with rotation.
    ///
    /// Returns the reply text on the first successful attempt, leaving the
    /// conversation open for [`continue_chat`](Self::continue_chat) until
    /// [`end_chat`](Self::end_chat) is called. Returns `None` when every
    /// attempt failed, when a rotation could not be completed, or when no
    /// session was ever bound (a caller bug, logged at error level).
    pub async fn start_chat(&mut self, prompt: &str, max_attempts: u32) -> Option<String> {
        if self.session.is_none() {
            error!("start_chat called before bind_initial; refusing to send");
            return None;
        }

        for attempt in 0..max_attempts {
            let session = self.session.as_ref()?;
            let mut chat = session.open_chat();

            match chat.send(prompt).await {
                Ok(reply) => {
                    debug!(attempt = attempt + 1, "chat attempt succeeded");
                    self.chat = Some(chat);
                    return Some(reply);
                }
                Err(e) => {
                    warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        error = %e,
                        "chat attempt failed"
                    );
                    if self.pool.len() > 1 && attempt + 1 < max_attempts {
                        if !self.rotate().await {
                            return None;
                        }
                    }
                }
            }
        }

        warn!(max_attempts, "all chat attempts exhausted");
        None
    }

    /// Send a follow-up message on the open conversation.
    ///
    /// Same retry/rotation policy as [`start_chat`](Self::start_chat), with
    /// one difference: after a successful rotation the conversation is
    /// rebuilt on the new session carrying its transcript, so the model
    /// keeps the context of earlier turns. Requires both a bound session and
    /// an open conversation.
    pub async fn continue_chat(&mut self, message: &str, max_attempts: u32) -> Option<String> {
        if self.session.is_none() {
            error!("continue_chat called before bind_initial; refusing to send");
            return None;
        }
        if self.chat.is_none() {
            error!("continue_chat called with no open conversation; refusing to send");
            return None;
        }

        for attempt in 0..max_attempts {
            let chat = self.chat.as_mut()?;

            match chat.send(message).await {
                Ok(reply) => return Some(reply),
                Err(e) => {
                    warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        error = %e,
                        "follow-up attempt failed"
                    );
                    if self.pool.len() > 1 && attempt + 1 < max_attempts {
                        // The failed send rolled itself back, so the
                        // transcript is clean to carry over.
                        let history = self
                            .chat
                            .as_ref()
                            .map(|c| c.history().to_vec())
                            .unwrap_or_default();
                        if !self.rotate().await {
                            return None;
                        }
                        let session = self.session.as_ref()?;
                        self.chat = Some(session.open_chat_with_history(history));
                    }
                }
            }
        }

        warn!(max_attempts, "all follow-up attempts exhausted");
        None
    }

    /// Close the open conversation, if any.
    ///
    /// The service keeps no server-side conversation state; dropping the
    /// context is the whole teardown. Safe to call unconditionally.
    pub fn end_chat(&mut self) {
        if self.chat.take().is_some() {
            debug!("conversation closed");
        }
    }

    /// Advance the pool and rebind the session on the next credential.
    ///
    /// Returns `true` when the broker now holds a session on the new
    /// credential. Returns `false` when the rebind was rejected: the pool
    /// has been stepped back and the previous session remains live.
    async fn rotate(&mut self) -> bool {
        if self.pool.advance().is_none() {
            return false;
        }
        match self.factory.bind(self.pool.current()).await {
            Ok(handle) => {
                self.session = Some(handle);
                true
            }
            Err(e) => {
                warn!(error = %e, "rebind after rotation failed, reverting");
                self.pool.retreat();
                false
            }
        }
    }
}
