//! Identity
//!
//! The signed-in user as seen by the rest of the app. Signing in is done by
//! an external auth service; this module only holds and broadcasts the
//! resulting session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    /// Bearer token for document store requests. Never serialized.
    #[serde(default, skip_serializing)]
    pub id_token: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            id_token: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }

    /// Upper-cased first letter of the email, shown as the avatar
    pub fn initial(&self) -> Option<char> {
        self.email
            .as_deref()?
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
    }

    /// Local part of the email, used in greetings
    pub fn display_name(&self) -> Option<&str> {
        let email = self.email.as_deref()?;
        email.split('@').next().filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("not signed in")]
    SignedOut,
    #[error("sign-out failed: {0}")]
    SignOut(String),
}

/// Session source consumed by the app
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn current_session(&self) -> Option<Identity>;

    /// Receives the new session every time it changes
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;

    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Gate for screens that need a signed-in user
pub fn require_session(provider: &dyn IdentityProvider) -> Result<Identity, IdentityError> {
    provider.current_session().ok_or(IdentityError::SignedOut)
}

/// In-process session holder, fed by whichever auth flow signs the user in
pub struct SessionState {
    session: watch::Sender<Option<Identity>>,
}

impl SessionState {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self { session }
    }

    pub fn sign_in(&self, identity: Identity) {
        log::info!("session started for {}", identity.uid);
        self.session.send_replace(Some(identity));
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for SessionState {
    fn current_session(&self) -> Option<Identity> {
        self.session.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.session.subscribe()
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        if let Some(previous) = self.session.send_replace(None) {
            log::info!("session ended for {}", previous.uid);
        }
        Ok(())
    }
}
