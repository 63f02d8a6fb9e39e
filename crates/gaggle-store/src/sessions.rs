use rand::distr::{Alphanumeric, SampleString};
use tracing::info;

use crate::Store;
use crate::error::StoreError;
use crate::models::{SessionId, UserId};

impl Store {
    /// Open a fresh session for an authenticated user. Sessions are
    /// never deduplicated; every login gets its own id.
    pub async fn open_session(&self, user: UserId) -> SessionId {
        let mut state = self.inner.write().await;
        let session = SessionId::generate();
        state.sessions.insert(session, user);
        session
    }

    /// Map a session id to its user, if the session is still active.
    pub async fn resolve_session(&self, session: SessionId) -> Option<UserId> {
        let state = self.inner.read().await;
        state.sessions.get(&session).copied()
    }

    /// Close a session. Returns whether it was active, so logout can
    /// report success without ever failing.
    pub async fn end_session(&self, session: SessionId) -> bool {
        let mut state = self.inner.write().await;
        state.sessions.remove(&session).is_some()
    }

    /// Generate a single-use password reset code for a registered email.
    /// Unknown emails get `None` so the caller can stay quiet about
    /// which addresses exist.
    pub async fn issue_reset_code(&self, email: &str) -> Option<String> {
        let mut state = self.inner.write().await;
        let user = state.users.values().find(|u| u.email == email)?.id;
        let code = Alphanumeric.sample_string(&mut rand::rng(), 8);
        state.reset_codes.insert(code.clone(), user);
        // There is no mailer; the log line is how the code gets delivered.
        info!("password reset code for {email}: {code}");
        Some(code)
    }

    /// Consume a reset code and replace the account's password hash.
    pub async fn reset_password(&self, code: &str, new_hash: String) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        let user = state
            .reset_codes
            .remove(code)
            .ok_or(StoreError::UnknownResetCode)?;
        state.user_mut(user)?.password_hash = new_hash;
        Ok(())
    }
}
