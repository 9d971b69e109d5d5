use tracing::info;

use crate::error::{AppError, AppResult};

/// Authentication collaborator. The handshake itself happens elsewhere; the
/// accounting core only needs a stable user id and, for hosted backends, a
/// bearer token.
pub trait AuthProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;

    fn token(&self) -> Option<String> {
        None
    }
}

/// Explicit per-session context passed to every accounting call. Established
/// at login, dropped at logout; there is no global signed-in state.
#[derive(Debug, Clone)]
pub struct SessionContext {
    user_id: String,
    token: Option<String>,
}

impl SessionContext {
    pub fn establish(provider: &dyn AuthProvider) -> AppResult<Self> {
        let user_id = provider
            .current_user_id()
            .ok_or_else(AppError::unauthenticated)?;
        info!(target: "app::auth", %user_id, "session established");
        Ok(Self {
            user_id,
            token: provider.token(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Explicit teardown at the logout boundary.
    pub fn close(self) {
        info!(target: "app::auth", user_id = %self.user_id, "session closed");
    }
}

/// Fixed-identity provider for tests and local development.
#[derive(Debug, Clone)]
pub struct StaticAuth {
    user_id: String,
    token: Option<String>,
}

impl StaticAuth {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl AuthProvider for StaticAuth {
    fn current_user_id(&self) -> Option<String> {
        Some(self.user_id.clone())
    }

    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Provider representing the signed-out state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignedOut;

impl AuthProvider for SignedOut {
    fn current_user_id(&self) -> Option<String> {
        None
    }
}
