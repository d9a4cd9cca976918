//! Explicit session context threaded through the client.
//!
//! The wizards and the API client never reach into ambient state for the
//! signed-in user; whoever embeds them constructs a [`Session`] and hands it
//! over. Interior mutability lets login state change underneath long-lived
//! clients.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Platform roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Farmer,
    Investor,
    Admin,
}

/// The signed-in user as the session sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<SessionUser>,
    access_token: Option<String>,
}

/// Login state shared between the embedder and the API client.
#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    /// A session with nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Records a successful login.
    pub fn login(&self, user: SessionUser, access_token: impl Into<String>) {
        info!(user_id = %user.id, "session established");
        let mut state = self.write_state();
        state.user = Some(user);
        state.access_token = Some(access_token.into());
    }

    /// Drops the signed-in user and their token.
    pub fn logout(&self) {
        let mut state = self.write_state();
        if let Some(user) = state.user.take() {
            info!(user_id = %user.id, "session cleared");
        }
        state.access_token = None;
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.read_state().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().user.is_some()
    }

    /// Token to put on the Authorization header, when one is held.
    pub fn bearer_token(&self) -> Option<String> {
        self.read_state().access_token.clone()
    }

    // A panicked writer cannot leave the state half-updated, so a poisoned
    // lock is safe to keep reading.
    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
