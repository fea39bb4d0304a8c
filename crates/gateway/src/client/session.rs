// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal session cleanup: clear credentials and send the user back to
//! the login surface.

use std::sync::Arc;

use crate::credential::{CredentialStore, ACCESS_TOKEN, REFRESH_TOKEN, USER_ID};

/// Surfaces that must not trigger a redirect — the user is already there,
/// and redirecting again would loop.
const AUTH_SURFACES: &[&str] = &["/login", "/register"];

/// Where the user currently is and how to move them.
///
/// Abstracted so the refresh coordinator can be exercised without a real
/// navigation target; the embedding app supplies the production impl.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
}

/// Clears auth state and redirects to login.
pub struct SessionHandler {
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionHandler {
    pub fn new(store: Arc<dyn CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    /// Clear access token, refresh token, and user id, then navigate to the
    /// login surface unless the user is already on login or registration.
    pub fn expire(&self) {
        self.store.remove(ACCESS_TOKEN);
        self.store.remove(REFRESH_TOKEN);
        self.store.remove(USER_ID);

        let current = self.navigator.current_path();
        if AUTH_SURFACES.iter().any(|s| current.starts_with(s)) {
            tracing::debug!(path = %current, "session expired on auth surface, skipping redirect");
            return;
        }
        tracing::info!(path = %current, "session expired, redirecting to login");
        self.navigator.navigate("/login");
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
