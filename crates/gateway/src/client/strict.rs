// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fetch wrapper for non-primary endpoints.
//!
//! Unlike the main dispatcher there is no refresh path here: these
//! endpoints are secondary surfaces where any 401/403 simply means the
//! session is gone.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::client::session::SessionHandler;
use crate::credential::{CredentialStore, ACCESS_TOKEN};
use crate::error::GatewayError;

/// Bearer-authenticated client that treats every 401/403 as session expiry.
pub struct StrictClient {
    store: Arc<dyn CredentialStore>,
    session: Arc<SessionHandler>,
    client: Client,
}

impl StrictClient {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        session: Arc<SessionHandler>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { store, session, client }
    }

    /// GET a JSON resource. 401/403 clears the session and surfaces
    /// `SessionExpired`; other non-2xx statuses surface as errors without
    /// touching the session.
    pub async fn get_json(&self, url: &str) -> anyhow::Result<serde_json::Value> {
        let mut builder = self.client.get(url);
        if let Some(token) = self.store.get(ACCESS_TOKEN) {
            builder = builder.bearer_auth(token);
        }
        let resp = builder.send().await?;
        let status = resp.status().as_u16();

        if status == 401 || status == 403 {
            self.session.expire();
            return Err(GatewayError::SessionExpired.into());
        }
        if !(200..300).contains(&status) {
            anyhow::bail!("request failed with status {status}");
        }
        let value = resp.json().await?;
        Ok(value)
    }
}

#[cfg(test)]
#[path = "strict_tests.rs"]
mod tests;
