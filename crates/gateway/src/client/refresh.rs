// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight token refresh.
//!
//! Any number of dispatched requests may hit 401 in the same window; only
//! one `refresh_token` exchange runs. Later arrivals park on a FIFO queue
//! and are resolved with the leader's outcome, strictly after the exchange
//! completes. Each original request is retried at most once with the new
//! token; a second 401 passes through to the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};

use crate::client::dispatch::Dispatcher;
use crate::client::session::SessionHandler;
use crate::client::{DispatchResponse, OutboundRequest, OP_REFRESH_TOKEN};
use crate::credential::{CredentialStore, ACCESS_TOKEN, REFRESH_TOKEN};
use crate::error::GatewayError;

/// A caller parked while a refresh is in flight.
type Waiter = oneshot::Sender<Result<String, GatewayError>>;

/// Gate state: `refreshing` is the sole synchronization primitive for the
/// "at most one exchange in flight" invariant.
#[derive(Default)]
struct Gate {
    refreshing: bool,
    waiters: Vec<Waiter>,
}

enum Role {
    /// This caller runs the exchange.
    Lead,
    /// This caller waits for the leader's outcome.
    Wait(oneshot::Receiver<Result<String, GatewayError>>),
}

/// Coordinates dispatch with 401 recovery.
///
/// Constructed per instance with injected dependencies — no module-level
/// state, so tests get a fresh coordinator each time.
pub struct RefreshCoordinator {
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn CredentialStore>,
    session: Arc<SessionHandler>,
    access_ttl: Duration,
    gate: Mutex<Gate>,
}

impl RefreshCoordinator {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        store: Arc<dyn CredentialStore>,
        session: Arc<SessionHandler>,
        access_ttl: Duration,
    ) -> Self {
        Self { dispatcher, store, session, access_ttl, gate: Mutex::new(Gate::default()) }
    }

    /// Dispatch a request, recovering from 401 via one token refresh.
    ///
    /// Excluded operations pass 401 through unmodified: there it means
    /// invalid credentials, not an expired session.
    pub async fn execute(&self, req: &OutboundRequest) -> anyhow::Result<DispatchResponse> {
        let resp = self.dispatcher.send(req).await?;
        if !resp.is_unauthorized() || self.dispatcher.exclusions().contains(&req.operation) {
            return Ok(resp);
        }

        let token = self.recover().await?;

        // Retry exactly once. If the retry 401s again the response is
        // returned as-is — no second refresh, no loop.
        let retry = self.dispatcher.send_with_token(req, &token).await?;
        Ok(retry)
    }

    /// Obtain a fresh access token, joining an in-flight refresh if one
    /// exists.
    async fn recover(&self) -> Result<String, GatewayError> {
        let Some(refresh_token) = self.store.get(REFRESH_TOKEN) else {
            // Nothing to exchange: straight to logout, no queueing.
            self.session.expire();
            return Err(GatewayError::SessionExpired);
        };

        let role = {
            let mut gate = self.gate.lock().await;
            if gate.refreshing {
                let (tx, rx) = oneshot::channel();
                gate.waiters.push(tx);
                Role::Wait(rx)
            } else {
                gate.refreshing = true;
                Role::Lead
            }
        };

        match role {
            Role::Wait(rx) => rx.await.map_err(|_| GatewayError::Internal)?,
            Role::Lead => {
                let outcome = self.exchange(&refresh_token).await;

                // Close the gate before resolving waiters so a late 401
                // after a failed refresh starts a new cycle instead of
                // parking forever.
                let waiters = {
                    let mut gate = self.gate.lock().await;
                    gate.refreshing = false;
                    std::mem::take(&mut gate.waiters)
                };

                match outcome {
                    Ok((token, ttl)) => {
                        self.store.set(ACCESS_TOKEN, &token, ttl);
                        for w in waiters {
                            let _ = w.send(Ok(token.clone()));
                        }
                        tracing::info!("access token refreshed");
                        Ok(token)
                    }
                    Err(err) => {
                        for w in waiters {
                            let _ = w.send(Err(err));
                        }
                        tracing::warn!(err = %err, "token refresh failed, expiring session");
                        self.session.expire();
                        Err(err)
                    }
                }
            }
        }
    }

    /// Perform the refresh exchange.
    ///
    /// The contract is `{"refresh_token": ...}` in, `{"token": ...}` out;
    /// any other shape (non-2xx, missing field, transport error, timeout)
    /// is a failure.
    async fn exchange(&self, refresh_token: &str) -> Result<(String, Duration), GatewayError> {
        let req = OutboundRequest::post(
            OP_REFRESH_TOKEN,
            serde_json::json!({ "refresh_token": refresh_token }),
        );
        let resp = self.dispatcher.send(&req).await.map_err(|e| {
            tracing::warn!(err = %e, "refresh exchange transport failure");
            GatewayError::SessionExpired
        })?;

        if !(200..300).contains(&resp.status) {
            tracing::warn!(status = resp.status, "refresh exchange rejected");
            return Err(GatewayError::SessionExpired);
        }
        let token = resp
            .body
            .get("token")
            .and_then(|t| t.as_str())
            .ok_or(GatewayError::SessionExpired)?;
        let ttl = resp
            .body
            .get("expires_in")
            .and_then(|v| v.as_u64())
            .map(Duration::from_secs)
            .unwrap_or(self.access_ttl);
        Ok((token.to_owned(), ttl))
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
