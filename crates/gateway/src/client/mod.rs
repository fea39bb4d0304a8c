// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client side of the gateway: dispatching, token refresh, and session
//! teardown against the single shared backend endpoint.
//!
//! Every business operation (`login`, `userget`, `refresh_token`, ...) goes
//! to one URL; the operation name carried in the query string or JSON body
//! is the de facto routing key.

pub mod dispatch;
pub mod refresh;
pub mod session;
pub mod strict;

#[cfg(test)]
pub mod test_support;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::client::dispatch::Dispatcher;
use crate::client::refresh::RefreshCoordinator;
use crate::client::session::{Navigator, SessionHandler};
use crate::config::GatewayConfig;
use crate::credential::file::FileStore;
use crate::credential::{
    default_ttl, ensure_session_id, CredentialStore, ACCESS_TOKEN, REFRESH_TOKEN, USER_ID,
};

/// Operation name for the token refresh exchange.
pub const OP_REFRESH_TOKEN: &str = "refresh_token";

/// Operations that must never receive a bearer token: the caller is not
/// authenticated yet, and a 401 from them means bad credentials rather
/// than an expired session.
const PUBLIC_OPS: &[&str] = &["login", "register", "forgot_password", OP_REFRESH_TOKEN];

/// The set of operations exempt from bearer auth and from 401 recovery.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    ops: HashSet<String>,
}

impl ExclusionSet {
    /// The built-in public set plus any extra operation names.
    ///
    /// The built-ins cannot be removed: dropping `refresh_token` would let
    /// the refresh coordinator recurse into its own exchange.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ops: HashSet<String> = PUBLIC_OPS.iter().map(|s| (*s).to_owned()).collect();
        ops.extend(extra.into_iter().map(Into::into));
        Self { ops }
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.ops.contains(operation)
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::with_extra(std::iter::empty::<String>())
    }
}

/// Payload of one outbound call.
#[derive(Debug, Clone)]
pub enum Payload {
    /// GET with query parameters.
    Query(Vec<(String, String)>),
    /// POST with a JSON body.
    Json(serde_json::Value),
}

/// One outbound call, constructed per dispatch.
///
/// The operation name alone determines whether the Authorization header is
/// attached.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub operation: String,
    pub payload: Payload,
}

impl OutboundRequest {
    pub fn get(operation: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self { operation: operation.into(), payload: Payload::Query(query) }
    }

    pub fn post(operation: impl Into<String>, body: serde_json::Value) -> Self {
        Self { operation: operation.into(), payload: Payload::Json(body) }
    }
}

/// Raw result of a dispatched call: HTTP status plus parsed body.
///
/// Non-2xx statuses are data, not errors — backend business failures (for
/// example invalid login credentials) flow to the UI layer as payloads.
#[derive(Debug, Clone)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl DispatchResponse {
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Fully wired client gateway: file-backed credentials, dispatcher,
/// session handler, and refresh coordinator, all from one config.
///
/// This is the surface the embedding app holds; the individual pieces stay
/// public for tests and special cases.
pub struct GatewayClient {
    pub store: Arc<dyn CredentialStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub session: Arc<SessionHandler>,
    pub coordinator: Arc<RefreshCoordinator>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl GatewayClient {
    pub fn from_config(config: &GatewayConfig, navigator: Arc<dyn Navigator>) -> Self {
        let store: Arc<dyn CredentialStore> = Arc::new(FileStore::open(&config.state_dir()));
        // Anonymous session id exists from the first construction on,
        // signed in or not.
        ensure_session_id(store.as_ref());
        let exclusions = ExclusionSet::with_extra(config.public_ops.iter().cloned());
        let dispatcher = Arc::new(Dispatcher::new(
            config.backend_url.clone(),
            config.route_param.clone(),
            config.request_timeout(),
            Arc::clone(&store),
            exclusions,
        ));
        let session = Arc::new(SessionHandler::new(Arc::clone(&store), navigator));
        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::clone(&dispatcher),
            Arc::clone(&store),
            Arc::clone(&session),
            config.access_ttl(),
        ));
        Self {
            store,
            dispatcher,
            session,
            coordinator,
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
        }
    }

    /// Dispatch with 401 recovery.
    pub async fn call(&self, req: &OutboundRequest) -> anyhow::Result<DispatchResponse> {
        self.coordinator.execute(req).await
    }

    /// Persist a successful login's credentials with their configured TTLs.
    pub fn remember_login(&self, access_token: &str, refresh_token: &str, user_id: &str) {
        self.store.set(ACCESS_TOKEN, access_token, self.access_ttl);
        self.store.set(REFRESH_TOKEN, refresh_token, self.refresh_ttl);
        self.store.set(USER_ID, user_id, default_ttl(USER_ID));
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
