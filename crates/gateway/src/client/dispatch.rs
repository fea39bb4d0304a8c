// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP dispatcher for the single shared backend endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::client::{DispatchResponse, ExclusionSet, OutboundRequest, Payload};
use crate::credential::{CredentialStore, ACCESS_TOKEN};

/// Sends one outbound call with the correct headers.
///
/// The dispatcher never interprets status codes — a non-2xx response is
/// returned to the caller as-is. Recovery from 401 belongs to the refresh
/// coordinator.
pub struct Dispatcher {
    base_url: String,
    route_param: String,
    store: Arc<dyn CredentialStore>,
    exclusions: ExclusionSet,
    client: Client,
}

impl Dispatcher {
    pub fn new(
        base_url: impl Into<String>,
        route_param: impl Into<String>,
        timeout: Duration,
        store: Arc<dyn CredentialStore>,
        exclusions: ExclusionSet,
    ) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self {
            base_url: base_url.into(),
            route_param: route_param.into(),
            store,
            exclusions,
            client,
        }
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Send a request, resolving the bearer token from the credential store.
    pub async fn send(&self, req: &OutboundRequest) -> anyhow::Result<DispatchResponse> {
        let token = if self.exclusions.contains(&req.operation) {
            None
        } else {
            self.store.get(ACCESS_TOKEN)
        };
        self.send_inner(req, token.as_deref()).await
    }

    /// Send a request with an explicit bearer token (retry after refresh).
    pub async fn send_with_token(
        &self,
        req: &OutboundRequest,
        token: &str,
    ) -> anyhow::Result<DispatchResponse> {
        self.send_inner(req, Some(token)).await
    }

    async fn send_inner(
        &self,
        req: &OutboundRequest,
        token: Option<&str>,
    ) -> anyhow::Result<DispatchResponse> {
        let builder = match &req.payload {
            Payload::Query(pairs) => {
                let mut query: Vec<(&str, &str)> =
                    vec![(self.route_param.as_str(), req.operation.as_str())];
                query.extend(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                self.client.get(&self.base_url).query(&query)
            }
            Payload::Json(body) => {
                let mut outbound = match body {
                    serde_json::Value::Object(map) => map.clone(),
                    serde_json::Value::Null => serde_json::Map::new(),
                    other => {
                        anyhow::bail!("JSON payload must be an object, got: {other}");
                    }
                };
                outbound.insert(
                    self.route_param.clone(),
                    serde_json::Value::String(req.operation.clone()),
                );
                self.client.post(&self.base_url).json(&outbound)
            }
        };

        let builder = match token {
            Some(tok) => builder.bearer_auth(tok),
            None => builder,
        };

        let resp = builder.send().await?;
        Ok(parse_response(resp).await)
    }

    /// Send a multipart upload. No explicit Content-Type is set so the
    /// transport can emit the boundary; the routing parameter travels as a
    /// form field.
    pub async fn send_multipart(
        &self,
        operation: &str,
        form: reqwest::multipart::Form,
    ) -> anyhow::Result<DispatchResponse> {
        let form = form.text(self.route_param.clone(), operation.to_owned());
        let mut builder = self.client.post(&self.base_url).multipart(form);
        if !self.exclusions.contains(operation) {
            if let Some(tok) = self.store.get(ACCESS_TOKEN) {
                builder = builder.bearer_auth(tok);
            }
        }
        let resp = builder.send().await?;
        Ok(parse_response(resp).await)
    }
}

/// Read status + body. An empty body becomes `null`; a body that is not
/// valid JSON is preserved as a string so callers can still log it.
async fn parse_response(resp: reqwest::Response) -> DispatchResponse {
    let status = resp.status().as_u16();
    let bytes = resp.bytes().await.unwrap_or_default();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    DispatchResponse { status, body }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
