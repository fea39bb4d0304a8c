// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the route proxy.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::{ErrorEnvelope, GatewayError};
use crate::proxy::inject::{inject_body, inject_query};
use crate::state::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// `GET /healthz`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "running".to_owned() })
}

/// `GET /api/{operation}` — forward query parameters to the backend with
/// the routing parameter injected.
pub async fn proxy_get(
    State(s): State<Arc<GatewayState>>,
    Path(operation): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> axum::response::Response {
    let query = inject_query(&s.config.route_param, &operation, &params);
    let result = s.http.get(&s.config.backend_url).query(&query).send().await;
    finish(&operation, result).await
}

/// `POST /api/{operation}` — forward the JSON body to the backend with the
/// routing parameter injected.
///
/// The body is parsed by hand rather than via the `Json` extractor so that
/// malformed input still yields the error envelope instead of a framework
/// rejection.
pub async fn proxy_post(
    State(s): State<Arc<GatewayState>>,
    Path(operation): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let inbound = if body.is_empty() {
        serde_json::Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(operation = %operation, err = %e, "proxy received malformed JSON body");
                return ErrorEnvelope::new("request body is not valid JSON")
                    .to_http_response(400)
                    .into_response();
            }
        }
    };

    let outbound = match inject_body(&s.config.route_param, &operation, inbound) {
        Ok(map) => map,
        Err(GatewayError::BadRequest) => {
            return ErrorEnvelope::new("request body must be a JSON object")
                .to_http_response(400)
                .into_response();
        }
        Err(e) => {
            return ErrorEnvelope::new(e.to_string()).to_http_response(500).into_response();
        }
    };

    let result = s.http.post(&s.config.backend_url).json(&outbound).send().await;
    finish(&operation, result).await
}

/// Turn the backend's reply (or transport failure) into the proxy's
/// response. Success passes the JSON through with 200; everything else
/// becomes the error envelope. Nothing here can panic the pipeline.
async fn finish(
    operation: &str,
    result: Result<reqwest::Response, reqwest::Error>,
) -> axum::response::Response {
    let resp = match result {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(operation = %operation, err = %e, "backend call failed");
            return ErrorEnvelope::new(format!("backend unreachable: {e}"))
                .to_http_response(500)
                .into_response();
        }
    };

    let status = resp.status().as_u16();
    let bytes = resp.bytes().await.unwrap_or_default();
    let body: serde_json::Value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    if (200..300).contains(&status) {
        return (StatusCode::OK, Json(body)).into_response();
    }

    let message = body
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("backend returned status {status}"));
    tracing::warn!(operation = %operation, status, message = %message, "backend error");
    ErrorEnvelope::new(message).to_http_response(status).into_response()
}
