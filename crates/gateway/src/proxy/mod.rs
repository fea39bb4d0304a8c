// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-side route proxy.
//!
//! Clients see `/api/{operation}`; the backend sees its routing parameter.
//! The parameter name never appears in any client-visible request or
//! response.

pub mod http;
pub mod inject;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::GatewayState;

/// Build the axum `Router` with all proxy routes.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/healthz", get(http::health))
        .route("/api/{operation}", get(http::proxy_get).post(http::proxy_post))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
