// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adgate: authenticated API gateway for the ad-performance dashboard.
//!
//! Two halves share this crate. The `client` and `credential` modules are
//! the app-facing gateway: bearer-token dispatch against the single
//! backend endpoint with single-flight refresh on 401. The `proxy` module
//! is the server that fronts the backend for browsers, hiding the
//! internal routing parameter.

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod proxy;
pub mod state;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::proxy::build_router;
use crate::state::GatewayState;

/// Run the proxy server until shutdown.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal.cancel();
        }
    });

    tracing::info!(backend = %config.backend_url, "adgate listening on {addr}");

    let state = Arc::new(GatewayState::new(config));
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
