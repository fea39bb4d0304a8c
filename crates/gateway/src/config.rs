// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

/// Configuration for the adgate proxy and client gateway.
#[derive(Debug, Clone, clap::Parser)]
pub struct GatewayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "ADGATE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9700, env = "ADGATE_PORT")]
    pub port: u16,

    /// Base URL of the backend API endpoint. All operations go to this one
    /// URL, keyed by the routing parameter.
    #[arg(long, env = "ADGATE_BACKEND_URL")]
    pub backend_url: String,

    /// Name of the routing parameter injected server-side. Never exposed to
    /// clients of the proxy.
    #[arg(long, default_value = "gofor", env = "ADGATE_ROUTE_PARAM")]
    pub route_param: String,

    /// Per-request timeout in seconds (dispatch, refresh, and proxy calls).
    #[arg(long, default_value_t = 20, env = "ADGATE_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Default access-token lifetime in days, used when the refresh exchange
    /// does not report `expires_in`.
    #[arg(long, default_value_t = 7, env = "ADGATE_ACCESS_TTL_DAYS")]
    pub access_ttl_days: u64,

    /// Refresh-token lifetime in days.
    #[arg(long, default_value_t = 7, env = "ADGATE_REFRESH_TTL_DAYS")]
    pub refresh_ttl_days: u64,

    /// Additional operations to exempt from bearer auth, on top of the
    /// built-in public set (comma-separated).
    #[arg(long, value_delimiter = ',', env = "ADGATE_PUBLIC_OPS")]
    pub public_ops: Vec<String>,

    /// Override for the credential state directory.
    #[arg(long, env = "ADGATE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    pub fn access_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.access_ttl_days.saturating_mul(86_400))
    }

    pub fn refresh_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_ttl_days.saturating_mul(86_400))
    }

    /// Resolve the state directory for persisted credentials.
    ///
    /// Checks the config override, then `$XDG_STATE_HOME/adgate`,
    /// then `$HOME/.local/state/adgate`.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.state_dir {
            return dir.clone();
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return PathBuf::from(xdg).join("adgate");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local/state/adgate");
        }
        PathBuf::from(".adgate")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
