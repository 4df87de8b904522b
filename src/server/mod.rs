//! Model Context Protocol tool server.
//!
//! Exposes chart scanning to MCP clients as three tools
//! (`scan_chart_path`, `scan_chart_url`, `scan_chart_upload`) and a
//! `help://usage` resource.
//!
//! # Architecture
//!
//! ```text
//! MCP client
//!     ↓ stdio (NDJSON) or HTTP POST /mcp
//! processor (JSON-RPC dispatch)
//!     ↓ spawn_blocking
//! ChartScanner (helm template + image discovery)
//! ```

pub mod processor;
pub mod protocol;
pub mod routes;
pub mod stdio;
pub mod tools;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::info;

use crate::analyzer::chart::ChartScanner;
use crate::analyzer::images::DiscoveryOptions;
use crate::cli::TransportKind;
use crate::config::Config;
use crate::error::{Result, ScannerError};

/// Configuration for the tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpConfig {
    pub transport: TransportKind,
    pub host: String,
    pub port: u16,
    /// HTTP endpoint path for JSON-RPC requests.
    pub path: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Stdio,
            host: "127.0.0.1".to_string(),
            port: 8000,
            path: "/mcp".to_string(),
        }
    }
}

impl McpConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            transport: TransportKind::parse(&config.server.transport).unwrap_or(TransportKind::Stdio),
            host: config.server.host.clone(),
            port: config.server.port,
            path: config.server.path.clone(),
        }
    }

    pub fn transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the endpoint path, adding a leading `/` when missing.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared state for request handlers.
#[derive(Clone)]
pub struct ServerState {
    scanner: Arc<ChartScanner>,
    options: DiscoveryOptions,
}

impl ServerState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scanner: Arc::new(ChartScanner::from_config(config)),
            options: DiscoveryOptions::default()
                .with_values_tree(config.scan.include_values_tree)
                .with_max_depth(config.scan.max_depth),
        }
    }

    pub fn scanner(&self) -> Arc<ChartScanner> {
        Arc::clone(&self.scanner)
    }

    /// Discovery defaults; tools override only the normalization mode.
    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }
}

/// The MCP tool server.
pub struct McpServer {
    config: McpConfig,
    state: ServerState,
}

impl McpServer {
    pub fn new(config: McpConfig, state: ServerState) -> Self {
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.config.path, post(routes::rpc))
            .route("/health", get(routes::health))
            .with_state(self.state.clone())
    }

    /// Runs the server until the transport closes or Ctrl-C.
    pub async fn run(self) -> Result<()> {
        match self.config.transport {
            TransportKind::Stdio => Ok(stdio::serve_stdio(self.state).await?),
            TransportKind::Http => {
                let app = self.router();
                let listener = tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port))
                    .await
                    .map_err(|e| ScannerError::Server(format!("failed to bind {}: {}", self.config.addr(), e)))?;
                info!(
                    "MCP server listening on http://{}{}",
                    self.config.addr(),
                    self.config.path
                );
                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
                Ok(())
            }
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
