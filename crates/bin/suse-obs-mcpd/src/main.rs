//! Daemon entry point for the SUSE Observability MCP server.
//!
//! Loads configuration from CLI flags and the environment, builds the HTTP
//! backend, and serves the MCP protocol over stdio or streamable HTTP.

mod backend;
mod config;

use suse_obs_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tracing_subscriber::EnvFilter;

use crate::backend::build_backend;
use crate::config::ObsConfig;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let config = ObsConfig::from_args()?;
    let backend = build_backend(&config)?;

    match config.http_addr {
        Some(addr) => {
            let http_config =
                McpHttpServerConfig::new(addr).with_stateful_mode(!config.stateless);
            serve_streamable_http(backend, http_config).await
        }
        None => serve_stdio(backend).await,
    }
}
