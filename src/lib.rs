//! Spotify MCP Server Library
//!
//! Exposes Spotify search and playlist operations as Model Context
//! Protocol tools over HTTP.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints (`/mcp`, `/callback`, `/health`)
//! - `config` - Configuration loaded once from the environment
//! - `error` - Crate error type and JSON-RPC error codes
//! - `management` - OAuth token cache with expiry-aware refresh
//! - `mcp` - JSON-RPC protocol handling and tool registration
//! - `server` - Router construction and the HTTP listener
//! - `spotify` - Spotify Web API client
//! - `types` - Upstream payloads and the projections returned by tools
//! - `utils` - Small helpers

pub mod api;
pub mod config;
pub mod error;
pub mod management;
pub mod mcp;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Runs the HTTP server until it fails.
pub async fn serve(config: config::Config, open_browser: bool) -> Result<()> {
    server::start_api_server(config, open_browser).await
}
