//! # API Module
//!
//! HTTP endpoints of the server:
//!
//! - [`mcp`] - `POST /mcp`, the MCP JSON-RPC endpoint. `GET`/`DELETE`
//!   answer with [`method_not_allowed`].
//! - [`callback`] - `GET /callback`, the Spotify OAuth redirect target.
//! - [`health`] - `GET /health`, status, version and whether a token is cached.
//!
//! All handlers read shared state through an [`axum::Extension`] holding
//! a [`crate::server::AppState`].

mod callback;
mod health;
mod mcp;

pub use callback::callback;
pub use health::health;
pub use mcp::{SESSION_CODE_HEADER, mcp, method_not_allowed};
