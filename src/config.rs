//! Configuration management for the Spotify MCP server.
//!
//! Values come from environment variables and `.env` files and are read
//! exactly once at startup into a [`Config`]. Lookup order:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. `.env` file in the working directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf};

use crate::{Error, Result};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_SCOPE: &str = "playlist-modify-public playlist-modify-private";
pub const DEFAULT_WEB_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_MARKET: &str = "US";

/// Loads environment variables from `.env` files.
///
/// Looks for `spotify-mcp/.env` in the platform-specific local data
/// directory first, then for `.env` in the working directory. Neither
/// file is required; variables already present in the environment are
/// never overwritten.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotify-mcp/.env`
/// - macOS: `~/Library/Application Support/spotify-mcp/.env`
/// - Windows: `%LOCALAPPDATA%/spotify-mcp/.env`
///
/// # Errors
///
/// Returns an error if the data directory cannot be created.
pub async fn load_env() -> Result<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if dotenv::from_path(&path).is_err() {
        tracing::debug!("No env file at {}", path.display());
    }
    dotenv::dotenv().ok();
    Ok(())
}

/// Directory holding the user's `.env` file.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotify-mcp");
    path
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    /// Base URL of the Spotify Web API, e.g. `https://api.spotify.com/v1`.
    pub web_api_url: String,
    /// Base URL of the Spotify accounts service.
    pub accounts_url: String,
    /// Optional base URL of the separate "list tracks by artist" service.
    pub tracks_service_url: Option<String>,
    pub market: String,
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// `SPOTIFY_CLIENT_ID` and `SPOTIFY_CLIENT_SECRET` are required.
    /// `PORT` must parse as a `u16` when set.
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("PORT '{}' is not a valid port: {}", raw, e)))?,
            Err(_) => DEFAULT_PORT,
        };

        let redirect_uri =
            optional("SPOTIFY_REDIRECT_URI").unwrap_or_else(|| default_redirect_uri(port));

        Ok(Self {
            host: optional("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            redirect_uri,
            scope: optional("SPOTIFY_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            web_api_url: trim_url(
                optional("SPOTIFY_WEB_API_URL").unwrap_or_else(|| DEFAULT_WEB_API_URL.to_string()),
            ),
            accounts_url: trim_url(
                optional("SPOTIFY_ACCOUNTS_URL")
                    .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string()),
            ),
            tracks_service_url: optional("SPOTIFY_API_URL").map(trim_url),
            market: optional("SPOTIFY_MARKET").unwrap_or_else(|| DEFAULT_MARKET.to_string()),
        })
    }

    /// Configuration pointing every upstream at `base_url`.
    ///
    /// Web API calls go to `base_url` directly and the token endpoint
    /// resolves to `{base_url}/api/token`, which is the layout a local
    /// stub server exposes.
    pub fn for_base_url(base_url: &str) -> Self {
        let base = trim_url(base_url.to_string());
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "http://127.0.0.1/callback".to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            web_api_url: base.clone(),
            accounts_url: base,
            tracks_service_url: None,
            market: DEFAULT_MARKET.to_string(),
        }
    }

    /// Applies command line overrides. A redirect URI derived from the
    /// old port follows the new one.
    pub fn override_listen(&mut self, host: Option<String>, port: Option<u16>) {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            if self.redirect_uri == default_redirect_uri(self.port) {
                self.redirect_uri = default_redirect_uri(port);
            }
            self.port = port;
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_url)
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.accounts_url)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_redirect_uri(port: u16) -> String {
    format!("http://127.0.0.1:{}/callback", port)
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| Error::Config(format!("{} must be set", name)))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
