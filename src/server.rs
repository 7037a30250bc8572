use std::{sync::Arc, time::Duration};

use axum::{
    Extension, Router,
    http::{
        HeaderName, HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use reqwest::Client;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::{
    Result, api,
    config::Config,
    management::{Credentials, TokenManager},
    spotify::{SpotifyApi, SpotifyClient},
    utils,
};

/// Upper bound for any single call to Spotify, token endpoint included.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// State shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenManager>,
    pub spotify: Arc<dyn SpotifyApi>,
    /// OAuth `state` value expected back on `/callback`.
    pub oauth_state: Arc<String>,
}

impl AppState {
    pub fn new(tokens: Arc<TokenManager>, spotify: Arc<dyn SpotifyApi>) -> Self {
        Self {
            tokens,
            spotify,
            oauth_state: Arc::new(utils::generate_state()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            Credentials::from_config(config),
        ));
        let spotify = Arc::new(SpotifyClient::new(http, Arc::clone(&tokens), config));
        Ok(Self::new(tokens, spotify))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/mcp",
            post(api::mcp)
                .get(api::method_not_allowed)
                .delete(api::method_not_allowed),
        )
        .route("/health", get(api::health))
        .route("/callback", get(api::callback))
        .layer(Extension(state))
        .layer(cors())
}

/// Browser clients are only accepted from the local machine.
pub fn is_local_origin(origin: &str) -> bool {
    origin == "http://localhost"
        || origin == "http://127.0.0.1"
        || origin.starts_with("http://localhost:")
        || origin.starts_with("http://127.0.0.1:")
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            origin.to_str().map(is_local_origin).unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            ACCEPT,
            HeaderName::from_static("mcp-session-id"),
            HeaderName::from_static("mcp-protocol-version"),
            HeaderName::from_static(api::SESSION_CODE_HEADER),
        ])
        .expose_headers([
            HeaderName::from_static("mcp-session-id"),
            HeaderName::from_static("x-request-id"),
            CONTENT_TYPE,
        ])
        .max_age(Duration::from_secs(86400))
}

pub async fn start_api_server(config: Config, open_browser: bool) -> Result<()> {
    let state = AppState::from_config(&config)?;

    let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
    info!(
        "MCP server running on http://{}/mcp",
        listener.local_addr()?
    );

    let auth_url = state.tokens.authorize_url(&state.oauth_state)?;
    info!("Authorize Spotify access at {}", auth_url);
    if open_browser && webbrowser::open(&auth_url).is_err() {
        warn!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        );
    }

    axum::serve(listener, router(state)).await?;
    Ok(())
}
