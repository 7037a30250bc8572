//! # Spotify Integration Module
//!
//! Thin client for the Spotify Web API. Every operation follows the same
//! pattern: obtain a bearer token from the shared [`TokenManager`], issue
//! one or more REST calls and reshape the JSON response into the
//! projections defined in [`crate::types`].
//!
//! ```text
//! MCP tools
//!     ↓
//! SpotifyApi (trait)
//!     ├── search       GET  /search
//!     ├── playlist     GET  /me, POST /users/{id}/playlists, POST /playlists/{id}/tracks
//!     └── artists      GET  /search, GET /artists/{id}/top-tracks
//!     ↓
//! TokenManager → POST {accounts}/api/token
//! ```
//!
//! ## Error Handling
//!
//! Non-2xx answers become [`Error::Upstream`] with a fixed message for
//! the step that failed. Nothing is retried. A failure in the second
//! step of a two-step operation leaves the first step's effect in place.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    Error, Result,
    config::Config,
    management::TokenManager,
    types::{ArtistTopTracks, PlaylistRef, PlaylistSnapshot, TrackSummary},
};

pub mod artists;
pub mod playlist;
pub mod search;

/// Operations exposed as MCP tools.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    async fn search(&self, query: &str, kind: &str, limit: u32) -> Result<Vec<TrackSummary>>;

    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistRef>;

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<PlaylistSnapshot>;

    async fn list_tracks_by_artist(&self, artist_name: &str) -> Result<ArtistTopTracks>;
}

pub struct SpotifyClient {
    http: Client,
    tokens: Arc<TokenManager>,
    web_api_url: String,
    tracks_service_url: Option<String>,
    market: String,
}

impl SpotifyClient {
    pub fn new(http: Client, tokens: Arc<TokenManager>, config: &Config) -> Self {
        Self {
            http,
            tokens,
            web_api_url: config.web_api_url.clone(),
            tracks_service_url: config.tracks_service_url.clone(),
            market: config.market.clone(),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Web API URL for `segments`. Each segment is percent-encoded, so an
    /// id holding `/` or `?` stays inside its own segment.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.web_api_url)
            .map_err(|e| Error::Config(format!("invalid Web API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("{} cannot be a base URL", self.web_api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        failure: &'static str,
    ) -> Result<T> {
        let url = self.url(segments)?;
        let path = url.path().to_string();
        let token = self.tokens.get_token().await?;
        debug!("GET {}", path);

        let res = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            warn!("GET {} answered {}", path, status);
            return Err(Error::upstream(failure, status));
        }

        Ok(res.json::<T>().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
        failure: &'static str,
    ) -> Result<T> {
        let url = self.url(segments)?;
        let path = url.path().to_string();
        let token = self.tokens.get_token().await?;
        debug!("POST {}", path);

        let res = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            warn!("POST {} answered {}", path, status);
            return Err(Error::upstream(failure, status));
        }

        Ok(res.json::<T>().await?)
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn search(&self, query: &str, kind: &str, limit: u32) -> Result<Vec<TrackSummary>> {
        self.search_tracks(query, kind, limit).await
    }

    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistRef> {
        self.create_user_playlist(name, description, public).await
    }

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<PlaylistSnapshot> {
        self.add_playlist_tracks(playlist_id, uris).await
    }

    async fn list_tracks_by_artist(&self, artist_name: &str) -> Result<ArtistTopTracks> {
        self.artist_top_tracks(artist_name).await
    }
}
