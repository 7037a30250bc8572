#![allow(dead_code)]

use std::sync::Arc;

use mockito::{Matcher, Mock, ServerGuard};
use reqwest::Client;
use serde_json::{Value, json};
use spotify_mcp::{
    config::Config,
    management::{Credentials, TokenManager},
    spotify::SpotifyClient,
};

pub fn build_client(config: &Config) -> (Arc<TokenManager>, Arc<SpotifyClient>) {
    let http = Client::new();
    let tokens = Arc::new(TokenManager::new(
        http.clone(),
        Credentials::from_config(config),
    ));
    let client = Arc::new(SpotifyClient::new(http, Arc::clone(&tokens), config));
    (tokens, client)
}

fn token_body(access_token: &str, expires_in: i64, refresh_token: Option<&str>) -> String {
    let mut body = json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in,
        "scope": "playlist-modify-public playlist-modify-private"
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = json!(refresh_token);
    }
    body.to_string()
}

pub async fn mock_code_exchange(
    server: &mut ServerGuard,
    code: &str,
    access_token: &str,
    expires_in: i64,
    refresh_token: Option<&str>,
) -> Mock {
    server
        .mock("POST", "/api/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), code.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(token_body(access_token, expires_in, refresh_token))
        .create_async()
        .await
}

pub async fn mock_refresh(
    server: &mut ServerGuard,
    refresh_token: &str,
    status: usize,
    access_token: &str,
) -> Mock {
    server
        .mock("POST", "/api/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), refresh_token.into()),
        ]))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(token_body(access_token, 3600, None))
        .create_async()
        .await
}

/// Client against `server` with code `code-1` primed; the exchange
/// hands out `token-1`.
pub async fn authorized_client(
    server: &mut ServerGuard,
) -> (Arc<TokenManager>, Arc<SpotifyClient>, Mock) {
    let config = Config::for_base_url(&server.url());
    let (tokens, client) = build_client(&config);
    let exchange = mock_code_exchange(server, "code-1", "token-1", 3600, None).await;
    tokens.set_code("code-1").await;
    (tokens, client, exchange)
}

pub fn track_json(n: usize) -> Value {
    json!({
        "id": format!("track{}", n),
        "uri": format!("spotify:track:track{}", n),
        "name": format!("Track {}", n),
        "artists": [
            { "id": "artist-dp", "name": "Daft Punk" },
            { "id": format!("guest{}", n), "name": format!("Guest {}", n) }
        ],
        "album": {
            "id": format!("album{}", n),
            "name": format!("Album {}", n),
            "images": [
                { "url": format!("https://i.scdn.co/image/{}", n), "height": 640, "width": 640 }
            ]
        },
        "popularity": 50 + n,
        "preview_url": null,
        "duration_ms": 200000 + n,
        "external_urls": { "spotify": format!("https://open.spotify.com/track/track{}", n) }
    })
}

pub async fn mock_search_tracks(server: &mut ServerGuard, query: &str, count: usize) -> Mock {
    let items: Vec<Value> = (0..count).map(track_json).collect();
    server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), query.into()),
            Matcher::UrlEncoded("type".into(), "track".into()),
        ]))
        .match_header("authorization", "Bearer token-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "tracks": { "items": items, "total": count } }).to_string())
        .create_async()
        .await
}

pub async fn mock_playlist_creation(server: &mut ServerGuard) -> (Mock, Mock) {
    let me = server
        .mock("GET", "/me")
        .match_header("authorization", "Bearer token-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "user-1", "display_name": "User One" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let create = server
        .mock("POST", "/users/user-1/playlists")
        .match_header("authorization", "Bearer token-1")
        .match_body(Matcher::Json(json!({
            "name": "My Mix",
            "description": "desc",
            "public": true,
            "collaborative": false
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "pl-1",
                "name": "My Mix",
                "description": "desc",
                "public": true,
                "external_urls": { "spotify": "https://open.spotify.com/playlist/pl-1" }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    (me, create)
}
