use axum::{Extension, response::Json};
use chrono::Utc;
use serde_json::{Value, json};

use crate::server::AppState;

/// Liveness probe. `authorized` tells whether a usable Spotify token is
/// cached right now; it never triggers a refresh.
pub async fn health(Extension(app): Extension<AppState>) -> Json<Value> {
    let tokens = app.tokens.snapshot().await;

    Json(json!({
        "status": "ok",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "authorized": tokens.is_valid_at(Utc::now().timestamp()),
    }))
}
