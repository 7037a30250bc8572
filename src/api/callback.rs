use axum::{Extension, extract::Query, response::Html};
use serde::Deserialize;
use tracing::warn;

use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// OAuth redirect target. Exchanges the returned code right away.
pub async fn callback(
    Query(params): Query<CallbackParams>,
    Extension(app): Extension<AppState>,
) -> Html<&'static str> {
    if let Some(error) = params.error {
        warn!("Authorization denied: {}", error);
        return Html("<h4>Authorization denied.</h4>");
    }

    let Some(code) = params.code else {
        return Html("<h4>Missing authorization code.</h4>");
    };

    if params.state.as_deref() != Some(app.oauth_state.as_str()) {
        warn!("OAuth state mismatch on callback");
        return Html("<h4>Invalid state parameter.</h4>");
    }

    match app.tokens.exchange_code(&code).await {
        Ok(_) => Html("<h2>Authentication successful.</h2><p>Close the browser window.</p>"),
        Err(e) => {
            warn!("Token exchange failed: {}", e);
            Html("<h4>Login failed.</h4>")
        }
    }
}
