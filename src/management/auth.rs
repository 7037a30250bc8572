use chrono::Utc;
use reqwest::{Client, Url};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{Error, Result, config::Config, types::TokenResponse};

/// Seconds shaved off the upstream token lifetime so a token is never
/// used right at its expiry.
pub const SAFETY_MARGIN_SECS: i64 = 30;

/// OAuth client credentials and endpoints for the Spotify accounts service.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub token_url: String,
    pub authorize_url: String,
}

impl Credentials {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
            token_url: config.token_url(),
            authorize_url: config.authorize_url(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Epoch seconds after which the access token must not be used.
    pub expires_at: i64,
    /// Authorization code waiting to be exchanged.
    pub code: Option<String>,
    /// Last code handed to the token endpoint. Codes are single-use.
    pub spent_code: Option<String>,
}

impl TokenState {
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.access_token.is_some() && now < self.expires_at
    }
}

enum Grant {
    AuthorizationCode(String),
    RefreshToken(String),
}

/// Process-wide bearer token cache.
///
/// `refresh` is held across a token-endpoint round trip, so concurrent
/// callers that all find the token expired trigger a single exchange.
/// `state` is only ever held for in-memory reads and writes and never
/// across a request.
pub struct TokenManager {
    http: Client,
    credentials: Credentials,
    refresh: Mutex<()>,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(http: Client, credentials: Credentials) -> Self {
        TokenManager {
            http,
            credentials,
            refresh: Mutex::new(()),
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Stores an authorization code for the next refresh.
    ///
    /// Clients resend the same code with every request, so priming the
    /// pending code or the last spent one again is ignored.
    pub async fn set_code(&self, code: &str) {
        let code = code.trim();
        if code.is_empty() {
            return;
        }

        let mut state = self.state.lock().await;
        if state.code.as_deref() == Some(code) || state.spent_code.as_deref() == Some(code) {
            return;
        }

        debug!("Authorization code primed");
        state.code = Some(code.to_string());
    }

    pub async fn snapshot(&self) -> TokenState {
        self.state.lock().await.clone()
    }

    async fn cached_token(&self) -> Option<String> {
        let state = self.state.lock().await;
        if state.is_valid_at(Utc::now().timestamp()) {
            state.access_token.clone()
        } else {
            None
        }
    }

    /// Returns a usable bearer token, refreshing it first when needed.
    pub async fn get_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let grant = {
            let mut state = self.state.lock().await;
            if let Some(code) = state.code.take() {
                state.spent_code = Some(code.clone());
                Grant::AuthorizationCode(code)
            } else if let Some(refresh_token) = &state.refresh_token {
                Grant::RefreshToken(refresh_token.clone())
            } else {
                warn!("Access token requested but no authorization code is set");
                return Err(Error::NoAuthorizationCode);
            }
        };

        self.apply_grant(grant).await
    }

    /// Exchanges `code` right away, even if a valid token is cached.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::NoAuthorizationCode);
        }

        let _refresh = self.refresh.lock().await;
        {
            let mut state = self.state.lock().await;
            if state.code.as_deref() == Some(code) {
                state.code = None;
            }
            state.spent_code = Some(code.to_string());
        }

        self.apply_grant(Grant::AuthorizationCode(code.to_string()))
            .await
    }

    /// Runs `grant` against the token endpoint and stores the result.
    /// Callers hold `refresh`.
    async fn apply_grant(&self, grant: Grant) -> Result<String> {
        let response = self.request_token(&grant).await?;
        let now = Utc::now().timestamp();

        let mut state = self.state.lock().await;
        state.access_token = Some(response.access_token.clone());
        if response.refresh_token.is_some() {
            state.refresh_token = response.refresh_token;
        }
        state.expires_at = now + response.expires_in - SAFETY_MARGIN_SECS;
        info!("Access token refreshed, valid for {}s", response.expires_in);

        Ok(response.access_token)
    }

    async fn request_token(&self, grant: &Grant) -> Result<TokenResponse> {
        let creds = &self.credentials;
        let form: Vec<(&str, &str)> = match grant {
            Grant::AuthorizationCode(code) => {
                info!("Exchanging authorization code for an access token");
                vec![
                    ("grant_type", "authorization_code"),
                    ("code", code.as_str()),
                    ("redirect_uri", creds.redirect_uri.as_str()),
                    ("client_id", creds.client_id.as_str()),
                    ("client_secret", creds.client_secret.as_str()),
                ]
            }
            Grant::RefreshToken(refresh_token) => {
                info!("Refreshing access token");
                vec![
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token.as_str()),
                    ("client_id", creds.client_id.as_str()),
                    ("client_secret", creds.client_secret.as_str()),
                ]
            }
        };

        let res = self
            .http
            .post(&creds.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::TokenRefresh(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!("Token endpoint answered {}: {}", status, body);
            return Err(Error::TokenRefresh(format!(
                "token endpoint answered {}",
                status
            )));
        }

        res.json::<TokenResponse>()
            .await
            .map_err(|e| Error::TokenRefresh(e.to_string()))
    }

    /// URL the user visits to grant this application access.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let creds = &self.credentials;
        let url = Url::parse_with_params(
            &creds.authorize_url,
            &[
                ("client_id", creds.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", creds.redirect_uri.as_str()),
                ("scope", creds.scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| Error::Config(format!("invalid authorize URL: {}", e)))?;
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state_is_invalid() {
        let state = TokenState::default();
        assert!(!state.is_valid_at(0));
    }

    #[test]
    fn test_token_invalid_once_expiry_reached() {
        let state = TokenState {
            access_token: Some("abc".to_string()),
            expires_at: 1_000,
            ..Default::default()
        };
        assert!(state.is_valid_at(999));
        assert!(!state.is_valid_at(1_000));
        assert!(!state.is_valid_at(1_001));
    }

    #[test]
    fn test_authorize_url_contains_oauth_params() {
        let config = Config::for_base_url("https://accounts.example.com");
        let manager = TokenManager::new(Client::new(), Credentials::from_config(&config));
        let url = manager.authorize_url("xyz").unwrap();

        assert!(url.starts_with("https://accounts.example.com/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("state=xyz"));
        assert!(url.contains("scope=playlist-modify-public+playlist-modify-private"));
    }
}
