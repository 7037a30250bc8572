use thiserror::Error;

/// JSON-RPC code for internal errors, also used for every HTTP 500 reply.
pub const INTERNAL_ERROR_CODE: i32 = -32603;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No authorization code set. Authorize the application with Spotify first.")]
    NoAuthorizationCode,

    #[error("Failed to refresh access token: {0}")]
    TokenRefresh(String),

    #[error("{message} (HTTP {status})")]
    Upstream { message: &'static str, status: u16 },

    #[error("Artist '{0}' not found")]
    ArtistNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn error_code(&self) -> i32 {
        match self {
            Error::InvalidRequest(_) => -32600,
            Error::MethodNotFound(_) => -32601,
            Error::InvalidParams(_) => -32602,
            _ => INTERNAL_ERROR_CODE,
        }
    }

    pub(crate) fn upstream(message: &'static str, status: reqwest::StatusCode) -> Self {
        Error::Upstream {
            message,
            status: status.as_u16(),
        }
    }
}
