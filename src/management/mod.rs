mod auth;

pub use auth::Credentials;
pub use auth::SAFETY_MARGIN_SECS;
pub use auth::TokenManager;
pub use auth::TokenState;
