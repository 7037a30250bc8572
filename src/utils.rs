use rand::{Rng, distr::Alphanumeric};

pub const TRACK_URI_PREFIX: &str = "spotify:track:";

/// Random value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Turns a bare track id into a `spotify:track:` URI. Anything that
/// already looks like a Spotify URI is returned as is.
pub fn normalize_track_uri(value: &str) -> String {
    let value = value.trim();
    if value.starts_with("spotify:") {
        value.to_string()
    } else {
        format!("{}{}", TRACK_URI_PREFIX, value)
    }
}

/// Clamps a search limit into the range the Web API accepts.
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, 50)
}
