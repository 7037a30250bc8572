use spotify_mcp::utils::*;

#[test]
fn test_generate_state_is_alphanumeric() {
    let state = generate_state();
    assert_eq!(state.len(), 32);
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn test_generate_state_differs_between_calls() {
    assert_ne!(generate_state(), generate_state());
}

#[test]
fn test_normalize_bare_track_id() {
    assert_eq!(
        normalize_track_uri("4uLU6hMCjMI75M1A2tKUQC"),
        "spotify:track:4uLU6hMCjMI75M1A2tKUQC"
    );
}

#[test]
fn test_normalize_keeps_existing_uri() {
    assert_eq!(
        normalize_track_uri("spotify:track:4uLU6hMCjMI75M1A2tKUQC"),
        "spotify:track:4uLU6hMCjMI75M1A2tKUQC"
    );
    assert_eq!(
        normalize_track_uri("spotify:episode:512ojhOuo1ktJprKbVcKyQ"),
        "spotify:episode:512ojhOuo1ktJprKbVcKyQ"
    );
}

#[test]
fn test_normalize_trims_whitespace() {
    assert_eq!(normalize_track_uri("  abc  "), "spotify:track:abc");
}

#[test]
fn test_clamp_limit() {
    assert_eq!(clamp_limit(0), 1);
    assert_eq!(clamp_limit(1), 1);
    assert_eq!(clamp_limit(10), 10);
    assert_eq!(clamp_limit(50), 50);
    assert_eq!(clamp_limit(500), 50);
}
