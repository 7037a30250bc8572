mod common;

use std::sync::Arc;

use chrono::Utc;
use mockito::{Matcher, Server, ServerGuard};
use spotify_mcp::{
    Error,
    config::Config,
    management::{SAFETY_MARGIN_SECS, TokenManager},
};

use common::{build_client, mock_code_exchange, mock_refresh};

fn manager_for(server: &ServerGuard) -> Arc<TokenManager> {
    let config = Config::for_base_url(&server.url());
    let (tokens, _) = build_client(&config);
    tokens
}

#[tokio::test]
async fn test_no_code_is_an_error() {
    let server = Server::new_async().await;
    let tokens = manager_for(&server);

    let err = tokens.get_token().await.unwrap_err();
    assert!(matches!(err, Error::NoAuthorizationCode));
    assert!(
        err.to_string()
            .to_lowercase()
            .contains("no authorization code")
    );
}

#[tokio::test]
async fn test_code_exchange_sends_client_credentials() {
    let mut server = Server::new_async().await;
    let tokens = manager_for(&server);

    let exchange = server
        .mock("POST", "/api/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "code-1".into()),
            Matcher::UrlEncoded("redirect_uri".into(), "http://127.0.0.1/callback".into()),
            Matcher::UrlEncoded("client_id".into(), "client-id".into()),
            Matcher::UrlEncoded("client_secret".into(), "client-secret".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"token-1","token_type":"Bearer","expires_in":3600}"#)
        .expect(1)
        .create_async()
        .await;

    tokens.set_code("code-1").await;
    assert_eq!(tokens.get_token().await.unwrap(), "token-1");
    exchange.assert_async().await;
}

#[tokio::test]
async fn test_valid_token_is_cached() {
    let mut server = Server::new_async().await;
    let tokens = manager_for(&server);
    let exchange = mock_code_exchange(&mut server, "code-1", "token-1", 3600, None).await;

    tokens.set_code("code-1").await;
    let before = Utc::now().timestamp();
    assert_eq!(tokens.get_token().await.unwrap(), "token-1");
    assert_eq!(tokens.get_token().await.unwrap(), "token-1");
    assert_eq!(tokens.get_token().await.unwrap(), "token-1");
    exchange.assert_async().await;

    let state = tokens.snapshot().await;
    assert!(state.expires_at >= before + 3600 - SAFETY_MARGIN_SECS);
    assert!(state.expires_at <= Utc::now().timestamp() + 3600 - SAFETY_MARGIN_SECS);
    assert_eq!(state.code, None);
    assert_eq!(state.spent_code.as_deref(), Some("code-1"));
}

#[tokio::test]
async fn test_short_lived_token_refreshes_on_every_call() {
    let mut server = Server::new_async().await;
    let tokens = manager_for(&server);

    // Lifetime below the safety margin: stale as soon as it arrives.
    let exchange =
        mock_code_exchange(&mut server, "code-1", "token-1", 10, Some("refresh-1")).await;
    tokens.set_code("code-1").await;
    assert_eq!(tokens.get_token().await.unwrap(), "token-1");
    exchange.assert_async().await;

    let refresh = mock_refresh(&mut server, "refresh-1", 200, "token-2").await;
    assert_eq!(tokens.get_token().await.unwrap(), "token-2");
    refresh.assert_async().await;

    // token-2 lives for an hour and is served from the cache.
    assert_eq!(tokens.get_token().await.unwrap(), "token-2");
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_failed_refresh_keeps_token_state() {
    let mut server = Server::new_async().await;
    let tokens = manager_for(&server);

    let _exchange =
        mock_code_exchange(&mut server, "code-1", "token-1", 10, Some("refresh-1")).await;
    tokens.set_code("code-1").await;
    tokens.get_token().await.unwrap();
    let before = tokens.snapshot().await;

    let refresh = mock_refresh(&mut server, "refresh-1", 500, "unused").await;
    let err = tokens.get_token().await.unwrap_err();
    assert!(matches!(err, Error::TokenRefresh(_)));
    refresh.assert_async().await;

    let after = tokens.snapshot().await;
    assert_eq!(after.access_token, before.access_token);
    assert_eq!(after.refresh_token, before.refresh_token);
    assert_eq!(after.expires_at, before.expires_at);
}

#[tokio::test]
async fn test_failed_code_exchange_spends_the_code() {
    let mut server = Server::new_async().await;
    let tokens = manager_for(&server);

    let exchange = server
        .mock("POST", "/api/token")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"invalid_grant"}"#)
        .expect(1)
        .create_async()
        .await;

    tokens.set_code("code-1").await;
    assert!(matches!(
        tokens.get_token().await.unwrap_err(),
        Error::TokenRefresh(_)
    ));
    assert_eq!(tokens.snapshot().await.access_token, None);

    // The same code again is not retried against the token endpoint.
    tokens.set_code("code-1").await;
    assert!(matches!(
        tokens.get_token().await.unwrap_err(),
        Error::NoAuthorizationCode
    ));
    exchange.assert_async().await;
}

#[tokio::test]
async fn test_new_code_replaces_spent_one() {
    let mut server = Server::new_async().await;
    let tokens = manager_for(&server);

    let first = mock_code_exchange(&mut server, "code-1", "token-1", 10, None).await;
    let second = mock_code_exchange(&mut server, "code-2", "token-2", 3600, None).await;

    tokens.set_code("code-1").await;
    assert_eq!(tokens.get_token().await.unwrap(), "token-1");

    // Clients resend the spent code with every request.
    tokens.set_code("code-1").await;
    assert!(matches!(
        tokens.get_token().await.unwrap_err(),
        Error::NoAuthorizationCode
    ));

    tokens.set_code("code-2").await;
    assert_eq!(tokens.get_token().await.unwrap(), "token-2");

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_blank_code_is_ignored() {
    let server = Server::new_async().await;
    let tokens = manager_for(&server);

    tokens.set_code("   ").await;
    assert_eq!(tokens.snapshot().await.code, None);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_exchange() {
    let mut server = Server::new_async().await;
    let tokens = manager_for(&server);
    let exchange = mock_code_exchange(&mut server, "code-1", "token-1", 3600, None).await;
    tokens.set_code("code-1").await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tokens = Arc::clone(&tokens);
            tokio::spawn(async move { tokens.get_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "token-1");
    }
    exchange.assert_async().await;
}

#[tokio::test]
async fn test_exchange_code_replaces_cached_token() {
    let mut server = Server::new_async().await;
    let tokens = manager_for(&server);
    let first = mock_code_exchange(&mut server, "code-1", "token-1", 3600, None).await;
    let second = mock_code_exchange(&mut server, "code-2", "token-2", 3600, None).await;

    tokens.set_code("code-1").await;
    assert_eq!(tokens.get_token().await.unwrap(), "token-1");

    assert_eq!(tokens.exchange_code("code-2").await.unwrap(), "token-2");
    assert_eq!(tokens.get_token().await.unwrap(), "token-2");
    assert_eq!(tokens.snapshot().await.spent_code.as_deref(), Some("code-2"));

    first.assert_async().await;
    second.assert_async().await;
}
