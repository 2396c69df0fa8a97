use std::collections::HashMap;

use anyhow::Result;
use url::Url;

use quickbooks_rs::{AuthProvider, Environment, Error, KeyPair, Scope};

mod test_utils;
use test_utils::{Script, auth_provider, make_token, spawn_oauth_server, token_response_body};

fn query_params(url: &Url) -> HashMap<String, String> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[test]
fn auth_url_carries_the_oauth_parameters() {
    test_utils::do_setup();

    let auth = AuthProvider::new(
        KeyPair::new("test_client_id".to_string(), Some("secret".to_string())),
        Url::parse("http://localhost:3000/auth-code").unwrap(),
        vec![Scope::OpenId, Scope::Accounting],
        Environment::Sandbox,
    );

    let url = auth.generate_auth_url();
    assert!(
        url.as_str()
            .starts_with("https://appcenter.intuit.com/connect/oauth2")
    );

    let params = query_params(&url);
    assert_eq!(params["client_id"], "test_client_id");
    assert_eq!(params["redirect_uri"], "http://localhost:3000/auth-code");
    assert_eq!(params["response_type"], "code");
    // Scopes joined by single spaces, in the caller-supplied order.
    assert_eq!(params["scope"], "openid com.intuit.quickbooks.accounting");
    assert!(!params["state"].is_empty());
}

#[test]
fn auth_url_state_differs_on_every_call() {
    test_utils::do_setup();

    let auth = AuthProvider::new(
        KeyPair::new("test_client_id".to_string(), None),
        Url::parse("http://localhost:3000/auth-code").unwrap(),
        vec![Scope::Accounting],
        Environment::Sandbox,
    );

    let first = query_params(&auth.generate_auth_url())["state"].clone();
    let second = query_params(&auth.generate_auth_url())["state"].clone();
    assert_ne!(first, second);
}

#[tokio::test]
async fn exchange_code_stores_and_returns_the_token() -> Result<()> {
    test_utils::do_setup();

    let server = spawn_oauth_server(
        Script::single(200, &token_response_body("AT1", "RT1")),
        Script::single(200, ""),
    )
    .await;
    let auth = auth_provider(&server.base_url);

    let token = auth.exchange_code("test_code", "test_realm").await?;
    assert_eq!(token.access_token(), "AT1");
    assert_eq!(token.refresh_token(), "RT1");
    assert_eq!(token.realm_id(), "test_realm");
    assert_eq!(token.token_type(), "bearer");

    // get_token returns the stored token without another network call.
    let stored = auth.get_token().await?;
    assert_eq!(stored.access_token(), "AT1");
    assert_eq!(server.token.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_exchange_embeds_the_raw_body() {
    test_utils::do_setup();

    let server = spawn_oauth_server(
        Script::single(400, r#"{"error":"invalid_client"}"#),
        Script::single(200, ""),
    )
    .await;
    let auth = auth_provider(&server.base_url);

    let err = auth
        .exchange_code("invalid_code", "test_realm")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthExchange(_)));
    assert_eq!(
        err.to_string(),
        r#"Failed to exchange auth code for a token: {"error":"invalid_client"}"#
    );
}

#[tokio::test]
async fn operations_before_any_token_fail_with_no_token() {
    test_utils::do_setup();

    let server = spawn_oauth_server(Script::single(200, ""), Script::single(200, "")).await;
    let auth = auth_provider(&server.base_url);

    assert!(matches!(auth.get_token().await, Err(Error::NoToken)));
    assert!(matches!(auth.refresh().await, Err(Error::NoToken)));
    assert!(matches!(auth.revoke().await, Err(Error::NoToken)));
    assert_eq!(server.token.call_count(), 0);
    assert_eq!(server.revoke.call_count(), 0);
}

#[tokio::test]
async fn refresh_with_expired_refresh_token_never_hits_the_network() {
    test_utils::do_setup();

    let server = spawn_oauth_server(
        Script::single(200, &token_response_body("AT2", "RT2")),
        Script::single(200, ""),
    )
    .await;
    let auth = auth_provider(&server.base_url);

    // Refresh token expired a second ago.
    auth.set_token(make_token("old_at", -3600, "old_rt", -1, "realm_1"))
        .await;

    let err = auth.refresh().await.unwrap_err();
    assert!(matches!(err, Error::RefreshTokenExpired));
    assert_eq!(
        err.to_string(),
        "Refresh token is expired, please re-authenticate"
    );
    assert_eq!(server.token.call_count(), 0);
}

#[tokio::test]
async fn refresh_replaces_the_token_and_carries_the_realm_over() -> Result<()> {
    test_utils::do_setup();

    // Success body has no realmId; it must carry over from the prior token.
    let server = spawn_oauth_server(
        Script::single(200, &token_response_body("AT2", "RT2")),
        Script::single(200, ""),
    )
    .await;
    let auth = auth_provider(&server.base_url);

    auth.set_token(make_token("old_at", -60, "old_rt", 86_400, "realm_1"))
        .await;

    let token = auth.refresh().await?;
    assert_eq!(token.access_token(), "AT2");
    assert_eq!(token.refresh_token(), "RT2");
    assert_eq!(token.realm_id(), "realm_1");
    assert!(!token.is_access_token_expired());

    let stored = auth.get_token().await?;
    assert_eq!(stored.access_token(), "AT2");
    assert_eq!(server.token.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_refresh_embeds_the_raw_body() {
    test_utils::do_setup();

    let server = spawn_oauth_server(
        Script::single(400, r#"{"error":"invalid_client"}"#),
        Script::single(200, ""),
    )
    .await;
    let auth = auth_provider(&server.base_url);

    auth.set_token(make_token("old_at", -60, "old_rt", 86_400, "realm_1"))
        .await;

    let err = auth.refresh().await.unwrap_err();
    assert!(matches!(err, Error::Refresh(_)));
    assert_eq!(
        err.to_string(),
        r#"Failed to refresh token: {"error":"invalid_client"}"#
    );
}

#[tokio::test]
async fn get_token_refreshes_transparently_when_access_token_expired() -> Result<()> {
    test_utils::do_setup();

    let server = spawn_oauth_server(
        Script::single(200, &token_response_body("AT2", "RT2")),
        Script::single(200, ""),
    )
    .await;
    let auth = auth_provider(&server.base_url);

    auth.set_token(make_token("old_at", -60, "old_rt", 86_400, "realm_1"))
        .await;

    let token = auth.get_token().await?;
    assert_eq!(token.access_token(), "AT2");
    assert_eq!(server.token.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_get_token_calls_share_a_single_refresh() -> Result<()> {
    test_utils::do_setup();

    let server = spawn_oauth_server(
        Script::single(200, &token_response_body("AT2", "RT2")),
        Script::single(200, ""),
    )
    .await;
    let auth = auth_provider(&server.base_url);

    auth.set_token(make_token("old_at", -60, "old_rt", 86_400, "realm_1"))
        .await;

    let (first, second) = tokio::join!(auth.get_token(), auth.get_token());
    assert_eq!(first?.access_token(), "AT2");
    assert_eq!(second?.access_token(), "AT2");
    // The loser of the lock race sees the fresh token instead of refreshing again.
    assert_eq!(server.token.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn revoke_clears_the_stored_token() -> Result<()> {
    test_utils::do_setup();

    // 2xx with an empty body counts as success.
    let server = spawn_oauth_server(Script::single(200, ""), Script::single(200, "")).await;
    let auth = auth_provider(&server.base_url);

    auth.set_token(make_token("at", 3600, "rt", 86_400, "realm_1"))
        .await;

    assert!(auth.revoke().await?);
    assert_eq!(server.revoke.call_count(), 1);
    assert!(matches!(auth.get_token().await, Err(Error::NoToken)));
    Ok(())
}

#[tokio::test]
async fn failed_revoke_embeds_the_parsed_error_code() {
    test_utils::do_setup();

    let server = spawn_oauth_server(
        Script::single(200, ""),
        Script::single(400, r#"{"error":"invalid_token"}"#),
    )
    .await;
    let auth = auth_provider(&server.base_url);

    auth.set_token(make_token("at", 3600, "rt", 86_400, "realm_1"))
        .await;

    let err = auth.revoke().await.unwrap_err();
    assert!(matches!(err, Error::Revoke(_)));
    // The parsed code, not the raw JSON.
    assert_eq!(err.to_string(), "Failed to revoke token: invalid_token");

    // The failed revoke leaves the token in place.
    assert!(auth.get_token().await.is_ok());
}

#[tokio::test]
async fn exchange_then_expired_refresh_scenario() -> Result<()> {
    test_utils::do_setup();

    let server = spawn_oauth_server(
        Script::new(vec![
            (200, token_response_body("AT1", "RT1")),
            (400, r#"{"error":"refresh_token_expired"}"#.to_string()),
        ]),
        Script::single(200, ""),
    )
    .await;
    let auth = auth_provider(&server.base_url);

    let token = auth.exchange_code("test_code", "test_realm").await?;
    assert_eq!(token.access_token(), "AT1");

    let err = auth.refresh().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Refresh token is expired, please re-authenticate"
    );
    Ok(())
}
