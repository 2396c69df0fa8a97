use oauth2::CsrfToken;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard};
use url::Url;

use crate::environment::{AuthEndpoints, Environment};
use crate::error::{Error, Result, RevokeErrorResponse};
use crate::scope::Scope;

/// Stores the OAuth 2 client ID and client secret.
#[derive(Debug, Clone)]
pub struct KeyPair(
    pub(crate) oauth2::ClientId,
    pub(crate) Option<oauth2::ClientSecret>,
);

impl KeyPair {
    /// Creates a new `KeyPair` from the provided `client_id` and `client_secret` strings.
    #[must_use]
    pub fn new(client_id: String, client_secret: Option<String>) -> Self {
        Self(
            oauth2::ClientId::new(client_id),
            client_secret.map(oauth2::ClientSecret::new),
        )
    }

    /// Creates a new `KeyPair` from `QUICKBOOKS_CLIENT_ID` and `QUICKBOOKS_CLIENT_SECRET`
    /// environment variables.
    ///
    /// # Panics
    /// Panics if `QUICKBOOKS_CLIENT_ID` environment variable is not set.
    #[must_use]
    pub fn from_env() -> Self {
        Self(
            oauth2::ClientId::new(
                std::env::var("QUICKBOOKS_CLIENT_ID").expect("QUICKBOOKS_CLIENT_ID not set"),
            ),
            std::env::var("QUICKBOOKS_CLIENT_SECRET")
                .ok()
                .map(oauth2::ClientSecret::new),
        )
    }
}

/// An access/refresh token pair scoped to one realm (company).
///
/// Tokens are only ever replaced wholesale by the provider (exchange, refresh);
/// the one exception is `realm_id`, which carries over from the prior token when
/// a refresh response omits it. Serializable so callers can persist a session
/// and restore it later with [`AuthProvider::set_token`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    access_token: oauth2::AccessToken,
    #[serde(with = "time::serde::rfc3339")]
    access_token_expires_at: OffsetDateTime,
    refresh_token: oauth2::RefreshToken,
    #[serde(with = "time::serde::rfc3339")]
    refresh_token_expires_at: OffsetDateTime,
    realm_id: String,
    token_type: String,
}

impl Token {
    /// Assembles a token from raw parts, e.g. when restoring a persisted session.
    #[must_use]
    pub fn new(
        access_token: String,
        access_token_expires_at: OffsetDateTime,
        refresh_token: String,
        refresh_token_expires_at: OffsetDateTime,
        realm_id: String,
        token_type: String,
    ) -> Self {
        Self {
            access_token: oauth2::AccessToken::new(access_token),
            access_token_expires_at,
            refresh_token: oauth2::RefreshToken::new(refresh_token),
            refresh_token_expires_at,
            realm_id,
            token_type,
        }
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.secret()
    }

    #[must_use]
    pub fn refresh_token(&self) -> &str {
        self.refresh_token.secret()
    }

    /// The tenant (company) identifier supplied at exchange time.
    #[must_use]
    pub fn realm_id(&self) -> &str {
        &self.realm_id
    }

    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    #[must_use]
    pub fn access_token_expires_at(&self) -> OffsetDateTime {
        self.access_token_expires_at
    }

    #[must_use]
    pub fn refresh_token_expires_at(&self) -> OffsetDateTime {
        self.refresh_token_expires_at
    }

    #[must_use]
    pub fn is_access_token_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.access_token_expires_at
    }

    #[must_use]
    pub fn is_refresh_token_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.refresh_token_expires_at
    }
}

/// Wire format of the token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
    #[serde(default)]
    x_refresh_token_expires_in: u64,
    token_type: String,
    #[serde(rename = "realmId")]
    realm_id: Option<String>,
}

impl TokenResponse {
    /// Both expiry timestamps are derived from the lifetimes at the moment the
    /// response is received, never from server-reported absolute expiry.
    fn into_token(self, issued_at: OffsetDateTime, fallback_realm_id: &str) -> Token {
        Token {
            access_token: oauth2::AccessToken::new(self.access_token),
            access_token_expires_at: issued_at + time::Duration::seconds(self.expires_in as i64),
            refresh_token: oauth2::RefreshToken::new(self.refresh_token),
            refresh_token_expires_at: issued_at
                + time::Duration::seconds(self.x_refresh_token_expires_in as i64),
            realm_id: self
                .realm_id
                .unwrap_or_else(|| fallback_realm_id.to_string()),
            token_type: self.token_type,
        }
    }
}

/// Upstream error code the token endpoint uses for a dead refresh token.
const REFRESH_TOKEN_EXPIRED_CODE: &str = "refresh_token_expired";

/// Drives the OAuth2 authorization-code + refresh-token lifecycle and owns the
/// current [`Token`].
///
/// The token slot sits behind an async mutex and is held across token-endpoint
/// requests, so concurrent callers that both discover an expired access token
/// share a single refresh instead of issuing duplicates. The provider performs
/// no retries; every upstream failure propagates to the caller.
#[derive(Debug)]
pub struct AuthProvider {
    key_pair: KeyPair,
    redirect_uri: Url,
    scopes: Vec<Scope>,
    environment: Environment,
    endpoints: AuthEndpoints,
    http: reqwest::Client,
    token: Mutex<Option<Token>>,
}

impl AuthProvider {
    #[must_use]
    pub fn new(
        key_pair: KeyPair,
        redirect_uri: Url,
        scopes: Vec<Scope>,
        environment: Environment,
    ) -> Self {
        Self {
            key_pair,
            redirect_uri,
            scopes,
            environment,
            endpoints: AuthEndpoints::default(),
            http: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    /// Overrides the OAuth endpoints, e.g. to point at a local mock server.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: AuthEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Builds the authorization URL the user is redirected to for consent.
    ///
    /// Pure; does not touch the stored token. The `state` parameter is a fresh
    /// unpredictable nonce on every call, intended for CSRF protection on the
    /// redirect callback. Validating the `state` echoed back on the callback is
    /// the caller's responsibility.
    #[must_use]
    pub fn generate_auth_url(&self) -> Url {
        let state = CsrfToken::new_random();
        let mut url = self.endpoints.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", self.key_pair.0.as_str())
            .append_pair("scope", &Scope::join(&self.scopes))
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("state", state.secret());
        url
    }

    /// Exchanges an authorization code for a token pair, storing the result.
    ///
    /// `realm_id` arrives alongside the code on the redirect callback and is
    /// preserved across later refreshes.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str, realm_id: &str) -> Result<Token> {
        let response = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::AuthExchange(body));
        }

        let issued_at = OffsetDateTime::now_utc();
        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization(e, Some(body)))?;
        let token = parsed.into_token(issued_at, realm_id);

        debug!(realm_id, "authorization code exchanged");
        let mut guard = self.token.lock().await;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Refreshes the stored token, replacing it wholesale.
    ///
    /// Fails with [`Error::NoToken`] if nothing is stored, and with
    /// [`Error::RefreshTokenExpired`] without any network call if the refresh
    /// token's expiry date is already past.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Token> {
        let mut guard = self.token.lock().await;
        if guard.is_none() {
            return Err(Error::NoToken);
        }
        self.refresh_locked(&mut guard).await
    }

    /// Returns a token valid for an authenticated request, refreshing
    /// transparently when the access token has expired.
    ///
    /// This is the entry point the request runner uses before every call;
    /// callers of the resource APIs never invoke [`Self::refresh`] themselves
    /// in normal operation.
    pub async fn get_token(&self) -> Result<Token> {
        let mut guard = self.token.lock().await;
        match guard.as_ref() {
            None => Err(Error::NoToken),
            Some(token) if !token.is_access_token_expired() => Ok(token.clone()),
            Some(_) => {
                trace!("access token expired, refreshing");
                self.refresh_locked(&mut guard).await
            }
        }
    }

    /// Overwrites the stored token, e.g. to resume a persisted session.
    /// No validation is performed at set time.
    pub async fn set_token(&self, token: Token) {
        let mut guard = self.token.lock().await;
        *guard = Some(token);
    }

    /// Revokes the stored refresh token upstream and clears the token slot.
    ///
    /// Any 2xx counts as success regardless of body. On failure the error
    /// carries the parsed `error` code from the body, not the raw JSON.
    #[instrument(skip(self))]
    pub async fn revoke(&self) -> Result<bool> {
        let mut guard = self.token.lock().await;
        let token = guard.as_ref().ok_or(Error::NoToken)?;

        let response = self
            .http
            .post(self.endpoints.revoke_url.clone())
            .basic_auth(
                self.key_pair.0.as_str(),
                self.key_pair.1.as_ref().map(|s| s.secret()),
            )
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({ "token": token.refresh_token() }))
            .send()
            .await?;

        if response.status().is_success() {
            debug!("token revoked");
            *guard = None;
            return Ok(true);
        }

        let body = response.text().await?;
        let code = serde_json::from_str::<RevokeErrorResponse>(&body)
            .map(|r| r.error)
            .unwrap_or_else(|_| "invalid_token".to_string());
        Err(Error::Revoke(code))
    }

    /// Performs the refresh-token grant while holding the token lock, which is
    /// what makes concurrent refreshes single-flight.
    async fn refresh_locked(&self, guard: &mut MutexGuard<'_, Option<Token>>) -> Result<Token> {
        let current = guard.as_ref().ok_or(Error::NoToken)?;
        if current.is_refresh_token_expired() {
            // Known-dead refresh token: never hits the network.
            return Err(Error::RefreshTokenExpired);
        }

        let refresh_token = current.refresh_token().to_string();
        let prior_realm_id = current.realm_id().to_string();

        let response = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", &refresh_token),
            ])
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<RevokeErrorResponse>(&body)
                && err.error == REFRESH_TOKEN_EXPIRED_CODE
            {
                return Err(Error::RefreshTokenExpired);
            }
            return Err(Error::Refresh(body));
        }

        let issued_at = OffsetDateTime::now_utc();
        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization(e, Some(body)))?;
        let token = parsed.into_token(issued_at, &prior_realm_id);

        debug!("token refreshed");
        **guard = Some(token.clone());
        Ok(token)
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<reqwest::Response> {
        Ok(self
            .http
            .post(self.endpoints.token_url.clone())
            .basic_auth(
                self.key_pair.0.as_str(),
                self.key_pair.1.as_ref().map(|s| s.secret()),
            )
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?)
    }
}
