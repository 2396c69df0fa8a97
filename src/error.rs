use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the OAuth revoke endpoint, e.g. `{"error":"invalid_token"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeErrorResponse {
    pub error: String,
}

/// Errors that can occur when interacting with the QuickBooks Online API.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("error making request: {0:?}")]
    #[diagnostic(
        code(quickbooks_rs::request_error),
        help("Check your network connection and QuickBooks API availability")
    )]
    Request(#[source] reqwest::Error),

    /// An operation requiring credentials was attempted before any token was set.
    #[error("no token set, authenticate or call set_token first")]
    #[diagnostic(
        code(quickbooks_rs::no_token),
        help("Complete the authorization-code flow with exchange_code, or restore a saved token with set_token")
    )]
    NoToken,

    /// The token endpoint rejected the authorization-code exchange.
    ///
    /// The message embeds the raw response body verbatim.
    #[error("Failed to exchange auth code for a token: {0}")]
    #[diagnostic(
        code(quickbooks_rs::auth_exchange),
        help("Verify the authorization code, redirect URI and client credentials")
    )]
    AuthExchange(String),

    /// The stored refresh token is past its expiry date. Detected locally where
    /// possible; no token-endpoint request is made in that case.
    #[error("Refresh token is expired, please re-authenticate")]
    #[diagnostic(
        code(quickbooks_rs::refresh_token_expired),
        help("Run the authorization-code flow again to obtain a fresh token pair")
    )]
    RefreshTokenExpired,

    /// The token endpoint rejected the refresh for a reason other than an
    /// expired refresh token. The message embeds the raw response body verbatim.
    #[error("Failed to refresh token: {0}")]
    #[diagnostic(
        code(quickbooks_rs::refresh),
        help("Verify the client credentials and the stored refresh token")
    )]
    Refresh(String),

    /// The revoke endpoint rejected the request. Unlike exchange/refresh this
    /// carries the parsed `error` code from the body, not the raw JSON.
    #[error("Failed to revoke token: {0}")]
    #[diagnostic(
        code(quickbooks_rs::revoke),
        help("The token may already be revoked or otherwise invalid")
    )]
    Revoke(String),

    /// A non-2xx response from a resource endpoint, propagated unchanged.
    #[error("api error (status {status}): {body}")]
    #[diagnostic(
        code(quickbooks_rs::api_error),
        help("Review the error body returned by the QuickBooks API")
    )]
    Api {
        status: reqwest::StatusCode,
        url: String,
        body: String,
    },

    /// A caller-level precondition failed before any network activity.
    #[error("validation error: {0}")]
    #[diagnostic(
        code(quickbooks_rs::validation),
        help("Fix the offending argument; no request was made")
    )]
    Validation(String),

    #[error("object not found: {entity}")]
    #[diagnostic(
        code(quickbooks_rs::not_found),
        help("Verify that the {entity} exists and that you have permission to access it")
    )]
    NotFound { entity: String },

    #[error("error decoding response: {0:?}")]
    #[diagnostic(
        code(quickbooks_rs::deserialization_error),
        help("The API returned data in an unexpected format")
    )]
    Deserialization(#[source] serde_json::Error, Option<String>),

    #[error("endpoint could not be parsed as a URL")]
    #[diagnostic(
        code(quickbooks_rs::invalid_endpoint),
        help("Check that the API endpoint URL is correctly formatted")
    )]
    InvalidEndpoint,
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Deserialization(e, None)
    }
}

/// Type alias for results from this crate.
pub type Result<O> = std::result::Result<O, Error>;
