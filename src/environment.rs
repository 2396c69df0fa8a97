use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

pub const AUTHORIZE_URL: &str = "https://appcenter.intuit.com/connect/oauth2";
pub const TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";
pub const REVOKE_URL: &str = "https://developer.api.intuit.com/v2/oauth2/tokens/revoke";

pub const SANDBOX_API_URL: &str = "https://sandbox-quickbooks.api.intuit.com";
pub const PRODUCTION_API_URL: &str = "https://quickbooks.api.intuit.com";

/// Which QuickBooks Online environment resource requests are sent to.
///
/// The OAuth endpoints are shared between environments; only the resource API
/// host differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    /// Base URL for the resource (v3) API in this environment.
    ///
    /// # Panics
    /// Never panics; the URLs are compile-time constants known to parse.
    #[must_use]
    pub fn api_base_url(self) -> Url {
        let base = match self {
            Self::Sandbox => SANDBOX_API_URL,
            Self::Production => PRODUCTION_API_URL,
        };
        Url::parse(base).expect("environment base URL is valid")
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sandbox => write!(f, "sandbox"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// The three OAuth2 endpoints used by the token lifecycle.
///
/// Defaults to the Intuit-hosted endpoints. Overridable as a group so the
/// protocol can be pointed at a local mock server in tests or a proxy.
#[derive(Debug, Clone)]
pub struct AuthEndpoints {
    pub authorize_url: Url,
    pub token_url: Url,
    pub revoke_url: Url,
}

impl AuthEndpoints {
    /// Endpoints rooted at a single base URL, using Intuit's path layout.
    /// Intended for tests against a local mock server.
    pub fn with_base(base: &Url) -> Result<Self> {
        Ok(Self {
            authorize_url: base.join("connect/oauth2").map_err(|_| Error::InvalidEndpoint)?,
            token_url: base
                .join("oauth2/v1/tokens/bearer")
                .map_err(|_| Error::InvalidEndpoint)?,
            revoke_url: base
                .join("v2/oauth2/tokens/revoke")
                .map_err(|_| Error::InvalidEndpoint)?,
        })
    }
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: Url::parse(AUTHORIZE_URL).expect("authorize URL is valid"),
            token_url: Url::parse(TOKEN_URL).expect("token URL is valid"),
            revoke_url: Url::parse(REVOKE_URL).expect("revoke URL is valid"),
        }
    }
}
