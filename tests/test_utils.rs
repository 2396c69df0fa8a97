use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

use time::{Duration, OffsetDateTime};
use tracing::info;
use url::Url;
use warp::Filter;
use warp::http::StatusCode;

use quickbooks_rs::{AuthEndpoints, AuthProvider, Environment, KeyPair, Scope, Token};

static LOGGING_CONFIGURED: Once = Once::new();

/// Setup before test runs
pub fn do_setup() {
    LOGGING_CONFIGURED.call_once(|| tracing_subscriber::fmt().with_test_writer().init());
    info!("Setting up test environment");
}

/// A scripted sequence of responses for one mock endpoint. Responses are
/// served in order; the last one repeats. Tracks how many requests arrived.
#[derive(Clone)]
#[allow(dead_code)]
pub struct Script {
    responses: Arc<Vec<(u16, String)>>,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl Script {
    pub fn new(responses: Vec<(u16, String)>) -> Self {
        assert!(!responses.is_empty(), "a script needs at least one response");
        Self {
            responses: Arc::new(responses),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn single(status: u16, body: &str) -> Self {
        Self::new(vec![(status, body.to_string())])
    }

    fn next(&self) -> (u16, String) {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses[idx.min(self.responses.len() - 1)].clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[allow(dead_code)]
pub struct MockOAuthServer {
    pub base_url: Url,
    pub token: Script,
    pub revoke: Script,
}

/// Spawns a local server mimicking the Intuit OAuth path layout.
#[allow(dead_code)]
pub async fn spawn_oauth_server(token: Script, revoke: Script) -> MockOAuthServer {
    let token_route = warp::post()
        .and(warp::path!("oauth2" / "v1" / "tokens" / "bearer"))
        .map({
            let token = token.clone();
            move || {
                let (status, body) = token.next();
                warp::reply::with_status(body, StatusCode::from_u16(status).unwrap())
            }
        });
    let revoke_route = warp::post()
        .and(warp::path!("v2" / "oauth2" / "tokens" / "revoke"))
        .map({
            let revoke = revoke.clone();
            move || {
                let (status, body) = revoke.next();
                warp::reply::with_status(body, StatusCode::from_u16(status).unwrap())
            }
        });

    let (addr, server) = warp::serve(token_route.or(revoke_route)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    MockOAuthServer {
        base_url: Url::parse(&format!("http://{addr}/")).unwrap(),
        token,
        revoke,
    }
}

/// An auth provider pointed at a mock server, with the test app config used
/// throughout the suite.
#[allow(dead_code)]
pub fn auth_provider(base_url: &Url) -> AuthProvider {
    AuthProvider::new(
        KeyPair::new(
            "test_client_id".to_string(),
            Some("test_client_secret".to_string()),
        ),
        Url::parse("http://localhost:3000/auth-code").unwrap(),
        vec![Scope::Accounting],
        Environment::Sandbox,
    )
    .with_endpoints(AuthEndpoints::with_base(base_url).unwrap())
}

/// A token with the given remaining lifetimes (negative means already expired).
#[allow(dead_code)]
pub fn make_token(
    access_token: &str,
    access_expires_in_secs: i64,
    refresh_token: &str,
    refresh_expires_in_secs: i64,
    realm_id: &str,
) -> Token {
    let now = OffsetDateTime::now_utc();
    Token::new(
        access_token.to_string(),
        now + Duration::seconds(access_expires_in_secs),
        refresh_token.to_string(),
        now + Duration::seconds(refresh_expires_in_secs),
        realm_id.to_string(),
        "bearer".to_string(),
    )
}

/// A well-formed token endpoint success body.
#[allow(dead_code)]
pub fn token_response_body(access_token: &str, refresh_token: &str) -> String {
    serde_json::json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "expires_in": 3600,
        "x_refresh_token_expires_in": 8_726_400,
        "token_type": "bearer",
    })
    .to_string()
}
