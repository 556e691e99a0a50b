//! Common test utilities shared across integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use schnorr_auth::directory::MemoryUserDirectory;
use schnorr_auth::events::RecordingEventPublisher;
use schnorr_auth::server::routes::routes;
use schnorr_auth::server::{AuthService, CpuPool, RateLimiter};
use schnorr_auth::store::{MemoryChallengeStore, CHALLENGE_TTL};
use schnorr_auth::token::RandomTokenIssuer;
use schnorr_auth::SchnorrGroup;
use warp::{Filter, Rejection, Reply};

/// Initialize test tracing (call once at the beginning of tests).
///
/// Subsequent calls are safe and will be ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new("schnorr_auth=info");

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}

/// A fully wired service over in-memory collaborators, with handles to each
/// of them for assertions.
pub struct TestApp {
    pub group: Arc<SchnorrGroup>,
    pub service: Arc<AuthService>,
    pub store: Arc<MemoryChallengeStore>,
    pub directory: Arc<MemoryUserDirectory>,
    pub events: Arc<RecordingEventPublisher>,
}

/// Builds a test app with the default 300 s challenge TTL.
pub fn test_app() -> TestApp {
    test_app_with_ttl(CHALLENGE_TTL)
}

/// Builds a test app with an explicit challenge TTL (expiry tests use
/// millisecond lifetimes so they do not wait out the real five minutes).
pub fn test_app_with_ttl(ttl: Duration) -> TestApp {
    let group = Arc::new(SchnorrGroup::rfc3526_1536());
    let store = Arc::new(MemoryChallengeStore::new());
    let directory = Arc::new(MemoryUserDirectory::new());
    let events = Arc::new(RecordingEventPublisher::new());
    let service = Arc::new(AuthService::new(
        group.clone(),
        store.clone(),
        directory.clone(),
        events.clone(),
        Arc::new(RandomTokenIssuer::default()),
        CpuPool::new(4, 1024),
        ttl,
    ));
    TestApp {
        group,
        service,
        store,
        directory,
        events,
    }
}

/// Route tree for the app with a rate limiter generous enough to stay out of
/// the way.
pub fn api(app: &TestApp) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    routes(app.service.clone(), RateLimiter::new(600_000, 100_000))
}

/// Parses a response body as JSON.
pub fn body_json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).expect("response body should be JSON")
}
