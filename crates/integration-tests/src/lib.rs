//! Integration tests for the Giftify storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p giftify-integration-tests
//! ```
//!
//! No external services are needed. The fixtures here stand in for the
//! identity provider and the catalog service:
//!
//! - [`FakeIdentity`] - in-memory identity provider with a toggleable session
//!   that publishes its changes
//! - [`ScriptedCatalog`] - catalog source whose replies can be held and
//!   released one request at a time
//! - [`CatalogServer`] - in-process HTTP catalog that records the
//!   `Authorization` header of every request

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::get;
use giftify_core::{Product, UserInfo};
use giftify_storefront::cart::CartStore;
use giftify_storefront::catalog::{CatalogError, CatalogSource};
use giftify_storefront::config::CatalogConfig;
use giftify_storefront::identity::{AccessToken, AuthSession, IdentityError, IdentityProvider};
use giftify_storefront::{Home, HomeState};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Token issued by [`FakeIdentity`].
pub const TEST_TOKEN: &str = "test-token-123";

/// How long a test waits for an expected state before failing.
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Fixture data
// ============================================================================

/// Products every visitor sees.
#[must_use]
pub fn public_products() -> Vec<Product> {
    vec![
        Product::new("candle-1", "Scented Candle", Decimal::new(1500, 2)),
        Product::new(2_i64, "Gift Card", Decimal::from(25)),
    ]
}

/// Products a signed-in visitor sees.
#[must_use]
pub fn member_products() -> Vec<Product> {
    let mut products = public_products();
    products.push(Product::new("hamper-9", "Members Hamper", Decimal::from(80)));
    products
}

/// Profile returned by [`FakeIdentity`].
#[must_use]
pub fn sample_user() -> UserInfo {
    UserInfo {
        sub: Some("user-42".to_string()),
        username: Some("ana".to_string()),
        display_name: Some("Ana Lima".to_string()),
        email: Some("ana@example.com".to_string()),
        ..UserInfo::default()
    }
}

/// Home wired to the given fakes with an empty cart.
#[must_use]
pub fn home_with(identity: Arc<FakeIdentity>, catalog: Arc<ScriptedCatalog>) -> Home {
    Home::new(AuthSession::new(identity), catalog, CartStore::new())
}

/// Wait until the home state satisfies `predicate` and return it.
///
/// # Panics
///
/// Panics if the state does not get there in time.
pub async fn wait_for_state(home: &Home, predicate: impl FnMut(&HomeState) -> bool) -> HomeState {
    let mut rx = home.subscribe();
    let state = tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for home state")
        .expect("home state channel closed");
    state.clone()
}

// ============================================================================
// Identity provider
// ============================================================================

/// In-memory identity provider.
///
/// Userinfo requests take queued gates from [`FakeIdentity::hold_user_info`]
/// in arrival order and answer once the gate is released or dropped.
#[derive(Debug)]
pub struct FakeIdentity {
    signed_in: watch::Sender<bool>,
    token: Option<String>,
    user: Option<UserInfo>,
    rejects_sign_in: bool,
    user_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    user_info_calls: watch::Sender<usize>,
}

impl FakeIdentity {
    /// Provider with a working token and userinfo endpoint.
    #[must_use]
    pub fn new(signed_in: bool) -> Self {
        let (signed_in, _) = watch::channel(signed_in);
        let (user_info_calls, _) = watch::channel(0);
        Self {
            signed_in,
            token: Some(TEST_TOKEN.to_string()),
            user: Some(sample_user()),
            rejects_sign_in: false,
            user_gates: Mutex::new(VecDeque::new()),
            user_info_calls,
        }
    }

    /// Token requests fail.
    #[must_use]
    pub fn without_token(mut self) -> Self {
        self.token = None;
        self
    }

    /// Userinfo requests fail.
    #[must_use]
    pub fn without_user_info(mut self) -> Self {
        self.user = None;
        self
    }

    /// Sign-in fails and leaves the session unchanged.
    #[must_use]
    pub fn rejecting_sign_in(mut self) -> Self {
        self.rejects_sign_in = true;
        self
    }

    /// Flip the session flag without going through sign-in.
    ///
    /// Subscribers are notified only when the flag actually changes.
    pub fn set_signed_in(&self, signed_in: bool) {
        self.signed_in.send_if_modified(|current| {
            let changed = *current != signed_in;
            *current = signed_in;
            changed
        });
    }

    /// Hold the next userinfo request until the returned sender fires.
    pub fn hold_user_info(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.user_gates
            .lock()
            .expect("user gates lock poisoned")
            .push_back(rx);
        tx
    }

    /// Number of userinfo requests made so far.
    pub fn user_info_calls(&self) -> usize {
        *self.user_info_calls.borrow()
    }

    /// Wait until at least `count` userinfo requests have arrived.
    ///
    /// # Panics
    ///
    /// Panics if they do not arrive in time.
    pub async fn wait_for_user_info_calls(&self, count: usize) {
        let mut rx = self.user_info_calls.subscribe();
        tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(|calls| *calls >= count))
            .await
            .expect("timed out waiting for userinfo requests")
            .map(|_| ())
            .expect("userinfo call counter closed");
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn is_authenticated(&self) -> bool {
        *self.signed_in.borrow()
    }

    async fn sign_in(&self) -> Result<(), IdentityError> {
        if self.rejects_sign_in {
            return Err(IdentityError::SignIn("popup closed by user".to_string()));
        }
        self.set_signed_in(true);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.set_signed_in(false);
        Ok(())
    }

    async fn get_basic_user_info(&self) -> Result<UserInfo, IdentityError> {
        let gate = self
            .user_gates
            .lock()
            .expect("user gates lock poisoned")
            .pop_front();
        self.user_info_calls.send_modify(|calls| *calls += 1);
        if let Some(gate) = gate {
            // A dropped sender releases the request too.
            let _ = gate.await;
        }
        self.user
            .clone()
            .ok_or_else(|| IdentityError::UserInfo("userinfo endpoint returned 500".to_string()))
    }

    async fn get_access_token(&self) -> Result<AccessToken, IdentityError> {
        self.token
            .as_deref()
            .map(AccessToken::new)
            .ok_or_else(|| IdentityError::AccessToken("refresh token expired".to_string()))
    }

    fn watch_authenticated(&self) -> Option<watch::Receiver<bool>> {
        Some(self.signed_in.subscribe())
    }
}

// ============================================================================
// Scripted catalog source
// ============================================================================

/// Reply for one held request: products, or an HTTP status to fail with.
pub type Reply = Result<Vec<Product>, u16>;

/// Catalog source with controllable timing.
///
/// Requests take queued gates from [`ScriptedCatalog::hold_next`] in arrival
/// order and wait for the gate's reply. Ungated requests answer at once with
/// [`member_products`] when a token was sent and [`public_products`]
/// otherwise, or fail while [`ScriptedCatalog::set_failing`] is on.
#[derive(Debug)]
pub struct ScriptedCatalog {
    gates: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    tokens: Mutex<Vec<Option<String>>>,
    calls: watch::Sender<usize>,
    failing: AtomicBool,
}

impl ScriptedCatalog {
    #[must_use]
    pub fn new() -> Self {
        let (calls, _) = watch::channel(0);
        Self {
            gates: Mutex::new(VecDeque::new()),
            tokens: Mutex::new(Vec::new()),
            calls,
            failing: AtomicBool::new(false),
        }
    }

    /// Hold the next request until the returned sender replies.
    ///
    /// Dropping the sender fails the request with HTTP 503.
    pub fn hold_next(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().expect("gates lock poisoned").push_back(rx);
        tx
    }

    /// Make ungated requests fail with HTTP 500.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Bearer token of every request so far, in arrival order.
    pub fn tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().expect("tokens lock poisoned").clone()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        *self.calls.borrow()
    }

    /// Wait until at least `count` requests have arrived.
    ///
    /// # Panics
    ///
    /// Panics if they do not arrive in time.
    pub async fn wait_for_calls(&self, count: usize) {
        let mut rx = self.calls.subscribe();
        tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(|calls| *calls >= count))
            .await
            .expect("timed out waiting for catalog requests")
            .map(|_| ())
            .expect("catalog call counter closed");
    }
}

impl Default for ScriptedCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    async fn fetch_products(
        &self,
        token: Option<&AccessToken>,
    ) -> Result<Vec<Product>, CatalogError> {
        let authenticated = token.is_some();
        self.tokens
            .lock()
            .expect("tokens lock poisoned")
            .push(token.map(|t| t.expose().to_string()));
        let gate = self.gates.lock().expect("gates lock poisoned").pop_front();
        self.calls.send_modify(|calls| *calls += 1);

        let reply = match gate {
            Some(gate) => gate.await.unwrap_or(Err(503)),
            None if self.failing.load(Ordering::SeqCst) => Err(500),
            None if authenticated => Ok(member_products()),
            None => Ok(public_products()),
        };
        reply.map_err(|status| CatalogError::Status {
            status,
            body: String::new(),
        })
    }
}

// ============================================================================
// HTTP catalog server
// ============================================================================

#[derive(Clone)]
struct ServerState {
    status: Arc<AtomicU16>,
    body: Arc<Mutex<String>>,
    authorization: Arc<Mutex<Vec<Option<String>>>>,
}

/// In-process catalog service on `127.0.0.1`, serving `GET /api/products`.
pub struct CatalogServer {
    base_url: String,
    state: ServerState,
    task: JoinHandle<()>,
}

impl CatalogServer {
    /// Start serving `body` with status 200.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(body: &Value) -> Self {
        let state = ServerState {
            status: Arc::new(AtomicU16::new(200)),
            body: Arc::new(Mutex::new(body.to_string())),
            authorization: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/api/products", get(list_products))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test catalog server");
        let addr = listener.local_addr().expect("Failed to read local address");
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test catalog server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            task,
        }
    }

    /// Catalog configuration pointing at this server.
    ///
    /// # Panics
    ///
    /// Panics if the server URL is rejected, which would be a fixture bug.
    #[must_use]
    pub fn config(&self) -> CatalogConfig {
        CatalogConfig::new(&self.base_url)
            .expect("test server URL is valid")
            .with_timeout(WAIT_TIMEOUT)
    }

    /// Answer subsequent requests with `status`.
    pub fn set_status(&self, status: u16) {
        self.state.status.store(status, Ordering::SeqCst);
    }

    /// Answer subsequent requests with `body`, verbatim.
    pub fn set_raw_body(&self, body: impl Into<String>) {
        *self.state.body.lock().expect("body lock poisoned") = body.into();
    }

    /// `Authorization` header of every request so far.
    pub fn authorization_headers(&self) -> Vec<Option<String>> {
        self.state
            .authorization
            .lock()
            .expect("authorization lock poisoned")
            .clone()
    }
}

impl Drop for CatalogServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn list_products(State(state): State<ServerState>, headers: HeaderMap) -> (StatusCode, String) {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .authorization
        .lock()
        .expect("authorization lock poisoned")
        .push(authorization);

    let status = StatusCode::from_u16(state.status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = state.body.lock().expect("body lock poisoned").clone();
    (status, body)
}
