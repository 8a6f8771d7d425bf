//! Home screen coordinator.
//!
//! # Architecture
//!
//! - [`Home`] owns the [`HomeState`] (active surface, catalog result, user
//!   info) and publishes every change through a `watch` channel
//! - Two effects run as Tokio tasks: the catalog fetch and the user info
//!   fetch. Both start on [`Home::mount`] and restart whenever the
//!   authentication flag is seen to change
//! - Each effect kind has a [`Generation`] counter. A task captures a ticket
//!   when it starts and applies its result only if that ticket is still
//!   current, so the latest request always wins
//! - Tasks hold a weak reference to the coordinator; once it is dropped or
//!   unmounted, late arrivals are no-ops
//! - When the provider publishes session changes, a watcher task re-syncs on
//!   every change, so a session that ends outside [`Home::sign_out`] still
//!   reloads the screen
//!
//! Lock order is `effects` then `state`. Neither lock is held across an
//! `.await`.

mod generation;
pub mod view;

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use giftify_core::UserInfo;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use self::generation::{Generation, Ticket};
pub use self::view::{
    CartDrawerModel, CartLineModel, CatalogGrid, GiftItemModel, HomeView, NavbarModel,
    PurchaseFormModel, RETRY_LABEL, UserProfileModel,
};
use crate::cart::CartStore;
use crate::catalog::{self, CatalogClient, CatalogResult, CatalogSource};
use crate::config::StorefrontConfig;
use crate::error::{StorefrontError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::identity::{AccessToken, AuthSession};
use crate::surface::{ActiveSurface, SurfaceAction};

/// Everything the home screen displays apart from the cart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HomeState {
    /// Which overlay is showing.
    pub surface: ActiveSurface,
    /// Outcome of the most recent catalog request.
    pub catalog: CatalogResult,
    /// Signed-in visitor's profile, once loaded.
    pub user: Option<UserInfo>,
}

/// Home screen coordinator.
///
/// Cheap to clone; clones drive the same screen. Effects are spawned on the
/// ambient Tokio runtime, so [`Home::mount`] and the methods that restart
/// effects must be called from within one.
#[derive(Clone)]
pub struct Home {
    inner: Arc<HomeInner>,
}

struct HomeInner {
    session: AuthSession,
    catalog: Arc<dyn CatalogSource>,
    cart: CartStore,
    state: watch::Sender<HomeState>,
    effects: Mutex<Effects>,
}

/// Bookkeeping for in-flight effects.
#[derive(Default)]
struct Effects {
    catalog_generation: Generation,
    user_generation: Generation,
    /// Authentication flag at the last mount or refresh; `None` before mount.
    observed_auth: Option<bool>,
    /// Token sent with the current catalog request shape.
    token_snapshot: Option<AccessToken>,
    tasks: Vec<JoinHandle<()>>,
    /// Follows provider session changes; not awaited by `settle`.
    session_watcher: Option<JoinHandle<()>>,
    unmounted: bool,
}

impl Effects {
    fn track(&mut self, task: JoinHandle<()>) {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(task);
    }

    fn abort_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if let Some(watcher) = self.session_watcher.take() {
            watcher.abort();
        }
    }
}

/// Where a catalog request gets its token.
enum TokenSource {
    /// Ask the session for a fresh token and record it as the snapshot.
    /// Skipped when the refresh saw no session.
    Acquire { authenticated: bool },
    /// Repeat an earlier request shape.
    Snapshot(Option<AccessToken>),
}

impl Home {
    /// Create a coordinator. Nothing is fetched until [`Home::mount`].
    #[must_use]
    pub fn new(session: AuthSession, catalog: Arc<dyn CatalogSource>, cart: CartStore) -> Self {
        let (state, _) = watch::channel(HomeState::default());
        Self {
            inner: Arc::new(HomeInner {
                session,
                catalog,
                cart,
                state,
                effects: Mutex::new(Effects::default()),
            }),
        }
    }

    /// Create a coordinator backed by the HTTP catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(
        config: &StorefrontConfig,
        session: AuthSession,
        cart: CartStore,
    ) -> crate::error::Result<Self> {
        let client = CatalogClient::new(&config.catalog)?;
        Ok(Self::new(session, Arc::new(client), cart))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start the screen: fetch the catalog, and the user info if signed in.
    ///
    /// Mounting again after [`Home::unmount`] starts over with fresh fetches.
    #[instrument(skip(self))]
    pub fn mount(&self) {
        let authenticated = self.inner.session.is_authenticated();
        let mut effects = self.inner.lock_effects();
        effects.unmounted = false;
        info!(authenticated, "Home mounted");
        self.refresh(&mut effects, authenticated);
        self.watch_session(&mut effects);
    }

    /// Re-read the authentication flag and restart both effects if it changed.
    ///
    /// Returns whether a refresh was started. A coordinator that was never
    /// mounted is mounted by the first call.
    #[instrument(skip(self))]
    pub fn sync_session(&self) -> bool {
        let authenticated = self.inner.session.is_authenticated();
        let mut effects = self.inner.lock_effects();
        if effects.unmounted || effects.observed_auth == Some(authenticated) {
            return false;
        }
        let first_sync = effects.observed_auth.is_none();
        info!(authenticated, "Authentication changed, reloading");
        self.refresh(&mut effects, authenticated);
        if first_sync {
            self.watch_session(&mut effects);
        }
        true
    }

    /// Stop the screen. In-flight fetches are aborted and any result that
    /// still arrives is discarded.
    pub fn unmount(&self) {
        let mut effects = self.inner.lock_effects();
        effects.unmounted = true;
        effects.catalog_generation.invalidate();
        effects.user_generation.invalidate();
        effects.abort_all();
        debug!("Home unmounted");
    }

    /// Wait until every effect started so far has finished.
    ///
    /// Effects started while waiting are awaited as well.
    pub async fn settle(&self) {
        loop {
            let tasks = mem::take(&mut self.inner.lock_effects().tasks);
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                match task.await {
                    Err(e) if e.is_panic() => error!(error = %e, "Home effect task panicked"),
                    _ => {}
                }
            }
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Sign in through the identity provider, then reload for the new session.
    ///
    /// # Errors
    ///
    /// Returns the provider's sign-in error. The session is re-read either
    /// way.
    pub async fn sign_in(&self) -> crate::error::Result<()> {
        add_breadcrumb("auth", "Sign-in requested", None);
        let result = self.inner.session.sign_in().await;
        self.sync_session();
        result.map_err(StorefrontError::from)
    }

    /// Sign out through the identity provider, then reload anonymously.
    ///
    /// # Errors
    ///
    /// Returns the provider's sign-out error. The session is re-read either
    /// way.
    pub async fn sign_out(&self) -> crate::error::Result<()> {
        add_breadcrumb("auth", "Sign-out requested", None);
        let result = self.inner.session.sign_out().await;
        self.sync_session();
        result.map_err(StorefrontError::from)
    }

    // =========================================================================
    // Surfaces
    // =========================================================================

    /// Cart icon: open the drawer. Ignored while the purchase form is open.
    pub fn open_cart(&self) -> bool {
        self.transition(SurfaceAction::OpenCart)
    }

    /// Close the drawer without checking out.
    pub fn close_cart(&self) -> bool {
        self.transition(SurfaceAction::CloseCart)
    }

    /// Drawer checkout: close the drawer and open the purchase form in one
    /// state change.
    pub fn checkout(&self) -> bool {
        self.transition(SurfaceAction::Checkout)
    }

    /// Dismiss the purchase form.
    pub fn close_purchase_form(&self) -> bool {
        self.transition(SurfaceAction::ClosePurchaseForm)
    }

    fn transition(&self, action: SurfaceAction) -> bool {
        let mut from = ActiveSurface::default();
        let changed = self.inner.state.send_if_modified(|state| {
            from = state.surface;
            match state.surface.apply(action) {
                Some(next) => {
                    state.surface = next;
                    true
                }
                None => false,
            }
        });
        if changed {
            debug!(?action, ?from, "Surface changed");
            add_breadcrumb("ui", action.label(), None);
        } else {
            debug!(?action, ?from, "Surface action ignored");
        }
        changed
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// "Try Again": repeat the last catalog request with the same token.
    ///
    /// Only applies while the catalog shows a failure; returns whether a
    /// request was started.
    pub fn retry_catalog(&self) -> bool {
        let mut effects = self.inner.lock_effects();
        if effects.unmounted || effects.observed_auth.is_none() {
            debug!("Catalog retry ignored, not mounted");
            return false;
        }
        if self.inner.state.borrow().catalog.error_message().is_none() {
            debug!("Catalog retry ignored, no failure showing");
            return false;
        }
        add_breadcrumb("catalog", "Retried catalog load", None);
        let snapshot = effects.token_snapshot.clone();
        self.start_catalog(&mut effects, TokenSource::Snapshot(snapshot));
        true
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// Derive the render models from the current state and cart.
    ///
    /// The auth controls follow the session the state was loaded for, so a
    /// view never mixes a profile with a signed-out navbar. Before mount they
    /// follow the provider.
    #[must_use]
    pub fn render(&self) -> HomeView {
        let observed = self.inner.lock_effects().observed_auth;
        let authenticated = observed.unwrap_or_else(|| self.inner.session.is_authenticated());
        let state = self.state();
        HomeView::build(&state, &self.inner.cart.lines(), authenticated)
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> HomeState {
        self.inner.state.borrow().clone()
    }

    /// Receive the state after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HomeState> {
        self.inner.state.subscribe()
    }

    /// The shared cart.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// The identity session.
    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.inner.session
    }

    // =========================================================================
    // Effects
    // =========================================================================

    /// Reset for `authenticated` and restart both effects.
    fn refresh(&self, effects: &mut Effects, authenticated: bool) {
        effects.observed_auth = Some(authenticated);
        effects.token_snapshot = None;
        effects.user_generation.invalidate();

        self.inner.state.send_if_modified(|state| {
            let changed = state.user.is_some() || !state.catalog.is_pending();
            state.user = None;
            state.catalog = CatalogResult::Pending;
            changed
        });

        self.start_catalog(effects, TokenSource::Acquire { authenticated });
        if authenticated {
            self.start_user_info(effects);
        } else {
            clear_sentry_user();
        }
    }

    fn start_catalog(&self, effects: &mut Effects, token_source: TokenSource) {
        let ticket = effects.catalog_generation.advance();
        self.inner.state.send_if_modified(|state| {
            if state.catalog.is_pending() {
                return false;
            }
            state.catalog = CatalogResult::Pending;
            true
        });

        let weak = Arc::downgrade(&self.inner);
        let session = self.inner.session.clone();
        let source = Arc::clone(&self.inner.catalog);
        effects.track(tokio::spawn(async move {
            let token = match token_source {
                TokenSource::Snapshot(token) => token,
                TokenSource::Acquire { authenticated } => {
                    let token = if authenticated {
                        session.access_token().await
                    } else {
                        None
                    };
                    if !record_token(&weak, ticket, token.as_ref()) {
                        return;
                    }
                    token
                }
            };

            let result = catalog::load(source.as_ref(), token.as_ref()).await;
            if let Some(inner) = weak.upgrade() {
                inner.apply_catalog(ticket, result);
            }
        }));
    }

    /// Follow provider session changes until unmount or drop.
    fn watch_session(&self, effects: &mut Effects) {
        let Some(mut changes) = self.inner.session.watch_authenticated() else {
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        let watcher = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                Self { inner }.sync_session();
            }
        });
        if let Some(previous) = effects.session_watcher.replace(watcher) {
            previous.abort();
        }
    }

    fn start_user_info(&self, effects: &mut Effects) {
        let ticket = effects.user_generation.advance();
        let weak = Arc::downgrade(&self.inner);
        let session = self.inner.session.clone();
        effects.track(tokio::spawn(async move {
            // Failures are logged by the session; no identity is shown.
            let Ok(user) = session.user_info().await else {
                return;
            };
            if let Some(inner) = weak.upgrade() {
                inner.apply_user(ticket, user);
            }
        }));
    }
}

/// Record the token a catalog request is about to use.
///
/// Returns `false` when the request has been superseded and should stop.
fn record_token(inner: &Weak<HomeInner>, ticket: Ticket, token: Option<&AccessToken>) -> bool {
    let Some(inner) = inner.upgrade() else {
        return false;
    };
    let mut effects = inner.lock_effects();
    if !effects.catalog_generation.is_current(ticket) {
        debug!("Catalog request superseded before it was sent");
        return false;
    }
    effects.token_snapshot = token.cloned();
    true
}

impl HomeInner {
    fn lock_effects(&self) -> MutexGuard<'_, Effects> {
        self.effects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_catalog(&self, ticket: Ticket, result: CatalogResult) {
        let effects = self.lock_effects();
        if !effects.catalog_generation.is_current(ticket) {
            debug!("Discarding stale catalog result");
            return;
        }
        self.state.send_modify(|state| state.catalog = result);
    }

    fn apply_user(&self, ticket: Ticket, user: UserInfo) {
        let effects = self.lock_effects();
        if !effects.user_generation.is_current(ticket) {
            debug!("Discarding stale user info");
            return;
        }
        set_sentry_user(&user);
        self.state.send_modify(|state| state.user = Some(user));
    }
}

impl Drop for HomeInner {
    fn drop(&mut self) {
        self.effects
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}

impl std::fmt::Debug for Home {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Home")
            .field("session", &self.inner.session)
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use giftify_core::{Product, Quantity};
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::{CatalogError, LOAD_FAILED_MESSAGE};
    use crate::identity::{IdentityError, IdentityProvider};

    /// Provider whose flag flips on sign-in and sign-out.
    #[derive(Default)]
    struct ToggleIdentity {
        signed_in: AtomicBool,
    }

    #[async_trait]
    impl IdentityProvider for ToggleIdentity {
        fn is_authenticated(&self) -> bool {
            self.signed_in.load(Ordering::SeqCst)
        }

        async fn sign_in(&self) -> Result<(), IdentityError> {
            self.signed_in.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn sign_out(&self) -> Result<(), IdentityError> {
            self.signed_in.store(false, Ordering::SeqCst);
            Ok(())
        }

        async fn get_basic_user_info(&self) -> Result<UserInfo, IdentityError> {
            Ok(UserInfo {
                username: Some("sam".to_string()),
                ..UserInfo::default()
            })
        }

        async fn get_access_token(&self) -> Result<AccessToken, IdentityError> {
            Ok(AccessToken::new("tok"))
        }
    }

    /// Catalog that fails until told otherwise.
    #[derive(Default)]
    struct FlakyCatalog {
        healthy: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for FlakyCatalog {
        async fn fetch_products(
            &self,
            _token: Option<&AccessToken>,
        ) -> Result<Vec<Product>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy.load(Ordering::SeqCst) {
                Ok(vec![Product::new("1", "Mug", Decimal::from(12))])
            } else {
                Err(CatalogError::Status {
                    status: 500,
                    body: String::new(),
                })
            }
        }
    }

    fn home(catalog: Arc<FlakyCatalog>) -> (Home, Arc<ToggleIdentity>) {
        let identity = Arc::new(ToggleIdentity::default());
        let session = AuthSession::new(identity.clone());
        (Home::new(session, catalog, CartStore::new()), identity)
    }

    #[tokio::test]
    async fn test_mount_starts_pending() {
        let (home, _) = home(Arc::new(FlakyCatalog::default()));
        assert!(home.state().catalog.is_pending());
        home.mount();
        home.settle().await;
        assert_eq!(
            home.state().catalog,
            CatalogResult::Failure(LOAD_FAILED_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_retry_only_after_failure() {
        let catalog = Arc::new(FlakyCatalog::default());
        let (home, _) = home(catalog.clone());
        assert!(!home.retry_catalog());

        home.mount();
        home.settle().await;
        catalog.healthy.store(true, Ordering::SeqCst);

        assert!(home.retry_catalog());
        assert!(home.state().catalog.is_pending());
        home.settle().await;
        assert_eq!(home.state().catalog.products().unwrap().len(), 1);
        assert!(!home.retry_catalog());
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sync_session_only_reacts_to_changes() {
        let catalog = Arc::new(FlakyCatalog::default());
        let (home, identity) = home(catalog.clone());
        home.mount();
        home.settle().await;

        assert!(!home.sync_session());
        identity.signed_in.store(true, Ordering::SeqCst);
        assert!(home.sync_session());
        home.settle().await;

        assert_eq!(home.state().user.unwrap().label(), Some("sam"));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unmount_discards_results() {
        let catalog = Arc::new(FlakyCatalog::default());
        let (home, _) = home(catalog);
        home.mount();
        home.unmount();
        home.settle().await;

        assert!(home.state().catalog.is_pending());
        assert!(!home.sync_session());
        assert!(!home.retry_catalog());
    }

    #[tokio::test]
    async fn test_surface_transitions_publish_state() {
        let (home, _) = home(Arc::new(FlakyCatalog::default()));
        let mut rx = home.subscribe();

        assert!(!home.checkout());
        assert!(!rx.has_changed().unwrap());

        assert!(home.open_cart());
        assert_eq!(rx.borrow_and_update().surface, ActiveSurface::Cart);
        assert!(home.checkout());
        assert_eq!(rx.borrow_and_update().surface, ActiveSurface::Checkout);
        assert!(!home.open_cart());
        assert!(home.close_purchase_form());
        assert_eq!(home.state().surface, ActiveSurface::Browsing);
    }

    #[tokio::test]
    async fn test_render_never_mixes_sessions() {
        let (home, identity) = home(Arc::new(FlakyCatalog::default()));
        identity.signed_in.store(true, Ordering::SeqCst);
        home.mount();
        home.settle().await;

        // Provider flips without notifying; the view stays on the loaded session.
        identity.signed_in.store(false, Ordering::SeqCst);
        let view = home.render();
        assert!(view.navbar.is_authenticated);
        assert!(view.user_profile.is_some());

        assert!(home.sync_session());
        let view = home.render();
        assert!(!view.navbar.is_authenticated);
        assert!(view.user_profile.is_none());
    }

    #[tokio::test]
    async fn test_render_uses_live_cart() {
        let (home, _) = home(Arc::new(FlakyCatalog::default()));
        home.cart()
            .add(Product::new("a", "Mug", Decimal::from(5)), Quantity::ONE);
        assert_eq!(home.render().navbar.cart_count, 1);
        assert!(!home.render().navbar.is_authenticated);
    }
}
