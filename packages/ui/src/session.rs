//! Session state and the manager that drives it.
//!
//! ```text
//!   Anonymous ──token present──▶ Verifying ──/api/me ok──▶ Authenticated
//!       ▲                          │   │                      │   │
//!       │                  network │   │ rejected             │   │ logout
//!       ├──────────────────────────┘   ▼                      │   │
//!       └──────────────────────── Expired ◀──── rejected ─────┘   │
//!       ▲                                                         │
//!       └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every verification, login and logout bumps a generation counter; a
//! verification whose generation is no longer current when its response
//! arrives is dropped, so a slow `/api/me` can never resurrect a session that
//! was logged out in the meantime.

use std::sync::Arc;
use std::time::Duration;

use api::{ApiError, Backend, UserInfo};
use parking_lot::Mutex;
use store::{ClientConfig, TokenStore};

use crate::navigation::{Navigator, Route};
use crate::notifications::Notifications;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Verifying,
    Authenticated(UserInfo),
    Expired,
}

impl SessionState {
    pub fn user(&self) -> Option<&UserInfo> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    fn can_become(&self, next: &SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Anonymous, Verifying)
                | (Verifying, Verifying)
                | (Verifying, Authenticated(_))
                | (Verifying, Expired)
                | (Verifying, Anonymous)
                | (Authenticated(_), Verifying)
                | (Authenticated(_), Expired)
                | (Authenticated(_), Anonymous)
                | (Expired, Anonymous)
        )
    }

    fn name(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Verifying => "verifying",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Expired => "expired",
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    generation: u64,
    /// Id of the last verified user. Survives `Verifying` so a re-verification
    /// does not look like a change of hands; cleared on `Anonymous`/`Expired`
    /// and when a login starts.
    owner: Option<String>,
}

impl Inner {
    fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_become(&next) {
            tracing::warn!(from = self.state.name(), to = next.name(), "ignoring invalid session transition");
            return false;
        }
        tracing::debug!(from = self.state.name(), to = next.name(), "session transition");
        match &next {
            SessionState::Authenticated(user) => self.owner = Some(user.id.clone()),
            SessionState::Anonymous | SessionState::Expired => self.owner = None,
            SessionState::Verifying => {}
        }
        self.state = next;
        true
    }
}

/// Process-wide session state. Starts [`SessionState::Anonymous`]; clones
/// share it.
#[derive(Clone, Debug)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Anonymous,
                generation: 0,
                owner: None,
            })),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    pub fn user(&self) -> Option<UserInfo> {
        self.inner.lock().state.user().cloned()
    }

    /// Id of the user whose data the client may hold: the authenticated
    /// user, or while re-verifying, the user verified last.
    pub fn owner(&self) -> Option<String> {
        self.inner.lock().owner.clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Move to `next` if the transition is allowed. Illegal transitions are
    /// logged and ignored.
    fn transition(&self, next: SessionState) -> bool {
        self.inner.lock().transition(next)
    }

    /// Like [`transition`](Self::transition), but only while `generation` is
    /// still current.
    fn transition_if(&self, generation: u64, next: SessionState) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return false;
        }
        inner.transition(next)
    }

    /// Start a new verification round: enter `Verifying` and return its
    /// generation.
    fn begin(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.transition(SessionState::Verifying);
        inner.generation
    }

    /// Start a login round: like [`begin`](Self::begin), but the identity
    /// being established is not yet known.
    fn begin_login(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.owner = None;
        inner.transition(SessionState::Verifying);
        inner.generation
    }

    fn bump(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.generation
    }
}

/// Drives the session state machine and owns every collaborator the client
/// controllers share: backend, token store, navigator and notification log.
///
/// Cheap to clone; clones drive the same session.
pub struct SessionManager<B> {
    backend: B,
    tokens: Arc<dyn TokenStore>,
    session: Session,
    navigator: Navigator,
    notifications: Notifications,
    redirect_delay: Duration,
}

impl<B: Clone> Clone for SessionManager<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            tokens: Arc::clone(&self.tokens),
            session: self.session.clone(),
            navigator: self.navigator.clone(),
            notifications: self.notifications.clone(),
            redirect_delay: self.redirect_delay,
        }
    }
}

impl<B: Backend + Clone> SessionManager<B> {
    pub fn new(backend: B, tokens: Arc<dyn TokenStore>, config: &ClientConfig) -> Self {
        Self {
            backend,
            tokens,
            session: Session::new(),
            navigator: Navigator::new(),
            notifications: Notifications::new(),
            redirect_delay: config.redirect_delay(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn user(&self) -> Option<UserInfo> {
        self.session.user()
    }

    /// Landing-view greeting while authenticated.
    pub fn greeting(&self) -> Option<String> {
        self.session
            .user()
            .map(|user| format!("Welcome {}", user.display_name()))
    }

    /// Application start: show `path` and verify the stored token.
    pub async fn start(&self, path: &str) -> SessionState {
        let requested = Route::parse(path);
        if let Some(route) = &requested {
            self.navigator.replace(route.clone());
        }
        self.verify(requested).await
    }

    /// A navigation event: push `path` and re-verify the stored token.
    pub async fn navigate(&self, path: &str) -> SessionState {
        let requested = Route::parse(path);
        if let Some(route) = &requested {
            self.navigator.push(route.clone());
        }
        self.verify(requested).await
    }

    /// Verify the stored token against the server for a navigation to
    /// `requested` (`None` when the requested path was empty or unknown).
    pub async fn verify(&self, requested: Option<Route>) -> SessionState {
        let Some(token) = self.tokens.get() else {
            self.session.bump();
            if self.session.state() != SessionState::Anonymous {
                self.session.transition(SessionState::Anonymous);
            }
            self.guard(requested.as_ref());
            return self.session.state();
        };

        let generation = self.session.begin();
        let result = self.backend.me(&token).await;
        if self.session.generation() != generation {
            tracing::debug!(generation, "discarding stale verification result");
            return self.session.state();
        }

        match result {
            Ok(user) => {
                tracing::info!(user = %user.id, "session verified");
                self.session
                    .transition_if(generation, SessionState::Authenticated(user));
                match requested {
                    Some(route) if route.is_public() => self.leave_public_view(generation).await,
                    Some(_) => {}
                    None => self.navigator.replace(Route::Home),
                }
            }
            Err(ApiError::Network(reason)) => {
                // the token may still be good; keep it for the next attempt
                tracing::warn!(%reason, "session verification failed to reach the server");
                self.session.transition_if(generation, SessionState::Anonymous);
                self.guard(requested.as_ref());
            }
            Err(err) => {
                tracing::debug!(reason = %err, "stored token rejected");
                self.expire();
            }
        }
        self.session.state()
    }

    /// Explicit logout. Local only; never fails.
    pub fn logout(&self) {
        self.session.bump();
        self.tokens.clear();
        if self.session.state() != SessionState::Anonymous {
            self.session.transition(SessionState::Anonymous);
        }
        self.notifications.success("Logged out.");
        self.navigator.replace(Route::Login);
    }

    /// The server rejected the token: `Expired`, drop the token, `Anonymous`,
    /// and force the login view.
    pub(crate) fn expire(&self) {
        self.session.bump();
        if self.session.state() != SessionState::Anonymous {
            self.session.transition(SessionState::Expired);
            self.tokens.clear();
            self.session.transition(SessionState::Anonymous);
        } else {
            self.tokens.clear();
        }
        self.navigator.replace(Route::Login);
    }

    /// Bump the generation and enter `Verifying` for a login round-trip.
    pub(crate) fn begin_login(&self) -> u64 {
        self.session.begin_login()
    }

    pub(crate) fn complete_login(&self, generation: u64, user: UserInfo) -> bool {
        self.session
            .transition_if(generation, SessionState::Authenticated(user))
    }

    /// Anonymous sessions never stay on a protected view.
    fn guard(&self, requested: Option<&Route>) {
        let protected = requested.map_or(true, |route| !route.is_public());
        if protected {
            self.navigator.replace(Route::Login);
        }
    }

    async fn leave_public_view(&self, generation: u64) {
        if !self.redirect_delay.is_zero() {
            tokio::time::sleep(self.redirect_delay).await;
        }
        if self.session.generation() == generation && self.session.state().is_authenticated() {
            self.navigator.replace(Route::Home);
        }
    }
}

#[cfg(test)]
mod tests {
    use api::MemoryBackend;
    use store::MemoryTokenStore;

    use super::*;

    fn manager(backend: &MemoryBackend, token: Option<&str>) -> SessionManager<MemoryBackend> {
        let tokens: Arc<dyn TokenStore> = match token {
            Some(token) => Arc::new(MemoryTokenStore::with_token(token)),
            None => Arc::new(MemoryTokenStore::new()),
        };
        let config = ClientConfig::default().with_redirect_delay(Duration::ZERO);
        SessionManager::new(backend.clone(), tokens, &config)
    }

    #[tokio::test]
    async fn test_no_token_stays_anonymous_without_network() {
        let backend = MemoryBackend::new();
        let manager = manager(&backend, None);

        let state = manager.start("/mycontacts").await;
        assert_eq!(state, SessionState::Anonymous);
        assert_eq!(manager.navigator().current(), Some(Route::Login));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_token_on_public_view_stays_put() {
        let backend = MemoryBackend::new();
        let manager = manager(&backend, None);
        manager.start("/register").await;
        assert_eq!(manager.navigator().current(), Some(Route::Register));
    }

    #[tokio::test]
    async fn test_valid_token_keeps_requested_view() {
        let backend = MemoryBackend::new();
        let user = backend.add_user("Ada", "a@x.com", "p");
        let token = backend.issue_token(&user.id);
        let manager = manager(&backend, Some(&token));

        let state = manager.start("/mycontacts").await;
        assert_eq!(state, SessionState::Authenticated(user));
        assert_eq!(manager.navigator().current(), Some(Route::Contacts));
        assert_eq!(manager.greeting().as_deref(), Some("Welcome Ada"));
    }

    #[tokio::test]
    async fn test_valid_token_leaves_login_view() {
        let backend = MemoryBackend::new();
        let user = backend.add_user("Ada", "a@x.com", "p");
        let token = backend.issue_token(&user.id);
        let manager = manager(&backend, Some(&token));

        manager.start("/login").await;
        assert_eq!(manager.navigator().history(), vec![Route::Home]);

        manager.navigate("").await;
        assert_eq!(manager.navigator().current(), Some(Route::Home));
    }

    #[tokio::test]
    async fn test_rejected_token_expires_session() {
        let backend = MemoryBackend::new();
        let manager = manager(&backend, Some("stale"));

        let state = manager.start("/create").await;
        assert_eq!(state, SessionState::Anonymous);
        assert!(manager.tokens().get().is_none());
        assert_eq!(manager.navigator().history(), vec![Route::Login]);
        // verification failures are never surfaced
        assert!(manager.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_keeps_token() {
        let backend = MemoryBackend::new();
        let user = backend.add_user("Ada", "a@x.com", "p");
        let token = backend.issue_token(&user.id);
        backend.set_offline(true);
        let manager = manager(&backend, Some(&token));

        let state = manager.start("/mycontacts").await;
        assert_eq!(state, SessionState::Anonymous);
        assert_eq!(manager.tokens().get(), Some(token));
        assert!(manager.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_token_and_redirects() {
        let backend = MemoryBackend::new();
        let user = backend.add_user("Ada", "a@x.com", "p");
        let token = backend.issue_token(&user.id);
        let manager = manager(&backend, Some(&token));
        manager.start("/").await;

        manager.logout();
        assert_eq!(manager.state(), SessionState::Anonymous);
        assert!(manager.tokens().get().is_none());
        assert_eq!(manager.navigator().current(), Some(Route::Login));
        assert_eq!(manager.notifications().last().map(|n| n.message), Some("Logged out.".to_string()));
        assert!(manager.greeting().is_none());
    }

    #[test]
    fn test_transitions_cannot_skip_verification() {
        let session = Session::new();
        let user = UserInfo {
            id: "u1".into(),
            email: "a@x.com".into(),
            name: None,
        };
        assert!(!session.transition(SessionState::Authenticated(user.clone())));
        assert!(!session.transition(SessionState::Expired));
        assert!(session.transition(SessionState::Verifying));
        assert!(session.transition(SessionState::Authenticated(user)));
        assert!(session.transition(SessionState::Expired));
        assert!(!session.transition(SessionState::Verifying));
        assert!(session.transition(SessionState::Anonymous));
    }

    #[test]
    fn test_owner_survives_reverification() {
        let session = Session::new();
        let user = UserInfo {
            id: "u1".into(),
            email: "a@x.com".into(),
            name: None,
        };
        session.begin();
        session.transition(SessionState::Authenticated(user));

        session.begin();
        assert_eq!(session.state(), SessionState::Verifying);
        assert_eq!(session.owner().as_deref(), Some("u1"));

        session.begin_login();
        assert!(session.owner().is_none());
        session.transition(SessionState::Anonymous);
        assert!(session.owner().is_none());
    }

    #[test]
    fn test_stale_generation_cannot_transition() {
        let session = Session::new();
        let generation = session.begin();
        session.bump();
        assert!(!session.transition_if(generation, SessionState::Anonymous));
        assert_eq!(session.state(), SessionState::Verifying);
    }
}
