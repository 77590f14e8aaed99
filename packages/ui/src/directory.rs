//! The directory controller: the authenticated user's contacts as the client
//! sees them.
//!
//! One [`Snapshot`] exists per authenticated user. It is tagged with the
//! owner's id and thrown away as soon as the session no longer belongs to
//! that owner (logout, expiry, another login), so a snapshot can never hold
//! records of two users. Re-verifying the same user on navigation keeps it.
//!
//! Server round-trips do not hold the lock while awaiting. When a response
//! arrives it is applied only if the session still belongs to the owner the
//! request was made for. Overlapping mutations are not sequenced: whichever
//! response is applied last wins.

use std::sync::Arc;

use api::{ApiError, Backend};
use parking_lot::Mutex;
use store::{Contact, ContactFields, ContactId, Snapshot, SortKey, SortState};

use crate::notifications::NETWORK_FAILURE;
use crate::session::SessionManager;

#[derive(Debug, Default)]
pub(crate) struct DirectoryState {
    owner: Option<String>,
    pub(crate) snapshot: Snapshot,
    opened: Option<ContactId>,
}

impl DirectoryState {
    /// Close the detail view if its record is gone.
    pub(crate) fn prune_opened(&mut self) {
        if let Some(id) = &self.opened {
            if !self.snapshot.contains(id) {
                tracing::debug!(%id, "closing detail view of removed contact");
                self.opened = None;
            }
        }
    }

    pub(crate) fn close(&mut self) {
        self.opened = None;
    }
}

pub struct DirectoryController<B> {
    manager: SessionManager<B>,
    state: Arc<Mutex<DirectoryState>>,
}

impl<B: Clone> Clone for DirectoryController<B> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<B: Backend + Clone> DirectoryController<B> {
    pub fn new(manager: SessionManager<B>) -> Self {
        Self {
            manager,
            state: Arc::new(Mutex::new(DirectoryState::default())),
        }
    }

    pub fn manager(&self) -> &SessionManager<B> {
        &self.manager
    }

    /// Fetch the owned collection and replace the snapshot with it. Clears
    /// the search string; keeps the sort.
    pub async fn load(&self) -> Result<Vec<Contact>, ApiError> {
        self.fetch(None).await
    }

    /// The explicit "reload" action. Same as [`load`](Self::load) with its own
    /// message when the server cannot be reached.
    pub async fn reload(&self) -> Result<Vec<Contact>, ApiError> {
        self.fetch(Some("Error reloading contacts")).await
    }

    async fn fetch(&self, network_message: Option<&str>) -> Result<Vec<Contact>, ApiError> {
        let (token, owner) = self.bearer()?;
        let records = match self.manager.backend().list_contacts(&token).await {
            Ok(records) => records,
            Err(err) => return Err(self.fail(err, network_message)),
        };
        let records = retain_owned(records, &owner);
        tracing::info!(count = records.len(), "contacts loaded");

        self.apply(&owner, |state| {
            state.snapshot.clear_search();
            state.snapshot.replace_base(records);
            state.prune_opened();
            state.snapshot.visible()
        })
    }

    pub async fn create(&self, fields: ContactFields) -> Result<Contact, ApiError> {
        if let Err(reason) = fields.validate() {
            return Err(self.fail(ApiError::Validation(reason), None));
        }
        let (token, owner) = self.bearer()?;
        let record = match self.manager.backend().create_contact(&token, &fields).await {
            Ok(record) => record,
            Err(err) => return Err(self.fail(err, None)),
        };
        if record.id.is_none() {
            return Err(self.fail(ApiError::Parse("Created contact has no id".to_string()), None));
        }
        let record = self.check_owner(record, &owner)?;

        let stored = record.clone();
        self.apply(&owner, move |state| state.snapshot.upsert(stored))?;
        self.manager
            .notifications()
            .success(&format!("Created {} contact", record.name));
        Ok(record)
    }

    pub async fn update(&self, id: &ContactId, fields: ContactFields) -> Result<Contact, ApiError> {
        if let Err(reason) = fields.validate() {
            return Err(self.fail(ApiError::Validation(reason), None));
        }
        let (token, owner) = self.bearer()?;
        let mut record = match self.manager.backend().update_contact(&token, id, &fields).await {
            Ok(record) => record,
            Err(err) => return Err(self.fail(err, None)),
        };
        if record.id.is_none() {
            record.id = Some(id.clone());
        }
        let record = self.check_owner(record, &owner)?;

        let stored = record.clone();
        self.apply(&owner, move |state| state.snapshot.upsert(stored))?;
        self.manager
            .notifications()
            .success(&format!("Updated {} contact", record.name));
        Ok(record)
    }

    /// Delete a record. The server's remaining collection replaces the
    /// snapshot; the detail view closes if it showed the deleted record.
    pub async fn delete(&self, id: &ContactId) -> Result<Vec<Contact>, ApiError> {
        let (token, owner) = self.bearer()?;
        let remaining = match self.manager.backend().delete_contact(&token, id).await {
            Ok(remaining) => retain_owned(remaining, &owner),
            Err(err) => return Err(self.fail(err, None)),
        };

        let visible = self.apply(&owner, |state| {
            state.snapshot.replace_base(remaining);
            if state.opened.as_ref() == Some(id) {
                state.opened = None;
            }
            state.prune_opened();
            state.snapshot.visible()
        })?;
        self.manager.notifications().success("Deleted contact");
        Ok(visible)
    }

    /// Filter by name. `search("")` restores the full set.
    pub fn search(&self, query: &str) -> Vec<Contact> {
        self.with_state(|state| state.snapshot.search(query))
    }

    /// Sort by `key`, toggling direction when `key` is already active.
    pub fn sort(&self, key: SortKey) -> Vec<Contact> {
        self.with_state(|state| {
            let SortState { key, direction } = state.snapshot.sort(key);
            tracing::debug!(%key, ?direction, "contacts sorted");
            state.snapshot.visible()
        })
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.with_state(|state| state.snapshot.sort_state())
    }

    pub fn query(&self) -> String {
        self.with_state(|state| state.snapshot.query().to_string())
    }

    pub fn visible(&self) -> Vec<Contact> {
        self.with_state(|state| state.snapshot.visible())
    }

    pub fn visible_count(&self) -> usize {
        self.with_state(|state| state.snapshot.visible_count())
    }

    pub fn is_empty(&self) -> bool {
        self.visible_count() == 0
    }

    pub fn get(&self, id: &ContactId) -> Option<Contact> {
        self.with_state(|state| state.snapshot.get(id).cloned())
    }

    /// Show one record in the detail view.
    pub fn open(&self, id: &ContactId) -> Option<Contact> {
        self.with_state(|state| {
            let record = state.snapshot.get(id).cloned();
            if record.is_some() {
                state.opened = Some(id.clone());
            }
            record
        })
    }

    pub fn close(&self) {
        self.with_state(DirectoryState::close);
    }

    pub fn opened(&self) -> Option<Contact> {
        self.with_state(|state| {
            let id = state.opened.clone()?;
            state.snapshot.get(&id).cloned()
        })
    }

    /// Run `f` on the state of the current session's owner, discarding any
    /// snapshot that belongs to someone else first.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut DirectoryState) -> R) -> R {
        let current = self.manager.session().owner();
        let mut state = self.state.lock();
        if state.owner != current {
            if state.owner.is_some() {
                tracing::debug!("discarding contacts of a previous session");
            }
            *state = DirectoryState {
                owner: current,
                ..DirectoryState::default()
            };
        }
        f(&mut state)
    }

    /// Apply a server response, unless the session changed hands while it
    /// was in flight.
    pub(crate) fn apply<R>(
        &self,
        owner: &str,
        f: impl FnOnce(&mut DirectoryState) -> R,
    ) -> Result<R, ApiError> {
        let current = self.manager.session().owner();
        if current.as_deref() != Some(owner) {
            tracing::debug!(owner, "discarding response for a session that ended");
            return Err(ApiError::not_authenticated());
        }
        Ok(self.with_state(f))
    }

    /// Token and user id for an authenticated call.
    pub(crate) fn bearer(&self) -> Result<(String, String), ApiError> {
        let owner = self.manager.session().owner();
        let token = self.manager.tokens().get();
        match (token, owner) {
            (Some(token), Some(owner)) => Ok((token, owner)),
            _ => {
                let err = ApiError::not_authenticated();
                self.manager.notifications().error(err.reason());
                Err(err)
            }
        }
    }

    /// Turn a failed call into its notification. A rejected token also ends
    /// the session.
    pub(crate) fn fail(&self, err: ApiError, network_message: Option<&str>) -> ApiError {
        tracing::debug!(kind = err.kind(), reason = %err, "contacts call failed");
        match &err {
            ApiError::Network(reason) => {
                tracing::warn!(%reason, "contacts request failed");
                self.manager
                    .notifications()
                    .error(network_message.unwrap_or(NETWORK_FAILURE));
            }
            ApiError::Auth(_) => {
                self.manager.notifications().error(err.reason());
                self.manager.expire();
            }
            other => self.manager.notifications().error(other.reason()),
        }
        err
    }

    fn check_owner(&self, record: Contact, owner: &str) -> Result<Contact, ApiError> {
        if record.is_owned_by(owner) {
            return Ok(record);
        }
        tracing::warn!(id = ?record.id, "server returned a contact owned by another user");
        Err(self.fail(ApiError::Parse("Unexpected contact owner".to_string()), None))
    }
}

/// Drop records whose owner is set and is not `owner`.
fn retain_owned(records: Vec<Contact>, owner: &str) -> Vec<Contact> {
    let before = records.len();
    let records: Vec<Contact> = records
        .into_iter()
        .filter(|c| c.is_owned_by(owner))
        .collect();
    if records.len() != before {
        tracing::warn!(dropped = before - records.len(), "discarded contacts owned by another user");
    }
    records
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use api::{Credentials, LoginResponse, MemoryBackend, RegisterProfile, UserInfo};
    use store::{ClientConfig, MemoryTokenStore, SortDirection, TokenStore};

    use super::*;
    use crate::navigation::Route;
    use crate::notifications::LogLevel;
    use crate::session::SessionState;

    struct Fixture {
        backend: MemoryBackend,
        directory: DirectoryController<MemoryBackend>,
        user_id: String,
    }

    fn fields(name: &str, phone: &str) -> ContactFields {
        ContactFields::new(name, "1 Main St", format!("{}@x.com", name.to_lowercase()), phone)
    }

    async fn signed_in() -> Fixture {
        let backend = MemoryBackend::new();
        let user = backend.add_user("Ada", "a@x.com", "p");
        backend.seed_contact(&user.id, fields("Carol", "300"));
        backend.seed_contact(&user.id, fields("alice", "20"));
        backend.seed_contact(&user.id, fields("Bob", "1000"));
        let token = backend.issue_token(&user.id);

        let config = ClientConfig::default().with_redirect_delay(Duration::ZERO);
        let manager = SessionManager::new(
            backend.clone(),
            Arc::new(MemoryTokenStore::with_token(&token)),
            &config,
        );
        manager.start("/mycontacts").await;
        Fixture {
            backend,
            directory: DirectoryController::new(manager),
            user_id: user.id,
        }
    }

    fn names(records: &[Contact]) -> Vec<&str> {
        records.iter().map(|c| c.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_keeps_server_order_until_sorted() {
        let fx = signed_in().await;
        let loaded = fx.directory.load().await.unwrap();
        assert_eq!(names(&loaded), ["Carol", "alice", "Bob"]);
        assert_eq!(fx.directory.visible_count(), 3);
        assert!(fx.directory.manager().notifications().is_empty());
    }

    #[tokio::test]
    async fn test_load_clears_search_and_keeps_sort() {
        let fx = signed_in().await;
        fx.directory.load().await.unwrap();
        fx.directory.sort(SortKey::Name);
        fx.directory.sort(SortKey::Name);
        fx.directory.search("bo");
        assert_eq!(fx.directory.visible_count(), 1);

        let reloaded = fx.directory.load().await.unwrap();
        assert_eq!(fx.directory.query(), "");
        assert_eq!(names(&reloaded), ["Carol", "Bob", "alice"]);
        assert_eq!(
            fx.directory.sort_state().map(|s| s.direction),
            Some(SortDirection::Descending)
        );
    }

    #[tokio::test]
    async fn test_failed_load_leaves_snapshot() {
        let fx = signed_in().await;
        fx.directory.load().await.unwrap();
        fx.backend.set_offline(true);

        let err = fx.directory.reload().await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(fx.directory.visible_count(), 3);
        let last = fx.directory.manager().notifications().last().unwrap();
        assert_eq!(last.level, LogLevel::Error);
        assert_eq!(last.message, "Error reloading contacts");
    }

    #[tokio::test]
    async fn test_search_is_reversible() {
        let fx = signed_in().await;
        fx.directory.load().await.unwrap();
        let sorted = fx.directory.sort(SortKey::Phone);

        assert_eq!(names(&fx.directory.search("AL")), ["alice"]);
        assert_eq!(fx.directory.search("zz"), Vec::<Contact>::new());
        assert_eq!(fx.directory.search(""), sorted);
    }

    #[tokio::test]
    async fn test_sort_name_twice_reverses() {
        let fx = signed_in().await;
        fx.directory.load().await.unwrap();
        let first = fx.directory.sort(SortKey::Name);
        let second = fx.directory.sort(SortKey::Name);
        assert_eq!(names(&first), ["alice", "Bob", "Carol"]);
        let mut reversed = first.clone();
        reversed.reverse();
        assert_eq!(second, reversed);

        // switching key starts ascending again
        let by_phone = fx.directory.sort(SortKey::Phone);
        assert_eq!(names(&by_phone), ["alice", "Carol", "Bob"]);
    }

    #[tokio::test]
    async fn test_create_and_update_patch_snapshot() {
        let fx = signed_in().await;
        fx.directory.load().await.unwrap();
        fx.directory.sort(SortKey::Name);

        let dave = fx.directory.create(fields("Dave", "5")).await.unwrap();
        assert_eq!(names(&fx.directory.visible()), ["alice", "Bob", "Carol", "Dave"]);

        let id = dave.id.clone().unwrap();
        fx.directory.update(&id, fields("Aaron", "5")).await.unwrap();
        assert_eq!(names(&fx.directory.visible()), ["Aaron", "alice", "Bob", "Carol"]);
        assert_eq!(fx.backend.contacts_of(&fx.user_id).len(), 4);

        let messages: Vec<String> = fx
            .directory
            .manager()
            .notifications()
            .entries()
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(messages, ["Created Dave contact", "Updated Aaron contact"]);
    }

    #[tokio::test]
    async fn test_invalid_fields_never_reach_server() {
        let fx = signed_in().await;
        let calls = fx.backend.call_count();
        let err = fx
            .directory
            .create(ContactFields::new("Dave", "", "dave@x.com", "5"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(fx.backend.call_count(), calls);
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let fx = signed_in().await;
        fx.directory.load().await.unwrap();
        let err = fx
            .directory
            .update(&ContactId::new("999"), fields("Zed", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(fx.directory.visible_count(), 3);
    }

    #[tokio::test]
    async fn test_delete_closes_detail_view() {
        let fx = signed_in().await;
        fx.directory.load().await.unwrap();
        let id = ContactId::new("2");
        assert_eq!(fx.directory.open(&id).map(|c| c.name), Some("alice".to_string()));

        let remaining = fx.directory.delete(&id).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(fx.directory.opened().is_none());
        assert_eq!(
            fx.directory.manager().notifications().last().map(|n| n.message),
            Some("Deleted contact".to_string())
        );
    }

    #[tokio::test]
    async fn test_rejected_token_ends_session() {
        let fx = signed_in().await;
        fx.directory.load().await.unwrap();
        let token = fx.directory.manager().tokens().get().unwrap();
        fx.backend.revoke(&token);

        let err = fx.directory.load().await.unwrap_err();
        assert!(err.is_auth());
        let manager = fx.directory.manager();
        assert_eq!(manager.state(), SessionState::Anonymous);
        assert!(manager.tokens().get().is_none());
        assert_eq!(manager.navigator().current(), Some(Route::Login));
        assert!(fx.directory.is_empty());
    }

    #[tokio::test]
    async fn test_logout_discards_snapshot_and_blocks_calls() {
        let fx = signed_in().await;
        fx.directory.load().await.unwrap();
        fx.directory.manager().logout();

        assert!(fx.directory.visible().is_empty());
        let calls = fx.backend.call_count();
        let err = fx.directory.load().await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(fx.backend.call_count(), calls);
    }

    /// Wraps the memory backend with a fixed `me` latency and queued
    /// `list_contacts` latencies. A listing is read before its delay, so a
    /// slow response carries the data as it was when the call started.
    #[derive(Clone)]
    struct Delayed {
        inner: MemoryBackend,
        me_delay: Duration,
        list_delays: Arc<Mutex<VecDeque<Duration>>>,
    }

    impl Delayed {
        fn queue_list_delay(&self, delay: Duration) {
            self.list_delays.lock().push_back(delay);
        }
    }

    impl Backend for Delayed {
        async fn me(&self, token: &str) -> Result<UserInfo, ApiError> {
            tokio::time::sleep(self.me_delay).await;
            self.inner.me(token).await
        }

        async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
            self.inner.login(credentials).await
        }

        async fn register(&self, profile: &RegisterProfile) -> Result<(), ApiError> {
            self.inner.register(profile).await
        }

        async fn list_contacts(&self, token: &str) -> Result<Vec<Contact>, ApiError> {
            let delay = self.list_delays.lock().pop_front().unwrap_or_default();
            let result = self.inner.list_contacts(token).await;
            tokio::time::sleep(delay).await;
            result
        }

        async fn create_contact(&self, token: &str, fields: &ContactFields) -> Result<Contact, ApiError> {
            self.inner.create_contact(token, fields).await
        }

        async fn update_contact(
            &self,
            token: &str,
            id: &ContactId,
            fields: &ContactFields,
        ) -> Result<Contact, ApiError> {
            self.inner.update_contact(token, id, fields).await
        }

        async fn delete_contact(&self, token: &str, id: &ContactId) -> Result<Vec<Contact>, ApiError> {
            self.inner.delete_contact(token, id).await
        }
    }

    async fn signed_in_delayed(me_delay: Duration) -> (Delayed, DirectoryController<Delayed>, String) {
        let inner = MemoryBackend::new();
        let user = inner.add_user("Ada", "a@x.com", "p");
        inner.seed_contact(&user.id, fields("Carol", "300"));
        inner.seed_contact(&user.id, fields("alice", "20"));
        inner.seed_contact(&user.id, fields("Bob", "1000"));
        let token = inner.issue_token(&user.id);

        let backend = Delayed {
            inner,
            me_delay,
            list_delays: Arc::default(),
        };
        let manager = SessionManager::new(
            backend.clone(),
            Arc::new(MemoryTokenStore::with_token(&token)),
            &ClientConfig::default().with_redirect_delay(Duration::ZERO),
        );
        manager.start("/mycontacts").await;
        (backend, DirectoryController::new(manager), user.id)
    }

    #[tokio::test]
    async fn test_reverification_keeps_snapshot() {
        let (_, directory, _) = signed_in_delayed(Duration::from_millis(50)).await;
        directory.load().await.unwrap();
        let manager = directory.manager().clone();

        let (state, during) = tokio::join!(manager.navigate("/mycontacts"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            (directory.manager().state(), directory.visible_count())
        });

        assert!(state.is_authenticated());
        assert_eq!(during, (SessionState::Verifying, 3));
        assert_eq!(directory.visible_count(), 3);
        assert!(manager.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_load_while_reverifying() {
        let (_, directory, _) = signed_in_delayed(Duration::from_millis(50)).await;
        let manager = directory.manager().clone();

        let (state, loaded) = tokio::join!(manager.navigate("/mycontacts"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            directory.load().await
        });

        assert!(state.is_authenticated());
        assert_eq!(loaded.unwrap().len(), 3);
        assert_eq!(directory.visible_count(), 3);
        assert!(manager.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_loads_last_response_wins() {
        let (backend, directory, user_id) = signed_in_delayed(Duration::ZERO).await;
        backend.queue_list_delay(Duration::from_millis(60));

        let (first, second) = tokio::join!(directory.load(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            backend.inner.seed_contact(&user_id, fields("Dave", "4"));
            directory.load().await
        });

        assert_eq!(first.unwrap().len(), 3);
        assert_eq!(second.unwrap().len(), 4);
        // the older listing arrived last and replaced the newer one
        assert_eq!(directory.visible_count(), 3);
        assert!(directory.get(&ContactId::new("4")).is_none());
    }

    #[tokio::test]
    async fn test_empty_collection_sort_and_search() {
        let backend = MemoryBackend::new();
        let user = backend.add_user("Ada", "a@x.com", "p");
        let token = backend.issue_token(&user.id);
        let manager = SessionManager::new(
            backend.clone(),
            Arc::new(MemoryTokenStore::with_token(&token)),
            &ClientConfig::default().with_redirect_delay(Duration::ZERO),
        );
        manager.start("/").await;
        let directory = DirectoryController::new(manager);

        assert!(directory.load().await.unwrap().is_empty());
        assert!(directory.sort(SortKey::Phone).is_empty());
        assert!(directory.search("x").is_empty());
        assert!(directory.is_empty());
    }
}
