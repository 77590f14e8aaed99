//! In-memory backend for tests and offline demos.
//!
//! Behaves like the contacts server: accounts with passwords, opaque tokens,
//! per-owner records with sequential ids (`"1"`, `"2"`, ...) and the same error
//! reasons. Every call is recorded so callers can assert which endpoints were
//! hit, and the whole backend can be switched offline to simulate transport
//! failures.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use store::{Contact, ContactFields, ContactId};

use crate::backend::Backend;
use crate::error::ApiError;
use crate::models::{Credentials, LoginResponse, RegisterProfile, UserInfo};

/// Endpoint hit on a [`MemoryBackend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    Me,
    Login,
    Register,
    List,
    Create,
    Update,
    Delete,
}

#[derive(Debug)]
struct Account {
    user: UserInfo,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    accounts: Vec<Account>,
    tokens: HashMap<String, String>,
    contacts: Vec<Contact>,
    next_user: u64,
    next_contact: u64,
    next_token: u64,
    calls: Vec<Call>,
    offline: bool,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account directly, bypassing validation.
    pub fn add_user(&self, name: &str, email: &str, password: &str) -> UserInfo {
        let mut state = self.state.lock();
        state.next_user += 1;
        let user = UserInfo {
            id: format!("user-{}", state.next_user),
            email: email.to_string(),
            name: Some(name.to_string()),
        };
        state.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }

    /// Issue a valid token for `user_id` without a login call.
    pub fn issue_token(&self, user_id: &str) -> String {
        let mut state = self.state.lock();
        Self::mint_token(&mut state, user_id)
    }

    /// Invalidate a token, as server-side expiry would.
    pub fn revoke(&self, token: &str) {
        self.state.lock().tokens.remove(token);
    }

    /// Store a record for `owner_id` and return it with its new id.
    pub fn seed_contact(&self, owner_id: &str, fields: ContactFields) -> Contact {
        let mut state = self.state.lock();
        Self::insert_contact(&mut state, owner_id, fields)
    }

    /// All records held for `owner_id`, in insertion order.
    pub fn contacts_of(&self, owner_id: &str) -> Vec<Contact> {
        Self::owned(&self.state.lock(), owner_id)
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    fn mint_token(state: &mut State, user_id: &str) -> String {
        state.next_token += 1;
        let token = format!("token-{}", state.next_token);
        state.tokens.insert(token.clone(), user_id.to_string());
        token
    }

    fn insert_contact(state: &mut State, owner_id: &str, fields: ContactFields) -> Contact {
        state.next_contact += 1;
        let contact = Contact {
            id: Some(ContactId::new(state.next_contact.to_string())),
            owner: Some(owner_id.to_string()),
            ..Contact::local(fields)
        };
        state.contacts.push(contact.clone());
        contact
    }

    fn owned(state: &State, owner_id: &str) -> Vec<Contact> {
        state
            .contacts
            .iter()
            .filter(|c| c.owner.as_deref() == Some(owner_id))
            .cloned()
            .collect()
    }

    /// Record the call and fail it if offline.
    fn enter(&self, call: Call) -> Result<parking_lot::MutexGuard<'_, State>, ApiError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.offline {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        Ok(state)
    }

    fn authorize(state: &State, token: &str) -> Result<String, ApiError> {
        state
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::Auth("Unauthorized!".to_string()))
    }
}

impl Backend for MemoryBackend {
    async fn me(&self, token: &str) -> Result<UserInfo, ApiError> {
        let state = self.enter(Call::Me)?;
        let user_id = Self::authorize(&state, token)?;
        state
            .accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
            .ok_or_else(|| ApiError::Auth("Unauthorized!".to_string()))
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let mut state = self.enter(Call::Login)?;
        let email = credentials.email.trim().to_lowercase();
        let user = state
            .accounts
            .iter()
            .find(|a| a.user.email == email && a.password == credentials.password)
            .map(|a| a.user.clone())
            .ok_or_else(|| ApiError::Auth("Invalid email or password!".to_string()))?;
        let token = Self::mint_token(&mut state, &user.id);
        Ok(LoginResponse { token, user })
    }

    async fn register(&self, profile: &RegisterProfile) -> Result<(), ApiError> {
        let mut state = self.enter(Call::Register)?;
        let email = profile.email.trim().to_lowercase();
        if state.accounts.iter().any(|a| a.user.email == email) {
            return Err(ApiError::Validation(format!(
                "a user with email [{email}] already exists so please try another one."
            )));
        }
        state.next_user += 1;
        let user = UserInfo {
            id: format!("user-{}", state.next_user),
            email,
            name: Some(profile.name.trim().to_string()),
        };
        state.accounts.push(Account {
            user,
            password: profile.password.clone(),
        });
        Ok(())
    }

    async fn list_contacts(&self, token: &str) -> Result<Vec<Contact>, ApiError> {
        let state = self.enter(Call::List)?;
        let owner = Self::authorize(&state, token)?;
        Ok(Self::owned(&state, &owner))
    }

    async fn create_contact(&self, token: &str, fields: &ContactFields) -> Result<Contact, ApiError> {
        let mut state = self.enter(Call::Create)?;
        let owner = Self::authorize(&state, token)?;
        fields.validate().map_err(ApiError::Validation)?;
        Ok(Self::insert_contact(&mut state, &owner, fields.clone()))
    }

    async fn update_contact(
        &self,
        token: &str,
        id: &ContactId,
        fields: &ContactFields,
    ) -> Result<Contact, ApiError> {
        let mut state = self.enter(Call::Update)?;
        let owner = Self::authorize(&state, token)?;
        fields.validate().map_err(ApiError::Validation)?;
        let record = state
            .contacts
            .iter_mut()
            .find(|c| c.id.as_ref() == Some(id) && c.owner.as_deref() == Some(owner.as_str()))
            .ok_or_else(|| ApiError::NotFound("no contact found".to_string()))?;
        record.name = fields.name.clone();
        record.address = fields.address.clone();
        record.email = fields.email.clone();
        record.phone = fields.phone.clone();
        Ok(record.clone())
    }

    async fn delete_contact(&self, token: &str, id: &ContactId) -> Result<Vec<Contact>, ApiError> {
        let mut state = self.enter(Call::Delete)?;
        let owner = Self::authorize(&state, token)?;
        let index = state
            .contacts
            .iter()
            .position(|c| c.id.as_ref() == Some(id) && c.owner.as_deref() == Some(owner.as_str()))
            .ok_or_else(|| ApiError::NotFound("no contact found".to_string()))?;
        state.contacts.remove(index);
        Ok(Self::owned(&state, &owner))
    }
}
