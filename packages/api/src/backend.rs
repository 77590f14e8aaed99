//! The backend seam: every call the client core makes to the server.
//!
//! | Method | Endpoint | Auth |
//! |--------|----------|------|
//! | [`me`](Backend::me) | `GET /api/me` | bearer |
//! | [`login`](Backend::login) | `POST /api/login` | none |
//! | [`register`](Backend::register) | `POST /api/register` | none |
//! | [`list_contacts`](Backend::list_contacts) | `GET /api/mycontacts` | bearer |
//! | [`create_contact`](Backend::create_contact) | `POST /api/create` | bearer |
//! | [`update_contact`](Backend::update_contact) | `PUT /api/edit/:id` | bearer |
//! | [`delete_contact`](Backend::delete_contact) | `DELETE /api/delete/:id` | bearer |
//!
//! The token is passed explicitly on every authenticated call; implementations
//! never hold one of their own.

use std::future::Future;

use store::{Contact, ContactFields, ContactId};

use crate::error::ApiError;
use crate::models::{Credentials, LoginResponse, RegisterProfile, UserInfo};

/// Async interface to the contacts server.
pub trait Backend {
    fn me(&self, token: &str) -> impl Future<Output = Result<UserInfo, ApiError>>;

    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>>;

    fn register(&self, profile: &RegisterProfile) -> impl Future<Output = Result<(), ApiError>>;

    fn list_contacts(&self, token: &str) -> impl Future<Output = Result<Vec<Contact>, ApiError>>;

    fn create_contact(
        &self,
        token: &str,
        fields: &ContactFields,
    ) -> impl Future<Output = Result<Contact, ApiError>>;

    fn update_contact(
        &self,
        token: &str,
        id: &ContactId,
        fields: &ContactFields,
    ) -> impl Future<Output = Result<Contact, ApiError>>;

    /// Delete a record; returns the owner's remaining records.
    fn delete_contact(
        &self,
        token: &str,
        id: &ContactId,
    ) -> impl Future<Output = Result<Vec<Contact>, ApiError>>;
}
