//! # HTTP backend over `reqwest`
//!
//! [`HttpBackend`] implements [`Backend`] against a running contacts server.
//! Authenticated calls send `Authorization: Bearer <token>`; bodies are JSON.
//!
//! Every response is decoded the same way, whatever its status: a JSON object
//! with an `error` field is a server-reported failure (classified with
//! [`ApiError::from_status`]), anything else on a non-success status is a
//! failure carrying the status text, and a success body is decoded into the
//! expected payload. Transport errors become [`ApiError::Network`].

use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use store::{Contact, ContactFields, ContactId};

use crate::backend::Backend;
use crate::error::ApiError;
use crate::models::{
    ContactEnvelope, ContactListEnvelope, Credentials, DeletedEnvelope, ErrorEnvelope,
    LoginResponse, RegisterProfile, UserInfo,
};

#[derive(Clone, Debug)]
pub struct HttpBackend {
    base: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base).map_err(|e| ApiError::Parse(format!("invalid base URL: {e}")))?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("contacts/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::Parse(format!("invalid path {path}: {e}")))
    }

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        tracing::debug!(%method, %url, "backend request");

        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        decode(status, &text)
    }
}

/// Decode a response body according to the uniform error convention.
fn decode<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<T, ApiError> {
    if let Ok(ErrorEnvelope { error }) = serde_json::from_str::<ErrorEnvelope>(text) {
        let code = if status.is_success() { 400 } else { status.as_u16() };
        return Err(ApiError::from_status(code, error));
    }
    if !status.is_success() {
        let reason = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        return Err(ApiError::from_status(status.as_u16(), reason));
    }
    serde_json::from_str(text).map_err(|e| ApiError::Parse(format!("unexpected response: {e}")))
}

impl Backend for HttpBackend {
    async fn me(&self, token: &str) -> Result<UserInfo, ApiError> {
        self.send::<UserInfo, ()>(Method::GET, "/api/me", Some(token), None)
            .await
            // an error payload from /api/me always means the token is unusable
            .map_err(|e| match e {
                ApiError::Validation(reason) | ApiError::NotFound(reason) => ApiError::Auth(reason),
                other => other,
            })
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.send(Method::POST, "/api/login", None, Some(credentials))
            .await
    }

    async fn register(&self, profile: &RegisterProfile) -> Result<(), ApiError> {
        self.send::<serde_json::Value, _>(Method::POST, "/api/register", None, Some(profile))
            .await
            .map(|_| ())
    }

    async fn list_contacts(&self, token: &str) -> Result<Vec<Contact>, ApiError> {
        self.send::<ContactListEnvelope, ()>(Method::GET, "/api/mycontacts", Some(token), None)
            .await
            .map(|envelope| envelope.contacts)
    }

    async fn create_contact(&self, token: &str, fields: &ContactFields) -> Result<Contact, ApiError> {
        self.send::<ContactEnvelope, _>(Method::POST, "/api/create", Some(token), Some(fields))
            .await
            .and_then(ContactEnvelope::into_contact)
    }

    async fn update_contact(
        &self,
        token: &str,
        id: &ContactId,
        fields: &ContactFields,
    ) -> Result<Contact, ApiError> {
        let path = format!("/api/edit/{id}");
        self.send::<ContactEnvelope, _>(Method::PUT, &path, Some(token), Some(fields))
            .await
            .and_then(ContactEnvelope::into_contact)
    }

    async fn delete_contact(&self, token: &str, id: &ContactId) -> Result<Vec<Contact>, ApiError> {
        let path = format!("/api/delete/{id}");
        self.send::<DeletedEnvelope, ()>(Method::DELETE, &path, Some(token), None)
            .await
            .map(|envelope| envelope.my_contacts)
    }
}
