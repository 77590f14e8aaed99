//! Response envelopes of the contact endpoints.

use serde::{Deserialize, Serialize};
use store::Contact;

use crate::error::ApiError;

/// `GET /api/mycontacts` → `{ "contacts": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactListEnvelope {
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

/// `DELETE /api/delete/:id` → `{ "myContacts": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedEnvelope {
    #[serde(rename = "myContacts", alias = "contacts", default)]
    pub my_contacts: Vec<Contact>,
}

/// Create and edit responses: `{ "contact": {...} }` or the bare record.
///
/// Every contact field has a default, so any JSON object would decode as a
/// bare record; one without an `_id` is rejected instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContactEnvelope {
    Wrapped { contact: Contact },
    Bare(Contact),
}

impl ContactEnvelope {
    pub fn into_contact(self) -> Result<Contact, ApiError> {
        match self {
            ContactEnvelope::Wrapped { contact } => Ok(contact),
            ContactEnvelope::Bare(contact) if contact.id.is_some() => Ok(contact),
            ContactEnvelope::Bare(_) => Err(ApiError::Parse(
                "unexpected response: contact without an id".to_string(),
            )),
        }
    }
}

/// `{ "error": "<reason>" }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}
