//! # Domain models for contacts
//!
//! Defines the records held in a user's address book and the field sets the
//! client sends when creating or editing one. These types are
//! `Serialize + Deserialize` so they can cross the client/server boundary as
//! JSON.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Contact`] | A single address-book record. The `id` is assigned by the server and serialized as `_id`; the owner is serialized as `postedBy` and is never sent by the client. Imported records carry neither. |
//! | [`ContactId`] | The server-assigned identifier of a record. |
//! | [`ContactFields`] | The four editable fields, as sent to the create and edit endpoints. |
//! | [`SortKey`] / [`SortDirection`] | The columns a directory can be ordered by and the order to apply. |
//!
//! Phone numbers are kept as text but may arrive from the server as JSON
//! numbers; [`Contact`] accepts both.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned identifier of a contact record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A contact record as held in the directory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Server id, absent for records that only exist locally (imports).
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ContactId>,
    /// Id of the owning user, set by the server only.
    #[serde(rename = "postedBy", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "phone_text")]
    pub phone: String,
}

impl Contact {
    /// Build a local-only record (no id, no owner) from its fields.
    pub fn local(fields: ContactFields) -> Self {
        Self {
            id: None,
            owner: None,
            name: fields.name,
            address: fields.address,
            email: fields.email,
            phone: fields.phone,
        }
    }

    /// The editable fields of this record.
    pub fn fields(&self) -> ContactFields {
        ContactFields {
            name: self.name.clone(),
            address: self.address.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    /// Value of the column a [`SortKey`] names.
    pub fn field(&self, key: SortKey) -> &str {
        match key {
            SortKey::Name => &self.name,
            SortKey::Address => &self.address,
            SortKey::Email => &self.email,
            SortKey::Phone => &self.phone,
        }
    }

    /// Whether this record is owned by `user_id`. Records without an owner
    /// (imports, servers that omit the field) are attributed to the caller.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner.as_deref().map_or(true, |owner| owner == user_id)
    }
}

/// Editable fields of a contact, as sent to the create and edit endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

impl ContactFields {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Check the fields before sending them to the server.
    pub fn validate(&self) -> Result<(), String> {
        let missing = [
            ("name", &self.name),
            ("address", &self.address),
            ("email", &self.email),
            ("phone", &self.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| label)
        .collect::<Vec<_>>();

        if !missing.is_empty() {
            return Err(format!("Please enter all the required fields: {}", missing.join(", ")));
        }
        if !self.email.contains('@') {
            return Err("Please enter a valid email address".to_string());
        }
        Ok(())
    }
}

/// Columns a directory can be sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Address,
    Email,
    Phone,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Address => "address",
            SortKey::Email => "email",
            SortKey::Phone => "phone",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "address" => Ok(SortKey::Address),
            "email" => Ok(SortKey::Email),
            "phone" => Ok(SortKey::Phone),
            other => Err(format!("Unknown sort key: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Accept a phone number serialized either as text or as a JSON number.
fn phone_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Phone {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Option::<Phone>::deserialize(deserializer)? {
        Some(Phone::Text(s)) => s,
        Some(Phone::Integer(n)) => n.to_string(),
        Some(Phone::Float(n)) => n.to_string(),
        None => String::new(),
    })
}
