//! crates/book_catalog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Apart from the token claims, these structs are independent of any
//! database or wire format.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single catalog entry. Never updated in place once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub created_at: DateTime<Utc>,
}

/// The fields a caller supplies when adding a book. The id and the
/// creation timestamp are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
}

// Represents an internal user record linked to one or more provider accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// The profile the identity provider hands back after a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider: String,
    pub provider_account_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

//=========================================================================================
// Session Token
//=========================================================================================

/// The claims carried by a signed session token.
///
/// Claims are kept as an open JSON mapping because a token decoded from a
/// cookie may carry fields of any shape; readers check types on access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(Map<String, Value>);

impl Token {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the standard claim set for a freshly signed-in profile.
    pub fn for_profile(
        profile: &ProviderProfile,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let mut token = Self::new();
        token.insert("sub", Value::String(profile.provider_account_id.clone()));
        if let Some(name) = &profile.name {
            token.insert("name", Value::String(name.clone()));
        }
        if let Some(email) = &profile.email {
            token.insert("email", Value::String(email.clone()));
        }
        if let Some(image) = &profile.image {
            token.insert("picture", Value::String(image.clone()));
        }
        token.insert("iat", Value::from(issued_at.timestamp()));
        token.insert("exp", Value::from(expires_at.timestamp()));
        token
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    /// Returns the claim only when it is a JSON string.
    pub fn string_claim(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The `exp` claim as a timestamp, if present and well-formed.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.0.get("exp").and_then(Value::as_i64)?;
        Utc.timestamp_opt(exp, 0).single()
    }
}

impl From<Map<String, Value>> for Token {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}

//=========================================================================================
// Session
//=========================================================================================

/// The externally visible session, rebuilt from the token on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user: SessionUser,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}
