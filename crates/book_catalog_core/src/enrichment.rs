//! crates/book_catalog_core/src/enrichment.rs
//!
//! Attaches the application's internal user id to session tokens and copies
//! it back out when a session is materialized for a request.

use serde_json::Value;

use crate::domain::{Session, SessionUser, Token, User};

/// Claim under which the internal user id travels inside the token.
pub const ID_CLAIM: &str = "id";

/// Runs when a token is issued or refreshed. `user` is only present on the
/// initial sign-in; every other call passes the token through untouched.
pub fn enrich_token(mut token: Token, user: Option<&User>) -> Token {
    if let Some(id) = user.and_then(|u| u.id.as_deref()) {
        token.insert(ID_CLAIM, Value::String(id.to_string()));
    }
    token
}

/// Copies the internal user id from the token onto the session.
///
/// A missing or non-string `id` claim leaves the session's user id as it was.
pub fn materialize_session(mut session: Session, token: &Token) -> Session {
    if let Some(id) = token.string_claim(ID_CLAIM) {
        session.user.id = Some(id.to_string());
    }
    session
}

/// Builds the default session for a decoded token, then enriches it.
pub fn session_from_token(token: &Token) -> Option<Session> {
    let expires = token.expires_at()?;
    let session = Session {
        user: SessionUser {
            id: None,
            name: token.string_claim("name").map(str::to_string),
            email: token.string_claim("email").map(str::to_string),
            image: token.string_claim("picture").map(str::to_string),
        },
        expires,
    };
    Some(materialize_session(session, token))
}
