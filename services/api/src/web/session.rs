//! services/api/src/web/session.rs
//!
//! Signs and verifies the stateless session token carried in the `session`
//! cookie, and builds the cookie headers that carry it.

use axum::http::{header, HeaderMap};
use book_catalog_core::domain::{ProviderProfile, Token};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

pub const SESSION_COOKIE: &str = "session";

/// HS256 codec for session tokens.
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    max_age: Duration,
    secure: bool,
}

impl SessionCodec {
    pub fn new(secret: &str, max_age: Duration, secure: bool) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            max_age,
            secure,
        }
    }

    /// A fresh, un-enriched token for a profile that has just signed in.
    /// `None` if the configured max age pushes the expiry past the clock's range.
    pub fn new_token(&self, profile: &ProviderProfile) -> Option<Token> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.max_age)?;
        Some(Token::for_profile(profile, now, expires_at))
    }

    pub fn encode(&self, token: &Token) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), token, &self.encoding_key)
    }

    /// Verifies the signature and expiry. Any failure means "no session".
    pub fn decode(&self, raw: &str) -> Option<Token> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<Token>(raw, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!("Ignoring invalid session token: {}", e);
                None
            }
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// A `Set-Cookie` value. A `max_age` of zero clears the cookie.
    pub fn cookie(&self, name: &str, value: &str, max_age: Duration) -> String {
        let secure = if self.secure { " Secure;" } else { "" };
        format!(
            "{}={}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
            name,
            value,
            secure,
            max_age.num_seconds()
        )
    }

    pub fn clear_cookie(&self, name: &str) -> String {
        self.cookie(name, "", Duration::zero())
    }
}

/// Reads a single cookie value from the request headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (key, value) = c.trim().split_once('=')?;
            (key == name).then_some(value)
        })
}
