//! services/api/src/adapters/google.rs
//!
//! This module contains the adapter for Google's OAuth 2.0 sign-in.
//! It implements the `IdentityProvider` port from the `core` crate.

use async_trait::async_trait;
use book_catalog_core::domain::ProviderProfile;
use book_catalog_core::ports::{IdentityProvider, PortError, PortResult};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::warn;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `IdentityProvider` port using Google OAuth.
#[derive(Clone)]
pub struct GoogleIdentityAdapter {
    http: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleIdentityAdapter {
    /// Creates a new `GoogleIdentityAdapter`. `redirect_uri` must match the
    /// callback registered with Google.
    pub fn new(http: Client, client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            redirect_uri,
        }
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

//=========================================================================================
// `IdentityProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityProvider for GoogleIdentityAdapter {
    fn id(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> PortResult<String> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> PortResult<ProviderProfile> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // A rejected code is the caller's problem, not an outage.
        if response.status().is_client_error() {
            warn!("Google rejected the authorization code: {}", response.status());
            return Err(PortError::Unauthorized);
        }
        let tokens: TokenResponse = response
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let info: UserInfo = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(ProviderProfile {
            provider: self.id().to_string(),
            provider_account_id: info.sub,
            name: info.name,
            email: info.email,
            image: info.picture,
        })
    }
}
