//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: provider sign-in redirect, OAuth callback,
//! sign-out, and the session lookup used by the pages.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Json, Redirect, Response},
    Extension,
};
use book_catalog_core::{enrichment::enrich_token, AuthContext, PortError};
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::session::{read_cookie, SESSION_COOKIE};
use crate::web::state::AppState;

const STATE_COOKIE: &str = "oauth_state";
const CALLBACK_COOKIE: &str = "oauth_callback";
const SIGNIN_PAGE: &str = "/auth/signin";

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/auth/signin/{provider} - Redirect the browser to the identity provider
pub async fn signin_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(query): Query<SignInQuery>,
) -> Result<Response, ApiError> {
    if provider != state.identity.id() {
        return Err(ApiError::BadRequest(format!("Unknown provider '{}'", provider)));
    }

    // 1. Generate the CSRF state echoed back by the provider
    let csrf = Uuid::new_v4().to_string();
    let authorize_url = state.identity.authorize_url(&csrf)?;

    // 2. Remember where to land afterwards (local paths only)
    let callback = query
        .callback_url
        .filter(|url| is_local_path(url))
        .unwrap_or_else(|| "/".to_string());

    let ttl = Duration::minutes(10);
    Ok((
        AppendHeaders([
            (header::SET_COOKIE, state.sessions.cookie(STATE_COOKIE, &csrf, ttl)),
            (header::SET_COOKIE, state.sessions.cookie(CALLBACK_COOKIE, &callback, ttl)),
        ]),
        Redirect::to(&authorize_url),
    )
        .into_response())
}

/// GET /api/auth/callback/{provider} - Finish sign-in and issue the session cookie
pub async fn callback_handler(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: axum::http::HeaderMap,
) -> Result<Response, ApiError> {
    if provider != state.identity.id() {
        return Ok(signin_error("OAuthCallback"));
    }
    if let Some(reason) = query.error {
        info!("Provider returned an error on callback: {}", reason);
        return Ok(signin_error("AccessDenied"));
    }

    // 1. Verify the CSRF state
    let expected = read_cookie(&headers, STATE_COOKIE);
    let (Some(code), Some(returned)) = (query.code, query.state) else {
        return Ok(signin_error("OAuthCallback"));
    };
    if expected != Some(returned.as_str()) {
        warn!("OAuth state mismatch on callback");
        return Ok(signin_error("OAuthCallback"));
    }

    // 2. Exchange the code for the provider profile
    let profile = match state.identity.exchange_code(&code).await {
        Ok(profile) => profile,
        Err(PortError::Unauthorized) => return Ok(signin_error("AccessDenied")),
        Err(e) => {
            error!("Failed to exchange authorization code: {:?}", e);
            return Ok(signin_error("OAuthCallback"));
        }
    };

    // 3. Resolve the internal user
    let user = match state.db.link_account(&profile).await {
        Ok(user) => user,
        Err(e) => {
            error!("Failed to link provider account: {:?}", e);
            return Ok(signin_error("Callback"));
        }
    };

    // 4. Issue the enriched session token
    let token = state
        .sessions
        .new_token(&profile)
        .ok_or_else(|| ApiError::Internal("Session expiry is out of range".to_string()))?;
    let token = enrich_token(token, Some(&user));
    let raw = state.sessions.encode(&token)?;
    info!(user_id = ?user.id, provider = %profile.provider, "User signed in");

    let landing = read_cookie(&headers, CALLBACK_COOKIE)
        .filter(|url| is_local_path(url))
        .unwrap_or("/")
        .to_string();

    Ok((
        AppendHeaders([
            (
                header::SET_COOKIE,
                state.sessions.cookie(SESSION_COOKIE, &raw, state.sessions.max_age()),
            ),
            (header::SET_COOKIE, state.sessions.clear_cookie(STATE_COOKIE)),
            (header::SET_COOKIE, state.sessions.clear_cookie(CALLBACK_COOKIE)),
        ]),
        Redirect::to(&landing),
    )
        .into_response())
}

/// GET|POST /api/auth/signout - Clear the session cookie
pub async fn signout_handler(State(state): State<Arc<AppState>>) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, state.sessions.clear_cookie(SESSION_COOKIE))]),
        Redirect::to("/"),
    )
        .into_response()
}

/// The current session, or an empty object for anonymous callers.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "The session, or `{}` when signed out")
    )
)]
pub async fn session_handler(Extension(ctx): Extension<AuthContext>) -> Response {
    match ctx.session() {
        Some(session) => Json(session).into_response(),
        None => Json(json!({})).into_response(),
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn signin_error(code: &str) -> Response {
    Redirect::to(&format!("{}?error={}", SIGNIN_PAGE, code)).into_response()
}

/// Accepts same-origin absolute paths that are safe to keep in a cookie.
fn is_local_path(url: &str) -> bool {
    url.starts_with('/')
        && !url.starts_with("//")
        && url
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, ';' | ',' | '"' | '\\'))
}
