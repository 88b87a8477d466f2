//! services/api/src/web/middleware.rs
//!
//! Session middleware shared by every route.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use book_catalog_core::{enrichment::session_from_token, AuthContext};
use std::sync::Arc;

use crate::web::session::{read_cookie, SESSION_COOKIE};
use crate::web::state::AppState;

/// Middleware that decodes the session cookie into an `AuthContext`.
///
/// The context is always inserted into the request extensions, anonymous when
/// the cookie is missing, forged or expired. Handlers decide what needs a
/// session; this layer never rejects a request.
pub async fn load_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = read_cookie(req.headers(), SESSION_COOKIE)
        .and_then(|raw| state.sessions.decode(raw))
        .and_then(|token| session_from_token(&token))
        .map(AuthContext::authenticated)
        .unwrap_or_default();

    req.extensions_mut().insert(ctx);
    next.run(req).await
}
