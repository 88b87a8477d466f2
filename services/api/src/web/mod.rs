pub mod auth;
pub mod middleware;
pub mod pages;
pub mod rest;
pub mod session;
pub mod state;

pub use middleware::load_session;
pub use rest::{create_book_handler, delete_book_handler, health_db_handler, list_books_handler};

use axum::{
    middleware as axum_middleware,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Builds the application router: pages, REST API and auth endpoints, all
/// behind the session middleware.
pub fn router(app_state: Arc<AppState>) -> Router {
    let pages = Router::new()
        .route("/", get(pages::index_page))
        .route("/add", get(pages::add_page))
        .route("/auth/signin", get(pages::signin_page))
        .route("/assets/app.js", get(pages::app_js))
        .route("/assets/style.css", get(pages::style_css));

    let auth_routes = Router::new()
        .route("/api/auth/signin/{provider}", get(auth::signin_handler))
        .route("/api/auth/callback/{provider}", get(auth::callback_handler))
        .route(
            "/api/auth/signout",
            get(auth::signout_handler).post(auth::signout_handler),
        )
        .route("/api/auth/session", get(auth::session_handler));

    let api_routes = Router::new()
        .route("/api/books", get(list_books_handler).post(create_book_handler))
        .route("/api/books/{id}", delete(delete_book_handler))
        .route("/api/health/db", get(health_db_handler));

    Router::new()
        .merge(pages)
        .merge(auth_routes)
        .merge(api_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            load_session,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
