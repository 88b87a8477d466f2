//! services/api/src/web/pages.rs
//!
//! The browser-facing pages. Each page is a static shell whose script calls
//! the REST API and the session endpoint, so the server stays the only
//! authority on validation and authorization.

use axum::{
    http::header,
    response::{Html, IntoResponse},
};

const INDEX_HTML: &str = include_str!("../../assets/index.html");
const ADD_HTML: &str = include_str!("../../assets/add.html");
const SIGNIN_HTML: &str = include_str!("../../assets/signin.html");
const APP_JS: &str = include_str!("../../assets/app.js");
const STYLE_CSS: &str = include_str!("../../assets/style.css");

/// GET / - The catalog list
pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /add - The add-book form
pub async fn add_page() -> Html<&'static str> {
    Html(ADD_HTML)
}

/// GET /auth/signin - Provider sign-in
pub async fn signin_page() -> Html<&'static str> {
    Html(SIGNIN_HTML)
}

pub async fn app_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], APP_JS)
}

pub async fn style_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS)
}
