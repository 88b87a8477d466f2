#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use api_lib::web::{self, session::SessionCodec, state::AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use book_catalog_core::enrichment::enrich_token;
use book_catalog_core::{
    Book, DatabaseService, IdentityProvider, NewBook, PortError, PortResult, ProviderProfile, User,
};
use chrono::{DateTime, Duration, Utc};
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

//=========================================================================================
// In-memory store
//=========================================================================================

#[derive(Default)]
pub struct MemoryDb {
    pub books: Mutex<Vec<Book>>,
    pub users: Mutex<Vec<(ProviderProfile, User)>>,
    pub offline: bool,
}

impl MemoryDb {
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    fn check(&self) -> PortResult<()> {
        if self.offline {
            Err(PortError::Unexpected("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DatabaseService for MemoryDb {
    async fn list_books(&self) -> PortResult<Vec<Book>> {
        self.check()?;
        Ok(self.books.lock().unwrap().clone())
    }

    async fn create_book(&self, book: NewBook) -> PortResult<Book> {
        self.check()?;
        let stored = Book {
            id: uuid::Uuid::new_v4().to_string(),
            title: book.title,
            author: book.author,
            genre: book.genre,
            created_at: Utc::now(),
        };
        self.books.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn delete_book(&self, book_id: &str) -> PortResult<bool> {
        self.check()?;
        let mut books = self.books.lock().unwrap();
        let before = books.len();
        books.retain(|b| b.id != book_id);
        Ok(books.len() != before)
    }

    async fn link_account(&self, profile: &ProviderProfile) -> PortResult<User> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if let Some((_, user)) = users
            .iter()
            .find(|(p, _)| p.provider_account_id == profile.provider_account_id)
        {
            return Ok(user.clone());
        }
        let user = User {
            id: Some(format!("user-{}", users.len() + 1)),
            name: profile.name.clone(),
            email: profile.email.clone(),
            image: profile.image.clone(),
        };
        users.push((profile.clone(), user.clone()));
        Ok(user)
    }

    async fn now(&self) -> PortResult<DateTime<Utc>> {
        self.check()?;
        Ok(Utc::now())
    }
}

//=========================================================================================
// Fake identity provider
//=========================================================================================

/// Accepts the code `good-code` and rejects everything else.
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn id(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> PortResult<String> {
        Ok(format!("https://idp.example/authorize?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> PortResult<ProviderProfile> {
        if code != "good-code" {
            return Err(PortError::Unauthorized);
        }
        Ok(profile())
    }
}

pub fn profile() -> ProviderProfile {
    ProviderProfile {
        provider: "google".to_string(),
        provider_account_id: "g-42".to_string(),
        name: Some("Ada Lovelace".to_string()),
        email: Some("ada@example.com".to_string()),
        image: None,
    }
}

//=========================================================================================
// App harness
//=========================================================================================

pub struct TestApp {
    pub db: Arc<MemoryDb>,
    pub state: Arc<AppState>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_db(MemoryDb::default())
    }

    pub fn with_db(db: MemoryDb) -> Self {
        let db = Arc::new(db);
        let state = Arc::new(AppState {
            db: db.clone(),
            identity: Arc::new(FakeIdentity),
            sessions: Arc::new(SessionCodec::new(SECRET, Duration::days(30), false)),
        });
        let router = web::router(state.clone());
        Self { db, state, router }
    }

    /// A `Cookie` header value for a signed-in user with the given internal id.
    pub fn session_cookie(&self, user_id: &str) -> String {
        let user = User {
            id: Some(user_id.to_string()),
            ..User::default()
        };
        let token = enrich_token(self.state.sessions.new_token(&profile()).unwrap(), Some(&user));
        format!("session={}", self.state.sessions.encode(&token).unwrap())
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends the request and parses the body as JSON (`Null` when empty).
    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.send(request).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn delete(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// All `Set-Cookie` values on a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
