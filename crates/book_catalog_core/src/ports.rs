//! crates/book_catalog_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete database and identity provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Book, NewBook, ProviderProfile, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Book Management ---
    /// All stored books, oldest first.
    async fn list_books(&self) -> PortResult<Vec<Book>>;

    /// Inserts a book, assigning its id and creation timestamp.
    async fn create_book(&self, book: NewBook) -> PortResult<Book>;

    /// Removes the book with the given id. Returns whether a row existed.
    async fn delete_book(&self, book_id: &str) -> PortResult<bool>;

    // --- Identity Records ---
    /// Resolves the internal user for a provider account, creating the user
    /// and the account link on first sign-in.
    async fn link_account(&self, profile: &ProviderProfile) -> PortResult<User>;

    // --- Health ---
    /// Issues a trivial query and returns the database clock.
    async fn now(&self) -> PortResult<DateTime<Utc>>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider name used in routes and account links, e.g. `google`.
    fn id(&self) -> &'static str;

    /// The URL the browser is redirected to in order to start sign-in.
    fn authorize_url(&self, state: &str) -> PortResult<String>;

    /// Exchanges the authorization code from the callback for the user's profile.
    async fn exchange_code(&self, code: &str) -> PortResult<ProviderProfile>;
}
