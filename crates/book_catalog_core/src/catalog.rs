//! crates/book_catalog_core/src/catalog.rs
//!
//! The book catalog operations. Authorization is decided from an explicit
//! `AuthContext` rather than any ambient session state, so these functions
//! can be driven without a live identity provider.

use std::fmt;

use crate::domain::{Book, NewBook, Session};
use crate::ports::{DatabaseService, PortError};

//=========================================================================================
// Auth Context
//=========================================================================================

/// The per-request view of the caller's session.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    session: Option<Session>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { session: None }
    }

    pub fn authenticated(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    fn require_session(&self) -> Result<&Session, CatalogError> {
        self.session.as_ref().ok_or(CatalogError::Unauthorized)
    }
}

//=========================================================================================
// Errors and Validation
//=========================================================================================

/// A required book field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Genre,
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Genre => "Genre",
        };
        f.write_str(name)
    }
}

/// Why a submitted book was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidBook {
    #[error("{0} is required")]
    Missing(BookField),
    /// Postgres text columns cannot hold U+0000.
    #[error("{0} contains invalid characters")]
    InvalidCharacter(BookField),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Validation(#[from] InvalidBook),
    #[error(transparent)]
    Port(#[from] PortError),
}

/// Checks that every required field is non-blank after trimming and free of
/// NUL characters. Reports the first failing field in title, author, genre order.
pub fn validate_new_book(book: &NewBook) -> Result<(), InvalidBook> {
    let fields = [
        (BookField::Title, &book.title),
        (BookField::Author, &book.author),
        (BookField::Genre, &book.genre),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(InvalidBook::Missing(field));
        }
        if value.contains('\0') {
            return Err(InvalidBook::InvalidCharacter(field));
        }
    }
    Ok(())
}

//=========================================================================================
// Operations
//=========================================================================================

/// Lists every stored book. Open to anonymous callers.
pub async fn list_books(db: &dyn DatabaseService) -> Result<Vec<Book>, CatalogError> {
    Ok(db.list_books().await?)
}

/// Adds a book on behalf of a signed-in caller.
///
/// The session check runs before validation, so an anonymous caller is told
/// only that they are unauthorized. Values are stored as submitted.
pub async fn create_book(
    db: &dyn DatabaseService,
    ctx: &AuthContext,
    book: NewBook,
) -> Result<Book, CatalogError> {
    ctx.require_session()?;
    validate_new_book(&book)?;
    Ok(db.create_book(book).await?)
}

/// Deletes a book on behalf of a signed-in caller.
///
/// Deleting an id that does not exist is not an error; the returned flag
/// reports whether anything was removed.
pub async fn delete_book(
    db: &dyn DatabaseService,
    ctx: &AuthContext,
    book_id: &str,
) -> Result<bool, CatalogError> {
    ctx.require_session()?;
    Ok(db.delete_book(book_id).await?)
}
