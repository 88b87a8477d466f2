//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use book_catalog_core::{catalog, AuthContext, Book, NewBook};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_books_handler,
        create_book_handler,
        delete_book_handler,
        health_db_handler,
        crate::web::auth::session_handler,
    ),
    components(
        schemas(BookResponse, CreateBookRequest, ErrorResponse, HealthResponse)
    ),
    tags(
        (name = "Book Catalog API", description = "List, add and delete catalog entries.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A catalog entry as returned to clients.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    id: String,
    title: String,
    author: String,
    genre: String,
    created_at: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            genre: book.genre,
            created_at: book.created_at,
        }
    }
}

/// The payload for adding a book. Missing fields count as blank.
#[derive(Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
}

impl From<CreateBookRequest> for NewBook {
    fn from(req: CreateBookRequest) -> Self {
        NewBook {
            title: req.title.unwrap_or_default(),
            author: req.author.unwrap_or_default(),
            genre: req.genre.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    now: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List every book in the catalog, oldest first.
#[utoipa::path(
    get,
    path = "/api/books",
    responses(
        (status = 200, description = "All books", body = Vec<BookResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = catalog::list_books(state.db.as_ref()).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// Add a book. Requires a signed-in session.
#[utoipa::path(
    post,
    path = "/api/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "A required field is missing or blank", body = ErrorResponse),
        (status = 401, description = "No active session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // The body is parsed before the handler runs; anonymous callers must not
    // learn anything about their payload.
    if !ctx.is_authenticated() {
        return Err(ApiError::Unauthorized);
    }
    let Json(req) = payload.map_err(|e| {
        debug!("Rejected book payload: {}", e);
        ApiError::BadRequest("Invalid request body".to_string())
    })?;

    let book = catalog::create_book(state.db.as_ref(), &ctx, req.into()).await?;
    info!(book_id = %book.id, "Book created");
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// Delete a book by id. Succeeds whether or not the id existed.
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(
        ("id" = String, Path, description = "The book id.")
    ),
    responses(
        (status = 204, description = "Book deleted (or was already absent)"),
        (status = 401, description = "No active session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(book_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let existed = catalog::delete_book(state.db.as_ref(), &ctx, &book_id).await?;
    if existed {
        info!(book_id = %book_id, "Book deleted");
    } else {
        debug!(book_id = %book_id, "Delete requested for unknown book");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Health check that round-trips a trivial query through the database.
#[utoipa::path(
    get,
    path = "/api/health/db",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 500, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_db_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.db.now().await {
        Ok(now) => (
            StatusCode::OK,
            Json(HealthResponse {
                ok: true,
                now: Some(now),
                error: None,
            }),
        ),
        Err(e) => {
            error!("Database health check failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    ok: false,
                    now: None,
                    error: Some("DB connection failed".to_string()),
                }),
            )
        }
    }
}
