//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use book_catalog_core::domain::{Book, NewBook, ProviderProfile, User};
use book_catalog_core::ports::{DatabaseService, PortError, PortResult};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgExecutor, FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct BookRecord {
    id: String,
    title: String,
    author: String,
    genre: String,
    created_at: DateTime<Utc>,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            title: self.title,
            author: self.author,
            genre: self.genre,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: String,
    name: Option<String>,
    email: Option<String>,
    image: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: Some(self.id),
            name: self.name,
            email: self.email,
            image: self.image,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

async fn find_linked_user<'e>(
    executor: impl PgExecutor<'e>,
    profile: &ProviderProfile,
) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>(
        "SELECT u.id, u.name, u.email, u.image FROM accounts a \
         JOIN users u ON u.id = a.user_id \
         WHERE a.provider = $1 AND a.provider_account_id = $2",
    )
    .bind(&profile.provider)
    .bind(&profile.provider_account_id)
    .fetch_optional(executor)
    .await
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn list_books(&self) -> PortResult<Vec<Book>> {
        let records = sqlx::query_as::<_, BookRecord>(
            "SELECT id, title, author, genre, created_at FROM books ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_book(&self, book: NewBook) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            "INSERT INTO books (id, title, author, genre) VALUES ($1, $2, $3, $4) \
             RETURNING id, title, author, genre, created_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn delete_book(&self, book_id: &str) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(result.rows_affected() > 0)
    }

    async fn link_account(&self, profile: &ProviderProfile) -> PortResult<User> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let existing = find_linked_user(&mut *tx, profile)
            .await
            .map_err(unexpected)?;

        if let Some(record) = existing {
            tx.commit().await.map_err(unexpected)?;
            return Ok(record.to_domain());
        }

        // Provider emails are verified, so a matching email resolves to the
        // same internal user rather than a duplicate.
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, name, email, image) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO UPDATE SET name = COALESCE(users.name, EXCLUDED.name) \
             RETURNING id, name, email, image",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.image)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        let linked = sqlx::query(
            "INSERT INTO accounts (user_id, provider, provider_account_id) VALUES ($1, $2, $3) \
             ON CONFLICT (provider, provider_account_id) DO NOTHING",
        )
        .bind(&record.id)
        .bind(&profile.provider)
        .bind(&profile.provider_account_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        if linked.rows_affected() == 0 {
            // A concurrent sign-in linked this account first. Drop the user row
            // created here and resolve to the committed link.
            tx.rollback().await.map_err(unexpected)?;
            let winner = find_linked_user(&self.pool, profile)
                .await
                .map_err(unexpected)?
                .ok_or_else(|| {
                    PortError::Unexpected("account link missing after conflict".to_string())
                })?;
            return Ok(winner.to_domain());
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn now(&self) -> PortResult<DateTime<Utc>> {
        sqlx::query_scalar::<_, DateTime<Utc>>("SELECT NOW()")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(account_id: &str, email: Option<&str>) -> ProviderProfile {
        ProviderProfile {
            provider: "google".to_string(),
            provider_account_id: account_id.to_string(),
            name: Some("Ada".to_string()),
            email: email.map(str::to_string),
            image: None,
        }
    }

    async fn count(pool: &PgPool, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn list_breaks_timestamp_ties_by_id(pool: PgPool) {
        for id in ["c", "a", "b"] {
            sqlx::query(
                "INSERT INTO books (id, title, author, genre, created_at) \
                 VALUES ($1, 'Dune', 'Herbert', 'SciFi', '2024-06-01T00:00:00Z')",
            )
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        }
        let db = DbAdapter::new(pool);
        let newest = db
            .create_book(NewBook {
                title: "Emma".to_string(),
                author: "Austen".to_string(),
                genre: "Classic".to_string(),
            })
            .await
            .unwrap();

        let ids: Vec<String> = db.list_books().await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string(), "c".to_string(), newest.id]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn delete_reports_whether_a_row_existed(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let book = db
            .create_book(NewBook {
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                genre: "SciFi".to_string(),
            })
            .await
            .unwrap();

        assert!(db.delete_book(&book.id).await.unwrap());
        assert!(!db.delete_book(&book.id).await.unwrap());
        assert!(!db.delete_book("missing").await.unwrap());
        assert!(db.list_books().await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn repeated_sign_in_resolves_the_same_user(pool: PgPool) {
        let db = DbAdapter::new(pool.clone());
        let first = db.link_account(&profile("g-1", Some("ada@example.com"))).await.unwrap();
        let again = db.link_account(&profile("g-1", Some("ada@example.com"))).await.unwrap();
        assert!(first.id.is_some());
        assert_eq!(first.id, again.id);

        // A second provider account with the same email joins the same user.
        let other = db.link_account(&profile("g-2", Some("ada@example.com"))).await.unwrap();
        assert_eq!(first.id, other.id);
        assert_eq!(count(&pool, "users").await, 1);
        assert_eq!(count(&pool, "accounts").await, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn concurrent_first_sign_ins_share_one_link(pool: PgPool) {
        let db = DbAdapter::new(pool.clone());
        // Without an email there is no users conflict to serialize on.
        let p = profile("g-race", None);
        let (left, right) = tokio::join!(db.link_account(&p), db.link_account(&p));

        assert_eq!(left.unwrap().id, right.unwrap().id);
        assert_eq!(count(&pool, "accounts").await, 1);
        assert_eq!(count(&pool, "users").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn now_reads_the_database_clock(pool: PgPool) {
        let db = DbAdapter::new(pool);
        let now = db.now().await.unwrap();
        assert!((Utc::now() - now).num_minutes().abs() < 5);
    }
}
