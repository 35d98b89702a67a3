//! Repository layer: the catalog store and its read-side queries.
//!
//! Both traits are implemented by the PostgreSQL repository and by the
//! in-memory repository used for demos and tests.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        Author, AuthorFilter, AuthorPatch, AuthorPayload, Book, BookFilter, BookPatch,
        BookPayload, BookWithAuthor, Fixture, LoadSummary,
    },
};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

/// Writes and single-record reads, each one atomic
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_author(&self, data: &AuthorPayload) -> AppResult<Author>;

    async fn get_author(&self, id: i32) -> AppResult<Author>;

    /// Apply the present fields of `changes`; an empty patch returns the record as is
    async fn update_author(&self, id: i32, changes: &AuthorPatch) -> AppResult<Author>;

    /// Delete an author and every book referencing it; returns the number of books removed
    async fn delete_author(&self, id: i32) -> AppResult<u64>;

    async fn create_book(&self, data: &BookPayload) -> AppResult<Book>;

    async fn get_book(&self, id: i32) -> AppResult<Book>;

    async fn update_book(&self, id: i32, changes: &BookPatch) -> AppResult<Book>;

    async fn delete_book(&self, id: i32) -> AppResult<()>;

    /// Replace the whole catalog with the fixture contents, all or nothing
    async fn replace_all(&self, fixture: &Fixture) -> AppResult<LoadSummary>;

    /// Check that the store is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// Filtered, ordered reads
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogQuery: Send + Sync {
    async fn list_authors(&self, filter: &AuthorFilter) -> AppResult<Vec<Author>>;

    /// Books of the given authors, ordered by title
    async fn books_for_authors(&self, author_ids: &[i32]) -> AppResult<Vec<Book>>;

    /// Books with their author resolved in the same pass
    async fn list_books(&self, filter: &BookFilter) -> AppResult<Vec<BookWithAuthor>>;

    async fn get_book_with_author(&self, id: i32) -> AppResult<BookWithAuthor>;
}

/// Store and query handles passed to the services
#[derive(Clone)]
pub struct Repository {
    pub store: Arc<dyn CatalogStore>,
    pub query: Arc<dyn CatalogQuery>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        let repo = Arc::new(PgRepository::new(pool));
        Self {
            store: repo.clone(),
            query: repo,
        }
    }

    /// Create an empty in-memory repository
    pub fn in_memory() -> Self {
        let repo = Arc::new(MemoryRepository::new());
        Self {
            store: repo.clone(),
            query: repo,
        }
    }
}
