//! Catalog management service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        Author, AuthorFilter, AuthorPatch, AuthorPayload, AuthorQuery, BookFilter, BookPatch,
        BookPayload, BookQuery, BookWithAuthor,
    },
    repository::{CatalogQuery, CatalogStore},
    transfer::{self, AuthorDetail, BookDetail},
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    query: Arc<dyn CatalogQuery>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, query: Arc<dyn CatalogQuery>) -> Self {
        Self { store, query }
    }

    /// Check that the underlying store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    /// List authors with their books
    pub async fn list_authors(&self, query: &AuthorQuery) -> AppResult<Vec<AuthorDetail>> {
        let filter = AuthorFilter::from_query(query)?;
        let authors = self.query.list_authors(&filter).await?;
        if authors.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
        let books = self.query.books_for_authors(&ids).await?;
        Ok(transfer::author_details(authors, books))
    }

    /// Get an author with their books
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.store.get_author(id).await?;
        self.author_detail(author).await
    }

    pub async fn create_author(&self, payload: AuthorPayload) -> AppResult<AuthorDetail> {
        let payload = payload.normalized();
        payload.validate()?;

        let author = self.store.create_author(&payload).await?;
        tracing::info!(author_id = author.id, "Created author {}", author.name);
        Ok(transfer::author_detail(author, &[]))
    }

    /// Replace every field of an author
    pub async fn update_author(&self, id: i32, payload: AuthorPayload) -> AppResult<AuthorDetail> {
        self.store.get_author(id).await?;
        let payload = payload.normalized();
        payload.validate()?;
        self.apply_author_changes(id, payload.into()).await
    }

    /// Change only the fields present in the patch
    pub async fn patch_author(&self, id: i32, patch: AuthorPatch) -> AppResult<AuthorDetail> {
        self.store.get_author(id).await?;
        let patch = patch.normalized();
        patch.validate()?;
        self.apply_author_changes(id, patch).await
    }

    async fn apply_author_changes(&self, id: i32, changes: AuthorPatch) -> AppResult<AuthorDetail> {
        let author = self.store.update_author(id, &changes).await?;
        tracing::info!(author_id = id, "Updated author");
        self.author_detail(author).await
    }

    /// Delete an author together with their books
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        let books_removed = self.store.delete_author(id).await?;
        tracing::info!(author_id = id, books_removed, "Deleted author");
        Ok(())
    }

    async fn author_detail(&self, author: Author) -> AppResult<AuthorDetail> {
        let books = self.query.books_for_authors(&[author.id]).await?;
        Ok(transfer::author_detail(author, &books))
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    /// List books with their authors
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<BookDetail>> {
        let filter = BookFilter::from_query(query)?;
        let rows = self.query.list_books(&filter).await?;
        Ok(rows.into_iter().map(BookDetail::from).collect())
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        Ok(self.query.get_book_with_author(id).await?.into())
    }

    pub async fn create_book(&self, payload: BookPayload) -> AppResult<BookDetail> {
        let payload = payload.normalized();
        payload.validate()?;
        let author = self.resolve_author(payload.author_id).await?;

        let book = self.store.create_book(&payload).await?;
        tracing::info!(book_id = book.id, author_id = author.id, "Created book {}", book.title);
        Ok(BookWithAuthor { book, author }.into())
    }

    /// Replace every field of a book
    pub async fn update_book(&self, id: i32, payload: BookPayload) -> AppResult<BookDetail> {
        self.store.get_book(id).await?;
        let payload = payload.normalized();
        payload.validate()?;
        let author = self.resolve_author(payload.author_id).await?;

        let book = self.store.update_book(id, &payload.into()).await?;
        tracing::info!(book_id = id, "Updated book");
        Ok(BookWithAuthor { book, author }.into())
    }

    /// Change only the fields present in the patch
    pub async fn patch_book(&self, id: i32, patch: BookPatch) -> AppResult<BookDetail> {
        self.store.get_book(id).await?;
        let patch = patch.normalized();
        patch.validate()?;
        if let Some(author_id) = patch.author_id {
            self.resolve_author(author_id).await?;
        }

        self.store.update_book(id, &patch).await?;
        tracing::info!(book_id = id, "Updated book");
        self.get_book(id).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.store.delete_book(id).await?;
        tracing::info!(book_id = id, "Deleted book");
        Ok(())
    }

    /// Turn a caller-supplied author id into a record, before any write happens
    async fn resolve_author(&self, author_id: i32) -> AppResult<Author> {
        match self.store.get_author(author_id).await {
            Err(AppError::NotFound(_)) => Err(AppError::Reference(format!(
                "Invalid pk \"{}\" - object does not exist.",
                author_id
            ))),
            other => other,
        }
    }
}
