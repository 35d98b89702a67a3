//! PostgreSQL catalog repository.
//!
//! Referential integrity, ISBN uniqueness and column lengths are enforced by
//! the schema in `migrations/`; violations come back as database errors and
//! are translated by [`AppError::from_write`].

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{CatalogQuery, CatalogStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        query::{like_pattern, order_clause},
        Author, AuthorFilter, AuthorPatch, AuthorPayload, Book, BookFilter, BookPatch,
        BookPayload, BookWithAuthor, Fixture, LoadSummary,
    },
};

const AUTHOR_COLUMNS: &str = "id, name, birth_date, country";
const BOOK_COLUMNS: &str = "id, title, author_id, published_date, isbn";

const BOOK_WITH_AUTHOR_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id, b.published_date, b.isbn,
           a.name AS author_name, a.birth_date AS author_birth_date, a.country AS author_country
    FROM books b
    JOIN authors a ON a.id = b.author_id
"#;

#[derive(Clone)]
pub struct PgRepository {
    pool: Pool<Postgres>,
}

impl PgRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn author_not_found(id: i32) -> AppError {
        AppError::NotFound(format!("Author {} not found", id))
    }

    fn book_not_found(id: i32) -> AppError {
        AppError::NotFound(format!("Book {} not found", id))
    }
}

#[async_trait]
impl CatalogStore for PgRepository {
    async fn create_author(&self, data: &AuthorPayload) -> AppResult<Author> {
        let query = format!(
            "INSERT INTO authors (name, birth_date, country) VALUES ($1, $2, $3) RETURNING {}",
            AUTHOR_COLUMNS
        );
        sqlx::query_as::<_, Author>(&query)
            .bind(&data.name)
            .bind(data.birth_date)
            .bind(&data.country)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_write)
    }

    async fn get_author(&self, id: i32) -> AppResult<Author> {
        let query = format!("SELECT {} FROM authors WHERE id = $1", AUTHOR_COLUMNS);
        sqlx::query_as::<_, Author>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Self::author_not_found(id))
    }

    async fn update_author(&self, id: i32, changes: &AuthorPatch) -> AppResult<Author> {
        if changes.is_empty() {
            return self.get_author(id).await;
        }

        let mut sets = Vec::new();
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(changes.name, "name");
        add_field!(changes.birth_date, "birth_date");
        add_field!(changes.country, "country");

        let query = format!(
            "UPDATE authors SET {} WHERE id = ${} RETURNING {}",
            sets.join(", "),
            idx,
            AUTHOR_COLUMNS
        );

        let mut builder = sqlx::query_as::<_, Author>(&query);
        if let Some(ref name) = changes.name {
            builder = builder.bind(name);
        }
        if let Some(birth_date) = changes.birth_date {
            builder = builder.bind(birth_date);
        }
        if let Some(ref country) = changes.country {
            builder = builder.bind(country);
        }

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_write)?
            .ok_or_else(|| Self::author_not_found(id))
    }

    async fn delete_author(&self, id: i32) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE author_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        // books go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Self::author_not_found(id));
        }

        tx.commit().await?;
        Ok(books as u64)
    }

    async fn create_book(&self, data: &BookPayload) -> AppResult<Book> {
        let query = format!(
            r#"
            INSERT INTO books (title, author_id, published_date, isbn)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(&data.title)
            .bind(data.author_id)
            .bind(data.published_date)
            .bind(&data.isbn)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_write)
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Self::book_not_found(id))
    }

    async fn update_book(&self, id: i32, changes: &BookPatch) -> AppResult<Book> {
        if changes.is_empty() {
            return self.get_book(id).await;
        }

        let mut sets = Vec::new();
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(changes.title, "title");
        add_field!(changes.author_id, "author_id");
        add_field!(changes.published_date, "published_date");
        add_field!(changes.isbn, "isbn");

        let query = format!(
            "UPDATE books SET {} WHERE id = ${} RETURNING {}",
            sets.join(", "),
            idx,
            BOOK_COLUMNS
        );

        let mut builder = sqlx::query_as::<_, Book>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(changes.title);
        bind_field!(changes.author_id);
        bind_field!(changes.published_date);
        bind_field!(changes.isbn);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_write)?
            .ok_or_else(|| Self::book_not_found(id))
    }

    async fn delete_book(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Self::book_not_found(id));
        }
        Ok(())
    }

    async fn replace_all(&self, fixture: &Fixture) -> AppResult<LoadSummary> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM books").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM authors").execute(&mut *tx).await?;

        for author in &fixture.authors {
            let data = author.payload();
            sqlx::query(
                "INSERT INTO authors (id, name, birth_date, country) VALUES ($1, $2, $3, $4)",
            )
            .bind(author.id)
            .bind(&data.name)
            .bind(data.birth_date)
            .bind(&data.country)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from_write)?;
        }

        // authors were inserted with explicit ids; move the sequence past them
        sqlx::query(
            r#"
            SELECT setval(
                pg_get_serial_sequence('authors', 'id'),
                GREATEST(COALESCE((SELECT MAX(id) FROM authors), 0) + 1, 1),
                false
            )
            "#,
        )
        .execute(&mut *tx)
        .await?;

        for book in &fixture.books {
            let data = book.payload();
            sqlx::query(
                r#"
                INSERT INTO books (title, author_id, published_date, isbn)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&data.title)
            .bind(data.author_id)
            .bind(data.published_date)
            .bind(&data.isbn)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from_write)?;
        }

        tx.commit().await?;

        Ok(LoadSummary {
            authors: fixture.authors.len(),
            books: fixture.books.len(),
        })
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogQuery for PgRepository {
    async fn list_authors(&self, filter: &AuthorFilter) -> AppResult<Vec<Author>> {
        let mut sql = format!("SELECT {} FROM authors", AUTHOR_COLUMNS);

        if !filter.terms.is_empty() {
            let conditions: Vec<String> = (1..=filter.terms.len())
                .map(|n| format!("(name ILIKE ${n} OR country ILIKE ${n})"))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push(' ');
        sql.push_str(&order_clause(&filter.ordering, "id"));

        let mut query = sqlx::query_as::<_, Author>(&sql);
        for term in &filter.terms {
            query = query.bind(like_pattern(term));
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn books_for_authors(&self, author_ids: &[i32]) -> AppResult<Vec<Book>> {
        let query = format!(
            "SELECT {} FROM books WHERE author_id = ANY($1) ORDER BY title, id",
            BOOK_COLUMNS
        );
        let rows = sqlx::query_as::<_, Book>(&query)
            .bind(author_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_books(&self, filter: &BookFilter) -> AppResult<Vec<BookWithAuthor>> {
        let mut sql = BOOK_WITH_AUTHOR_SELECT.to_string();

        if !filter.terms.is_empty() {
            let conditions: Vec<String> = (1..=filter.terms.len())
                .map(|n| format!("(b.title ILIKE ${n} OR a.name ILIKE ${n} OR b.isbn ILIKE ${n})"))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push(' ');
        sql.push_str(&order_clause(&filter.ordering, "b.id"));

        let mut query = sqlx::query_as::<_, BookWithAuthor>(&sql);
        for term in &filter.terms {
            query = query.bind(like_pattern(term));
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn get_book_with_author(&self, id: i32) -> AppResult<BookWithAuthor> {
        let sql = format!("{} WHERE b.id = $1", BOOK_WITH_AUTHOR_SELECT);
        sqlx::query_as::<_, BookWithAuthor>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Self::book_not_found(id))
    }
}
