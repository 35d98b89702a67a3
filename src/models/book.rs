//! Book model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::author::Author;
use super::query::{parse_ordering, search_terms, SortField, SortKey};
use crate::error::AppResult;

/// Book record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub published_date: NaiveDate,
    pub isbn: String,
}

/// Book joined with its author in a single query
#[derive(Debug, Clone, PartialEq)]
pub struct BookWithAuthor {
    pub book: Book,
    pub author: Author,
}

impl<'r> FromRow<'r, PgRow> for BookWithAuthor {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let author_id: i32 = row.try_get("author_id")?;
        Ok(Self {
            book: Book {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
                author_id,
                published_date: row.try_get("published_date")?,
                isbn: row.try_get("isbn")?,
            },
            author: Author {
                id: author_id,
                name: row.try_get("author_name")?,
                birth_date: row.try_get("author_birth_date")?,
                country: row.try_get("author_country")?,
            },
        })
    }
}

/// Create or replace a book; the author is given by id
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookPayload {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    pub author_id: i32,
    pub published_date: NaiveDate,
    #[validate(length(min = 1, max = 13, message = "ISBN must be between 1 and 13 characters"))]
    pub isbn: String,
}

impl BookPayload {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.isbn = self.isbn.trim().to_string();
        self
    }
}

/// Partial book update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
pub struct BookPatch {
    #[serde(default, deserialize_with = "crate::models::non_null")]
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "crate::models::non_null")]
    pub author_id: Option<i32>,
    #[serde(default, deserialize_with = "crate::models::non_null")]
    pub published_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "crate::models::non_null")]
    #[validate(length(min = 1, max = 13, message = "ISBN must be between 1 and 13 characters"))]
    pub isbn: Option<String>,
}

impl BookPatch {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.isbn = self.isbn.map(|i| i.trim().to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author_id.is_none()
            && self.published_date.is_none()
            && self.isbn.is_none()
    }
}

impl From<BookPayload> for BookPatch {
    fn from(payload: BookPayload) -> Self {
        Self {
            title: Some(payload.title),
            author_id: Some(payload.author_id),
            published_date: Some(payload.published_date),
            isbn: Some(payload.isbn),
        }
    }
}

/// Book list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Terms matched against title, author name and ISBN
    pub search: Option<String>,
    /// `title` or `published_date`, `-` prefix for descending
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSort {
    Title,
    PublishedDate,
}

impl SortField for BookSort {
    const ALLOWED: &'static [(&'static str, Self)] = &[
        ("title", BookSort::Title),
        ("published_date", BookSort::PublishedDate),
    ];
    const DEFAULT: Self = BookSort::Title;

    fn column(self) -> &'static str {
        match self {
            BookSort::Title => "b.title",
            BookSort::PublishedDate => "b.published_date",
        }
    }
}

/// Parsed book listing criteria
#[derive(Debug, Clone, PartialEq)]
pub struct BookFilter {
    pub terms: Vec<String>,
    pub ordering: Vec<SortKey<BookSort>>,
}

impl BookFilter {
    pub fn from_query(query: &BookQuery) -> AppResult<Self> {
        Ok(Self {
            terms: search_terms(query.search.as_deref()),
            ordering: parse_ordering(query.ordering.as_deref())?,
        })
    }
}

impl Default for BookFilter {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            ordering: vec![SortKey::ascending(BookSort::DEFAULT)],
        }
    }
}
