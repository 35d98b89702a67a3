//! Wire shapes returned by the API and the mappings that build them.
//!
//! Authors carry their books as [`BookSummary`] values (no author inside),
//! books carry their author as [`AuthorBrief`] (no books inside), so neither
//! shape can nest the other without bound.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Author, Book, BookWithAuthor};

/// Book as listed inside an author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub published_date: NaiveDate,
    pub isbn: String,
}

/// Author with all of their books
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthorDetail {
    pub id: i32,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub country: String,
    pub books: Vec<BookSummary>,
}

/// Author as embedded in a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthorBrief {
    pub id: i32,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub country: String,
}

/// Book with its author resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub author: AuthorBrief,
    pub published_date: NaiveDate,
    pub isbn: String,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            published_date: book.published_date,
            isbn: book.isbn.clone(),
        }
    }
}

impl From<Author> for AuthorBrief {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            name: author.name,
            birth_date: author.birth_date,
            country: author.country,
        }
    }
}

impl From<BookWithAuthor> for BookDetail {
    fn from(row: BookWithAuthor) -> Self {
        let BookWithAuthor { book, author } = row;
        Self {
            id: book.id,
            title: book.title,
            author: author.into(),
            published_date: book.published_date,
            isbn: book.isbn,
        }
    }
}

/// Build one author's shape; books of other authors are ignored
pub fn author_detail(author: Author, books: &[Book]) -> AuthorDetail {
    let books = books
        .iter()
        .filter(|b| b.author_id == author.id)
        .map(BookSummary::from)
        .collect();
    AuthorDetail {
        id: author.id,
        name: author.name,
        birth_date: author.birth_date,
        country: author.country,
        books,
    }
}

/// Attach a batch of books to their authors, keeping both input orders
pub fn author_details(authors: Vec<Author>, books: Vec<Book>) -> Vec<AuthorDetail> {
    let mut by_author: HashMap<i32, Vec<BookSummary>> = HashMap::new();
    for book in &books {
        by_author.entry(book.author_id).or_default().push(book.into());
    }

    authors
        .into_iter()
        .map(|author| AuthorDetail {
            books: by_author.remove(&author.id).unwrap_or_default(),
            id: author.id,
            name: author.name,
            birth_date: author.birth_date,
            country: author.country,
        })
        .collect()
}
