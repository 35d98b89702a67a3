//! Bulk-load document: `{"authors": [...], "books": [...]}`

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::author::AuthorPayload;
use super::book::BookPayload;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub authors: Vec<FixtureAuthor>,
    pub books: Vec<FixtureBook>,
}

/// Author entry; the id is kept as given
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureAuthor {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Book entry; `author_id` refers to an author of the same document
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureBook {
    pub title: String,
    pub author_id: i32,
    pub published_date: NaiveDate,
    pub isbn: String,
}

/// Counts reported after a successful load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub authors: usize,
    pub books: usize,
}

impl FixtureAuthor {
    /// Field values as they are stored, trimmed like API payloads
    pub fn payload(&self) -> AuthorPayload {
        AuthorPayload {
            name: self.name.clone(),
            birth_date: self.birth_date,
            country: self.country.clone().unwrap_or_default(),
        }
        .normalized()
    }
}

impl FixtureBook {
    /// Field values as they are stored, trimmed like API payloads
    pub fn payload(&self) -> BookPayload {
        BookPayload {
            title: self.title.clone(),
            author_id: self.author_id,
            published_date: self.published_date,
            isbn: self.isbn.clone(),
        }
        .normalized()
    }
}

impl Fixture {
    pub fn from_json(text: &str) -> AppResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| AppError::validation(format!("Invalid fixture document: {}", e)))
    }

    /// Check the whole document before anything is replaced
    pub fn check(&self) -> AppResult<()> {
        let mut author_ids = HashSet::new();
        for author in &self.authors {
            // the id sequence must still have room after the largest loaded id
            if !(1..i32::MAX).contains(&author.id) {
                return Err(AppError::invalid_field(
                    "id",
                    format!(
                        "Author id {} is outside the range 1 to {}",
                        author.id,
                        i32::MAX - 1
                    ),
                ));
            }
            author.payload().validate()?;
            if !author_ids.insert(author.id) {
                return Err(AppError::Integrity(format!(
                    "Author id {} appears more than once",
                    author.id
                )));
            }
        }

        let mut isbns = HashSet::new();
        for book in &self.books {
            let payload = book.payload();
            payload.validate()?;
            if !author_ids.contains(&book.author_id) {
                return Err(AppError::Reference(format!(
                    "Book \"{}\" refers to author {} which is not in the fixture",
                    book.title, book.author_id
                )));
            }
            if !isbns.insert(payload.isbn.clone()) {
                return Err(AppError::Integrity(format!(
                    "ISBN {} appears more than once",
                    payload.isbn
                )));
            }
        }
        Ok(())
    }
}
