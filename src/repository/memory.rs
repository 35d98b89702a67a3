//! In-memory catalog repository.
//!
//! Holds both tables behind one lock and enforces the same constraints as the
//! PostgreSQL schema: ISBN uniqueness, existing author references, column
//! lengths and cascade on author deletion. Every write checks first and
//! mutates second while holding the write lock.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CatalogQuery, CatalogStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        author::AuthorSort,
        book::BookSort,
        query::{cmp_nulls_last, contains_ignore_case, SortKey},
        Author, AuthorFilter, AuthorPatch, AuthorPayload, Book, BookFilter, BookPatch,
        BookPayload, BookWithAuthor, Fixture, LoadSummary,
    },
};

const NAME_MAX: usize = 255;
const COUNTRY_MAX: usize = 100;
const TITLE_MAX: usize = 255;
const ISBN_MAX: usize = 13;

#[derive(Debug, Clone)]
struct Tables {
    authors: BTreeMap<i32, Author>,
    books: BTreeMap<i32, Book>,
    next_author_id: i32,
    next_book_id: i32,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            authors: BTreeMap::new(),
            books: BTreeMap::new(),
            next_author_id: 1,
            next_book_id: 1,
        }
    }
}

fn check_length(column: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::invalid_field(
            column,
            format!("value too long for type character varying({})", max),
        ));
    }
    Ok(())
}

fn check_author_columns(author: &Author) -> AppResult<()> {
    check_length("name", &author.name, NAME_MAX)?;
    check_length("country", &author.country, COUNTRY_MAX)
}

fn check_book_columns(book: &Book) -> AppResult<()> {
    check_length("title", &book.title, TITLE_MAX)?;
    check_length("isbn", &book.isbn, ISBN_MAX)
}

impl Tables {
    fn author(&self, id: i32) -> AppResult<&Author> {
        self.authors
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    fn book(&self, id: i32) -> AppResult<&Book> {
        self.books
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    fn check_reference(&self, author_id: i32) -> AppResult<()> {
        if !self.authors.contains_key(&author_id) {
            return Err(AppError::Reference(
                "Referenced author does not exist".to_string(),
            ));
        }
        Ok(())
    }

    fn check_isbn_free(&self, isbn: &str, except: Option<i32>) -> AppResult<()> {
        let taken = self
            .books
            .values()
            .any(|b| b.isbn == isbn && Some(b.id) != except);
        if taken {
            return Err(AppError::Integrity(
                "Unique constraint books_isbn_key violated".to_string(),
            ));
        }
        Ok(())
    }

    fn insert_book(&mut self, book: Book) -> AppResult<Book> {
        check_book_columns(&book)?;
        self.check_reference(book.author_id)?;
        self.check_isbn_free(&book.isbn, Some(book.id))?;
        self.books.insert(book.id, book.clone());
        Ok(book)
    }
}

fn compare_authors(a: &Author, b: &Author, keys: &[SortKey<AuthorSort>]) -> Ordering {
    keys.iter()
        .map(|key| {
            key.directed(match key.field {
                AuthorSort::Name => a.name.cmp(&b.name),
                AuthorSort::BirthDate => cmp_nulls_last(&a.birth_date, &b.birth_date),
            })
        })
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.id.cmp(&b.id))
}

fn compare_books(a: &Book, b: &Book, keys: &[SortKey<BookSort>]) -> Ordering {
    keys.iter()
        .map(|key| {
            key.directed(match key.field {
                BookSort::Title => a.title.cmp(&b.title),
                BookSort::PublishedDate => a.published_date.cmp(&b.published_date),
            })
        })
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.id.cmp(&b.id))
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryRepository {
    async fn create_author(&self, data: &AuthorPayload) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        let author = Author {
            id: tables.next_author_id,
            name: data.name.clone(),
            birth_date: data.birth_date,
            country: data.country.clone(),
        };
        check_author_columns(&author)?;
        tables.next_author_id += 1;
        tables.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.tables.read().await.author(id).cloned()
    }

    async fn update_author(&self, id: i32, changes: &AuthorPatch) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        let mut author = tables.author(id)?.clone();

        if let Some(ref name) = changes.name {
            author.name = name.clone();
        }
        if let Some(birth_date) = changes.birth_date {
            author.birth_date = birth_date;
        }
        if let Some(ref country) = changes.country {
            author.country = country.clone();
        }
        check_author_columns(&author)?;

        tables.authors.insert(id, author.clone());
        Ok(author)
    }

    async fn delete_author(&self, id: i32) -> AppResult<u64> {
        let mut tables = self.tables.write().await;
        tables.author(id)?;
        tables.authors.remove(&id);
        let before = tables.books.len();
        tables.books.retain(|_, b| b.author_id != id);
        Ok((before - tables.books.len()) as u64)
    }

    async fn create_book(&self, data: &BookPayload) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        let book = Book {
            id: tables.next_book_id,
            title: data.title.clone(),
            author_id: data.author_id,
            published_date: data.published_date,
            isbn: data.isbn.clone(),
        };
        let book = tables.insert_book(book)?;
        tables.next_book_id += 1;
        Ok(book)
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.tables.read().await.book(id).cloned()
    }

    async fn update_book(&self, id: i32, changes: &BookPatch) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        let mut book = tables.book(id)?.clone();

        if let Some(ref title) = changes.title {
            book.title = title.clone();
        }
        if let Some(author_id) = changes.author_id {
            book.author_id = author_id;
        }
        if let Some(published_date) = changes.published_date {
            book.published_date = published_date;
        }
        if let Some(ref isbn) = changes.isbn {
            book.isbn = isbn.clone();
        }

        tables.insert_book(book)
    }

    async fn delete_book(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.book(id)?;
        tables.books.remove(&id);
        Ok(())
    }

    async fn replace_all(&self, fixture: &Fixture) -> AppResult<LoadSummary> {
        let mut tables = self.tables.write().await;

        // build the replacement aside so a failure leaves the current catalog untouched
        let mut next = Tables {
            next_book_id: tables.next_book_id,
            ..Tables::default()
        };

        for entry in &fixture.authors {
            let data = entry.payload();
            let author = Author {
                id: entry.id,
                name: data.name,
                birth_date: data.birth_date,
                country: data.country,
            };
            check_author_columns(&author)?;
            if next.authors.insert(author.id, author).is_some() {
                return Err(AppError::Integrity(
                    "Unique constraint authors_pkey violated".to_string(),
                ));
            }
        }
        next.next_author_id = match next.authors.keys().max() {
            None => 1,
            Some(max) => max.checked_add(1).ok_or_else(|| {
                AppError::invalid_field("id", format!("Author id {} leaves no room for new authors", max))
            })?,
        };

        for entry in &fixture.books {
            let data = entry.payload();
            let book = Book {
                id: next.next_book_id,
                title: data.title,
                author_id: data.author_id,
                published_date: data.published_date,
                isbn: data.isbn,
            };
            next.insert_book(book)?;
            next.next_book_id += 1;
        }

        *tables = next;
        Ok(LoadSummary {
            authors: fixture.authors.len(),
            books: fixture.books.len(),
        })
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CatalogQuery for MemoryRepository {
    async fn list_authors(&self, filter: &AuthorFilter) -> AppResult<Vec<Author>> {
        let tables = self.tables.read().await;
        let mut authors: Vec<Author> = tables
            .authors
            .values()
            .filter(|a| {
                filter.terms.iter().all(|t| {
                    contains_ignore_case(&a.name, t) || contains_ignore_case(&a.country, t)
                })
            })
            .cloned()
            .collect();
        authors.sort_by(|a, b| compare_authors(a, b, &filter.ordering));
        Ok(authors)
    }

    async fn books_for_authors(&self, author_ids: &[i32]) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        let mut books: Vec<Book> = tables
            .books
            .values()
            .filter(|b| author_ids.contains(&b.author_id))
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(books)
    }

    async fn list_books(&self, filter: &BookFilter) -> AppResult<Vec<BookWithAuthor>> {
        let tables = self.tables.read().await;
        let mut rows = Vec::new();
        for book in tables.books.values() {
            let author = tables.author(book.author_id)?;
            let matches = filter.terms.iter().all(|t| {
                contains_ignore_case(&book.title, t)
                    || contains_ignore_case(&author.name, t)
                    || contains_ignore_case(&book.isbn, t)
            });
            if matches {
                rows.push(BookWithAuthor {
                    book: book.clone(),
                    author: author.clone(),
                });
            }
        }
        rows.sort_by(|a, b| compare_books(&a.book, &b.book, &filter.ordering));
        Ok(rows)
    }

    async fn get_book_with_author(&self, id: i32) -> AppResult<BookWithAuthor> {
        let tables = self.tables.read().await;
        let book = tables.book(id)?.clone();
        let author = tables.author(book.author_id)?.clone();
        Ok(BookWithAuthor { book, author })
    }
}
