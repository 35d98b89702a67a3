//! Data models for the catalog

use serde::{de::Error as _, Deserialize, Deserializer};

pub mod author;
pub mod book;
pub mod fixture;
pub mod query;

// Re-export commonly used types
pub use author::{Author, AuthorFilter, AuthorPatch, AuthorPayload, AuthorQuery};
pub use book::{Book, BookFilter, BookPatch, BookPayload, BookQuery, BookWithAuthor};
pub use fixture::{Fixture, LoadSummary};

/// Deserialize an optional patch field that may be omitted but not set to `null`
pub(crate) fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<T>::deserialize(deserializer)? {
        Some(value) => Ok(Some(value)),
        None => Err(D::Error::custom("This field may not be null.")),
    }
}
