//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::query::{parse_ordering, search_terms, SortField, SortKey};
use crate::error::AppResult;

/// Author record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub country: String,
}

/// Create or replace an author
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AuthorPayload {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 100, message = "Country must be at most 100 characters"))]
    pub country: String,
}

impl AuthorPayload {
    /// Strip surrounding whitespace from text fields
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.country = self.country.trim().to_string();
        self
    }
}

/// Partial author update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
pub struct AuthorPatch {
    #[serde(default, deserialize_with = "crate::models::non_null")]
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,
    /// `null` clears the birth date
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "crate::models::non_null")]
    #[validate(length(max = 100, message = "Country must be at most 100 characters"))]
    pub country: Option<String>,
}

impl AuthorPatch {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self.country = self.country.map(|c| c.trim().to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.birth_date.is_none() && self.country.is_none()
    }
}

impl From<AuthorPayload> for AuthorPatch {
    fn from(payload: AuthorPayload) -> Self {
        Self {
            name: Some(payload.name),
            birth_date: Some(payload.birth_date),
            country: Some(payload.country),
        }
    }
}

/// Author list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AuthorQuery {
    /// Terms matched against name and country
    pub search: Option<String>,
    /// `name` or `birth_date`, `-` prefix for descending
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorSort {
    Name,
    BirthDate,
}

impl SortField for AuthorSort {
    const ALLOWED: &'static [(&'static str, Self)] =
        &[("name", AuthorSort::Name), ("birth_date", AuthorSort::BirthDate)];
    const DEFAULT: Self = AuthorSort::Name;

    fn column(self) -> &'static str {
        match self {
            AuthorSort::Name => "name",
            AuthorSort::BirthDate => "birth_date",
        }
    }
}

/// Parsed author listing criteria
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorFilter {
    pub terms: Vec<String>,
    pub ordering: Vec<SortKey<AuthorSort>>,
}

impl AuthorFilter {
    pub fn from_query(query: &AuthorQuery) -> AppResult<Self> {
        Ok(Self {
            terms: search_terms(query.search.as_deref()),
            ordering: parse_ordering(query.ordering.as_deref())?,
        })
    }
}

impl Default for AuthorFilter {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            ordering: vec![SortKey::ascending(AuthorSort::DEFAULT)],
        }
    }
}
