//! Search terms and ordering shared by the list endpoints.
//!
//! `search` is split on whitespace and commas; a record matches when every
//! term is found (case-insensitively) in at least one searchable field.
//! `ordering` is a comma-separated list of field names, each optionally
//! prefixed with `-` for descending order.

use std::cmp::Ordering;

use crate::error::{AppError, AppResult};

/// A field a listing may be ordered by
pub trait SortField: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    /// Public names accepted in the `ordering` parameter
    const ALLOWED: &'static [(&'static str, Self)];
    /// Ordering used when the caller gives none
    const DEFAULT: Self;

    /// Qualified SQL column for this field
    fn column(self) -> &'static str;
}

/// One `ordering` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey<F> {
    pub field: F,
    pub descending: bool,
}

impl<F: SortField> SortKey<F> {
    pub fn ascending(field: F) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    /// Apply the direction to an ascending comparison
    pub fn directed(&self, ordering: Ordering) -> Ordering {
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Split a raw `search` parameter into terms
pub fn search_terms(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a raw `ordering` parameter, rejecting fields outside `F::ALLOWED`
pub fn parse_ordering<F: SortField>(raw: Option<&str>) -> AppResult<Vec<SortKey<F>>> {
    let mut keys = Vec::new();

    for part in raw.unwrap_or_default().split(',').map(str::trim) {
        if part.is_empty() {
            continue;
        }
        let (name, descending) = match part.strip_prefix('-') {
            Some(name) => (name, true),
            None => (part, false),
        };
        let field = F::ALLOWED
            .iter()
            .find(|(allowed, _)| *allowed == name)
            .map(|(_, field)| *field)
            .ok_or_else(|| {
                let allowed: Vec<&str> = F::ALLOWED.iter().map(|(n, _)| *n).collect();
                AppError::invalid_field(
                    "ordering",
                    format!(
                        "Cannot order by \"{}\". Choices are: {}",
                        name,
                        allowed.join(", ")
                    ),
                )
            })?;
        keys.push(SortKey { field, descending });
    }

    if keys.is_empty() {
        keys.push(SortKey::ascending(F::DEFAULT));
    }
    Ok(keys)
}

/// Build an `ORDER BY` clause, tie-broken on `id_column`
pub fn order_clause<F: SortField>(keys: &[SortKey<F>], id_column: &str) -> String {
    let mut parts: Vec<String> = keys
        .iter()
        .map(|k| {
            format!(
                "{} {}",
                k.field.column(),
                if k.descending { "DESC" } else { "ASC" }
            )
        })
        .collect();
    parts.push(format!("{} ASC", id_column));
    format!("ORDER BY {}", parts.join(", "))
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards escaped
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Case-insensitive substring test used by the in-memory store
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Compare optional values the way PostgreSQL sorts them ascending (NULLS LAST)
pub fn cmp_nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
