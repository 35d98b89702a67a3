//! Fixture loading service

use std::{collections::HashMap, path::Path, sync::Arc};

use crate::{
    error::{AppError, AppResult},
    models::{Fixture, LoadSummary},
    repository::CatalogStore,
};

#[derive(Clone)]
pub struct FixtureService {
    store: Arc<dyn CatalogStore>,
}

impl FixtureService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Read a fixture document from disk and load it
    pub async fn load_file(&self, path: &Path) -> AppResult<LoadSummary> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Internal(format!("Cannot read fixture {}: {}", path.display(), e))
        })?;
        self.load(&Fixture::from_json(&text)?).await
    }

    /// Replace the whole catalog with the fixture contents
    pub async fn load(&self, fixture: &Fixture) -> AppResult<LoadSummary> {
        fixture.check()?;

        tracing::info!("Clearing existing data and loading fixture");
        let summary = self.store.replace_all(fixture).await?;

        let names: HashMap<i32, String> = fixture
            .authors
            .iter()
            .map(|a| (a.id, a.payload().name))
            .collect();
        for author in &fixture.authors {
            tracing::info!("Created author: {}", author.payload().name);
        }
        for book in &fixture.books {
            tracing::info!(
                "Created book: {} by {}",
                book.payload().title,
                names.get(&book.author_id).map_or("?", String::as_str)
            );
        }

        tracing::info!(
            "Successfully loaded {} authors and {} books",
            summary.authors,
            summary.books
        );
        Ok(summary)
    }
}
