//! Business logic services

pub mod catalog;
pub mod fixtures;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub fixtures: fixtures::FixtureService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.store.clone(), repository.query),
            fixtures: fixtures::FixtureService::new(repository.store),
        }
    }
}
