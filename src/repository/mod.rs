//! Repository layer: store interfaces and their Postgres implementations
//!
//! Owners are persisted as documents (one row per owner, the embedded book
//! list and region as `jsonb`), reachable by keyed lookups and by the closed
//! family of predicate queries in [`CatalogQuery`]. Services depend on the
//! traits here, never on SQL.

pub mod geo;
pub mod owners;
pub mod topics;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        catalog::CatalogQuery,
        geo::{City, Continent, Country, Province},
        owner::Owner,
        topic::Topic,
    },
};

/// Owner document store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OwnerStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Owner>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Owner>>;
    async fn exists_by_email(&self, email: &str) -> AppResult<bool>;
    async fn find_by_verification_token(&self, token: &str) -> AppResult<Option<Owner>>;
    async fn find_all(&self) -> AppResult<Vec<Owner>>;
    /// Execute one predicate query and return the matching owner documents
    async fn find_matching(&self, query: &CatalogQuery) -> AppResult<Vec<Owner>>;
    /// Owners having at least one book whose title or author contains the
    /// term, case-insensitively
    async fn search_title_author(&self, term: &str) -> AppResult<Vec<Owner>>;
    /// Write back the whole owner document (insert or overwrite)
    async fn save(&self, owner: &Owner) -> AppResult<()>;
}

/// Topic reference-data store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TopicStore: Send + Sync {
    async fn find_all(&self) -> AppResult<Vec<Topic>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Topic>>;
    async fn find_by_names(&self, names: &[String]) -> AppResult<Vec<Topic>>;
}

/// Geography reference-data store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoStore: Send + Sync {
    async fn continents(&self) -> AppResult<Vec<Continent>>;
    async fn continent_by_name(&self, name: &str) -> AppResult<Option<Continent>>;
    async fn countries_by_continent(&self, continent_id: Uuid) -> AppResult<Vec<Country>>;
    async fn country_by_name(&self, name: &str) -> AppResult<Option<Country>>;
    async fn provinces_by_country(&self, country_id: Uuid) -> AppResult<Vec<Province>>;
    async fn province_by_name_and_country(
        &self,
        name: &str,
        country_id: Uuid,
    ) -> AppResult<Option<Province>>;
    async fn cities_by_province(&self, province_id: Uuid) -> AppResult<Vec<City>>;
}

/// Main repository wiring the Postgres-backed stores
#[derive(Clone)]
pub struct Repository {
    pub owners: Arc<dyn OwnerStore>,
    pub topics: Arc<dyn TopicStore>,
    pub geo: Arc<dyn GeoStore>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            owners: Arc::new(owners::PgOwnerStore::new(pool.clone())),
            topics: Arc::new(topics::PgTopicStore::new(pool.clone())),
            geo: Arc::new(geo::PgGeoStore::new(pool)),
        }
    }
}
