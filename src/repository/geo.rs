//! Geography reference-data store backed by Postgres

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::geo::{City, Continent, Country, Province},
};

use super::GeoStore;

#[derive(Clone)]
pub struct PgGeoStore {
    pool: Pool<Postgres>,
}

impl PgGeoStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GeoStore for PgGeoStore {
    async fn continents(&self) -> AppResult<Vec<Continent>> {
        let continents = sqlx::query_as::<_, Continent>("SELECT * FROM continents ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(continents)
    }

    async fn continent_by_name(&self, name: &str) -> AppResult<Option<Continent>> {
        let continent = sqlx::query_as::<_, Continent>("SELECT * FROM continents WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(continent)
    }

    async fn countries_by_continent(&self, continent_id: Uuid) -> AppResult<Vec<Country>> {
        let countries = sqlx::query_as::<_, Country>(
            "SELECT * FROM countries WHERE continent_id = $1 ORDER BY name",
        )
        .bind(continent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(countries)
    }

    async fn country_by_name(&self, name: &str) -> AppResult<Option<Country>> {
        let country = sqlx::query_as::<_, Country>("SELECT * FROM countries WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(country)
    }

    async fn provinces_by_country(&self, country_id: Uuid) -> AppResult<Vec<Province>> {
        let provinces = sqlx::query_as::<_, Province>(
            "SELECT * FROM provinces WHERE country_id = $1 ORDER BY name",
        )
        .bind(country_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(provinces)
    }

    async fn province_by_name_and_country(
        &self,
        name: &str,
        country_id: Uuid,
    ) -> AppResult<Option<Province>> {
        let province = sqlx::query_as::<_, Province>(
            "SELECT * FROM provinces WHERE name = $1 AND country_id = $2",
        )
        .bind(name)
        .bind(country_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(province)
    }

    async fn cities_by_province(&self, province_id: Uuid) -> AppResult<Vec<City>> {
        let cities = sqlx::query_as::<_, City>(
            "SELECT * FROM cities WHERE province_id = $1 ORDER BY name",
        )
        .bind(province_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(cities)
    }
}
