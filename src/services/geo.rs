//! Hierarchical geography lookups: continents, countries, provinces, cities

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::geo::{Continent, Country, Province},
    repository::GeoStore,
};

#[derive(Clone)]
pub struct GeoService {
    geo: Arc<dyn GeoStore>,
}

impl GeoService {
    pub fn new(geo: Arc<dyn GeoStore>) -> Self {
        Self { geo }
    }

    /// Names of all continents
    pub async fn continents(&self) -> AppResult<Vec<String>> {
        Ok(self
            .geo
            .continents()
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    /// Names of all countries in a continent
    pub async fn countries(&self, continent_name: &str) -> AppResult<Vec<String>> {
        let continent = self.get_continent(continent_name).await?;
        Ok(self
            .geo
            .countries_by_continent(continent.id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    /// Names of all provinces in a country, validating the hierarchy
    pub async fn provinces(
        &self,
        continent_name: &str,
        country_name: &str,
    ) -> AppResult<Vec<String>> {
        let continent = self.get_continent(continent_name).await?;
        let country = self.get_country(country_name, &continent).await?;

        Ok(self
            .geo
            .provinces_by_country(country.id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect())
    }

    /// Names of all cities in a province, validating the hierarchy
    pub async fn cities(
        &self,
        continent_name: &str,
        country_name: &str,
        province_name: &str,
    ) -> AppResult<Vec<String>> {
        let continent = self.get_continent(continent_name).await?;
        let country = self.get_country(country_name, &continent).await?;
        let province = self.get_province(province_name, &country).await?;

        Ok(self
            .geo
            .cities_by_province(province.id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    async fn get_continent(&self, name: &str) -> AppResult<Continent> {
        self.geo
            .continent_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Continent {} not found", name)))
    }

    async fn get_country(&self, name: &str, continent: &Continent) -> AppResult<Country> {
        let country = self
            .geo
            .country_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Country {} not found", name)))?;

        if country.continent_id != continent.id {
            return Err(AppError::InvalidInput(format!(
                "Country {} does not belong to continent {}",
                name, continent.name
            )));
        }
        Ok(country)
    }

    async fn get_province(&self, name: &str, country: &Country) -> AppResult<Province> {
        self.geo
            .province_by_name_and_country(name, country.id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Province {} not found in country {}",
                    name, country.name
                ))
            })
    }
}
