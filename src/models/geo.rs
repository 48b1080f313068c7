//! Geographic reference data: continents, countries, provinces, cities

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Continent {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Country {
    pub id: Uuid,
    pub name: String,
    pub continent_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Province {
    pub id: Uuid,
    pub name: String,
    pub country_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub province_id: Uuid,
}
