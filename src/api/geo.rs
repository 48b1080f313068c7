//! Geographic reference-data endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;

/// List all continents
#[utoipa::path(
    get,
    path = "/geo/continents",
    tag = "geo",
    responses(
        (status = 200, description = "Continent names", body = Vec<String>)
    )
)]
pub async fn list_continents(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<String>>> {
    let names = state.services.geo.continents().await?;
    Ok(Json(names))
}

/// List the countries of a continent
#[utoipa::path(
    get,
    path = "/geo/continents/{continent}/countries",
    tag = "geo",
    params(("continent" = String, Path, description = "Continent name")),
    responses(
        (status = 200, description = "Country names", body = Vec<String>),
        (status = 404, description = "Continent not found")
    )
)]
pub async fn list_countries(
    State(state): State<crate::AppState>,
    Path(continent): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    let names = state.services.geo.countries(&continent).await?;
    Ok(Json(names))
}

/// List the provinces of a country
#[utoipa::path(
    get,
    path = "/geo/continents/{continent}/countries/{country}/provinces",
    tag = "geo",
    params(
        ("continent" = String, Path, description = "Continent name"),
        ("country" = String, Path, description = "Country name")
    ),
    responses(
        (status = 200, description = "Province names", body = Vec<String>),
        (status = 400, description = "Country outside the continent"),
        (status = 404, description = "Continent or country not found")
    )
)]
pub async fn list_provinces(
    State(state): State<crate::AppState>,
    Path((continent, country)): Path<(String, String)>,
) -> AppResult<Json<Vec<String>>> {
    let names = state.services.geo.provinces(&continent, &country).await?;
    Ok(Json(names))
}

/// List the cities of a province
#[utoipa::path(
    get,
    path = "/geo/continents/{continent}/countries/{country}/provinces/{province}/cities",
    tag = "geo",
    params(
        ("continent" = String, Path, description = "Continent name"),
        ("country" = String, Path, description = "Country name"),
        ("province" = String, Path, description = "Province name")
    ),
    responses(
        (status = 200, description = "City names", body = Vec<String>),
        (status = 400, description = "Country outside the continent"),
        (status = 404, description = "Continent, country or province not found")
    )
)]
pub async fn list_cities(
    State(state): State<crate::AppState>,
    Path((continent, country, province)): Path<(String, String, String)>,
) -> AppResult<Json<Vec<String>>> {
    let names = state
        .services
        .geo
        .cities(&continent, &country, &province)
        .await?;
    Ok(Json(names))
}
