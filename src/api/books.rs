//! Book endpoints: the owner's list, catalog filtering and search, loans

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookInput, BookSearchResult, BookView, LoanView},
        catalog::BookFilter,
    },
};

use super::AuthenticatedUser;

/// Status change request
#[derive(Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    /// One of: available, reserved, borrowed (case-insensitive)
    pub status: String,
}

/// Reservation / return request, addressing a book by its owner and title
#[derive(Deserialize, Validate, ToSchema)]
pub struct ReservationRequest {
    #[validate(email)]
    pub owner_email: String,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
}

/// Catalog filter dimensions; omitted or "todos"/"all" means no filtering
#[derive(Deserialize, IntoParams)]
pub struct FilterParams {
    pub topic: Option<String>,
    pub status: Option<String>,
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
}

/// Free-text search parameters
#[derive(Deserialize, IntoParams)]
pub struct SearchParams {
    pub query: String,
}

/// List the authenticated owner's books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The owner's books in list order", body = Vec<BookView>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookView>>> {
    let books = state.services.books.list_books(&claims.sub).await?;
    Ok(Json(books))
}

/// Add a book to the authenticated owner's list
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookInput,
    responses(
        (status = 201, description = "Book added", body = BookView),
        (status = 400, description = "Empty or unresolvable topic list")
    )
)]
pub async fn add_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(input): Json<BookInput>,
) -> AppResult<(StatusCode, Json<BookView>)> {
    input
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let book = state.services.books.add_book(&claims.sub, input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update the book at a position in the authenticated owner's list
#[utoipa::path(
    put,
    path = "/books/{index}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("index" = usize, Path, description = "Position in the owner's list")),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated", body = BookView),
        (status = 400, description = "Empty or unresolvable topic list"),
        (status = 404, description = "Owner unknown or index out of range")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(index): Path<usize>,
    Json(input): Json<BookInput>,
) -> AppResult<Json<BookView>> {
    input
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let book = state
        .services
        .books
        .update_book(&claims.sub, index, input)
        .await?;
    Ok(Json(book))
}

/// Remove the book at a position in the authenticated owner's list
#[utoipa::path(
    delete,
    path = "/books/{index}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("index" = usize, Path, description = "Position in the owner's list")),
    responses(
        (status = 204, description = "Book removed"),
        (status = 404, description = "Owner unknown or index out of range")
    )
)]
pub async fn remove_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(index): Path<usize>,
) -> AppResult<StatusCode> {
    state.services.books.remove_book(&claims.sub, index).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change the status of the book at a position
#[utoipa::path(
    put,
    path = "/books/{index}/status",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("index" = usize, Path, description = "Position in the owner's list")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = BookView),
        (status = 400, description = "Unknown status literal"),
        (status = 404, description = "Owner unknown or index out of range")
    )
)]
pub async fn change_book_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(index): Path<usize>,
    Json(request): Json<ChangeStatusRequest>,
) -> AppResult<Json<BookView>> {
    let book = state
        .services
        .books
        .change_status(&claims.sub, index, &request.status)
        .await?;
    Ok(Json(book))
}

/// Filter the whole catalog by topic, status and location
#[utoipa::path(
    get,
    path = "/books/filter",
    tag = "books",
    params(FilterParams),
    responses(
        (status = 200, description = "Matching books", body = Vec<BookSearchResult>),
        (status = 400, description = "Malformed topic id")
    )
)]
pub async fn filter_books(
    State(state): State<crate::AppState>,
    Query(params): Query<FilterParams>,
) -> AppResult<Json<Vec<BookSearchResult>>> {
    let filter = BookFilter::new(
        params.topic,
        params.status,
        params.country,
        params.province,
        params.city,
    )?;

    let results = state.services.catalog.filter_books(&filter).await?;
    Ok(Json(results))
}

/// Search the whole catalog by title or author substring
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching books", body = Vec<BookSearchResult>)
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<BookSearchResult>>> {
    let results = state.services.catalog.search_books(&params.query).await?;
    Ok(Json(results))
}

/// Books currently borrowed by or reserved for the authenticated user
#[utoipa::path(
    get,
    path = "/books/borrowed",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active loans", body = Vec<LoanView>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn borrowed_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanView>>> {
    let loans = state.services.books.borrowed_by(&claims.sub).await?;
    Ok(Json(loans))
}

/// Reserve another owner's book
#[utoipa::path(
    post,
    path = "/books/reserve",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = ReservationRequest,
    responses(
        (status = 204, description = "Reserved"),
        (status = 404, description = "Owner or book not found"),
        (status = 409, description = "Book is not available")
    )
)]
pub async fn reserve_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ReservationRequest>,
) -> AppResult<StatusCode> {
    request
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    state
        .services
        .books
        .reserve_book(&claims.sub, &request.owner_email, &request.title)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Return a borrowed or reserved book
#[utoipa::path(
    post,
    path = "/books/return",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = ReservationRequest,
    responses(
        (status = 204, description = "Returned"),
        (status = 404, description = "No matching book or reservation")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ReservationRequest>,
) -> AppResult<StatusCode> {
    request
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    state
        .services
        .books
        .return_book(&claims.sub, &request.owner_email, &request.title)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
