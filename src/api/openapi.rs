//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, geo, health, topics};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ShelfShare API",
        version = "1.0.0",
        description = "Book Sharing Platform REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::verify_email,
        auth::change_password,
        auth::get_profile,
        auth::update_profile,
        // Books
        books::list_books,
        books::add_book,
        books::update_book,
        books::remove_book,
        books::change_book_status,
        books::filter_books,
        books::search_books,
        books::borrowed_books,
        books::reserve_book,
        books::return_book,
        // Topics
        topics::list_topics,
        topics::get_topic,
        // Geography
        geo::list_continents,
        geo::list_countries,
        geo::list_provinces,
        geo::list_cities,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::VerifyRequest,
            auth::ChangePasswordRequest,
            crate::models::owner::RegisterOwner,
            crate::models::owner::UpdateProfile,
            crate::models::owner::ProfileView,
            // Books
            books::ChangeStatusRequest,
            books::ReservationRequest,
            crate::models::book::BookInput,
            crate::models::book::BookView,
            crate::models::book::BookSearchResult,
            crate::models::book::BookStatus,
            crate::models::book::LoanView,
            crate::models::book::Reservation,
            // Topics
            crate::models::topic::Topic,
            // Misc
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and profile"),
        (name = "books", description = "Book lifecycle, catalog filtering and loans"),
        (name = "topics", description = "Topic reference data"),
        (name = "geo", description = "Geographic reference data"),
        (name = "health", description = "Service probes")
    )
)]
pub struct ApiDoc;

/// Create the router serving the OpenAPI document and Swagger UI
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
