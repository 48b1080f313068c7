//! ShelfShare Book Sharing Platform
//!
//! Backend of a book-sharing web platform: users register, list the books
//! they own, browse and filter other users' books by topic and location, and
//! reserve, borrow and return them.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
