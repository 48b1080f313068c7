//! Business logic services

pub mod books;
pub mod catalog;
pub mod email;
pub mod geo;
pub mod topics;
pub mod users;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, EmailConfig},
    repository::Repository,
};

use email::Notifier;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub books: books::BooksService,
    pub catalog: catalog::CatalogService,
    pub topics: topics::TopicsService,
    pub geo: geo::GeoService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        email_config: EmailConfig,
        frontend_url: String,
    ) -> Self {
        let email = email::EmailService::new(email_config);
        let notifier: Arc<dyn Notifier> = Arc::new(email.clone());

        Self {
            users: users::UsersService::new(
                repository.owners.clone(),
                Arc::clone(&notifier),
                auth_config,
                frontend_url,
            ),
            books: books::BooksService::new(
                repository.owners.clone(),
                repository.topics.clone(),
                notifier,
            ),
            catalog: catalog::CatalogService::new(repository.owners.clone()),
            topics: topics::TopicsService::new(repository.topics.clone()),
            geo: geo::GeoService::new(repository.geo),
            email,
        }
    }
}
