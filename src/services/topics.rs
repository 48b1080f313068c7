//! Topic reference-data service

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::topic::Topic,
    repository::TopicStore,
};

#[derive(Clone)]
pub struct TopicsService {
    topics: Arc<dyn TopicStore>,
}

impl TopicsService {
    pub fn new(topics: Arc<dyn TopicStore>) -> Self {
        Self { topics }
    }

    /// All topics available for tagging books
    pub async fn list_topics(&self) -> AppResult<Vec<Topic>> {
        self.topics.find_all().await
    }

    /// Get a topic by ID
    pub async fn get_topic(&self, id: Uuid) -> AppResult<Topic> {
        self.topics
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Topic {} not found", id)))
    }
}
