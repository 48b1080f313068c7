//! Topic reference-data store backed by Postgres

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{error::AppResult, models::topic::Topic};

use super::TopicStore;

#[derive(Clone)]
pub struct PgTopicStore {
    pool: Pool<Postgres>,
}

impl PgTopicStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TopicStore for PgTopicStore {
    async fn find_all(&self) -> AppResult<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>("SELECT * FROM topics ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(topics)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Topic>> {
        let topic = sqlx::query_as::<_, Topic>("SELECT * FROM topics WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(topic)
    }

    async fn find_by_names(&self, names: &[String]) -> AppResult<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>("SELECT * FROM topics WHERE name = ANY($1)")
            .bind(names)
            .fetch_all(&self.pool)
            .await?;
        Ok(topics)
    }
}
