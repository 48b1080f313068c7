//! Topic reference-data endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{error::AppResult, models::topic::Topic};

/// List all topics
#[utoipa::path(
    get,
    path = "/topics",
    tag = "topics",
    responses(
        (status = 200, description = "All topics", body = Vec<Topic>)
    )
)]
pub async fn list_topics(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Topic>>> {
    let topics = state.services.topics.list_topics().await?;
    Ok(Json(topics))
}

/// Get a topic by ID
#[utoipa::path(
    get,
    path = "/topics/{id}",
    tag = "topics",
    params(("id" = Uuid, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Topic details", body = Topic),
        (status = 404, description = "Topic not found")
    )
)]
pub async fn get_topic(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Topic>> {
    let topic = state.services.topics.get_topic(id).await?;
    Ok(Json(topic))
}
