//! Topic reference data

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Reference-data tag attached to books for filtering. Topics are created
/// out of band and are read-only from the application's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub description: Option<String>,
}
