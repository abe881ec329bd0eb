use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One successful generation. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    pub image_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl GeneratedImage {
    pub fn new(user_id: Uuid, prompt: String, image_url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            prompt,
            image_url,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
