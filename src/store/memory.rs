use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::Store;
use crate::{auth::repo_types::User, images::repo_types::GeneratedImage};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    images: Vec<GeneratedImage>,
}

/// Process-local store. Every operation holds the lock for its whole body.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        credits: i64,
    ) -> anyhow::Result<Option<User>> {
        anyhow::ensure!(credits >= 0, "credits must be non-negative");
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            credits,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.insert(user.id, user.clone());
        debug!(user_id = %user.id, "user created");
        Ok(Some(user))
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn update_user_credits(&self, id: Uuid, credits: i64) -> anyhow::Result<()> {
        anyhow::ensure!(credits >= 0, "credits must be non-negative");
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("user {} not found", id))?;
        user.credits = credits;
        Ok(())
    }

    async fn consume_credit(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("user {} not found", id))?;
        if user.credits < 1 {
            return Ok(None);
        }
        user.credits -= 1;
        Ok(Some(user.credits))
    }

    async fn create_image(&self, image: &GeneratedImage) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        anyhow::ensure!(
            inner.users.contains_key(&image.user_id),
            "image owner {} does not exist",
            image.user_id
        );
        inner.images.push(image.clone());
        Ok(())
    }

    async fn get_images_by_user_id(&self, user_id: Uuid) -> anyhow::Result<Vec<GeneratedImage>> {
        let inner = self.inner.read().await;
        Ok(inner
            .images
            .iter()
            .filter(|img| img.user_id == user_id)
            .cloned()
            .collect())
    }
}
