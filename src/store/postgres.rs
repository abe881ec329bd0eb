use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use crate::{auth::repo_types::User, images::repo_types::GeneratedImage};

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        credits: i64,
    ) -> anyhow::Result<Option<User>> {
        anyhow::ensure!(credits >= 0, "credits must be non-negative");
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, credits)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, credits, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(credits)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(Some(user)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e).context("insert user"),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, credits, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, credits, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn update_user_credits(&self, id: Uuid, credits: i64) -> anyhow::Result<()> {
        anyhow::ensure!(credits >= 0, "credits must be non-negative");
        let res = sqlx::query(r#"UPDATE users SET credits = $2 WHERE id = $1"#)
            .bind(id)
            .bind(credits)
            .execute(&self.db)
            .await
            .context("update user credits")?;
        anyhow::ensure!(res.rows_affected() == 1, "user {} not found", id);
        Ok(())
    }

    async fn consume_credit(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let remaining = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
               SET credits = credits - 1
             WHERE id = $1 AND credits >= 1
            RETURNING credits
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("consume credit")?;
        Ok(remaining)
    }

    async fn create_image(&self, image: &GeneratedImage) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO generated_images (id, user_id, prompt, image_url, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(image.id)
        .bind(image.user_id)
        .bind(&image.prompt)
        .bind(&image.image_url)
        .bind(image.created_at)
        .execute(&self.db)
        .await
        .context("insert generated image")?;
        Ok(())
    }

    async fn get_images_by_user_id(&self, user_id: Uuid) -> anyhow::Result<Vec<GeneratedImage>> {
        let rows = sqlx::query_as::<_, GeneratedImage>(
            r#"
            SELECT id, user_id, prompt, image_url, created_at
              FROM generated_images
             WHERE user_id = $1
             ORDER BY seq ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list images by user")?;
        Ok(rows)
    }
}
