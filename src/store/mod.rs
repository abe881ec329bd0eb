//! User and image persistence.
//!
//! Handlers only see the [`Store`] trait. [`MemoryStore`] backs local runs and
//! tests, [`PgStore`] backs deployments with a `DATABASE_URL`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{auth::repo_types::User, images::repo_types::GeneratedImage};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Create a user with an initial credit balance. `None` means the email
    /// is already taken.
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        credits: i64,
    ) -> anyhow::Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Overwrite a balance. Negative values are rejected.
    async fn update_user_credits(&self, id: Uuid, credits: i64) -> anyhow::Result<()>;

    /// Decrement the balance by one if it is at least one, as a single step.
    /// Returns the new balance, or `None` when there was nothing to spend.
    async fn consume_credit(&self, id: Uuid) -> anyhow::Result<Option<i64>>;

    /// Persist a new image. The owner must exist.
    async fn create_image(&self, image: &GeneratedImage) -> anyhow::Result<()>;

    /// All images owned by `user_id`, in the order they were stored.
    async fn get_images_by_user_id(&self, user_id: Uuid) -> anyhow::Result<Vec<GeneratedImage>>;
}
