use serde_json::Value;
use tracing::{info, warn};

use super::repo_types::GeneratedImage;
use crate::{
    auth::repo_types::User,
    error::{internal, ApiError},
    state::AppState,
};

const GENERATE_FAILED: &str = "Failed to generate image";

/// Accepts only a JSON string that is non-empty once trimmed. The text is
/// returned as submitted, untrimmed.
pub fn validate_prompt(prompt: Option<Value>) -> Result<String, ApiError> {
    match prompt {
        Some(Value::String(p)) if !p.trim().is_empty() => Ok(p),
        _ => Err(ApiError::Validation("Valid prompt is required".into())),
    }
}

/// Spend one credit of `user` on one image for `prompt`.
///
/// The balance is checked before the provider call so an empty account never
/// costs a generation. The spend itself is a conditional decrement, so two
/// racing requests cannot take the same last credit.
pub async fn generate_for_user(
    st: &AppState,
    user: &User,
    prompt: String,
) -> Result<(GeneratedImage, i64), ApiError> {
    if user.credits < 1 {
        warn!(user_id = %user.id, "generation refused: no credits");
        return Err(ApiError::InsufficientCredits);
    }

    let image_url = st
        .generator
        .generate(&prompt)
        .await
        .map_err(internal(GENERATE_FAILED))?;

    let spent = st
        .store
        .consume_credit(user.id)
        .await
        .map_err(internal(GENERATE_FAILED))?;
    if spent.is_none() {
        warn!(user_id = %user.id, "credit spent by a concurrent request");
        return Err(ApiError::InsufficientCredits);
    }

    let image = GeneratedImage::new(user.id, prompt, image_url);
    st.store
        .create_image(&image)
        .await
        .map_err(internal(GENERATE_FAILED))?;

    let remaining = st
        .store
        .find_user_by_id(user.id)
        .await
        .map_err(internal(GENERATE_FAILED))?
        .map(|u| u.credits)
        .unwrap_or(0);

    info!(user_id = %user.id, image_id = %image.id, remaining, "image generated");
    Ok((image, remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_must_be_non_blank_string() {
        assert!(validate_prompt(None).is_err());
        assert!(validate_prompt(Some(json!(null))).is_err());
        assert!(validate_prompt(Some(json!(42))).is_err());
        assert!(validate_prompt(Some(json!(["a"]))).is_err());
        assert!(validate_prompt(Some(json!(""))).is_err());
        assert!(validate_prompt(Some(json!(" \t\n"))).is_err());
    }

    #[test]
    fn prompt_is_kept_verbatim() {
        let p = validate_prompt(Some(json!("  a red bicycle "))).unwrap();
        assert_eq!(p, "  a red bicycle ");
    }

    #[tokio::test]
    async fn spends_one_credit_and_records_image() {
        let st = AppState::fake();
        let user = st.store.create_user("a@b.co", "hash", 3).await.unwrap().unwrap();

        let (image, remaining) = generate_for_user(&st, &user, "a red bicycle".into())
            .await
            .unwrap();

        assert_eq!(remaining, 2);
        assert_eq!(image.user_id, user.id);
        assert_eq!(image.prompt, "a red bicycle");
        assert!(!image.image_url.is_empty());
        let images = st.store.get_images_by_user_id(user.id).await.unwrap();
        assert_eq!(images, vec![image]);
    }

    #[tokio::test]
    async fn refuses_empty_balance() {
        let st = AppState::fake();
        let user = st.store.create_user("a@b.co", "hash", 0).await.unwrap().unwrap();

        let err = generate_for_user(&st, &user, "x".into()).await.unwrap_err();
        assert!(matches!(err, ApiError::InsufficientCredits));
        assert!(st.store.get_images_by_user_id(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_balance_loses_to_concurrent_spend() {
        let st = AppState::fake();
        let user = st.store.create_user("a@b.co", "hash", 1).await.unwrap().unwrap();
        // Another request took the last credit after this user was loaded.
        st.store.consume_credit(user.id).await.unwrap();

        let err = generate_for_user(&st, &user, "x".into()).await.unwrap_err();
        assert!(matches!(err, ApiError::InsufficientCredits));
        assert!(st.store.get_images_by_user_id(user.id).await.unwrap().is_empty());
        let fresh = st.store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fresh.credits, 0);
    }
}
