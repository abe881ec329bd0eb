use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{GenerateRequest, GenerateResponse, ImagesResponse},
    services::{generate_for_user, validate_prompt},
};
use crate::{
    auth::extractors::AuthUser,
    error::{internal, ApiError},
    state::AppState,
};

pub fn image_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/images", get(list_images))
}

/// POST /api/generate { prompt }
#[instrument(skip_all, fields(user_id = tracing::field::Empty))]
pub async fn generate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    tracing::Span::current().record("user_id", tracing::field::display(user.id));

    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable generate body");
            GenerateRequest::default()
        }
    };
    let prompt = validate_prompt(body.prompt)?;

    let (image, remaining_credits) = generate_for_user(&state, &user, prompt).await?;

    Ok(Json(GenerateResponse {
        success: true,
        message: "Image generated successfully".into(),
        image,
        remaining_credits,
    }))
}

/// GET /api/images
#[instrument(skip_all, fields(user_id = tracing::field::Empty))]
pub async fn list_images(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ImagesResponse>, ApiError> {
    tracing::Span::current().record("user_id", tracing::field::display(user.id));

    let images = state
        .store
        .get_images_by_user_id(user.id)
        .await
        .map_err(internal("Failed to retrieve images"))?;

    Ok(Json(ImagesResponse {
        success: true,
        images,
    }))
}
