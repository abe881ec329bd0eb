use serde::{Deserialize, Serialize};

use super::repo_types::GeneratedImage;

/// `prompt` is kept loose so a missing or non-string value is a 400, not a
/// deserialization rejection.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub message: String,
    pub image: GeneratedImage,
    pub remaining_credits: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImagesResponse {
    pub success: bool,
    pub images: Vec<GeneratedImage>,
}
