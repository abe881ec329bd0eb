use tracing::{debug, warn};

use super::{ApiClient, ClientError};
use crate::{auth::dto::PublicUser, images::repo_types::GeneratedImage};

/// Local view of one signed-in session.
///
/// Mirrors the server's prompt and credit checks so obvious failures never
/// leave the client, but the server's answer is what ends up in state.
pub struct Dashboard {
    api: ApiClient,
    token: Option<String>,
    pub user: Option<PublicUser>,
    pub images: Vec<GeneratedImage>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl Dashboard {
    pub fn new(api: ApiClient, token: impl Into<String>) -> Self {
        Self {
            api,
            token: Some(token.into()),
            user: None,
            images: Vec::new(),
            error: None,
            success: None,
        }
    }

    /// Sign in and start a session from the returned token.
    pub async fn login(api: ApiClient, email: &str, password: &str) -> Result<Self, ClientError> {
        let auth = api.login(email, password).await?;
        let mut dashboard = Self::new(api, auth.token);
        dashboard.user = Some(auth.user);
        Ok(dashboard)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Load identity and images. A failed identity fetch ends the session.
    pub async fn mount(&mut self) {
        self.refresh_user().await;
        if self.is_logged_in() {
            self.refresh_images().await;
        }
    }

    pub async fn refresh_user(&mut self) {
        let Some(token) = self.token.clone() else {
            return;
        };
        match self.api.me(&token).await {
            Ok(me) if me.success => self.user = Some(me.user),
            Ok(_) => self.logout(),
            Err(e) => {
                warn!(error = %e, "failed to fetch user");
                self.logout();
            }
        }
    }

    /// Image fetch failures leave the current list untouched.
    pub async fn refresh_images(&mut self) {
        let Some(token) = self.token.clone() else {
            return;
        };
        match self.api.images(&token).await {
            Ok(res) if res.success => self.images = res.images,
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to fetch images"),
        }
    }

    /// Submit `prompt`; on success the new image goes first and the credit
    /// count is replaced by the server's figure.
    pub async fn generate(&mut self, prompt: &str) {
        self.error = None;
        self.success = None;

        if prompt.trim().is_empty() {
            self.error = Some("Please enter a prompt".into());
            return;
        }
        if matches!(&self.user, Some(u) if u.credits < 1) {
            self.error = Some("Insufficient credits".into());
            return;
        }
        let Some(token) = self.token.clone() else {
            self.error = Some(ClientError::NotLoggedIn.to_string());
            return;
        };

        match self.api.generate(&token, prompt).await {
            Ok(res) => {
                debug!(image_id = %res.image.id, remaining = res.remaining_credits, "generated");
                self.success = Some("Image generated successfully!".into());
                if let Some(user) = self.user.as_mut() {
                    user.credits = res.remaining_credits;
                }
                self.images.insert(0, res.image);
            }
            Err(ClientError::Api { message, .. }) => self.error = Some(message),
            Err(e) => {
                warn!(error = %e, "generate request failed");
                self.error = Some("Failed to generate image. Please try again.".into());
            }
        }
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
        self.images.clear();
    }
}
