use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use imagegen::{
    app::build_app,
    auth::repo_types::User,
    images::repo_types::GeneratedImage,
    config::{AppConfig, GeneratorConfig, JwtConfig},
    generator::ImageGenerator,
    state::AppState,
    store::{MemoryStore, Store},
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Generator double that counts calls and can be told to fail.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl ScriptedGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("provider unavailable");
        }
        Ok(format!("https://cdn.test/{}-{}.png", n, prompt.len()))
    }
}

/// Memory store whose individual operations can be switched to fail.
#[derive(Default)]
pub struct FailingStore {
    pub inner: Arc<MemoryStore>,
    pub fail_consume: AtomicBool,
    pub fail_create_image: AtomicBool,
    pub fail_list: AtomicBool,
}

impl FailingStore {
    fn check(flag: &AtomicBool, op: &str) -> anyhow::Result<()> {
        if flag.load(Ordering::SeqCst) {
            anyhow::bail!("{op}: connection reset");
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        credits: i64,
    ) -> anyhow::Result<Option<User>> {
        self.inner.create_user(email, password_hash, credits).await
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn update_user_credits(&self, id: Uuid, credits: i64) -> anyhow::Result<()> {
        self.inner.update_user_credits(id, credits).await
    }

    async fn consume_credit(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        Self::check(&self.fail_consume, "consume credit")?;
        self.inner.consume_credit(id).await
    }

    async fn create_image(&self, image: &GeneratedImage) -> anyhow::Result<()> {
        Self::check(&self.fail_create_image, "insert image")?;
        self.inner.create_image(image).await
    }

    async fn get_images_by_user_id(&self, user_id: Uuid) -> anyhow::Result<Vec<GeneratedImage>> {
        Self::check(&self.fail_list, "list images")?;
        self.inner.get_images_by_user_id(user_id).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<ScriptedGenerator>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        jwt: JwtConfig {
            secret: "integration-secret".into(),
            issuer: "imagegen".into(),
            audience: "imagegen-users".into(),
            ttl_minutes: 10,
        },
        generator: GeneratorConfig {
            api_url: "http://unused.local".into(),
            api_key: None,
            model: None,
            timeout_secs: 1,
        },
        signup_credits: 3,
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(ScriptedGenerator::default())
}

pub fn spawn_app_with(generator: ScriptedGenerator) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(generator);
    let state = AppState::from_parts(
        store.clone() as Arc<dyn Store>,
        generator.clone() as Arc<dyn ImageGenerator>,
        Arc::new(test_config()),
    );
    TestApp {
        router: build_app(state.clone()),
        state,
        store,
        generator,
    }
}

/// App whose store can be made to fail. `TestApp::store` is the backing
/// memory store, for inspecting state directly.
pub fn spawn_failing_app() -> (TestApp, Arc<FailingStore>) {
    let failing = Arc::new(FailingStore::default());
    let generator = Arc::new(ScriptedGenerator::default());
    let state = AppState::from_parts(
        failing.clone() as Arc<dyn Store>,
        generator.clone() as Arc<dyn ImageGenerator>,
        Arc::new(test_config()),
    );
    let app = TestApp {
        router: build_app(state.clone()),
        state,
        store: failing.inner.clone(),
        generator,
    };
    (app, failing)
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", t));
        }
        let body = match body {
            Some(b) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(b)
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Register `email` and return its token and user id.
    pub async fn register(&self, email: &str) -> (String, uuid::Uuid) {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({ "email": email, "password": "password123" }).to_string()),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        let token = body["token"].as_str().unwrap().to_string();
        let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
        (token, id)
    }

    pub async fn generate(&self, token: &str, prompt: Value) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/api/generate",
            Some(token),
            Some(serde_json::json!({ "prompt": prompt }).to_string()),
        )
        .await
    }
}
