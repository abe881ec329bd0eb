use crate::config::AppConfig;
use crate::db;
use crate::generator::{HttpImageGenerator, ImageGenerator};
use crate::store::{MemoryStore, PgStore, Store};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub generator: Arc<dyn ImageGenerator>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                let pool = db::connect(url).await?;
                db::migrate(&pool).await?;
                info!("using postgres store");
                Arc::new(PgStore::new(pool)) as Arc<dyn Store>
            }
            None => {
                info!("DATABASE_URL not set; using in-memory store");
                Arc::new(MemoryStore::new()) as Arc<dyn Store>
            }
        };

        let generator =
            Arc::new(HttpImageGenerator::new(&config.generator)?) as Arc<dyn ImageGenerator>;

        Ok(Self {
            store,
            generator,
            config,
        })
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        generator: Arc<dyn ImageGenerator>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            generator,
            config,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use async_trait::async_trait;

        struct FakeGenerator;
        #[async_trait]
        impl ImageGenerator for FakeGenerator {
            async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
                Ok(format!("https://fake.local/{}.png", prompt.len()))
            }
        }

        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            generator: crate::config::GeneratorConfig {
                api_url: "http://fake.local/generate".into(),
                api_key: None,
                model: None,
                timeout_secs: 1,
            },
            signup_credits: 3,
        });

        Self::from_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(FakeGenerator),
            config,
        )
    }
}
