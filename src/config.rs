use serde::Deserialize;

pub const DEFAULT_TTL_MINUTES: i64 = 60 * 24 * 7;
/// Longest token lifetime accepted from the environment: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Settings for the external image generation provider.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres is used when set, the in-memory store otherwise.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub generator: GeneratorConfig,
    pub signup_credits: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "imagegen".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "imagegen-users".into()),
            ttl_minutes: parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok().as_deref()),
        };
        let generator = GeneratorConfig {
            api_url: std::env::var("IMAGE_API_URL")
                .map_err(|_| anyhow::anyhow!("IMAGE_API_URL must be set"))?,
            api_key: std::env::var("IMAGE_API_KEY").ok().filter(|v| !v.is_empty()),
            model: std::env::var("IMAGE_API_MODEL").ok().filter(|v| !v.is_empty()),
            timeout_secs: std::env::var("IMAGE_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(120),
        };
        let signup_credits = std::env::var("SIGNUP_CREDITS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|c| *c >= 0)
            .unwrap_or(10);
        Ok(Self {
            database_url,
            jwt,
            generator,
            signup_credits,
        })
    }
}

/// Unparseable values fall back to the default; the rest are clamped to
/// `0..=MAX_TTL_MINUTES`.
pub fn parse_ttl_minutes(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|m| m.clamp(0, MAX_TTL_MINUTES))
        .unwrap_or(DEFAULT_TTL_MINUTES)
}
