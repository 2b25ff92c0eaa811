use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_ESSAY_SYSTEM_TEXT: &str = "\
Ни в коем случае не используй слова, кроме русских.

Генерация сочинений: пиши так, будто ты человек, который пишет сочинение.";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub proxy: Option<String>,
    pub essay_system_text: String,
    pub min_tokens_for_ai: i64,
    pub min_tokens_for_essay: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub ai: AiConfig,
    pub cors: CorsConfig,
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

pub(crate) fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            private_key_path: std::env::var("JWT_PRIVATE_KEY_PATH")
                .unwrap_or_else(|_| "certs/private.pem".into())
                .into(),
            public_key_path: std::env::var("JWT_PUBLIC_KEY_PATH")
                .unwrap_or_else(|_| "certs/public.pem".into())
                .into(),
            access_ttl_minutes: env_i64("JWT_ACCESS_TTL_MINUTES", 15),
            refresh_ttl_minutes: env_i64("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 30),
        };
        let ai = AiConfig {
            api_key: std::env::var("OPENAI_API_KEY")?,
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            proxy: std::env::var("OPENAI_PROXY").ok(),
            essay_system_text: std::env::var("ESSAY_SYSTEM_TEXT")
                .unwrap_or_else(|_| DEFAULT_ESSAY_SYSTEM_TEXT.into()),
            min_tokens_for_ai: env_i64("MIN_TOKENS_FOR_AI", 500),
            min_tokens_for_essay: env_i64("MIN_TOKENS_FOR_ESSAY", 750),
        };
        let cors = CorsConfig {
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_else(|_| vec!["*".into()]),
        };
        Ok(Self {
            database_url,
            jwt,
            ai,
            cors,
        })
    }
}
