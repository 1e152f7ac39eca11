use std::env;
use std::fmt::Display;
use std::str::FromStr;

use log::info;

/// Which document store backs the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

impl Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Mongo => write!(f, "mongo"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub redis_url: Option<String>,
    pub page_cache_ttl_seconds: u64,
    pub jwt_secret: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: parse_var("PORT", "8000")?,
            store_backend: parse_var("STORE_BACKEND", "mongo")?,
            mongodb_uri: env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "threads_db".to_string()),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            page_cache_ttl_seconds: parse_var("PAGE_CACHE_TTL_SECONDS", "60")?,
            jwt_secret: env::var("JWT_SECRET").map_err(|_| "JWT_SECRET is required")?,
        })
    }
}

fn parse_var<T: FromStr>(key: &str, default: &str) -> Result<T, String>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{} not set, using default: {}", key, default);
        default.to_string()
    });

    raw.parse()
        .map_err(|e| format!("{} must be valid: {}", key, e))
}
