//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_TTL;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Supabase project URL
    pub supabase_url: String,
    /// Supabase service role key (bypasses RLS - server only!)
    pub supabase_service_role_key: String,
    /// Supabase JWT secret for token verification
    pub supabase_jwt_secret: String,

    /// Search engine base URL
    pub search_url: String,
    /// Search engine API key (search-only key is enough)
    pub search_api_key: String,
    /// Upper bound on hits fetched per search before local filtering
    pub search_result_limit: usize,

    /// File backing the query cache
    pub cache_path: PathBuf,
    /// Query cache expiry
    pub cache_ttl: Duration,

    /// Default page size for listings
    pub page_size: usize,

    /// Allowed client origin for CORS
    pub client_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Render provides PORT env var, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            supabase_url: required("SUPABASE_URL")?,
            supabase_service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            supabase_jwt_secret: required("SUPABASE_JWT_SECRET")?,

            search_url: required("SEARCH_URL")?,
            search_api_key: required("SEARCH_API_KEY")?,
            search_result_limit: optional("SEARCH_RESULT_LIMIT", 1000)?,

            cache_path: env::var("CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("paisan-cache.json")),
            cache_ttl: Duration::from_secs(optional("CACHE_TTL_SECS", DEFAULT_TTL.as_secs())?),

            page_size: optional("PAGE_SIZE", 24)?,

            client_origin: required("CLIENT_ORIGIN")?,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
impl Config {
    /// Configuration pointing both hosted services at local mock servers
    pub fn for_tests(supabase_url: &str, search_url: &str, cache_path: PathBuf) -> Self {
        Self {
            server_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "debug".to_string(),
            supabase_url: supabase_url.to_string(),
            supabase_service_role_key: "service-key".to_string(),
            supabase_jwt_secret: "jwt-secret".to_string(),
            search_url: search_url.to_string(),
            search_api_key: "search-key".to_string(),
            search_result_limit: 100,
            cache_path,
            cache_ttl: DEFAULT_TTL,
            page_size: 2,
            client_origin: "http://localhost:5173".to_string(),
        }
    }
}
