// src/config.rs
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub blob_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub session_ttl_hours: i64,
    pub max_upload_bytes: usize,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub metrics_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` is the production entry point.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("PORT must be a number"))?;

        let blob_dir = lookup("BLOB_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/blobs"));

        let static_dir = lookup("STATIC_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let session_ttl_hours: i64 = lookup("SESSION_TTL_HOURS")
            .unwrap_or_else(|| "24".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SESSION_TTL_HOURS must be a number"))?;

        if session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("SESSION_TTL_HOURS must be positive"));
        }

        let max_upload_mb: usize = lookup("MAX_UPLOAD_MB")
            .unwrap_or_else(|| "20".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("MAX_UPLOAD_MB must be a number"))?;

        let admin_username = lookup("ADMIN_USERNAME").filter(|s| !s.trim().is_empty());
        let admin_password = lookup("ADMIN_PASSWORD").filter(|s| !s.is_empty());

        let metrics_enabled = lookup("METRICS_ENABLED")
            .unwrap_or_else(|| "true".to_string())
            .parse()
            .unwrap_or(true);

        Ok(Self {
            database_url,
            port,
            blob_dir,
            static_dir,
            session_ttl_hours,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            admin_username,
            admin_password,
            metrics_enabled,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
