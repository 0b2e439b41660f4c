use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Where candidate records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory { snapshot_path: Option<PathBuf> },
    Remote { base_url: String, token: Option<String> },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub jwt_secret: String,
    pub port: u16,
    pub rust_log: String,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let backend = get("STORE_BACKEND").map(|b| b.trim().to_lowercase());
        let store = match backend.as_deref() {
            Some("postgres") => StoreBackend::Postgres {
                database_url: require("DATABASE_URL")?,
            },
            Some("memory") => StoreBackend::Memory {
                snapshot_path: get("CANDIDATES_SNAPSHOT_PATH").map(PathBuf::from),
            },
            Some("remote") => StoreBackend::Remote {
                base_url: require("REMOTE_API_URL")?,
                token: get("REMOTE_API_TOKEN"),
            },
            Some(other) => bail!(
                "STORE_BACKEND must be one of 'postgres', 'memory', 'remote' (got '{other}')"
            ),
            None => match get("DATABASE_URL") {
                Some(database_url) => StoreBackend::Postgres { database_url },
                None => StoreBackend::Memory {
                    snapshot_path: get("CANDIDATES_SNAPSHOT_PATH").map(PathBuf::from),
                },
            },
        };

        let port = match get("PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            store,
            jwt_secret: require("JWT_SECRET")?,
            port,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            cors_allowed_origins,
        })
    }
}
