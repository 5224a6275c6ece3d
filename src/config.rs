// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup and handed to the services that need
//! it; nothing below the `main` entry point consults the environment.

use std::env;
use std::path::PathBuf;

const DEFAULT_KINDWISE_ENDPOINT: &str = "https://crop.kindwise.com/api/v1/identification";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Where documents are stored, parsed from `DATABASE_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// `firestore://<gcp-project-id>`
    Firestore { project_id: String },
    /// `memory://`: process-local store, lost on exit
    Memory,
}

impl DatabaseTarget {
    /// Parse a database connection string.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        if let Some(project_id) = url.strip_prefix("firestore://") {
            let project_id = project_id.trim_end_matches('/');
            if project_id.is_empty() || project_id.contains('/') {
                return Err(ConfigError::Invalid {
                    name: "DATABASE_URL",
                    value: url.to_string(),
                });
            }
            return Ok(DatabaseTarget::Firestore {
                project_id: project_id.to_string(),
            });
        }
        if url == "memory://" || url == "memory" {
            return Ok(DatabaseTarget::Memory);
        }
        Err(ConfigError::Invalid {
            name: "DATABASE_URL",
            value: url.to_string(),
        })
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Document store to connect to
    pub database: DatabaseTarget,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Kindwise crop.health API key
    pub kindwise_api_key: String,
    /// Identification endpoint URL
    pub kindwise_endpoint: String,
    /// Upper bound on a single identification call
    pub upstream_timeout_secs: u64,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Request body limit for image uploads
    pub max_upload_bytes: usize,
    /// Optional JSON file of disease reference entries to seed at startup
    pub disease_seed_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
            .into_bytes();
        if jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        let kindwise_api_key = env::var("KINDWISE_API_KEY")
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        if kindwise_api_key.is_empty() {
            tracing::warn!("KINDWISE_API_KEY is not set; identification calls will be rejected upstream");
        }

        Ok(Self {
            database: DatabaseTarget::parse(&database_url)?,
            jwt_secret,
            kindwise_api_key,
            kindwise_endpoint: env::var("KINDWISE_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_KINDWISE_ENDPOINT.to_string()),
            upstream_timeout_secs: parse_var("KINDWISE_TIMEOUT_SECS", DEFAULT_UPSTREAM_TIMEOUT_SECS)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_var("PORT", DEFAULT_PORT)?,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            disease_seed_path: env::var("DISEASE_SEED_PATH").ok().map(PathBuf::from),
        })
    }

    /// Deterministic in-memory configuration for tests.
    pub fn test_default() -> Self {
        Self {
            database: DatabaseTarget::Memory,
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            kindwise_api_key: "test_kindwise_key".to_string(),
            kindwise_endpoint: "http://127.0.0.1:9/api/v1/identification".to_string(),
            upstream_timeout_secs: 5,
            frontend_url: "http://localhost:5173".to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            disease_seed_path: None,
        }
    }
}

/// Read an optional numeric variable, rejecting values that do not parse.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
