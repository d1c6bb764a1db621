use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Placeholder JWT secrets that should never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEFAULT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = var("BARTER_PORT").unwrap_or_else(|| "3000".into());

        Ok(Self {
            host: var("BARTER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: port
                .parse()
                .with_context(|| format!("BARTER_PORT is not a valid port: {}", port))?,
            db_path: var("BARTER_DB_PATH")
                .unwrap_or_else(|| "barter.db".into())
                .into(),
            jwt_secret: var("BARTER_JWT_SECRET")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SECRET.into()),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn has_placeholder_secret(&self) -> bool {
        PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}
