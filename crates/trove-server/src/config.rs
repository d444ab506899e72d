use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used in release builds.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), cfg!(debug_assertions))
    }

    /// Build the config from any key lookup. Debug builds fall back to a
    /// development secret; release builds refuse to start without a real one.
    pub fn from_lookup<F>(lookup: F, allow_dev_secret: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("TROVE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("TROVE_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("TROVE_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("TROVE_HOST must be an IP address")?;

        let db_path: PathBuf = lookup("TROVE_DB_PATH")
            .unwrap_or_else(|| "trove.db".into())
            .into();

        let jwt_secret = match lookup("TROVE_JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) if allow_dev_secret || !PLACEHOLDER_SECRETS.contains(&secret.as_str()) => {
                secret
            }
            Some(_) => bail!("TROVE_JWT_SECRET is still a placeholder value"),
            None if allow_dev_secret => DEV_SECRET.to_string(),
            None => bail!("TROVE_JWT_SECRET is not set"),
        };

        Ok(Self {
            addr,
            db_path,
            jwt_secret,
        })
    }
}
