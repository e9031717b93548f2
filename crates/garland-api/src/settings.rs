//! Environment-driven service settings.

use std::env;
use std::net::SocketAddr;

/// Settings errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid LISTEN address: {0}")]
    InvalidListen(String),
}

/// Service configuration read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// `ENV`: `dev` (default) or `production`. Dev adds CORS for the
    /// local frontend.
    pub env: String,
    /// `LISTEN`: bind address, default `:8080`. A bare `:port` binds all
    /// interfaces.
    pub listen: SocketAddr,
    /// `DATABASE_URL`, default `postgres:///al`.
    pub database_url: String,
    /// `GIT_SHA`: build identifier surfaced by `/health` and the
    /// `server-version` header.
    pub git_sha: String,
    /// `IPFS_PINNING_SERVICE_URL`: optional pin side-channel endpoint.
    pub ipfs_pinning_service_url: Option<String>,
    /// `IPFS_PINNING_SECRET`: bearer token for the pinning service.
    pub ipfs_pinning_secret: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let env_name = env::var("ENV").unwrap_or_else(|_| "dev".to_string());
        let listen_raw = env::var("LISTEN").unwrap_or_else(|_| ":8080".to_string());
        Ok(Self {
            env: env_name,
            listen: parse_listen(&listen_raw)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres:///al".to_string()),
            git_sha: env::var("GIT_SHA").unwrap_or_else(|_| "dev".to_string()),
            ipfs_pinning_service_url: env::var("IPFS_PINNING_SERVICE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            ipfs_pinning_secret: env::var("IPFS_PINNING_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
        })
    }

    /// True when running in production; controls the CORS layer.
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }
}

/// Parse a listen address, accepting the bare `:port` shorthand.
fn parse_listen(raw: &str) -> Result<SocketAddr, SettingsError> {
    let full = if raw.starts_with(':') {
        format!("0.0.0.0{raw}")
    } else {
        raw.to_string()
    };
    full.parse()
        .map_err(|_| SettingsError::InvalidListen(raw.to_string()))
}
