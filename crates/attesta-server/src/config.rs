//! Environment-driven server configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Runtime configuration, read once at startup and handed down.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string. Required.
    pub database_url: String,
    /// Port to listen on.
    pub port: u16,
    /// Base URL embedded in artifact QR codes and artifact locators.
    pub public_base_url: String,
    /// Directory where the filesystem blob publisher stores artifacts.
    pub artifact_dir: PathBuf,
    /// Connection pool ceiling.
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Builds the configuration from environment variables.
    ///
    /// `DATABASE_URL` is required; everything else has a default. When
    /// `PUBLIC_BASE_URL` is unset, the base URL points at the listen port on
    /// localhost, which is right for local runs and wrong for anything
    /// behind a proxy.
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let port: u16 = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {raw:?}"))?,
            Err(_) => 4000,
        };

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| default_base_url(port))
            .trim_end_matches('/')
            .to_string();

        let artifact_dir = std::env::var("ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./artifacts"));

        let db_max_connections: u32 = match std::env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {raw:?}"))?,
            Err(_) => 10,
        };

        Ok(Self {
            database_url,
            port,
            public_base_url,
            artifact_dir,
            db_max_connections,
        })
    }
}

/// Base URL used when `PUBLIC_BASE_URL` is not configured.
fn default_base_url(port: u16) -> String {
    format!("http://localhost:{port}")
}
