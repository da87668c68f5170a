//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the storage backend, database URL, server port, JWT secret, the GitHub API
//! endpoint and the optional SMTP settings used for invitation emails.

use anyhow::{Context, Result, bail};
use std::env;
use std::str::FromStr;

/// Where team, membership and contribution data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    /// Ephemeral in-process store, for demos and local development.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("Unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub jwt_secret: String,
    pub server_port: u16,
    pub github_api_url: String,
    pub github_timeout_seconds: u64,
    pub app_base_url: String,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_email: Option<String>,
    pub from_name: String,
}

/// SMTP settings, present only when every required variable is set.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    pub base_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let storage_backend = var("STORAGE_BACKEND")
            .unwrap_or_else(|| "sqlite".to_string())
            .parse::<StorageBackend>()
            .context("STORAGE_BACKEND must be 'sqlite' or 'memory'")?;

        let database_url = var("DATABASE_URL");
        if storage_backend == StorageBackend::Sqlite && database_url.is_none() {
            bail!("DATABASE_URL not set");
        }

        let max_connections = var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET not set")?;

        let server_port = var("SERVER_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let github_api_url = var("GITHUB_API_URL")
            .unwrap_or_else(|| "https://api.github.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let github_timeout_seconds = var("GITHUB_TIMEOUT_SECONDS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u64>()
            .context("GITHUB_TIMEOUT_SECONDS must be a valid number")?;

        let app_base_url = var("APP_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let smtp_port = var("SMTP_PORT")
            .unwrap_or_else(|| "587".to_string())
            .parse::<u16>()
            .context("SMTP_PORT must be a valid number")?;

        Ok(Config {
            storage_backend,
            database_url,
            max_connections,
            acquire_timeout_seconds,
            jwt_secret,
            server_port,
            github_api_url,
            github_timeout_seconds,
            app_base_url,
            smtp_host: var("SMTP_HOST"),
            smtp_port,
            smtp_username: var("SMTP_USERNAME"),
            smtp_password: var("SMTP_PASSWORD"),
            from_email: var("FROM_EMAIL"),
            from_name: var("FROM_NAME").unwrap_or_else(|| "CollabMate".to_string()),
        })
    }

    /// Returns the SMTP configuration if email delivery is fully configured.
    pub fn email_config(&self) -> Option<EmailConfig> {
        Some(EmailConfig {
            smtp_host: self.smtp_host.clone()?,
            smtp_port: self.smtp_port,
            smtp_username: self.smtp_username.clone()?,
            smtp_password: self.smtp_password.clone()?,
            from_email: self.from_email.clone()?,
            from_name: self.from_name.clone(),
            base_url: self.app_base_url.clone(),
        })
    }
}
