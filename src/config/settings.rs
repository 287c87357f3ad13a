//! Application configuration loading from config.toml
//!
//! The file declares the business header printed on documents, the order
//! statuses and product categories seeded on startup, bootstrap user
//! accounts, and the API tokens accepted by the auth layer.

use crate::core::session::DEFAULT_SESSION_MINUTES;
use crate::entities::{Role, StatusKind};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Business details shown on invoices and reports
    #[serde(default)]
    pub business: BusinessInfo,
    /// Order statuses to seed
    #[serde(default)]
    pub statuses: Vec<StatusConfig>,
    /// Product categories to seed
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    /// User accounts created when missing
    #[serde(default)]
    pub users: Vec<UserConfig>,
    /// Accepted bearer tokens
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    /// Login session settings
    #[serde(default)]
    pub auth: AuthConfig,
}

/// `[auth]` block
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Lifetime of sessions opened by `POST /login`
    #[serde(default = "default_session_minutes")]
    pub session_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_minutes: default_session_minutes(),
        }
    }
}

const fn default_session_minutes() -> i64 {
    DEFAULT_SESSION_MINUTES
}

/// Header block for generated documents
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BusinessInfo {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Default for BusinessInfo {
    fn default() -> Self {
        Self {
            name: "Comanda".to_string(),
            address: None,
            phone: None,
            email: None,
        }
    }
}

/// Configuration for a single order status
#[derive(Debug, Deserialize, Clone)]
pub struct StatusConfig {
    /// Display name (e.g. "En Preparación")
    pub name: String,
    /// Behavioural kind driving side effects
    pub kind: StatusKind,
    #[serde(default)]
    pub description: Option<String>,
    /// Overrides the kind's default terminal flag
    #[serde(default)]
    pub terminal: Option<bool>,
}

impl StatusConfig {
    /// Effective terminal flag for this status
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal.unwrap_or_else(|| self.kind.is_terminal())
    }
}

/// Configuration for a single product category
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Bootstrap user account
#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    pub name: String,
    pub nit: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    /// Initial password; without one the account can only use API tokens
    #[serde(default)]
    pub password: Option<String>,
}

/// Maps an opaque bearer token to the e-mail of the account it authenticates
#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    pub token: String,
    pub email: String,
}

/// Loads the application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<()> {
    let received = config
        .statuses
        .iter()
        .filter(|s| s.kind == StatusKind::Received)
        .count();
    if received > 1 {
        return Err(Error::Config {
            message: "Exactly one status of kind 'received' may be configured".to_string(),
        });
    }
    if config.auth.session_minutes <= 0 {
        return Err(Error::Config {
            message: "auth.session_minutes must be positive".to_string(),
        });
    }
    if config.tokens.iter().any(|t| t.token.trim().is_empty()) {
        return Err(Error::Config {
            message: "API tokens cannot be empty".to_string(),
        });
    }
    Ok(())
}
