//! Server settings read from environment variables.

use crate::errors::{Error, Result};
use std::net::SocketAddr;

/// Deployment environment, controls how much error detail reaches clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parses `APP_ENV`-style values; anything but "production" is development.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    /// Whether internal error details may be echoed to clients
    #[must_use]
    pub const fn exposes_error_details(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Listener and runtime settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    /// Origins allowed by CORS; empty means any origin
    pub cors_origins: Vec<String>,
    /// Path of the TOML configuration file
    pub config_path: String,
}

impl ServerSettings {
    /// Reads `BIND_ADDR`, `APP_ENV`, `CORS_ORIGINS` and `COMANDA_CONFIG`.
    pub fn from_env() -> Result<Self> {
        let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind.parse().map_err(|e| Error::Config {
            message: format!("Invalid BIND_ADDR '{bind}': {e}"),
        })?;

        let environment = std::env::var("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Development);

        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();

        let config_path =
            std::env::var("COMANDA_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        Ok(Self {
            bind_addr,
            environment,
            cors_origins,
            config_path,
        })
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(ToString::to_string)
        .collect()
}
