/// Database configuration and connection management
pub mod database;

/// Server settings from environment variables
pub mod server;

/// Application configuration loading from config.toml
pub mod settings;
