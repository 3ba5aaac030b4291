/// Database configuration and connection management
pub mod database;

/// Calculator settings loading from config.toml
pub mod settings;
