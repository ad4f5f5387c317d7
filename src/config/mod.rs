/// Classification reference-data loading from classifications.toml
pub mod classifications;

/// Database configuration and connection management
pub mod database;

/// Application settings collected from environment variables
pub mod settings;

pub use settings::AppConfig;
