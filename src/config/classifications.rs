//! Classification reference-data loading from classifications.toml
//!
//! The minor-to-major category table (and its display colors) is immutable at
//! runtime and seeded into the database on startup from a TOML file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire classifications.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// List of classification entries to seed
    pub classifications: Vec<ClassificationConfig>,
}

/// Configuration for a single classification entry
#[derive(Debug, Deserialize, Clone)]
pub struct ClassificationConfig {
    /// Minor category name (unique)
    pub minor: String,
    /// Parent major category name
    pub major: String,
    /// Display color (hex) for chat bubbles
    pub color: String,
}

/// Loads classification configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read classifications file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse classifications.toml: {e}"),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_classification_config() {
        let toml_str = r##"
            [[classifications]]
            minor = "groceries"
            major = "living"
            color = "#1DB446"

            [[classifications]]
            minor = "eating out"
            major = "leisure"
            color = "#FF6B35"
        "##;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.classifications.len(), 2);
        assert_eq!(config.classifications[0].minor, "groceries");
        assert_eq!(config.classifications[0].major, "living");
        assert_eq!(config.classifications[1].color, "#FF6B35");
    }
}
