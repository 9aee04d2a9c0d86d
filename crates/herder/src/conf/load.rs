//! Load — config loading from file and environment variables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::HerderConfig;

impl HerderConfig {
    /// Load configuration from file or environment variables.
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path =
            std::env::var("HERDER_CONFIG_FILE").unwrap_or_else(|_| "herder.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Load from an explicit config path; falls back to env-only when the
    /// file does not exist.
    pub fn load_from(config_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = if Path::new(config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(config_path)?
        } else {
            tracing::info!(
                "Config file not found at {}, using environment variables",
                config_path
            );
            Self::default()
        };

        // Environment variables override file config.
        if let Ok(url) = std::env::var("HERDER_RESULTS_URL") {
            config.results_url = url;
        }
        if let Ok(path) = std::env::var("HERDER_RESULTS_CREDENTIALS") {
            config.results_credentials_path = path;
        }
        if let Ok(path) = std::env::var("HERDER_BLOB_CREDENTIALS") {
            config.blob_credentials_path = path;
        }
        if let Ok(retries) = std::env::var("HERDER_RETRIES") {
            if let Ok(parsed) = retries.parse() {
                config.retries = parsed;
            }
        }
        // Jenkins exposes the build identity to every job it runs.
        if let Ok(tag) = std::env::var("BUILD_TAG") {
            config.jenkins_build_tag = tag;
        }
        if let Ok(url) = std::env::var("BUILD_URL") {
            config.jenkins_build_url = url;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: HerderConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}
