use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin printed into scan-point links, e.g. `https://hunts.example.com`.
    pub public_url: String,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub media_dir: PathBuf,
    pub max_blob_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrintConfig {
    /// QR image service; the encoded link is appended as the `data` parameter.
    pub qr_image_url: String,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            qr_image_url: crate::print::DEFAULT_QR_IMAGE_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub print: PrintConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("HUNT_CONFIG").unwrap_or_else(|_| "config/config".into());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.public_url", "http://localhost:3000")?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://data/hunts.db?mode=rwc")?
            .set_default("storage.media_dir", "./data/media")?
            .set_default("storage.max_blob_size", common::media::MAX_MEDIA_SIZE)?
            .set_default("print.qr_image_url", crate::print::DEFAULT_QR_IMAGE_URL)?
            // Load from config/config.toml (or $HUNT_CONFIG)
            .add_source(File::with_name(&file).required(false))
            // Override from environment (e.g., HUNT__SERVER__PUBLIC_URL)
            .add_source(Environment::with_prefix("HUNT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
