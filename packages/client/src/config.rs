use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Directory name used under the platform cache and data directories.
pub const APP_DIR: &str = "qr-treasure-hunt";

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:3000`.
    pub api_url: String,
    /// Root of the persistent media cache.
    pub cache_dir: PathBuf,
    pub known_hunts_path: PathBuf,
    /// Concurrent fetches per prefetch batch.
    pub prefetch_batch_size: usize,
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("HUNT_CLIENT_CONFIG").ok().or_else(|| {
            dirs::config_dir().map(|dir| dir.join(APP_DIR).join("client").display().to_string())
        });

        let mut builder = Config::builder()
            .set_default("api_url", "http://localhost:3000")?
            .set_default("cache_dir", default_cache_dir().display().to_string())?
            .set_default(
                "known_hunts_path",
                default_known_hunts_path().display().to_string(),
            )?
            .set_default("prefetch_batch_size", 3)?;

        if let Some(file) = file {
            builder = builder.add_source(File::with_name(&file).required(false));
        }

        builder
            // e.g. HUNT_CLIENT__API_URL
            .add_source(Environment::with_prefix("HUNT_CLIENT").separator("__"))
            .build()?
            .try_deserialize()
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("media")
}

fn default_known_hunts_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("known-hunts.json")
}
