use serde::Deserialize;
use std::env;
use std::path::Path;
use packwise_catalog::PackagingConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub packaging: PackagingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub backend: CatalogBackend,
    /// JSON catalog loaded by the memory backend.
    pub fixture_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Self::load_from(Path::new("config"), &run_mode)
    }

    pub fn load_from(dir: &Path, run_mode: &str) -> Result<Self, config::ConfigError> {
        let file = |name: &str| config::File::from(dir.join(name));

        let s = config::Config::builder()
            .add_source(file("default"))
            // Per-environment overrides are optional
            .add_source(file(run_mode).required(false))
            // Local overrides, never checked in
            .add_source(file("local").required(false))
            // Eg.. `PACKWISE__SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("PACKWISE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
