use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;
use serde_json::Value;
use packwise_catalog::PackagingConfig;

use crate::app_config::DatabaseConfig;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay packaging settings stored in the `settings` table on top of
    /// the file configuration.
    pub async fn fetch_packaging_config(&self, defaults: PackagingConfig) -> Result<PackagingConfig, sqlx::Error> {
        let rows: Vec<(String, Value)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        Ok(apply_settings(defaults, rows))
    }
}

// Expected value format: {"value": <bool/number/string>}
fn apply_settings(defaults: PackagingConfig, rows: Vec<(String, Value)>) -> PackagingConfig {
    let mut config = defaults;

    for (key, value) in rows {
        if let Some(v) = value.get("value") {
            match key.as_str() {
                "packaging.fallback_to_bigger_unit" => {
                    if let Some(b) = v.as_bool() {
                        config.fallback_to_bigger_unit = b;
                    }
                }
                _ => {
                    tracing::debug!(%key, "ignoring unknown setting");
                }
            }
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_overlay() {
        let rows = vec![
            ("packaging.fallback_to_bigger_unit".to_string(), json!({"value": false})),
            ("ui.theme".to_string(), json!({"value": "dark"})),
        ];
        let config = apply_settings(PackagingConfig::default(), rows);
        assert!(!config.fallback_to_bigger_unit);
    }

    #[test]
    fn test_malformed_setting_keeps_default() {
        let rows = vec![(
            "packaging.fallback_to_bigger_unit".to_string(),
            json!({"value": "no"}),
        )];
        let config = apply_settings(PackagingConfig::default(), rows);
        assert!(config.fallback_to_bigger_unit);
    }
}
