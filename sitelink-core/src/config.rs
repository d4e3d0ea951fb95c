//! Settings loading for the core services.
//!
//! Layered sources, later wins: built-in defaults, an optional
//! `sitelink.toml` next to the process, then `SITELINK__*` environment
//! variables (double underscore as section separator, e.g.
//! `SITELINK__DATABASE__URL`).

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::allocation::AllocationSettings;
use crate::error::Result;

/// Connection settings for the PostgreSQL pool.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Top-level settings for the core crate.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub allocation: AllocationSettings,
}

impl Settings {
    /// Load settings from defaults, `sitelink.toml` and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings with an explicit config file path (tests, tooling).
    pub fn load_from(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("database.url", "postgres://localhost/sitelink")?
            .set_default("database.max_connections", 5i64)?
            .set_default(
                "allocation.saturation_threshold",
                AllocationSettings::DEFAULT_SATURATION_THRESHOLD,
            )?
            // Reserved M2M carrier. 0 matches no real provider row, so the
            // fixed-carrier path stays off until a deployment configures it.
            .set_default("allocation.m2m_provider_id", 0i64)?
            .set_default("allocation.m2m_provider_name", "M2M")?;

        builder = match path {
            Some(p) => builder.add_source(File::with_name(p)),
            None => builder.add_source(File::with_name("sitelink").required(false)),
        };

        let settings = builder
            .add_source(Environment::with_prefix("SITELINK").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}
