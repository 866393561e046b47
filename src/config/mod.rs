pub mod settings;
pub mod validation;

pub use settings::*;
pub use validation::validate_config;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
use ::config::{Config, Environment, File};
use std::path::Path;
use tracing::{debug, info};

impl EtlConfig {
    /// Layer an optional config file under `SITE_ETL__*` environment
    /// variables, then validate the result.
    ///
    /// Without an explicit path, `site_etl.{toml,json,yaml}` in the working
    /// directory is picked up when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let builder = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Config::builder().add_source(File::from(path).required(true))
            }
            None => Config::builder().add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: EtlConfig = settings.try_deserialize()?;
        config.ensure_valid()?;

        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Fail with every configuration problem listed
    pub fn ensure_valid(&self) -> Result<()> {
        validate_config(self).map_err(|errors| ProcessingError::Config(errors.join("; ")))
    }
}
