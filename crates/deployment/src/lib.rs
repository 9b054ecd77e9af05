use async_trait::async_trait;
use db::DBService;
use sqlx::Error as SqlxError;
use thiserror::Error;

pub mod config;

pub use config::{Config, ConfigError};

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything a request handler needs: the database and the loaded configuration.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    /// Loads configuration from the environment and opens the database.
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Config;

    fn db(&self) -> &DBService;

    /// Logs the settings that are worth a second look before serving traffic.
    fn log_startup_warnings(&self) {
        let config = self.config();
        if config.using_default_secret {
            tracing::warn!("JWT_SECRET is not set, falling back to the built-in development secret");
        }
        if !config.enforce_location_ownership {
            tracing::warn!(
                "Location ownership checks are disabled; partners may write rates for foreign locations"
            );
        }
    }
}
