use async_trait::async_trait;
use db::DBService;
use deployment::{Config, Deployment, DeploymentError};

#[derive(Clone)]
pub struct LocalDeployment {
    config: Config,
    db: DBService,
}

impl LocalDeployment {
    /// Assembles a deployment from an already opened database, used by tests
    /// and embedders that manage the pool themselves.
    pub fn from_parts(config: Config, db: DBService) -> Self {
        Self { config, db }
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = Config::from_env()?;

        let db = match config.database_url.as_deref() {
            Some(url) => {
                let max_connections = if url.contains(":memory:") { 1 } else { 5 };
                DBService::new_with_url(url, max_connections).await?
            }
            None => DBService::new().await?,
        };
        tracing::info!(
            "Database connected ({})",
            config.database_url.as_deref().unwrap_or("asset directory")
        );

        Ok(Self { config, db })
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }
}
