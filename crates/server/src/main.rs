use deployment::{Deployment, DeploymentError};
use server::{DeploymentImpl, routes};
use sqlx::Error as SqlxError;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Debug, Error)]
pub enum ExchangeServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
}

#[tokio::main]
async fn main() -> Result<(), ExchangeServerError> {
    // Pick up JWT_SECRET / DATABASE_URL from `.env` during local development
    dotenv::dotenv().ok();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},db={level},deployment={level},local_deployment={level},utils={level},tower_http={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).unwrap_or_else(|e| {
        eprintln!("Invalid RUST_LOG ({}), using info", e);
        EnvFilter::new("info")
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let deployment = DeploymentImpl::new().await?;
    deployment.log_startup_warnings();

    let host = deployment.config().host.clone();
    let port = deployment.config().port;
    let app_router = routes::router(deployment);

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    let actual_port = listener.local_addr()?.port();
    tracing::info!("Exchange admin API listening on http://{host}:{actual_port}");

    axum::serve(listener, app_router).await?;
    Ok(())
}
