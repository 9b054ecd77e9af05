use axum::{Json, extract::State};
use deployment::Deployment;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

/// GET /health - answers once the database accepts queries.
pub async fn health_check(
    State(deployment): State<DeploymentImpl>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    sqlx::query("SELECT 1")
        .execute(&deployment.db().pool)
        .await?;
    Ok(Json(ApiResponse::success("ok")))
}
