//! Partner rate management: list, insert, update and delete exchange rates.
//!
//! Every route sits behind [`require_partner`]; handlers read the caller from
//! the [`PartnerContext`] extension.

use axum::{
    Extension, Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use db::models::{
    location::Location,
    rate::{Rate, RateFields, RateWithDetails},
};
use deployment::Deployment;
use serde::Deserialize;
use serde_json::Value;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::{ApiError, MISSING_INFORMATION},
    middleware::{PartnerContext, require_partner},
};

#[derive(Debug, Default, Deserialize)]
pub struct ListRatesQuery {
    pub search: Option<String>,
}

/// Body of `POST /rate/insert`. Fields stay loosely typed so that absent,
/// empty and mistyped values all end up as the same 400.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRateRequest {
    pub id_location: Option<Value>,
    pub id_currency: Option<Value>,
    pub date: Option<Value>,
    pub value: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRateRequest {
    pub id_rates: Option<Value>,
    #[serde(flatten)]
    pub fields: InsertRateRequest,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRateRequest {
    pub id_rates: Option<Value>,
}

/// Positive integer id, given either as a JSON number or as a numeric string
/// (HTML form inputs send strings). Whole floats such as `3.0` count as ids.
fn positive_id(value: Option<&Value>) -> Option<i64> {
    let id = match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        Value::String(s) => {
            let s = s.trim();
            s.parse()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    }?;
    (id > 0).then_some(id)
}

fn whole_number(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64).then_some(n as i64)
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.as_str()),
        _ => None,
    }
}

fn missing_information() -> ApiError {
    ApiError::BadRequest(MISSING_INFORMATION.to_string())
}

impl InsertRateRequest {
    pub fn into_fields(self) -> Result<RateFields, ApiError> {
        let (Some(id_location), Some(id_currency), Some(date), Some(value)) = (
            positive_id(self.id_location.as_ref()),
            positive_id(self.id_currency.as_ref()),
            non_empty_str(self.date.as_ref()),
            number(self.value.as_ref()),
        ) else {
            return Err(missing_information());
        };

        Ok(RateFields::new(id_location, id_currency, date, value)?)
    }
}

impl UpdateRateRequest {
    pub fn into_parts(self) -> Result<(i64, RateFields), ApiError> {
        let id_rates = positive_id(self.id_rates.as_ref()).ok_or_else(missing_information)?;
        Ok((id_rates, self.fields.into_fields()?))
    }
}

async fn ensure_location_owned(
    deployment: &DeploymentImpl,
    partner: PartnerContext,
    id_location: i64,
) -> Result<(), ApiError> {
    if !deployment.config().enforce_location_ownership {
        return Ok(());
    }
    if Location::belongs_to_partner(&deployment.db().pool, id_location, partner.partner_id).await? {
        Ok(())
    } else {
        tracing::warn!(
            partner_id = partner.partner_id,
            id_location,
            "Partner tried to write a rate for a foreign location"
        );
        Err(ApiError::Forbidden(
            "Location does not belong to partner".to_string(),
        ))
    }
}

/// Rates of another partner are off limits. Unknown ids pass, the write then
/// touches no row.
async fn ensure_rate_owned(
    deployment: &DeploymentImpl,
    partner: PartnerContext,
    id_rates: i64,
) -> Result<(), ApiError> {
    if !deployment.config().enforce_location_ownership {
        return Ok(());
    }
    match Rate::owner_of(&deployment.db().pool, id_rates).await? {
        Some(owner) if owner != partner.partner_id => Err(ApiError::Forbidden(
            "Rate does not belong to partner".to_string(),
        )),
        _ => Ok(()),
    }
}

/// GET /rate
async fn list_rates(
    State(deployment): State<DeploymentImpl>,
    Extension(partner): Extension<PartnerContext>,
    query: Result<Query<ListRatesQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<RateWithDetails>>>, ApiError> {
    let Query(query) = query?;
    let rates = Rate::find_by_partner(
        &deployment.db().pool,
        partner.partner_id,
        query.search.as_deref(),
    )
    .await?;

    Ok(Json(ApiResponse::success(rates)))
}

/// POST /rate/insert
async fn insert_rate(
    State(deployment): State<DeploymentImpl>,
    Extension(partner): Extension<PartnerContext>,
    payload: Result<Json<InsertRateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(payload) = payload?;
    let fields = payload.into_fields()?;
    ensure_location_owned(&deployment, partner, fields.id_location).await?;

    let id_rates = Rate::create(&deployment.db().pool, &fields).await?;
    tracing::info!(partner_id = partner.partner_id, id_rates, "Rate added");

    Ok(Json(ApiResponse::message("Rate added successfully!")))
}

/// PUT /rate/update
async fn update_rate(
    State(deployment): State<DeploymentImpl>,
    Extension(partner): Extension<PartnerContext>,
    payload: Result<Json<UpdateRateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(payload) = payload?;
    let (id_rates, fields) = payload.into_parts()?;
    ensure_rate_owned(&deployment, partner, id_rates).await?;
    ensure_location_owned(&deployment, partner, fields.id_location).await?;

    let touched = Rate::update(&deployment.db().pool, id_rates, &fields).await?;
    if touched == 0 {
        tracing::warn!(partner_id = partner.partner_id, id_rates, "Update matched no rate");
    } else {
        tracing::info!(partner_id = partner.partner_id, id_rates, "Rate updated");
    }

    Ok(Json(ApiResponse::message("Rate updated successfully!")))
}

/// DELETE /rate/delete
async fn delete_rate(
    State(deployment): State<DeploymentImpl>,
    Extension(partner): Extension<PartnerContext>,
    payload: Result<Json<DeleteRateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(payload) = payload?;
    let id_rates = positive_id(payload.id_rates.as_ref()).ok_or_else(missing_information)?;
    ensure_rate_owned(&deployment, partner, id_rates).await?;

    let touched = Rate::delete(&deployment.db().pool, id_rates).await?;
    if touched == 0 {
        tracing::warn!(partner_id = partner.partner_id, id_rates, "Delete matched no rate");
    } else {
        tracing::info!(partner_id = partner.partner_id, id_rates, "Rate deleted");
    }

    Ok(Json(ApiResponse::message("Rate deleted successfully!")))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/rate", get(list_rates))
        .route("/rate/insert", post(insert_rate))
        .route("/rate/update", put(update_rate))
        .route("/rate/delete", delete(delete_rate))
        .route_layer(from_fn_with_state(deployment.clone(), require_partner))
}
