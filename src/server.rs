//! HTTP surface over [`RateService`].

use crate::core::converter::ConversionResult;
use crate::core::error::ConversionError;
use crate::service::{ConversionRequest, RateService};
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct ConvertQuery {
    pub amount: Option<String>,
    pub src_currency: Option<String>,
    pub dest_currency: Option<String>,
    pub reference_date: Option<String>,
    pub fresh: Option<String>,
}

impl From<ConvertQuery> for ConversionRequest {
    fn from(query: ConvertQuery) -> Self {
        ConversionRequest {
            amount: query.amount,
            source_currency: query.src_currency,
            destination_currency: query.dest_currency,
            reference_date: query.reference_date,
            force_refresh: is_truthy(query.fresh.as_deref()),
        }
    }
}

fn is_truthy(flag: Option<&str>) -> bool {
    match flag.map(str::trim) {
        None | Some("") => false,
        Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false")),
    }
}

pub struct ApiError(ConversionError);

impl From<ConversionError> for ApiError {
    fn from(err: ConversionError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, message) = match &err {
            e if e.is_user_error() => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ConversionError::RateValue { .. } => {
                error!(error = %err, "Rate data integrity fault");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "invalid rate data in source document".to_string(),
                )
            }
            e => {
                error!(error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        if status.is_client_error() {
            warn!(kind = err.kind(), %message, "Rejected request");
        }
        let mut body = Map::new();
        body.insert(err.kind().to_string(), Value::String(message));
        (status, Json(Value::Object(body))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

async fn convert(
    State(service): State<Arc<RateService>>,
    Query(query): Query<ConvertQuery>,
) -> ApiResult<Json<ConversionResult>> {
    let request = ConversionRequest::from(query);
    Ok(Json(service.convert(&request).await?))
}

#[derive(Debug, Serialize)]
struct DatesResponse {
    dates: Vec<String>,
}

async fn dates(State(service): State<Arc<RateService>>) -> ApiResult<Json<DatesResponse>> {
    Ok(Json(DatesResponse {
        dates: service.available_dates().await?,
    }))
}

pub fn app_router(service: Arc<RateService>) -> Router {
    Router::new()
        .route("/convert", get(convert))
        .route("/dates", get(dates))
        .with_state(service)
}

/// Loads the rate table, then serves until the process is stopped.
pub async fn serve(service: Arc<RateService>, bind: &str) -> Result<()> {
    service
        .initialize()
        .await
        .context("Failed to load the rate table")?;

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!("Listening on {}", bind);
    axum::serve(listener, app_router(service)).await?;
    Ok(())
}
