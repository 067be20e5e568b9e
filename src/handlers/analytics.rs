// src/handlers/analytics.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::error::AppError,
    config::AppState,
    models::analytics::{AnalyticsReport, TimeRange},
};

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct AnalyticsQuery {
    // this_week | this_month | this_quarter | all_time
    #[serde(default)]
    pub range: TimeRange,
}

// GET /api/analytics
#[utoipa::path(
    get,
    path = "/api/analytics",
    tag = "Analytics",
    params(AnalyticsQuery),
    responses((status = 200, description = "Relatório do período", body = AnalyticsReport)),
    security(("api_jwt" = []))
)]
pub async fn get_report(
    State(app_state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.analytics_service.report(query.range).await?;
    Ok((StatusCode::OK, Json(report)))
}
