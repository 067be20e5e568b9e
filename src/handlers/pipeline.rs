// src/handlers/pipeline.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::lead::{BoardColumn, Lead, Stage},
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Jane Doe")]
    pub name: String,

    #[serde(default)]
    pub email: String,
    #[serde(default)]
    #[schema(example = "+1234")]
    pub phone: String,

    // Texto livre: o classificador resolve para o id canônico (ausente
    // ou irreconhecível cai em "new").
    #[schema(example = "qualified")]
    pub stage: Option<String>,
    #[schema(example = "medium")]
    pub priority: Option<String>,

    #[serde(default)]
    #[schema(example = "Website")]
    pub source: String,
    #[serde(default)]
    #[schema(value_type = Object, example = "$100K-130K")]
    pub budget: Value,
    #[serde(default)]
    pub interested_project: String,
    #[serde(default)]
    pub notes: String,
    pub last_contact_date: Option<NaiveDate>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub investment_type: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveLeadPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "qualified")]
    pub stage: String,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// GET /api/pipeline/board
#[utoipa::path(
    get,
    path = "/api/pipeline/board",
    tag = "Pipeline",
    responses((status = 200, description = "Colunas do board por estágio", body = Vec<BoardColumn>)),
    security(("api_jwt" = []))
)]
pub async fn get_board(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let board = app_state.pipeline_service.board().await?;
    Ok((StatusCode::OK, Json(board)))
}

// POST /api/pipeline/leads
#[utoipa::path(
    post,
    path = "/api/pipeline/leads",
    tag = "Pipeline",
    request_body = LeadPayload,
    responses(
        (status = 201, description = "Lead criado", body = Lead),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    Json(payload): Json<LeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lead = app_state
        .pipeline_service
        .create_lead(
            &payload.name,
            &payload.email,
            &payload.phone,
            payload.stage.as_deref(),
            payload.priority.as_deref(),
            &payload.source,
            payload.budget,
            &payload.interested_project,
            &payload.notes,
            payload.last_contact_date,
            &payload.country,
            &payload.investment_type,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// PUT /api/pipeline/leads/{id}
#[utoipa::path(
    put,
    path = "/api/pipeline/leads/{id}",
    tag = "Pipeline",
    request_body = LeadPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead atualizado", body = Lead),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lead = app_state
        .pipeline_service
        .update_lead(
            id,
            &payload.name,
            &payload.email,
            &payload.phone,
            payload.stage.as_deref(),
            payload.priority.as_deref(),
            &payload.source,
            payload.budget,
            &payload.interested_project,
            &payload.notes,
            payload.last_contact_date,
            &payload.country,
            &payload.investment_type,
        )
        .await?;

    Ok((StatusCode::OK, Json(lead)))
}

// DELETE /api/pipeline/leads/{id}
#[utoipa::path(
    delete,
    path = "/api/pipeline/leads/{id}",
    tag = "Pipeline",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses((status = 204, description = "Lead removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.pipeline_service.delete_lead(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/pipeline/leads/{id}/stage
#[utoipa::path(
    post,
    path = "/api/pipeline/leads/{id}/stage",
    tag = "Pipeline",
    request_body = MoveLeadPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead movido", body = Lead),
        (status = 400, description = "Backend recusou; o cliente desfaz o movimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn move_lead(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let target = Stage::normalize(&payload.stage);
    let lead = app_state.pipeline_service.move_lead_to_stage(id, target).await?;
    Ok((StatusCode::OK, Json(lead)))
}
