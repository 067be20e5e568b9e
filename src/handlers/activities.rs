// src/handlers/activities.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::activity::Activity,
    models::dashboard::ReminderOverview,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Follow-up com a Jane")]
    pub title: String,

    #[serde(rename = "type")]
    #[schema(example = "call")]
    pub activity_type: Option<String>,

    #[serde(default)]
    pub lead_name: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub location: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub reminder_enabled: bool,
    pub reminder_date: Option<NaiveDate>,
    #[serde(default)]
    #[schema(example = "14:30")]
    pub reminder_time: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "contrato.pdf")]
    pub file_name: String,
    #[serde(default)]
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    /// Conteúdo do arquivo em base64.
    #[validate(length(min = 1, message = "required"))]
    pub data: String,
}

// GET /api/activities
#[utoipa::path(
    get,
    path = "/api/activities",
    tag = "Activities",
    responses((status = 200, description = "Atividades por data de vencimento", body = Vec<Activity>)),
    security(("api_jwt" = []))
)]
pub async fn list_activities(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let activities = app_state.activity_service.list().await?;
    Ok((StatusCode::OK, Json(activities)))
}

// POST /api/activities
#[utoipa::path(
    post,
    path = "/api/activities",
    tag = "Activities",
    request_body = ActivityPayload,
    responses((status = 201, description = "Atividade criada", body = Activity)),
    security(("api_jwt" = []))
)]
pub async fn create_activity(
    State(app_state): State<AppState>,
    Json(payload): Json<ActivityPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let activity = app_state
        .activity_service
        .create(
            &payload.title,
            payload.activity_type.as_deref(),
            &payload.lead_name,
            &payload.project_name,
            &payload.contact,
            &payload.location,
            payload.due_date,
            payload.priority.as_deref(),
            &payload.notes,
            payload.reminder_enabled,
            payload.reminder_date,
            &payload.reminder_time,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(activity)))
}

// PUT /api/activities/{id}
#[utoipa::path(
    put,
    path = "/api/activities/{id}",
    tag = "Activities",
    request_body = ActivityPayload,
    params(("id" = Uuid, Path, description = "ID da atividade")),
    responses((status = 200, description = "Atividade atualizada", body = Activity)),
    security(("api_jwt" = []))
)]
pub async fn update_activity(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActivityPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let activity = app_state
        .activity_service
        .update(
            id,
            &payload.title,
            payload.activity_type.as_deref(),
            &payload.lead_name,
            &payload.project_name,
            &payload.contact,
            &payload.location,
            payload.due_date,
            payload.priority.as_deref(),
            &payload.notes,
            payload.reminder_enabled,
            payload.reminder_date,
            &payload.reminder_time,
        )
        .await?;

    Ok((StatusCode::OK, Json(activity)))
}

// POST /api/activities/{id}/toggle
#[utoipa::path(
    post,
    path = "/api/activities/{id}/toggle",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "ID da atividade")),
    responses(
        (status = 200, description = "Flag de conclusão invertida", body = Activity),
        (status = 400, description = "Backend recusou; o cliente desfaz o toggle")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_activity(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let activity = app_state.activity_service.toggle_completed(id).await?;
    Ok((StatusCode::OK, Json(activity)))
}

// POST /api/activities/{id}/attachment
#[utoipa::path(
    post,
    path = "/api/activities/{id}/attachment",
    tag = "Activities",
    request_body = AttachmentPayload,
    params(("id" = Uuid, Path, description = "ID da atividade")),
    responses((status = 200, description = "Anexo salvo", body = Activity)),
    security(("api_jwt" = []))
)]
pub async fn attach_file(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.data.as_bytes())
        .map_err(|e| anyhow::anyhow!("Anexo inválido (base64): {}", e))?;

    let activity = app_state
        .activity_service
        .attach_file(id, &payload.file_name, &payload.mime_type, bytes)
        .await?;
    Ok((StatusCode::OK, Json(activity)))
}

// DELETE /api/activities/{id}
#[utoipa::path(
    delete,
    path = "/api/activities/{id}",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "ID da atividade")),
    responses((status = 204, description = "Atividade removida (anexo limpo antes)")),
    security(("api_jwt" = []))
)]
pub async fn delete_activity(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.activity_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/activities/reminders
#[utoipa::path(
    get,
    path = "/api/activities/reminders",
    tag = "Activities",
    responses((status = 200, description = "Lembretes bucketizados", body = ReminderOverview)),
    security(("api_jwt" = []))
)]
pub async fn list_reminders(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let overview = app_state.activity_service.reminders().await?;
    Ok((StatusCode::OK, Json(overview)))
}
