// src/handlers/projects.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::project::Project};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Vista Azul")]
    pub name: String,

    // Sem slug explícito, deriva do nome.
    pub slug: Option<String>,

    #[serde(default)]
    #[schema(example = "Canggu")]
    pub location: String,
    #[serde(default)]
    pub region: String,
    #[schema(example = "construction")]
    pub status: Option<String>,
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    #[schema(value_type = f64, example = 130000.0)]
    pub price_per_unit: Decimal,
    #[serde(default)]
    pub roi_min: f64,
    #[serde(default)]
    pub roi_max: f64,

    #[serde(default)]
    pub build_size: String,
    #[serde(default)]
    pub pool_size: String,
    #[serde(default)]
    pub lease_years: i64,

    #[serde(default)]
    pub total_units: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResizeUnitsPayload {
    #[schema(example = 12)]
    pub total_units: usize,
}

// GET /api/projects
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Projects",
    responses((status = 200, description = "Projetos por nome", body = Vec<Project>)),
    security(("api_jwt" = []))
)]
pub async fn list_projects(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let projects = app_state.project_service.list().await?;
    Ok((StatusCode::OK, Json(projects)))
}

// GET /api/projects/{slug}
#[utoipa::path(
    get,
    path = "/api/projects/{slug}",
    tag = "Projects",
    params(("slug" = String, Path, description = "Slug do projeto")),
    responses(
        (status = 200, description = "Detalhe do projeto", body = Project),
        (status = 404, description = "Projeto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_project(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let project = app_state.project_service.get_by_slug(&slug).await?;
    Ok((StatusCode::OK, Json(project)))
}

// POST /api/projects
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Projects",
    request_body = ProjectPayload,
    responses((status = 201, description = "Projeto criado", body = Project)),
    security(("api_jwt" = []))
)]
pub async fn create_project(
    State(app_state): State<AppState>,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let project = app_state
        .project_service
        .create(
            &payload.name,
            payload.slug.as_deref(),
            &payload.location,
            &payload.region,
            payload.status.as_deref(),
            &payload.description,
            payload.price_per_unit,
            payload.roi_min,
            payload.roi_max,
            &payload.build_size,
            &payload.pool_size,
            payload.lease_years,
            payload.total_units,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

// PUT /api/projects/{id}
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "Projects",
    request_body = ProjectPayload,
    params(("id" = Uuid, Path, description = "ID do projeto")),
    responses((status = 200, description = "Projeto atualizado", body = Project)),
    security(("api_jwt" = []))
)]
pub async fn update_project(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let total_units = (payload.total_units > 0).then_some(payload.total_units);
    let project = app_state
        .project_service
        .update(
            id,
            &payload.name,
            &payload.location,
            &payload.region,
            payload.status.as_deref(),
            &payload.description,
            payload.price_per_unit,
            payload.roi_min,
            payload.roi_max,
            &payload.build_size,
            &payload.pool_size,
            payload.lease_years,
            total_units,
        )
        .await?;

    Ok((StatusCode::OK, Json(project)))
}

// PUT /api/projects/{id}/units
#[utoipa::path(
    put,
    path = "/api/projects/{id}/units",
    tag = "Projects",
    request_body = ResizeUnitsPayload,
    params(("id" = Uuid, Path, description = "ID do projeto")),
    responses((status = 200, description = "Unidades redimensionadas", body = Project)),
    security(("api_jwt" = []))
)]
pub async fn resize_units(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResizeUnitsPayload>,
) -> Result<impl IntoResponse, AppError> {
    let project = app_state
        .project_service
        .resize_units(id, payload.total_units)
        .await?;
    Ok((StatusCode::OK, Json(project)))
}

// DELETE /api/projects/{id}
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "ID do projeto")),
    responses((status = 204, description = "Projeto removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_project(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.project_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
