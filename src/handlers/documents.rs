// src/handlers/documents.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::document::Document};

// Ou `url` (link externo) ou `data` (arquivo em base64), nunca os dois.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Planta baixa - Fase 2")]
    pub name: String,

    #[serde(rename = "type")]
    #[schema(example = "design")]
    pub doc_type: Option<String>,

    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub description: String,

    pub url: Option<String>,

    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    /// Conteúdo do arquivo em base64 (quando for upload).
    pub data: Option<String>,
}

// GET /api/documents
#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "Documents",
    responses((status = 200, description = "Documentos mais recentes primeiro", body = Vec<Document>)),
    security(("api_jwt" = []))
)]
pub async fn list_documents(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let documents = app_state.document_service.list().await?;
    Ok((StatusCode::OK, Json(documents)))
}

// POST /api/documents
#[utoipa::path(
    post,
    path = "/api/documents",
    tag = "Documents",
    request_body = DocumentPayload,
    responses(
        (status = 201, description = "Documento criado", body = Document),
        (status = 400, description = "Nem URL nem arquivo informados")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_document(
    State(app_state): State<AppState>,
    Json(payload): Json<DocumentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let document = match (&payload.data, &payload.url) {
        (Some(data), _) => {
            let file_name = payload
                .file_name
                .as_deref()
                .filter(|n| !n.is_empty())
                .ok_or_else(|| anyhow::anyhow!("Upload sem nome de arquivo."))?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(data.as_bytes())
                .map_err(|e| anyhow::anyhow!("Arquivo inválido (base64): {}", e))?;

            app_state
                .document_service
                .create_upload(
                    &payload.name,
                    payload.doc_type.as_deref(),
                    &payload.project,
                    &payload.description,
                    file_name,
                    &payload.mime_type,
                    bytes,
                )
                .await?
        }
        (None, Some(url)) if !url.is_empty() => {
            app_state
                .document_service
                .create_external(
                    &payload.name,
                    payload.doc_type.as_deref(),
                    &payload.project,
                    &payload.description,
                    url,
                )
                .await?
        }
        _ => return Err(anyhow::anyhow!("Informe uma URL externa ou um arquivo.").into()),
    };

    Ok((StatusCode::CREATED, Json(document)))
}

// DELETE /api/documents/{id}
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "ID do documento")),
    responses((status = 204, description = "Documento removido (objeto do storage limpo antes)")),
    security(("api_jwt" = []))
)]
pub async fn delete_document(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.document_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
