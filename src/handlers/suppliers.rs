// src/handlers/suppliers.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::supplier::Supplier};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Bali Stone Works")]
    pub name: String,

    #[serde(default)]
    #[schema(example = "Materiais")]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0, message = "A nota vai de 0 a 5."))]
    pub rating: f64,

    #[serde(default)]
    pub active_orders: i64,
    #[serde(default)]
    pub total_orders: i64,
    #[serde(default)]
    pub payment_terms: String,
    #[serde(default)]
    pub notes: String,
}

// GET /api/suppliers
#[utoipa::path(
    get,
    path = "/api/suppliers",
    tag = "Suppliers",
    responses((status = 200, description = "Fornecedores por nome", body = Vec<Supplier>)),
    security(("api_jwt" = []))
)]
pub async fn list_suppliers(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let suppliers = app_state.supplier_service.list().await?;
    Ok((StatusCode::OK, Json(suppliers)))
}

// POST /api/suppliers
#[utoipa::path(
    post,
    path = "/api/suppliers",
    tag = "Suppliers",
    request_body = SupplierPayload,
    responses((status = 201, description = "Fornecedor criado", body = Supplier)),
    security(("api_jwt" = []))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let supplier = app_state
        .supplier_service
        .create(
            &payload.name,
            &payload.category,
            &payload.subcategory,
            &payload.contact,
            &payload.phone,
            &payload.email,
            payload.rating,
            &payload.payment_terms,
            &payload.notes,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

// PUT /api/suppliers/{id}
#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    request_body = SupplierPayload,
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses((status = 200, description = "Fornecedor atualizado", body = Supplier)),
    security(("api_jwt" = []))
)]
pub async fn update_supplier(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let supplier = app_state
        .supplier_service
        .update(
            id,
            &payload.name,
            &payload.category,
            &payload.subcategory,
            &payload.contact,
            &payload.phone,
            &payload.email,
            payload.rating,
            payload.active_orders,
            payload.total_orders,
            &payload.payment_terms,
            &payload.notes,
        )
        .await?;

    Ok((StatusCode::OK, Json(supplier)))
}

// DELETE /api/suppliers/{id}
#[utoipa::path(
    delete,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses((status = 204, description = "Fornecedor removido")),
    security(("api_jwt" = []))
)]
pub async fn delete_supplier(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.supplier_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
