// src/services/project_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::project::{Project, ProjectStatus, sync_units_to_total},
    store::writer::{insert_with_fallback, update_with_fallback},
    store::{Order, RecordStore},
};

const PROJECTS_TABLE: &str = "projects";

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn RecordStore>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Project>, AppError> {
        let rows = self
            .store
            .select(PROJECTS_TABLE, None, Some(("name", Order::Asc)))
            .await?;
        Ok(rows.iter().map(Project::from_record).collect())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Project, AppError> {
        let rows = self
            .store
            .select(PROJECTS_TABLE, Some(("slug", json!(slug))), None)
            .await?;
        rows.first()
            .map(Project::from_record)
            .ok_or(AppError::RecordNotFound("Projeto"))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: &str,
        slug: Option<&str>,
        location: &str,
        region: &str,
        status_raw: Option<&str>,
        description: &str,
        price_per_unit: Decimal,
        roi_min: f64,
        roi_max: f64,
        build_size: &str,
        pool_size: &str,
        lease_years: i64,
        total_units: usize,
    ) -> Result<Project, AppError> {
        let mut project = Project {
            id: Uuid::new_v4(),
            slug: slug.map(str::to_string).unwrap_or_else(|| slugify(name)),
            name: name.to_string(),
            location: location.to_string(),
            region: region.to_string(),
            status: ProjectStatus::normalize(status_raw.unwrap_or("")),
            description: description.to_string(),
            price_per_unit,
            roi_min,
            roi_max,
            build_size: build_size.to_string(),
            pool_size: pool_size.to_string(),
            lease_years,
            units: sync_units_to_total(total_units, &[]),
            milestones: Vec::new(),
            payment_structure: Vec::new(),
            available_units: 0,
            reserved_units: 0,
            sold_units: 0,
            total_value: Decimal::ZERO,
            created_at: Some(Utc::now()),
        };
        project.recompute_derived();

        let saved =
            insert_with_fallback(self.store.as_ref(), PROJECTS_TABLE, &project.record_variants())
                .await?;
        Ok(Project::from_record(&saved))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        location: &str,
        region: &str,
        status_raw: Option<&str>,
        description: &str,
        price_per_unit: Decimal,
        roi_min: f64,
        roi_max: f64,
        build_size: &str,
        pool_size: &str,
        lease_years: i64,
        total_units: Option<usize>,
    ) -> Result<Project, AppError> {
        let mut updated = self.find(id).await?;
        updated.name = name.to_string();
        updated.location = location.to_string();
        updated.region = region.to_string();
        if let Some(raw) = status_raw {
            updated.status = ProjectStatus::normalize(raw);
        }
        updated.description = description.to_string();
        updated.price_per_unit = price_per_unit;
        updated.roi_min = roi_min;
        updated.roi_max = roi_max;
        updated.build_size = build_size.to_string();
        updated.pool_size = pool_size.to_string();
        updated.lease_years = lease_years;
        if let Some(total) = total_units {
            // Preserva status/buyer por número de unidade no resize.
            updated.resize_units(total);
        } else {
            updated.recompute_derived();
        }

        let saved = update_with_fallback(
            self.store.as_ref(),
            PROJECTS_TABLE,
            &id.to_string(),
            &updated.record_variants(),
        )
        .await?;
        Ok(Project::from_record(&saved))
    }

    /// Redimensiona só a coleção de unidades (o controle "total de
    /// unidades" da página de detalhe).
    pub async fn resize_units(&self, id: Uuid, total: usize) -> Result<Project, AppError> {
        let mut project = self.find(id).await?;
        project.resize_units(total);

        let saved = update_with_fallback(
            self.store.as_ref(),
            PROJECTS_TABLE,
            &id.to_string(),
            &project.units_change_variants(),
        )
        .await?;
        // A linha ecoada pode vir do shape mínimo; os derivados são
        // recalculados na normalização.
        Ok(Project::from_record(&saved))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.store.delete(PROJECTS_TABLE, &id.to_string()).await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Project, AppError> {
        let rows = self
            .store
            .select(PROJECTS_TABLE, Some(("id", json!(id.to_string()))), None)
            .await?;
        rows.first()
            .map(Project::from_record)
            .ok_or(AppError::RecordNotFound("Projeto"))
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Vista Azul — Fase 2"), "vista-azul-fase-2");
        assert_eq!(slugify("  Casa  Verde  "), "casa-verde");
    }
}
