// src/services/supplier_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::supplier::Supplier,
    store::writer::{insert_with_fallback, update_with_fallback},
    store::{Order, RecordStore},
};

const SUPPLIERS_TABLE: &str = "suppliers";

#[derive(Clone)]
pub struct SupplierService {
    store: Arc<dyn RecordStore>,
}

impl SupplierService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Supplier>, AppError> {
        let rows = self
            .store
            .select(SUPPLIERS_TABLE, None, Some(("name", Order::Asc)))
            .await?;
        Ok(rows.iter().map(Supplier::from_record).collect())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: &str,
        category: &str,
        subcategory: &str,
        contact: &str,
        phone: &str,
        email: &str,
        rating: f64,
        payment_terms: &str,
        notes: &str,
    ) -> Result<Supplier, AppError> {
        let supplier = Supplier {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            contact: contact.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
            rating: rating.clamp(0.0, 5.0),
            active_orders: 0,
            total_orders: 0,
            payment_terms: payment_terms.to_string(),
            notes: notes.to_string(),
            created_at: Some(Utc::now()),
        };
        let saved =
            insert_with_fallback(self.store.as_ref(), SUPPLIERS_TABLE, &supplier.record_variants())
                .await?;
        Ok(Supplier::from_record(&saved))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        category: &str,
        subcategory: &str,
        contact: &str,
        phone: &str,
        email: &str,
        rating: f64,
        active_orders: i64,
        total_orders: i64,
        payment_terms: &str,
        notes: &str,
    ) -> Result<Supplier, AppError> {
        let mut updated = self.find(id).await?;
        updated.name = name.to_string();
        updated.category = category.to_string();
        updated.subcategory = subcategory.to_string();
        updated.contact = contact.to_string();
        updated.phone = phone.to_string();
        updated.email = email.to_string();
        updated.rating = rating.clamp(0.0, 5.0);
        updated.active_orders = active_orders;
        updated.total_orders = total_orders;
        updated.payment_terms = payment_terms.to_string();
        updated.notes = notes.to_string();

        let saved = update_with_fallback(
            self.store.as_ref(),
            SUPPLIERS_TABLE,
            &id.to_string(),
            &updated.record_variants(),
        )
        .await?;
        Ok(Supplier::from_record(&saved))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.store.delete(SUPPLIERS_TABLE, &id.to_string()).await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Supplier, AppError> {
        let rows = self
            .store
            .select(SUPPLIERS_TABLE, Some(("id", json!(id.to_string()))), None)
            .await?;
        rows.first()
            .map(Supplier::from_record)
            .ok_or(AppError::RecordNotFound("Fornecedor"))
    }
}
