// src/models/supplier.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::fields;
use crate::store::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub contact: String,
    pub phone: String,
    pub email: String,

    // 0 a 5; valores fora da faixa são grampeados na normalização.
    pub rating: f64,

    pub active_orders: i64,
    pub total_orders: i64,
    pub payment_terms: String,
    pub notes: String,

    pub created_at: Option<DateTime<Utc>>,
}

impl Supplier {
    pub fn from_record(record: &Record) -> Self {
        let rating = fields::float(record, &["rating", "score"], 0.0).clamp(0.0, 5.0);
        Self {
            id: fields::uuid(record, &["id"]),
            name: fields::text(record, &["name", "supplier_name", "supplierName", "company"]),
            category: fields::text(record, &["category"]),
            subcategory: fields::text(record, &["subcategory", "sub_category", "subCategory"]),
            contact: fields::text(record, &["contact", "contact_person", "contactPerson"]),
            phone: fields::text(record, &["phone", "phone_number", "phoneNumber"]),
            email: fields::text(record, &["email"]),
            rating,
            active_orders: fields::integer(record, &["active_orders", "activeOrders"], 0),
            total_orders: fields::integer(record, &["total_orders", "totalOrders"], 0),
            payment_terms: fields::text(record, &["payment_terms", "paymentTerms"]),
            notes: fields::text(record, &["notes"]),
            created_at: fields::datetime(record, &["created_at", "createdAt"]),
        }
    }

    pub fn to_record_full(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(self.id.to_string()));
        rec.insert("name".into(), json!(self.name));
        rec.insert("category".into(), json!(self.category));
        rec.insert("subcategory".into(), json!(self.subcategory));
        rec.insert("contact".into(), json!(self.contact));
        rec.insert("phone".into(), json!(self.phone));
        rec.insert("email".into(), json!(self.email));
        rec.insert("rating".into(), json!(self.rating));
        rec.insert("active_orders".into(), json!(self.active_orders));
        rec.insert("total_orders".into(), json!(self.total_orders));
        rec.insert("payment_terms".into(), json!(self.payment_terms));
        rec.insert("notes".into(), json!(self.notes));
        if let Some(dt) = self.created_at {
            rec.insert("created_at".into(), json!(dt.to_rfc3339()));
        }
        rec
    }

    fn to_record_legacy(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(self.id.to_string()));
        rec.insert("name".into(), json!(self.name));
        rec.insert("category".into(), json!(self.category));
        rec.insert("contact".into(), json!(self.contact));
        rec.insert("phone".into(), json!(self.phone));
        rec
    }

    pub fn record_variants(&self) -> Vec<Record> {
        vec![self.to_record_full(), self.to_record_legacy()]
    }
}
