// src/models/project.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::fields;
use crate::store::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    PreConstruction,
    Construction,
    Complete,
}

impl ProjectStatus {
    pub fn id(self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::PreConstruction => "pre_construction",
            ProjectStatus::Construction => "construction",
            ProjectStatus::Complete => "complete",
        }
    }

    pub fn normalize(raw: &str) -> ProjectStatus {
        match raw.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "pre_construction" | "preconstruction" => ProjectStatus::PreConstruction,
            "construction" | "under_construction" => ProjectStatus::Construction,
            "complete" | "completed" | "done" => ProjectStatus::Complete,
            _ => ProjectStatus::Planning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Available,
    Reserved,
    Sold,
}

impl UnitStatus {
    pub fn id(self) -> &'static str {
        match self {
            UnitStatus::Available => "available",
            UnitStatus::Reserved => "reserved",
            UnitStatus::Sold => "sold",
        }
    }

    pub fn normalize(raw: &str) -> UnitStatus {
        match raw.trim().to_lowercase().as_str() {
            "reserved" | "hold" => UnitStatus::Reserved,
            "sold" => UnitStatus::Sold,
            _ => UnitStatus::Available,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub number: i32,
    pub status: UnitStatus,
    pub buyer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub name: String,
    pub status: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstallment {
    pub description: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    // Chave de rota da página de detalhe.
    pub slug: String,
    pub name: String,
    pub location: String,
    pub region: String,
    pub status: ProjectStatus,
    pub description: String,

    #[schema(value_type = f64)]
    pub price_per_unit: Decimal,
    pub roi_min: f64,
    pub roi_max: f64,

    pub build_size: String,
    pub pool_size: String,
    pub lease_years: i64,

    pub units: Vec<Unit>,
    pub milestones: Vec<Milestone>,
    pub payment_structure: Vec<PaymentInstallment>,

    // Derivados, recalculados sempre que `units` muda.
    pub available_units: usize,
    pub reserved_units: usize,
    pub sold_units: usize,
    #[schema(value_type = f64)]
    pub total_value: Decimal,

    pub created_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn from_record(record: &Record) -> Self {
        let status_raw = fields::text(record, &["status", "project_status", "projectStatus"]);
        let units = parse_units(&fields::value(record, &["units", "unit_list", "unitList"]));
        let milestones = parse_milestones(&fields::value(record, &["milestones", "timeline"]));
        let payment_structure =
            parse_payment_structure(&fields::value(record, &["payment_structure", "paymentStructure", "payment_plan"]));

        let price_per_unit = parse_decimal(&fields::value(record, &["price_per_unit", "pricePerUnit", "unit_price"]));

        let mut project = Self {
            id: fields::uuid(record, &["id"]),
            slug: fields::text(record, &["slug", "route_key", "routeKey"]),
            name: fields::text(record, &["name", "project_name", "projectName"]),
            location: fields::text(record, &["location"]),
            region: fields::text(record, &["region", "area"]),
            status: ProjectStatus::normalize(&status_raw),
            description: fields::text(record, &["description"]),
            price_per_unit,
            roi_min: fields::float(record, &["roi_min", "roiMin"], 0.0),
            roi_max: fields::float(record, &["roi_max", "roiMax"], 0.0),
            build_size: fields::text(record, &["build_size", "buildSize"]),
            pool_size: fields::text(record, &["pool_size", "poolSize"]),
            lease_years: fields::integer(record, &["lease_years", "leaseYears"], 0),
            units,
            milestones,
            payment_structure,
            available_units: 0,
            reserved_units: 0,
            sold_units: 0,
            total_value: Decimal::ZERO,
            created_at: fields::datetime(record, &["created_at", "createdAt"]),
        };
        project.recompute_derived();
        project
    }

    /// Recalcula contagens e valor total a partir da coleção de unidades.
    pub fn recompute_derived(&mut self) {
        self.available_units = self.units.iter().filter(|u| u.status == UnitStatus::Available).count();
        self.reserved_units = self.units.iter().filter(|u| u.status == UnitStatus::Reserved).count();
        self.sold_units = self.units.iter().filter(|u| u.status == UnitStatus::Sold).count();
        self.total_value = self.price_per_unit * Decimal::from(self.units.len() as u64);
    }

    /// Redimensiona a coleção para `total` unidades e recalcula os
    /// derivados. Status/buyer são preservados por número de unidade.
    pub fn resize_units(&mut self, total: usize) {
        self.units = sync_units_to_total(total, &self.units);
        self.recompute_derived();
    }

    pub fn to_record_full(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(self.id.to_string()));
        rec.insert("slug".into(), json!(self.slug));
        rec.insert("name".into(), json!(self.name));
        rec.insert("location".into(), json!(self.location));
        rec.insert("region".into(), json!(self.region));
        rec.insert("status".into(), json!(self.status.id()));
        rec.insert("description".into(), json!(self.description));
        rec.insert("price_per_unit".into(), json!(self.price_per_unit));
        rec.insert("roi_min".into(), json!(self.roi_min));
        rec.insert("roi_max".into(), json!(self.roi_max));
        rec.insert("build_size".into(), json!(self.build_size));
        rec.insert("pool_size".into(), json!(self.pool_size));
        rec.insert("lease_years".into(), json!(self.lease_years));
        rec.insert("total_units".into(), json!(self.units.len()));
        rec.insert(
            "units".into(),
            serde_json::to_value(
                self.units
                    .iter()
                    .map(|u| json!({ "number": u.number, "status": u.status.id(), "buyer": u.buyer }))
                    .collect::<Vec<_>>(),
            )
            .unwrap_or(Value::Null),
        );
        rec.insert(
            "milestones".into(),
            serde_json::to_value(
                self.milestones
                    .iter()
                    .map(|m| {
                        json!({
                            "name": m.name,
                            "status": m.status,
                            "date": m.date.map(|d| d.format("%Y-%m-%d").to_string()),
                        })
                    })
                    .collect::<Vec<_>>(),
            )
            .unwrap_or(Value::Null),
        );
        rec.insert(
            "payment_structure".into(),
            serde_json::to_value(
                self.payment_structure
                    .iter()
                    .map(|p| json!({ "description": p.description, "percentage": p.percentage }))
                    .collect::<Vec<_>>(),
            )
            .unwrap_or(Value::Null),
        );
        if let Some(dt) = self.created_at {
            rec.insert("created_at".into(), json!(dt.to_rfc3339()));
        }
        rec
    }

    /// Sem milestones/payment_structure (schemas antigos não tinham).
    fn to_record_reduced(&self) -> Record {
        let mut rec = self.to_record_full();
        for key in ["milestones", "payment_structure", "roi_min", "roi_max", "lease_years"] {
            rec.remove(key);
        }
        rec
    }

    fn to_record_legacy(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(self.id.to_string()));
        rec.insert("slug".into(), json!(self.slug));
        rec.insert("name".into(), json!(self.name));
        rec.insert("location".into(), json!(self.location));
        rec.insert("status".into(), json!(self.status.id()));
        rec.insert("description".into(), json!(self.description));
        rec.insert("total_units".into(), json!(self.units.len()));
        rec
    }

    pub fn record_variants(&self) -> Vec<Record> {
        vec![self.to_record_full(), self.to_record_reduced(), self.to_record_legacy()]
    }

    /// Variantes para o redimensionamento de unidades.
    pub fn units_change_variants(&self) -> Vec<Record> {
        let mut full = Record::new();
        full.insert(
            "units".into(),
            serde_json::to_value(
                self.units
                    .iter()
                    .map(|u| json!({ "number": u.number, "status": u.status.id(), "buyer": u.buyer }))
                    .collect::<Vec<_>>(),
            )
            .unwrap_or(Value::Null),
        );
        full.insert("total_units".into(), json!(self.units.len()));
        let mut minimal = Record::new();
        minimal.insert("units".into(), full.get("units").cloned().unwrap_or(Value::Null));
        vec![full, minimal]
    }
}

/// Invariante central da página de projetos: a coleção de unidades
/// acompanha o total configurado. Crescer anexa unidades "available",
/// encolher trunca pelo fim, e o que existir em ambos os conjuntos
/// preserva status/buyer pelo número da unidade.
pub fn sync_units_to_total(total: usize, existing: &[Unit]) -> Vec<Unit> {
    (1..=total as i32)
        .map(|number| {
            existing
                .iter()
                .find(|u| u.number == number)
                .cloned()
                .unwrap_or(Unit { number, status: UnitStatus::Available, buyer: None })
        })
        .collect()
}

// --- parse leniente das coleções JSONB ---

fn parse_units(value: &Value) -> Vec<Unit> {
    let Some(items) = value.as_array() else { return Vec::new() };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let rec: Record = item.as_object().cloned().unwrap_or_default();
            let number = fields::integer(&rec, &["number", "unit_number", "unitNumber"], (i + 1) as i64) as i32;
            let status = UnitStatus::normalize(&fields::text(&rec, &["status"]));
            Unit { number, status, buyer: fields::opt_text(&rec, &["buyer", "buyer_name", "buyerName"]) }
        })
        .collect()
}

fn parse_milestones(value: &Value) -> Vec<Milestone> {
    let Some(items) = value.as_array() else { return Vec::new() };
    items
        .iter()
        .map(|item| {
            let rec: Record = item.as_object().cloned().unwrap_or_default();
            Milestone {
                name: fields::text(&rec, &["name", "title"]),
                status: fields::text(&rec, &["status"]),
                date: fields::date(&rec, &["date", "target_date", "targetDate"]),
            }
        })
        .collect()
}

fn parse_payment_structure(value: &Value) -> Vec<PaymentInstallment> {
    let Some(items) = value.as_array() else { return Vec::new() };
    items
        .iter()
        .map(|item| {
            let rec: Record = item.as_object().cloned().unwrap_or_default();
            PaymentInstallment {
                description: fields::text(&rec, &["description", "label"]),
                percentage: fields::float(&rec, &["percentage", "percent"], 0.0),
            }
        })
        .collect()
}

fn parse_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(Decimal::from_f64_retain)
            .unwrap_or(Decimal::ZERO),
        Value::String(s) => s.trim().parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(number: i32, status: UnitStatus, buyer: Option<&str>) -> Unit {
        Unit { number, status, buyer: buyer.map(String::from) }
    }

    #[test]
    fn growing_appends_available_units() {
        let existing = vec![unit(1, UnitStatus::Sold, Some("Ana")), unit(2, UnitStatus::Reserved, None)];
        let resized = sync_units_to_total(4, &existing);

        assert_eq!(resized.len(), 4);
        assert_eq!(resized[0].status, UnitStatus::Sold);
        assert_eq!(resized[0].buyer.as_deref(), Some("Ana"));
        assert_eq!(resized[1].status, UnitStatus::Reserved);
        assert_eq!(resized[2].status, UnitStatus::Available);
        assert_eq!(resized[3].status, UnitStatus::Available);
    }

    #[test]
    fn shrinking_truncates_but_preserves_survivors() {
        let existing = vec![
            unit(1, UnitStatus::Available, None),
            unit(2, UnitStatus::Sold, Some("Bruno")),
            unit(3, UnitStatus::Reserved, None),
        ];
        let resized = sync_units_to_total(2, &existing);

        assert_eq!(resized.len(), 2);
        assert_eq!(resized[1].status, UnitStatus::Sold);
        assert_eq!(resized[1].buyer.as_deref(), Some("Bruno"));
    }

    #[test]
    fn resize_recomputes_derived_counts_and_total_value() {
        let mut rec = Record::new();
        rec.insert("id".into(), json!("0c6a1dd8-4f3a-43a1-b8b0-0a2f9f8a7701"));
        rec.insert("name".into(), json!("Vista Azul"));
        rec.insert("price_per_unit".into(), json!(130000));
        rec.insert("units".into(), json!([
            { "number": 1, "status": "sold", "buyer": "Ana" },
            { "number": 2, "status": "available" },
        ]));

        let mut project = Project::from_record(&rec);
        assert_eq!(project.sold_units, 1);
        assert_eq!(project.total_value, Decimal::from(260000));

        project.resize_units(5);
        assert_eq!(project.units.len(), 5);
        assert_eq!(project.available_units, 4);
        assert_eq!(project.sold_units, 1);
        assert_eq!(project.total_value, Decimal::from(650000));
    }

    #[test]
    fn from_record_tolerates_malformed_collections() {
        let mut rec = Record::new();
        rec.insert("name".into(), json!("Sem unidades"));
        rec.insert("units".into(), json!("not an array"));
        rec.insert("milestones".into(), json!(null));

        let project = Project::from_record(&rec);
        assert!(project.units.is_empty());
        assert!(project.milestones.is_empty());
        assert_eq!(project.status, ProjectStatus::Planning);
    }
}
