// src/models/lead.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::fields;
use crate::store::Record;

// --- ESTÁGIOS DO PIPELINE ---

// O conjunto é fixo e ordenado. Valores legados ou texto livre vindos do
// backend SEMPRE resolvem para um destes ids (ver `normalize`), nunca
// sobrevivem como string solta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    New,
    Contacted,
    Qualified,
    PdfSent,
    SiteVisit,
    Negotiating,
    Won,
    Lost,
}

// Rótulos legados que apareceram em alguma versão do schema.
const STAGE_ALIASES: &[(&str, Stage)] = &[
    ("booked", Stage::Won),
    ("closed_won", Stage::Won),
    ("closed_lost", Stage::Lost),
    ("closing", Stage::Negotiating),
    ("negotiation", Stage::Negotiating),
    ("in_negotiation", Stage::Negotiating),
    ("pdf", Stage::PdfSent),
    ("proposal_sent", Stage::PdfSent),
    ("visit", Stage::SiteVisit),
    ("viewing", Stage::SiteVisit),
    ("contact", Stage::Contacted),
    ("lead", Stage::New),
];

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::New,
        Stage::Contacted,
        Stage::Qualified,
        Stage::PdfSent,
        Stage::SiteVisit,
        Stage::Negotiating,
        Stage::Won,
        Stage::Lost,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Stage::New => "new",
            Stage::Contacted => "contacted",
            Stage::Qualified => "qualified",
            Stage::PdfSent => "pdf_sent",
            Stage::SiteVisit => "site_visit",
            Stage::Negotiating => "negotiating",
            Stage::Won => "won",
            Stage::Lost => "lost",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::New => "New Lead",
            Stage::Contacted => "Contacted",
            Stage::Qualified => "Qualified",
            Stage::PdfSent => "PDF Sent",
            Stage::SiteVisit => "Site Visit",
            Stage::Negotiating => "Negotiating",
            Stage::Won => "Won",
            Stage::Lost => "Lost",
        }
    }

    fn from_id(raw: &str) -> Option<Stage> {
        Stage::ALL.iter().copied().find(|s| s.id() == raw)
    }

    /// Função TOTAL: nunca falha, só degrada para `New`. Um valor de
    /// estágio irreconhecível não pode quebrar a renderização do board.
    pub fn normalize(raw: &str) -> Stage {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Stage::New;
        }
        // 1. Match exato contra os ids canônicos
        if let Some(stage) = Stage::from_id(trimmed) {
            return stage;
        }
        // 2. Ids canônicos, case-insensitive
        let lower = trimmed.to_lowercase();
        if let Some(stage) = Stage::from_id(&lower) {
            return stage;
        }
        // 3. Rótulos de exibição, case-insensitive
        if let Some(stage) = Stage::ALL
            .iter()
            .copied()
            .find(|s| s.label().eq_ignore_ascii_case(trimmed))
        {
            return stage;
        }
        // 4. Espaços e hífens viram underscore
        let underscored = lower.replace([' ', '-'], "_");
        if let Some(stage) = Stage::from_id(&underscored) {
            return stage;
        }
        // 5. Tabela fixa de aliases legados
        if let Some((_, stage)) = STAGE_ALIASES.iter().find(|(alias, _)| *alias == underscored) {
            return *stage;
        }
        // 6. Default seguro
        Stage::New
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Won | Stage::Lost)
    }
}

// --- PRIORIDADE ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn id(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    // Análogo estreito do `Stage::normalize`: total, default medium.
    pub fn normalize(raw: &str) -> Priority {
        match raw.trim().to_lowercase().as_str() {
            "high" | "hot" | "urgent" => Priority::High,
            "low" | "cold" => Priority::Low,
            "medium" | "warm" | "normal" => Priority::Medium,
            _ => Priority::Medium,
        }
    }
}

// --- LEAD ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub stage: Stage,
    pub priority: Priority,
    pub source: String,

    // Texto livre ("$130K", "$100K-130K") ou número. O parse fica no
    // agregador de analytics; aqui o valor passa cru.
    #[schema(value_type = Object)]
    pub budget: Value,

    pub interested_project: String,
    pub notes: String,
    pub last_contact_date: Option<NaiveDate>,
    pub country: String,
    pub investment_type: String,

    pub created_at: Option<DateTime<Utc>>,
    // Preenchido quando o lead entra em won/lost; alimenta o tempo médio
    // de fechamento.
    pub closed_at: Option<DateTime<Utc>>,
}

impl Lead {
    /// Normaliza uma linha crua do backend para o shape canônico.
    /// Idempotente: normalizar uma linha já canônica é um no-op.
    pub fn from_record(record: &Record) -> Self {
        let stage_raw = fields::text(record, &["stage", "pipeline_stage", "pipelineStage", "status"]);
        let priority_raw = fields::text(record, &["priority", "lead_priority", "temperature"]);

        Self {
            id: fields::uuid(record, &["id"]),
            name: fields::text(record, &["name", "full_name", "fullName", "lead_name", "leadName"]),
            email: fields::text(record, &["email", "email_address", "emailAddress"]),
            phone: fields::text(record, &["phone", "phone_number", "phoneNumber", "mobile"]),
            stage: Stage::normalize(&stage_raw),
            priority: Priority::normalize(&priority_raw),
            source: fields::text(record, &["source", "lead_source", "leadSource"]),
            budget: fields::value(record, &["budget", "budget_range", "budgetRange", "price_range"]),
            interested_project: fields::text(
                record,
                &["interested_project", "interestedProject", "project", "project_interest"],
            ),
            notes: fields::text(record, &["notes", "note", "comments"]),
            last_contact_date: fields::date(
                record,
                &["last_contact_date", "lastContactDate", "last_contact", "lastContact"],
            ),
            country: fields::text(record, &["country"]),
            investment_type: fields::text(record, &["investment_type", "investmentType"]),
            created_at: fields::datetime(record, &["created_at", "createdAt", "inserted_at"]),
            closed_at: fields::datetime(record, &["closed_at", "closedAt", "close_date", "closeDate"]),
        }
    }

    /// Payload canônico completo (o shape "rico").
    pub fn to_record_full(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(self.id.to_string()));
        rec.insert("name".into(), json!(self.name));
        rec.insert("email".into(), json!(self.email));
        rec.insert("phone".into(), json!(self.phone));
        rec.insert("stage".into(), json!(self.stage.id()));
        rec.insert("priority".into(), json!(self.priority.id()));
        rec.insert("source".into(), json!(self.source));
        rec.insert("budget".into(), json!(budget_text(&self.budget)));
        rec.insert("interested_project".into(), json!(self.interested_project));
        rec.insert("notes".into(), json!(self.notes));
        if let Some(d) = self.last_contact_date {
            rec.insert("last_contact_date".into(), json!(d.format("%Y-%m-%d").to_string()));
        }
        rec.insert("country".into(), json!(self.country));
        rec.insert("investment_type".into(), json!(self.investment_type));
        if let Some(dt) = self.created_at {
            rec.insert("created_at".into(), json!(dt.to_rfc3339()));
        }
        if let Some(dt) = self.closed_at {
            rec.insert("closed_at".into(), json!(dt.to_rfc3339()));
        }
        rec
    }

    /// Shape reduzido: sem as colunas mais novas (country,
    /// investment_type, last_contact_date, closed_at).
    fn to_record_reduced(&self) -> Record {
        let mut rec = self.to_record_full();
        for key in ["country", "investment_type", "last_contact_date", "closed_at"] {
            rec.remove(key);
        }
        rec
    }

    /// Shape legado mínimo: só os campos que toda versão do schema teve,
    /// com "project" no nome antigo.
    fn to_record_legacy(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(self.id.to_string()));
        rec.insert("name".into(), json!(self.name));
        rec.insert("email".into(), json!(self.email));
        rec.insert("phone".into(), json!(self.phone));
        rec.insert("stage".into(), json!(self.stage.id()));
        rec.insert("notes".into(), json!(self.notes));
        rec.insert("project".into(), json!(self.interested_project));
        rec
    }

    /// As variantes de payload em ordem de prioridade, do mais rico ao
    /// mínimo. É isso que o writer de fallback percorre.
    pub fn record_variants(&self) -> Vec<Record> {
        vec![self.to_record_full(), self.to_record_reduced(), self.to_record_legacy()]
    }

    /// Variantes para a troca de estágio (drag-and-drop). O payload é
    /// pequeno de propósito: um update de board não deve reescrever a
    /// linha inteira. `closed_at` vai explícito (null limpa um
    /// fechamento antigo ao sair de won/lost).
    pub fn stage_change_variants(&self) -> Vec<Record> {
        let mut full = Record::new();
        full.insert("stage".into(), json!(self.stage.id()));
        full.insert(
            "closed_at".into(),
            self.closed_at.map(|dt| json!(dt.to_rfc3339())).unwrap_or(Value::Null),
        );
        let mut minimal = Record::new();
        minimal.insert("stage".into(), json!(self.stage.id()));
        vec![full, minimal]
    }
}

// A coluna budget é texto no schema canônico; linhas legadas podem
// trazer número, então a escrita textualiza sem perder o valor.
fn budget_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Uma coluna do board, na ordem fixa dos estágios.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub stage: Stage,
    pub label: String,
    pub leads: Vec<Lead>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_canonical_ids() {
        assert_eq!(Stage::normalize("pdf_sent"), Stage::PdfSent);
        assert_eq!(Stage::normalize("won"), Stage::Won);
    }

    #[test]
    fn normalize_is_case_insensitive() {
        assert_eq!(Stage::normalize("QUALIFIED"), Stage::Qualified);
        assert_eq!(Stage::normalize("Site Visit"), Stage::SiteVisit);
    }

    #[test]
    fn normalize_matches_display_labels() {
        assert_eq!(Stage::normalize("New Lead"), Stage::New);
        assert_eq!(Stage::normalize("PDF Sent"), Stage::PdfSent);
    }

    #[test]
    fn normalize_handles_hyphens_and_whitespace() {
        assert_eq!(Stage::normalize("site-visit"), Stage::SiteVisit);
        assert_eq!(Stage::normalize("  pdf sent "), Stage::PdfSent);
    }

    #[test]
    fn normalize_resolves_legacy_aliases() {
        assert_eq!(Stage::normalize("booked"), Stage::Won);
        assert_eq!(Stage::normalize("closed_won"), Stage::Won);
        assert_eq!(Stage::normalize("Closed-Lost"), Stage::Lost);
        assert_eq!(Stage::normalize("closing"), Stage::Negotiating);
        assert_eq!(Stage::normalize("pdf"), Stage::PdfSent);
    }

    #[test]
    fn normalize_falls_back_to_new() {
        assert_eq!(Stage::normalize("garbage value"), Stage::New);
        assert_eq!(Stage::normalize(""), Stage::New);
    }

    #[test]
    fn priority_normalize_handles_legacy_temperatures() {
        assert_eq!(Priority::normalize("hot"), Priority::High);
        assert_eq!(Priority::normalize("WARM"), Priority::Medium);
        assert_eq!(Priority::normalize("cold"), Priority::Low);
        assert_eq!(Priority::normalize("???"), Priority::Medium);
    }

    #[test]
    fn from_record_resolves_camel_case_aliases() {
        let raw: Record = serde_json::from_value(json!({
            "id": "7f3d3f1e-5c9a-4b6f-8a35-31a1cf9a2a10",
            "fullName": "Jane Doe",
            "phoneNumber": "+1234",
            "pipelineStage": "Booked",
            "leadSource": "Instagram",
            "budgetRange": "$100K-130K",
        }))
        .unwrap();

        let lead = Lead::from_record(&raw);
        assert_eq!(lead.name, "Jane Doe");
        assert_eq!(lead.phone, "+1234");
        assert_eq!(lead.stage, Stage::Won);
        assert_eq!(lead.source, "Instagram");
        assert_eq!(lead.budget, json!("$100K-130K"));
        // Campos ausentes degradam para o valor neutro, nunca quebram.
        assert_eq!(lead.email, "");
        assert_eq!(lead.priority, Priority::Medium);
    }

    #[test]
    fn normalization_round_trips() {
        let raw: Record = serde_json::from_value(json!({
            "id": "7f3d3f1e-5c9a-4b6f-8a35-31a1cf9a2a10",
            "name": "Carlos Mota",
            "email": "carlos@example.com",
            "phone": "+55 11 99999-0000",
            "stage": "negotiating",
            "priority": "high",
            "source": "Website",
            "budget": "$300K+",
            "interested_project": "Vista Azul - Unit 12",
            "notes": "prefere cobertura",
            "last_contact_date": "2026-07-30",
            "country": "BR",
            "investment_type": "rental",
            "created_at": "2026-06-01T12:00:00+00:00",
        }))
        .unwrap();

        let lead = Lead::from_record(&raw);
        let echoed = Lead::from_record(&lead.to_record_full());
        assert_eq!(lead, echoed);
    }
}
