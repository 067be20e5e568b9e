// src/models/activity.rs

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::fields;
use crate::models::lead::Priority;
use crate::store::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    SiteVisit,
    Whatsapp,
    FollowUp,
    DocumentSent,
    Inspection,
    Other,
}

impl ActivityType {
    pub fn id(self) -> &'static str {
        match self {
            ActivityType::Call => "call",
            ActivityType::Email => "email",
            ActivityType::Meeting => "meeting",
            ActivityType::SiteVisit => "site_visit",
            ActivityType::Whatsapp => "whatsapp",
            ActivityType::FollowUp => "follow_up",
            ActivityType::DocumentSent => "document_sent",
            ActivityType::Inspection => "inspection",
            ActivityType::Other => "other",
        }
    }

    const ALL: [ActivityType; 9] = [
        ActivityType::Call,
        ActivityType::Email,
        ActivityType::Meeting,
        ActivityType::SiteVisit,
        ActivityType::Whatsapp,
        ActivityType::FollowUp,
        ActivityType::DocumentSent,
        ActivityType::Inspection,
        ActivityType::Other,
    ];

    // Total, default follow_up.
    pub fn normalize(raw: &str) -> ActivityType {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        if let Some(t) = ActivityType::ALL.iter().copied().find(|t| t.id() == normalized) {
            return t;
        }
        match normalized.as_str() {
            "followup" => ActivityType::FollowUp,
            "wa" | "whats_app" => ActivityType::Whatsapp,
            "visit" | "viewing" => ActivityType::SiteVisit,
            "doc_sent" | "document" => ActivityType::DocumentSent,
            "" => ActivityType::FollowUp,
            _ => ActivityType::FollowUp,
        }
    }
}

/// Anexo único opcional de uma atividade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub path: String,
    pub url: String,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    // Vínculo por nome, não por id: o match com leads/projetos é textual
    // e case-insensitive. Renomear um lead dispara um patch em massa
    // best-effort nas atividades (ver pipeline_service).
    pub lead_name: String,
    pub project_name: String,

    pub contact: String,
    pub location: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub completed: bool,
    pub notes: String,

    pub reminder_enabled: bool,
    pub reminder_date: Option<NaiveDate>,
    // Horário "HH:MM" como texto, igual vem do formulário.
    pub reminder_time: String,

    pub attachment: Option<Attachment>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Activity {
    pub fn from_record(record: &Record) -> Self {
        let type_raw = fields::text(record, &["type", "activity_type", "activityType"]);
        let priority_raw = fields::text(record, &["priority"]);

        let attachment_path = fields::text(record, &["attachment_path", "attachmentPath", "file_path"]);
        let attachment_url = fields::text(record, &["attachment_url", "attachmentUrl", "file_url"]);
        let attachment = if attachment_path.is_empty() && attachment_url.is_empty() {
            None
        } else {
            Some(Attachment {
                path: attachment_path,
                url: attachment_url,
                name: fields::text(record, &["attachment_name", "attachmentName", "file_name"]),
                mime_type: fields::text(record, &["attachment_type", "attachmentType", "mime_type"]),
                size: fields::integer(record, &["attachment_size", "attachmentSize", "file_size"], 0),
            })
        };

        Self {
            id: fields::uuid(record, &["id"]),
            title: fields::text(record, &["title", "name", "subject"]),
            activity_type: ActivityType::normalize(&type_raw),
            lead_name: fields::text(record, &["lead_name", "leadName", "lead"]),
            project_name: fields::text(record, &["project_name", "projectName", "project"]),
            contact: fields::text(record, &["contact", "contact_info", "contactInfo"]),
            location: fields::text(record, &["location"]),
            due_date: fields::date(record, &["due_date", "dueDate", "date"]),
            priority: Priority::normalize(&priority_raw),
            completed: fields::boolean(record, &["completed", "done", "is_completed"], false),
            notes: fields::text(record, &["notes", "note"]),
            reminder_enabled: fields::boolean(record, &["reminder_enabled", "reminderEnabled"], false),
            reminder_date: fields::date(record, &["reminder_date", "reminderDate"]),
            reminder_time: fields::text(record, &["reminder_time", "reminderTime"]),
            attachment,
            created_at: fields::datetime(record, &["created_at", "createdAt"]),
        }
    }

    pub fn to_record_full(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(self.id.to_string()));
        rec.insert("title".into(), json!(self.title));
        rec.insert("type".into(), json!(self.activity_type.id()));
        rec.insert("lead_name".into(), json!(self.lead_name));
        rec.insert("project_name".into(), json!(self.project_name));
        rec.insert("contact".into(), json!(self.contact));
        rec.insert("location".into(), json!(self.location));
        if let Some(d) = self.due_date {
            rec.insert("due_date".into(), json!(d.format("%Y-%m-%d").to_string()));
        }
        rec.insert("priority".into(), json!(self.priority.id()));
        rec.insert("completed".into(), json!(self.completed));
        rec.insert("notes".into(), json!(self.notes));
        rec.insert("reminder_enabled".into(), json!(self.reminder_enabled));
        if let Some(d) = self.reminder_date {
            rec.insert("reminder_date".into(), json!(d.format("%Y-%m-%d").to_string()));
        }
        rec.insert("reminder_time".into(), json!(self.reminder_time));
        if let Some(att) = &self.attachment {
            rec.insert("attachment_path".into(), json!(att.path));
            rec.insert("attachment_url".into(), json!(att.url));
            rec.insert("attachment_name".into(), json!(att.name));
            rec.insert("attachment_type".into(), json!(att.mime_type));
            rec.insert("attachment_size".into(), json!(att.size));
        }
        if let Some(dt) = self.created_at {
            rec.insert("created_at".into(), json!(dt.to_rfc3339()));
        }
        rec
    }

    /// Sem as colunas de lembrete e anexo (schemas antigos).
    fn to_record_reduced(&self) -> Record {
        let mut rec = self.to_record_full();
        for key in [
            "reminder_enabled",
            "reminder_date",
            "reminder_time",
            "attachment_path",
            "attachment_url",
            "attachment_name",
            "attachment_type",
            "attachment_size",
        ] {
            rec.remove(key);
        }
        rec
    }

    /// Mínimo legado: "lead"/"project" em vez de lead_name/project_name.
    fn to_record_legacy(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(self.id.to_string()));
        rec.insert("title".into(), json!(self.title));
        rec.insert("type".into(), json!(self.activity_type.id()));
        rec.insert("lead".into(), json!(self.lead_name));
        rec.insert("project".into(), json!(self.project_name));
        if let Some(d) = self.due_date {
            rec.insert("due_date".into(), json!(d.format("%Y-%m-%d").to_string()));
        }
        rec.insert("completed".into(), json!(self.completed));
        rec.insert("notes".into(), json!(self.notes));
        rec
    }

    pub fn record_variants(&self) -> Vec<Record> {
        vec![self.to_record_full(), self.to_record_reduced(), self.to_record_legacy()]
    }
}

// =========================================================================
//  BUCKETS DE LEMBRETE
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReminderBucket {
    Overdue,
    DueToday,
    // Exatamente amanhã. (Uma versão antiga usava +2 dias; "amanhã" é o
    // comportamento canônico.)
    DueSoon,
    Later,
}

/// Classificação compartilhada entre o banner do dashboard e a lista de
/// atividades. Comparação de data local, sem fuso.
pub fn reminder_bucket(activity: &Activity, today: NaiveDate) -> Option<ReminderBucket> {
    if !activity.reminder_enabled || activity.completed {
        return None;
    }
    let date = activity.reminder_date?;
    let tomorrow = today + Days::new(1);
    Some(if date < today {
        ReminderBucket::Overdue
    } else if date == today {
        ReminderBucket::DueToday
    } else if date == tomorrow {
        ReminderBucket::DueSoon
    } else {
        ReminderBucket::Later
    })
}

/// Ordem de exibição: atrasado/hoje primeiro, depois "em breve", depois
/// por data e hora ascendentes.
pub fn display_rank(bucket: ReminderBucket) -> u8 {
    match bucket {
        ReminderBucket::Overdue | ReminderBucket::DueToday => 0,
        ReminderBucket::DueSoon => 1,
        ReminderBucket::Later => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity_with_reminder(date: Option<NaiveDate>, completed: bool) -> Activity {
        let mut rec = Record::new();
        rec.insert("title".into(), json!("Follow up"));
        let mut a = Activity::from_record(&rec);
        a.reminder_enabled = true;
        a.reminder_date = date;
        a.completed = completed;
        a
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn yesterday_is_overdue() {
        let a = activity_with_reminder(Some(day("2026-08-05")), false);
        assert_eq!(reminder_bucket(&a, day("2026-08-06")), Some(ReminderBucket::Overdue));
    }

    #[test]
    fn today_is_due_today() {
        let a = activity_with_reminder(Some(day("2026-08-06")), false);
        assert_eq!(reminder_bucket(&a, day("2026-08-06")), Some(ReminderBucket::DueToday));
    }

    #[test]
    fn tomorrow_is_due_soon_and_two_days_out_is_later() {
        let a = activity_with_reminder(Some(day("2026-08-07")), false);
        assert_eq!(reminder_bucket(&a, day("2026-08-06")), Some(ReminderBucket::DueSoon));

        let b = activity_with_reminder(Some(day("2026-08-08")), false);
        assert_eq!(reminder_bucket(&b, day("2026-08-06")), Some(ReminderBucket::Later));
    }

    #[test]
    fn completed_is_excluded_even_when_overdue() {
        let a = activity_with_reminder(Some(day("2026-01-01")), true);
        assert_eq!(reminder_bucket(&a, day("2026-08-06")), None);
    }

    #[test]
    fn disabled_or_dateless_is_excluded() {
        let mut a = activity_with_reminder(Some(day("2026-08-06")), false);
        a.reminder_enabled = false;
        assert_eq!(reminder_bucket(&a, day("2026-08-06")), None);

        let b = activity_with_reminder(None, false);
        assert_eq!(reminder_bucket(&b, day("2026-08-06")), None);
    }

    #[test]
    fn type_normalize_defaults_to_follow_up() {
        assert_eq!(ActivityType::normalize("Site Visit"), ActivityType::SiteVisit);
        assert_eq!(ActivityType::normalize("whatever"), ActivityType::FollowUp);
    }

    #[test]
    fn attachment_round_trips_through_record() {
        let mut rec = Record::new();
        rec.insert("id".into(), json!("e4a9c7ce-9d1f-42f5-9c2b-7a44d9a6f001"));
        rec.insert("title".into(), json!("Enviar contrato"));
        rec.insert("attachment_path".into(), json!("acts/contract.pdf"));
        rec.insert("attachment_url".into(), json!("http://localhost/storage/acts/contract.pdf"));
        rec.insert("attachment_name".into(), json!("contract.pdf"));
        rec.insert("attachment_type".into(), json!("application/pdf"));
        rec.insert("attachment_size".into(), json!(20480));

        let activity = Activity::from_record(&rec);
        let att = activity.attachment.as_ref().expect("attachment presente");
        assert_eq!(att.name, "contract.pdf");

        let echoed = Activity::from_record(&activity.to_record_full());
        assert_eq!(activity, echoed);
    }
}
