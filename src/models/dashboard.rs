// src/models/dashboard.rs

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::activity::{Activity, ActivityType, ReminderBucket, display_rank, reminder_bucket};
use crate::models::lead::Lead;

// Uma entrada do banner de lembretes (e da lista de próximos).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEntry {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub lead_name: String,
    pub reminder_date: Option<NaiveDate>,
    pub reminder_time: String,
    pub bucket: ReminderBucket,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderOverview {
    // Atrasados / hoje / amanhã: o que pede atenção agora.
    pub attention: Vec<ReminderEntry>,
    // Tudo que tem lembrete ativo, inclusive além da janela "em breve".
    pub upcoming: Vec<ReminderEntry>,
}

/// A classificação de lembretes usada pelo banner do dashboard E pela
/// página de atividades. Uma implementação só, para as duas telas nunca
/// discordarem da janela "em breve".
pub fn build_reminder_overview(activities: &[Activity], today: NaiveDate) -> ReminderOverview {
    let mut entries: Vec<ReminderEntry> = activities
        .iter()
        .filter_map(|activity| {
            let bucket = reminder_bucket(activity, today)?;
            Some(ReminderEntry {
                id: activity.id,
                title: activity.title.clone(),
                activity_type: activity.activity_type,
                lead_name: activity.lead_name.clone(),
                reminder_date: activity.reminder_date,
                reminder_time: activity.reminder_time.clone(),
                bucket,
            })
        })
        .collect();

    // Atrasado/hoje primeiro, depois amanhã, depois data e hora.
    entries.sort_by(|a, b| {
        (display_rank(a.bucket), a.reminder_date, a.reminder_time.clone())
            .cmp(&(display_rank(b.bucket), b.reminder_date, b.reminder_time.clone()))
    });

    let attention = entries
        .iter()
        .filter(|e| e.bucket != ReminderBucket::Later)
        .cloned()
        .collect();
    ReminderOverview { attention, upcoming: entries }
}

// Os cards do topo do dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_leads: usize,
    pub active_leads: usize,
    pub won_leads: usize,
    pub activities_due_today: usize,
    pub overdue_reminders: usize,
    pub reminders: Vec<ReminderEntry>,
    pub recent_leads: Vec<Lead>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Record;
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn reminder(title: &str, date: &str, time: &str, completed: bool) -> Activity {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(uuid::Uuid::new_v4().to_string()));
        rec.insert("title".into(), json!(title));
        rec.insert("reminder_enabled".into(), json!(true));
        rec.insert("reminder_date".into(), json!(date));
        rec.insert("reminder_time".into(), json!(time));
        rec.insert("completed".into(), json!(completed));
        Activity::from_record(&rec)
    }

    #[test]
    fn overview_sorts_and_splits_attention_from_upcoming() {
        let today = day("2026-08-06");
        let activities = vec![
            reminder("depois", "2026-08-20", "09:00", false),
            reminder("amanha", "2026-08-07", "10:00", false),
            reminder("hoje tarde", "2026-08-06", "15:00", false),
            reminder("hoje cedo", "2026-08-06", "08:00", false),
            reminder("atrasado", "2026-08-01", "09:00", false),
            reminder("concluido", "2026-08-01", "09:00", true),
        ];

        let overview = build_reminder_overview(&activities, today);

        // Concluídos somem de TODAS as listas.
        assert_eq!(overview.upcoming.len(), 5);
        assert_eq!(overview.attention.len(), 4);

        let titles: Vec<&str> = overview.attention.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["atrasado", "hoje cedo", "hoje tarde", "amanha"]);
        assert_eq!(overview.upcoming.last().unwrap().title, "depois");
    }
}
