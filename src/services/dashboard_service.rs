// src/services/dashboard_service.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    common::error::AppError,
    models::activity::{Activity, ReminderBucket},
    models::dashboard::{DashboardSummary, build_reminder_overview},
    models::lead::Lead,
    store::RecordStore,
};

const LEADS_TABLE: &str = "leads";
const ACTIVITIES_TABLE: &str = "activities";

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn RecordStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn summary(&self) -> Result<DashboardSummary, AppError> {
        // Fetches independentes, disparados juntos; cada resultado é
        // aplicado por si só, sem invariante entre os dois.
        let (leads_rows, activities_rows) = tokio::join!(
            self.store.select(LEADS_TABLE, None, None),
            self.store.select(ACTIVITIES_TABLE, None, None),
        );
        let leads: Vec<Lead> = leads_rows?.iter().map(Lead::from_record).collect();
        let activities: Vec<Activity> =
            activities_rows?.iter().map(Activity::from_record).collect();

        let today = Utc::now().date_naive();

        let overview = build_reminder_overview(&activities, today);
        let overdue = overview
            .attention
            .iter()
            .filter(|e| e.bucket == ReminderBucket::Overdue)
            .count();

        let mut recent = leads.clone();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(5);

        Ok(DashboardSummary {
            total_leads: leads.len(),
            active_leads: leads.iter().filter(|l| !l.stage.is_terminal()).count(),
            won_leads: leads.iter().filter(|l| l.stage == crate::models::lead::Stage::Won).count(),
            activities_due_today: activities
                .iter()
                .filter(|a| !a.completed && a.due_date == Some(today))
                .count(),
            overdue_reminders: overdue,
            reminders: overview.attention,
            recent_leads: recent,
        })
    }
}
