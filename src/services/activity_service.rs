// src/services/activity_service.rs

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::activity::{Activity, ActivityType, Attachment},
    models::dashboard::{ReminderOverview, build_reminder_overview},
    models::lead::Priority,
    store::writer::{insert_with_fallback, update_with_fallback},
    store::{ObjectStore, Order, Record, RecordStore},
};

const ACTIVITIES_TABLE: &str = "activities";
const ATTACHMENTS_BUCKET: &str = "activity-attachments";

#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn RecordStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    pub async fn list(&self) -> Result<Vec<Activity>, AppError> {
        let rows = self
            .store
            .select(ACTIVITIES_TABLE, None, Some(("due_date", Order::Asc)))
            .await?;
        Ok(rows.iter().map(Activity::from_record).collect())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        title: &str,
        type_raw: Option<&str>,
        lead_name: &str,
        project_name: &str,
        contact: &str,
        location: &str,
        due_date: Option<NaiveDate>,
        priority_raw: Option<&str>,
        notes: &str,
        reminder_enabled: bool,
        reminder_date: Option<NaiveDate>,
        reminder_time: &str,
    ) -> Result<Activity, AppError> {
        let activity = Activity {
            id: Uuid::new_v4(),
            title: title.to_string(),
            activity_type: ActivityType::normalize(type_raw.unwrap_or("")),
            lead_name: lead_name.to_string(),
            project_name: project_name.to_string(),
            contact: contact.to_string(),
            location: location.to_string(),
            due_date,
            priority: Priority::normalize(priority_raw.unwrap_or("")),
            completed: false,
            notes: notes.to_string(),
            reminder_enabled,
            reminder_date,
            reminder_time: reminder_time.to_string(),
            attachment: None,
            created_at: Some(Utc::now()),
        };

        let saved =
            insert_with_fallback(self.store.as_ref(), ACTIVITIES_TABLE, &activity.record_variants())
                .await?;
        Ok(Activity::from_record(&saved))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        title: &str,
        type_raw: Option<&str>,
        lead_name: &str,
        project_name: &str,
        contact: &str,
        location: &str,
        due_date: Option<NaiveDate>,
        priority_raw: Option<&str>,
        notes: &str,
        reminder_enabled: bool,
        reminder_date: Option<NaiveDate>,
        reminder_time: &str,
    ) -> Result<Activity, AppError> {
        let mut updated = self.find(id).await?;
        updated.title = title.to_string();
        if let Some(raw) = type_raw {
            updated.activity_type = ActivityType::normalize(raw);
        }
        updated.lead_name = lead_name.to_string();
        updated.project_name = project_name.to_string();
        updated.contact = contact.to_string();
        updated.location = location.to_string();
        updated.due_date = due_date;
        if let Some(raw) = priority_raw {
            updated.priority = Priority::normalize(raw);
        }
        updated.notes = notes.to_string();
        updated.reminder_enabled = reminder_enabled;
        updated.reminder_date = reminder_date;
        updated.reminder_time = reminder_time.to_string();

        let saved = update_with_fallback(
            self.store.as_ref(),
            ACTIVITIES_TABLE,
            &id.to_string(),
            &updated.record_variants(),
        )
        .await?;
        Ok(Activity::from_record(&saved))
    }

    /// Marca/desmarca como concluída. O cliente aplica o toggle
    /// otimista; um erro aqui faz o checkbox voltar lá.
    pub async fn toggle_completed(&self, id: Uuid) -> Result<Activity, AppError> {
        let current = self.find(id).await?;
        let mut changes = Record::new();
        changes.insert("completed".into(), json!(!current.completed));

        let saved = update_with_fallback(
            self.store.as_ref(),
            ACTIVITIES_TABLE,
            &id.to_string(),
            &[changes],
        )
        .await?;
        Ok(Activity::from_record(&saved))
    }

    /// Anexa um arquivo: upload primeiro, escrita no banco depois. Se a
    /// escrita falhar, o objeto recém-subido é apagado (best-effort)
    /// para não deixar lixo órfão no storage.
    pub async fn attach_file(
        &self,
        id: Uuid,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Activity, AppError> {
        self.find(id).await?;

        let size = bytes.len() as i64;
        let key = format!("{id}/{file_name}");
        self.objects.upload(ATTACHMENTS_BUCKET, &key, bytes).await?;
        let url = self.objects.public_url(ATTACHMENTS_BUCKET, &key);

        let attachment = Attachment {
            path: key.clone(),
            url,
            name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            size,
        };
        let mut changes = Record::new();
        changes.insert("attachment_path".into(), json!(attachment.path));
        changes.insert("attachment_url".into(), json!(attachment.url));
        changes.insert("attachment_name".into(), json!(attachment.name));
        changes.insert("attachment_type".into(), json!(attachment.mime_type));
        changes.insert("attachment_size".into(), json!(attachment.size));

        match update_with_fallback(self.store.as_ref(), ACTIVITIES_TABLE, &id.to_string(), &[changes])
            .await
        {
            Ok(saved) => Ok(Activity::from_record(&saved)),
            Err(err) => {
                // Compensação: apaga o objeto órfão. A falha DELA não
                // sobe: um erro por vez no banner.
                if let Err(cleanup) = self.objects.remove(ATTACHMENTS_BUCKET, &[key]).await {
                    tracing::warn!(%cleanup, "falha ao limpar anexo órfão");
                }
                Err(err.into())
            }
        }
    }

    /// Remove a atividade, tentando limpar o anexo antes.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let activity = self.find(id).await?;
        if let Some(att) = &activity.attachment {
            if !att.path.is_empty() {
                if let Err(err) = self.objects.remove(ATTACHMENTS_BUCKET, &[att.path.clone()]).await {
                    tracing::warn!(%err, "falha ao remover anexo antes de excluir a atividade");
                }
            }
        }
        self.store.delete(ACTIVITIES_TABLE, &id.to_string()).await?;
        Ok(())
    }

    /// Lembretes bucketizados: a MESMA classificação que o dashboard
    /// usa (ver models/dashboard.rs).
    pub async fn reminders(&self) -> Result<ReminderOverview, AppError> {
        let activities = self.list().await?;
        Ok(build_reminder_overview(&activities, Utc::now().date_naive()))
    }

    async fn find(&self, id: Uuid) -> Result<Activity, AppError> {
        let rows = self
            .store
            .select(ACTIVITIES_TABLE, Some(("id", json!(id.to_string()))), None)
            .await?;
        rows.first()
            .map(Activity::from_record)
            .ok_or(AppError::RecordNotFound("Atividade"))
    }
}
