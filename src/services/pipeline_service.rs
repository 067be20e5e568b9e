// src/services/pipeline_service.rs

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::activity::Activity,
    models::lead::{BoardColumn, Lead, Priority, Stage},
    store::writer::{insert_with_fallback, update_with_fallback},
    store::{Order, Record, RecordStore},
};

const LEADS_TABLE: &str = "leads";
const ACTIVITIES_TABLE: &str = "activities";

// O controller do board. Mantém a lista de leads em memória (cache
// transitório, sempre refetchável) e é o único lugar que mexe nela: as
// trocas de estágio são otimistas, com rollback se o backend recusar.
#[derive(Clone)]
pub struct PipelineService {
    store: Arc<dyn RecordStore>,
    board: Arc<RwLock<Vec<Lead>>>,
}

impl PipelineService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, board: Arc::new(RwLock::new(Vec::new())) }
    }

    // =========================================================================
    //  LEITURA / BOARD
    // =========================================================================

    /// Recarrega o cache a partir do backend.
    pub async fn refresh(&self) -> Result<Vec<Lead>, AppError> {
        let rows = self
            .store
            .select(LEADS_TABLE, None, Some(("created_at", Order::Desc)))
            .await?;
        let leads: Vec<Lead> = rows.iter().map(Lead::from_record).collect();
        *self.board.write().await = leads.clone();
        Ok(leads)
    }

    /// As colunas do board, na ordem fixa dos estágios (lost incluído).
    pub async fn board(&self) -> Result<Vec<BoardColumn>, AppError> {
        let leads = self.refresh().await?;
        Ok(Stage::ALL
            .iter()
            .map(|&stage| BoardColumn {
                stage,
                label: stage.label().to_string(),
                leads: leads.iter().filter(|l| l.stage == stage).cloned().collect(),
            })
            .collect())
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_lead(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        stage_raw: Option<&str>,
        priority_raw: Option<&str>,
        source: &str,
        budget: Value,
        interested_project: &str,
        notes: &str,
        last_contact_date: Option<NaiveDate>,
        country: &str,
        investment_type: &str,
    ) -> Result<Lead, AppError> {
        let stage = Stage::normalize(stage_raw.unwrap_or(""));
        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            stage,
            priority: Priority::normalize(priority_raw.unwrap_or("")),
            source: source.to_string(),
            budget,
            interested_project: interested_project.to_string(),
            notes: notes.to_string(),
            last_contact_date,
            country: country.to_string(),
            investment_type: investment_type.to_string(),
            created_at: Some(now),
            closed_at: stage.is_terminal().then_some(now),
        };

        let saved = insert_with_fallback(self.store.as_ref(), LEADS_TABLE, &lead.record_variants()).await?;
        let fresh = Lead::from_record(&saved);
        self.board.write().await.push(fresh.clone());
        Ok(fresh)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_lead(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
        phone: &str,
        stage_raw: Option<&str>,
        priority_raw: Option<&str>,
        source: &str,
        budget: Value,
        interested_project: &str,
        notes: &str,
        last_contact_date: Option<NaiveDate>,
        country: &str,
        investment_type: &str,
    ) -> Result<Lead, AppError> {
        let current = self.find_lead(id).await?;

        let mut updated = current.clone();
        updated.name = name.to_string();
        updated.email = email.to_string();
        updated.phone = phone.to_string();
        if let Some(raw) = stage_raw {
            updated.stage = Stage::normalize(raw);
        }
        if let Some(raw) = priority_raw {
            updated.priority = Priority::normalize(raw);
        }
        updated.source = source.to_string();
        updated.budget = budget;
        updated.interested_project = interested_project.to_string();
        updated.notes = notes.to_string();
        updated.last_contact_date = last_contact_date;
        updated.country = country.to_string();
        updated.investment_type = investment_type.to_string();
        if updated.stage.is_terminal() {
            updated.closed_at = updated.closed_at.or_else(|| Some(Utc::now()));
        } else {
            updated.closed_at = None;
        }

        let saved = update_with_fallback(
            self.store.as_ref(),
            LEADS_TABLE,
            &id.to_string(),
            &updated.record_variants(),
        )
        .await?;
        let fresh = Lead::from_record(&saved);
        self.replace_in_cache(&fresh).await;

        // Vínculo textual: atividades apontam para o lead pelo nome.
        if !current.name.eq_ignore_ascii_case(&fresh.name) {
            self.propagate_lead_rename(&current.name, &fresh.name).await;
        }

        Ok(fresh)
    }

    pub async fn delete_lead(&self, id: Uuid) -> Result<(), AppError> {
        self.store.delete(LEADS_TABLE, &id.to_string()).await?;
        self.board.write().await.retain(|l| l.id != id);
        Ok(())
    }

    /// O movimento de drag-and-drop: aplica o novo estágio no estado
    /// local ANTES de confirmar no backend, e desfaz se a escrita
    /// falhar. A linha ecoada no sucesso vira a fonte de verdade.
    pub async fn move_lead_to_stage(&self, id: Uuid, target: Stage) -> Result<Lead, AppError> {
        let prior = self.find_lead(id).await?;
        if prior.stage == target {
            return Ok(prior);
        }

        // 1. Otimista: o card já muda de coluna.
        let mut moved = prior.clone();
        moved.stage = target;
        moved.closed_at = if target.is_terminal() {
            moved.closed_at.or_else(|| Some(Utc::now()))
        } else {
            None
        };
        self.replace_in_cache(&moved).await;

        // 2. Confirma no backend.
        match update_with_fallback(
            self.store.as_ref(),
            LEADS_TABLE,
            &id.to_string(),
            &moved.stage_change_variants(),
        )
        .await
        {
            Ok(row) => {
                let fresh = Lead::from_record(&row);
                self.replace_in_cache(&fresh).await;
                Ok(fresh)
            }
            Err(err) => {
                // 3. Rollback: o card volta para a coluna anterior e a
                // mensagem do backend sobe para o banner.
                self.replace_in_cache(&prior).await;
                Err(err.into())
            }
        }
    }

    // =========================================================================
    //  HELPERS
    // =========================================================================

    async fn find_lead(&self, id: Uuid) -> Result<Lead, AppError> {
        if let Some(lead) = self.board.read().await.iter().find(|l| l.id == id).cloned() {
            return Ok(lead);
        }
        // Cache frio (ex.: processo reiniciado): busca direto e semeia.
        let rows = self
            .store
            .select(LEADS_TABLE, Some(("id", json!(id.to_string()))), None)
            .await?;
        let lead = rows
            .first()
            .map(Lead::from_record)
            .ok_or(AppError::RecordNotFound("Lead"))?;
        self.board.write().await.push(lead.clone());
        Ok(lead)
    }

    async fn replace_in_cache(&self, lead: &Lead) {
        let mut board = self.board.write().await;
        match board.iter_mut().find(|l| l.id == lead.id) {
            Some(slot) => *slot = lead.clone(),
            None => board.push(lead.clone()),
        }
    }

    /// Patch em massa best-effort das atividades que referenciam o nome
    /// antigo. Falhas individuais são logadas e engolidas: o rename do
    /// lead em si já foi persistido.
    async fn propagate_lead_rename(&self, old_name: &str, new_name: &str) {
        if old_name.trim().is_empty() {
            return;
        }
        let rows = match self.store.select(ACTIVITIES_TABLE, None, None).await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(%err, "não foi possível listar atividades para propagar o rename");
                return;
            }
        };

        for row in &rows {
            let activity = Activity::from_record(row);
            if !activity.lead_name.eq_ignore_ascii_case(old_name) {
                continue;
            }
            let mut canonical = Record::new();
            canonical.insert("lead_name".into(), json!(new_name));
            let mut legacy = Record::new();
            legacy.insert("lead".into(), json!(new_name));

            if let Err(err) = update_with_fallback(
                self.store.as_ref(),
                ACTIVITIES_TABLE,
                &activity.id.to_string(),
                &[canonical, legacy],
            )
            .await
            {
                tracing::warn!(activity_id = %activity.id, %err, "falha ao propagar rename de lead");
            }
        }
    }
}
