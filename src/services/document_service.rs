// src/services/document_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::document::{Document, DocumentType},
    store::writer::insert_with_fallback,
    store::{ObjectStore, Order, RecordStore},
};

const DOCUMENTS_TABLE: &str = "documents";
const DOCUMENTS_BUCKET: &str = "documents";

#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn RecordStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    pub async fn list(&self) -> Result<Vec<Document>, AppError> {
        let rows = self
            .store
            .select(DOCUMENTS_TABLE, None, Some(("created_at", Order::Desc)))
            .await?;
        Ok(rows.iter().map(Document::from_record).collect())
    }

    /// Documento apontando para uma URL externa (nada entra no storage).
    pub async fn create_external(
        &self,
        name: &str,
        type_raw: Option<&str>,
        project: &str,
        description: &str,
        url: &str,
    ) -> Result<Document, AppError> {
        let document = Document {
            id: Uuid::new_v4(),
            name: name.to_string(),
            doc_type: DocumentType::normalize(type_raw.unwrap_or("")),
            project: project.to_string(),
            description: description.to_string(),
            path: String::new(),
            file_name: String::new(),
            mime_type: String::new(),
            size: 0,
            url: url.to_string(),
            created_at: Some(Utc::now()),
        };
        let saved =
            insert_with_fallback(self.store.as_ref(), DOCUMENTS_TABLE, &document.record_variants())
                .await?;
        Ok(Document::from_record(&saved))
    }

    /// Documento com arquivo: upload primeiro, linha no banco depois.
    /// Escrita falhou => o objeto recém-subido é apagado (best-effort).
    #[allow(clippy::too_many_arguments)]
    pub async fn create_upload(
        &self,
        name: &str,
        type_raw: Option<&str>,
        project: &str,
        description: &str,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Document, AppError> {
        let id = Uuid::new_v4();
        let size = bytes.len() as i64;
        let key = format!("{id}/{file_name}");

        self.objects.upload(DOCUMENTS_BUCKET, &key, bytes).await?;
        let url = self.objects.public_url(DOCUMENTS_BUCKET, &key);

        let document = Document {
            id,
            name: name.to_string(),
            doc_type: DocumentType::normalize(type_raw.unwrap_or("")),
            project: project.to_string(),
            description: description.to_string(),
            path: key.clone(),
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            size,
            url,
            created_at: Some(Utc::now()),
        };

        match insert_with_fallback(self.store.as_ref(), DOCUMENTS_TABLE, &document.record_variants())
            .await
        {
            Ok(saved) => Ok(Document::from_record(&saved)),
            Err(err) => {
                if let Err(cleanup) = self.objects.remove(DOCUMENTS_BUCKET, &[key]).await {
                    tracing::warn!(%cleanup, "falha ao limpar objeto órfão de documento");
                }
                Err(err.into())
            }
        }
    }

    /// Remove o documento, limpando o objeto do storage antes quando
    /// houver um.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let rows = self
            .store
            .select(DOCUMENTS_TABLE, Some(("id", json!(id.to_string()))), None)
            .await?;
        let document = rows
            .first()
            .map(Document::from_record)
            .ok_or(AppError::RecordNotFound("Documento"))?;

        if document.is_stored_object() {
            if let Err(err) = self.objects.remove(DOCUMENTS_BUCKET, &[document.path.clone()]).await {
                tracing::warn!(%err, "falha ao remover objeto antes de excluir o documento");
            }
        }
        self.store.delete(DOCUMENTS_TABLE, &id.to_string()).await?;
        Ok(())
    }
}
