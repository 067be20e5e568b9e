// src/models/document.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::fields;
use crate::store::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Marketing,
    Design,
    Financial,
    Contract,
    Legal,
    Permit,
    Other,
}

impl DocumentType {
    pub fn id(self) -> &'static str {
        match self {
            DocumentType::Marketing => "marketing",
            DocumentType::Design => "design",
            DocumentType::Financial => "financial",
            DocumentType::Contract => "contract",
            DocumentType::Legal => "legal",
            DocumentType::Permit => "permit",
            DocumentType::Other => "other",
        }
    }

    pub fn normalize(raw: &str) -> DocumentType {
        match raw.trim().to_lowercase().as_str() {
            "marketing" => DocumentType::Marketing,
            "design" => DocumentType::Design,
            "financial" | "finance" => DocumentType::Financial,
            "contract" => DocumentType::Contract,
            "legal" => DocumentType::Legal,
            "permit" | "license" => DocumentType::Permit,
            _ => DocumentType::Other,
        }
    }
}

// Um documento referencia OU um objeto no storage (path preenchido) OU
// uma URL externa. Nunca os dois.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub project: String,
    pub description: String,

    pub path: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: i64,
    pub url: String,

    pub created_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn from_record(record: &Record) -> Self {
        let type_raw = fields::text(record, &["type", "doc_type", "docType", "document_type"]);
        Self {
            id: fields::uuid(record, &["id"]),
            name: fields::text(record, &["name", "title"]),
            doc_type: DocumentType::normalize(&type_raw),
            project: fields::text(record, &["project", "project_name", "projectName"]),
            description: fields::text(record, &["description"]),
            path: fields::text(record, &["path", "storage_path", "storagePath", "file_path"]),
            file_name: fields::text(record, &["file_name", "fileName"]),
            mime_type: fields::text(record, &["mime_type", "mimeType", "content_type"]),
            size: fields::integer(record, &["size", "file_size", "fileSize"], 0),
            url: fields::text(record, &["url", "external_url", "externalUrl", "link"]),
            created_at: fields::datetime(record, &["created_at", "createdAt"]),
        }
    }

    pub fn to_record_full(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(self.id.to_string()));
        rec.insert("name".into(), json!(self.name));
        rec.insert("type".into(), json!(self.doc_type.id()));
        rec.insert("project".into(), json!(self.project));
        rec.insert("description".into(), json!(self.description));
        rec.insert("path".into(), json!(self.path));
        rec.insert("file_name".into(), json!(self.file_name));
        rec.insert("mime_type".into(), json!(self.mime_type));
        rec.insert("size".into(), json!(self.size));
        rec.insert("url".into(), json!(self.url));
        if let Some(dt) = self.created_at {
            rec.insert("created_at".into(), json!(dt.to_rfc3339()));
        }
        rec
    }

    fn to_record_legacy(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(self.id.to_string()));
        rec.insert("name".into(), json!(self.name));
        rec.insert("type".into(), json!(self.doc_type.id()));
        rec.insert("url".into(), json!(self.url));
        rec
    }

    pub fn record_variants(&self) -> Vec<Record> {
        vec![self.to_record_full(), self.to_record_legacy()]
    }

    pub fn is_stored_object(&self) -> bool {
        !self.path.is_empty()
    }
}
