// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::fields;
use crate::store::Record;

// Representa o operador autenticado, vindo do record store.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: fields::uuid(record, &["id"]),
            email: fields::text(record, &["email"]),
            password_hash: fields::text(record, &["password_hash", "passwordHash", "hashed_password"]),
            created_at: fields::datetime(record, &["created_at", "createdAt"]),
        }
    }

    pub fn to_record(&self) -> Record {
        let mut rec = Record::new();
        rec.insert("id".into(), json!(self.id.to_string()));
        rec.insert("email".into(), json!(self.email));
        rec.insert("password_hash".into(), json!(self.password_hash));
        if let Some(dt) = self.created_at {
            rec.insert("created_at".into(), json!(dt.to_rfc3339()));
        }
        rec
    }
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
