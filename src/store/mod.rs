// src/store/mod.rs

pub mod memory;
pub mod objects;
pub mod postgres;
pub mod writer;

pub use memory::MemoryStore;
pub use objects::{LocalObjectStore, ObjectStore};
pub use postgres::PgStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Uma linha "crua" do backend: um mapa JSON com tipagem frouxa.
/// Todo o resto do sistema só enxerga esse shape através dos
/// normalizadores em `models/`.
pub type Record = serde_json::Map<String, Value>;

// =========================================================================
//  ERRO DO STORE
// =========================================================================

// O contrato com o backend é uma mensagem de texto. A classificação
// abaixo é feita por pattern-matching nessa mensagem (o formato de
// referência é o do Postgres).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// `column "x" of relation "y" does not exist`: recuperável via
    /// degradação de payload (ver `writer.rs`).
    MissingColumn,
    /// `relation "y" does not exist`: a tabela em si não foi provisionada.
    MissingRelation,
    /// Qualquer outra coisa (permissão, rede, constraint). Nunca re-tentado.
    Other,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn kind(&self) -> StoreErrorKind {
        let msg = self.message.to_lowercase();
        if !msg.contains("does not exist") {
            return StoreErrorKind::Other;
        }
        // Ordem importa: a mensagem de coluna ausente também contém a
        // palavra "relation".
        if msg.contains("column") {
            StoreErrorKind::MissingColumn
        } else if msg.contains("relation") {
            StoreErrorKind::MissingRelation
        } else {
            StoreErrorKind::Other
        }
    }

    pub fn is_missing_column(&self) -> bool {
        self.kind() == StoreErrorKind::MissingColumn
    }

    pub fn is_missing_relation(&self) -> bool {
        self.kind() == StoreErrorKind::MissingRelation
    }

    /// Extrai o nome entre aspas da mensagem (`relation "activities" does
    /// not exist` -> `activities`). Usado só para montar a mensagem de
    /// "tabela não provisionada".
    pub fn quoted_name(&self) -> Option<String> {
        let start = self.message.find('"')? + 1;
        let end = start + self.message[start..].find('"')?;
        Some(self.message[start..end].to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // Preserva a mensagem original do banco quando houver: é nela que
        // a classificação acima se apoia.
        match err.as_database_error() {
            Some(db_err) => StoreError::new(db_err.message()),
            None => StoreError::new(err.to_string()),
        }
    }
}

// =========================================================================
//  O CONTRATO GENÉRICO COM O BACKEND
// =========================================================================

/// Direção de ordenação de um `select`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Lista linhas de uma tabela, com filtro opcional de igualdade e
    /// ordenação opcional por uma coluna.
    async fn select(
        &self,
        table: &str,
        filter: Option<(&str, Value)>,
        order: Option<(&str, Order)>,
    ) -> Result<Vec<Record>, StoreError>;

    /// Insere uma linha e devolve a linha ecoada pelo backend.
    async fn insert(&self, table: &str, record: Record) -> Result<Record, StoreError>;

    /// Atualiza a linha com o `id` dado e devolve a linha resultante.
    async fn update(&self, table: &str, id: &str, changes: Record) -> Result<Record, StoreError>;

    /// Remove a linha com o `id` dado.
    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_missing_column() {
        let err = StoreError::new(r#"column "reminder_date" of relation "activities" does not exist"#);
        assert_eq!(err.kind(), StoreErrorKind::MissingColumn);
        assert!(err.is_missing_column());
    }

    #[test]
    fn classifies_missing_relation() {
        let err = StoreError::new(r#"relation "suppliers" does not exist"#);
        assert_eq!(err.kind(), StoreErrorKind::MissingRelation);
        assert_eq!(err.quoted_name().as_deref(), Some("suppliers"));
    }

    #[test]
    fn anything_else_is_other() {
        for msg in [
            "permission denied for table leads",
            "connection refused",
            r#"duplicate key value violates unique constraint "leads_pkey""#,
        ] {
            assert_eq!(StoreError::new(msg).kind(), StoreErrorKind::Other);
        }
    }
}
