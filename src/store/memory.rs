// src/store/memory.rs
//
// RecordStore em memória, com conjuntos de colunas declarados por
// tabela. Produz as MESMAS mensagens de erro do Postgres para coluna e
// tabela ausentes. É isso que a suíte de testes usa para exercitar o
// writer de fallback sem banco. Também serve de backend de demonstração
// (STORE_BACKEND=memory).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde_json::Value;

use super::{Order, Record, RecordStore, StoreError};

struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    // Falha injetada para o próximo write (testes de rollback).
    fail_next: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            fail_next: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_table(self, name: &str, columns: &[&str]) -> Self {
        {
            let mut tables = self.tables.write().expect("memory store lock");
            tables.insert(
                name.to_string(),
                Table { columns: columns.iter().map(|c| c.to_string()).collect(), rows: Vec::new() },
            );
        }
        self
    }

    /// O schema canônico completo do CRM (ver migrations/).
    pub fn seeded() -> Self {
        MemoryStore::new()
            .with_table("users", &["id", "email", "password_hash", "created_at"])
            .with_table("leads", &[
                "id", "name", "email", "phone", "stage", "priority", "source", "budget",
                "interested_project", "notes", "last_contact_date", "country",
                "investment_type", "created_at", "closed_at",
            ])
            .with_table("activities", &[
                "id", "title", "type", "lead_name", "project_name", "contact", "location",
                "due_date", "priority", "completed", "notes", "reminder_enabled",
                "reminder_date", "reminder_time", "attachment_path", "attachment_url",
                "attachment_name", "attachment_type", "attachment_size", "created_at",
            ])
            .with_table("projects", &[
                "id", "slug", "name", "location", "region", "status", "description",
                "price_per_unit", "roi_min", "roi_max", "build_size", "pool_size",
                "lease_years", "total_units", "units", "milestones", "payment_structure",
                "created_at",
            ])
            .with_table("documents", &[
                "id", "name", "type", "project", "description", "path", "file_name",
                "mime_type", "size", "url", "created_at",
            ])
            .with_table("suppliers", &[
                "id", "name", "category", "subcategory", "contact", "phone", "email",
                "rating", "active_orders", "total_orders", "payment_terms", "notes",
                "created_at",
            ])
    }

    /// Faz o PRÓXIMO insert/update/delete falhar com a mensagem dada.
    /// Só os testes chamam isso.
    pub fn fail_next_write(&self, message: &str) {
        *self.fail_next.lock().expect("memory store lock") = Some(message.to_string());
    }

    fn take_injected_failure(&self) -> Option<StoreError> {
        self.fail_next.lock().expect("memory store lock").take().map(StoreError::new)
    }

    fn check_columns(table_name: &str, table: &Table, record: &Record) -> Result<(), StoreError> {
        for key in record.keys() {
            if !table.columns.iter().any(|c| c == key) {
                return Err(StoreError::new(format!(
                    "column \"{key}\" of relation \"{table_name}\" does not exist"
                )));
            }
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_relation(table: &str) -> StoreError {
    StoreError::new(format!("relation \"{table}\" does not exist"))
}

fn row_id(row: &Record) -> Option<&str> {
    row.get("id").and_then(|v| v.as_str())
}

// Ordenação leniente: números por valor, o resto pela forma textual.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal),
        (Some(x), Some(y)) => {
            let xs = x.as_str().map(str::to_string).unwrap_or_else(|| x.to_string());
            let ys = y.as_str().map(str::to_string).unwrap_or_else(|| y.to_string());
            xs.cmp(&ys)
        }
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn select(
        &self,
        table: &str,
        filter: Option<(&str, Value)>,
        order: Option<(&str, Order)>,
    ) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read().expect("memory store lock");
        let t = tables.get(table).ok_or_else(|| missing_relation(table))?;

        let mut rows: Vec<Record> = t
            .rows
            .iter()
            .filter(|row| match &filter {
                Some((column, value)) => row.get(*column) == Some(value),
                None => true,
            })
            .cloned()
            .collect();

        if let Some((column, direction)) = order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(column), b.get(column));
                match direction {
                    Order::Asc => ord,
                    Order::Desc => ord.reverse(),
                }
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, record: Record) -> Result<Record, StoreError> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        let mut tables = self.tables.write().expect("memory store lock");
        let t = tables.get_mut(table).ok_or_else(|| missing_relation(table))?;
        Self::check_columns(table, t, &record)?;
        t.rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, table: &str, id: &str, changes: Record) -> Result<Record, StoreError> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        let mut tables = self.tables.write().expect("memory store lock");
        let t = tables.get_mut(table).ok_or_else(|| missing_relation(table))?;
        Self::check_columns(table, t, &changes)?;

        let row = t
            .rows
            .iter_mut()
            .find(|row| row_id(row) == Some(id))
            .ok_or_else(|| StoreError::new(format!("record {id} not found in {table}")))?;
        for (key, value) in changes {
            row.insert(key, value);
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        let mut tables = self.tables.write().expect("memory store lock");
        let t = tables.get_mut(table).ok_or_else(|| missing_relation(table))?;
        t.rows.retain(|row| row_id(row) != Some(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn insert_into_missing_table_reports_missing_relation() {
        let store = MemoryStore::new();
        let err = store.insert("ghosts", record(&[("id", json!("1"))])).await.unwrap_err();
        assert!(err.is_missing_relation());
    }

    #[tokio::test]
    async fn unknown_column_uses_postgres_wording() {
        let store = MemoryStore::new().with_table("leads", &["id", "name"]);
        let err = store
            .insert("leads", record(&[("id", json!("1")), ("stage", json!("new"))]))
            .await
            .unwrap_err();
        assert!(err.is_missing_column());
        assert!(err.message.contains("\"stage\""));
        assert!(err.message.contains("\"leads\""));
    }

    #[tokio::test]
    async fn select_filters_and_orders() {
        let store = MemoryStore::new().with_table("leads", &["id", "stage", "created_at"]);
        for (id, stage, at) in [
            ("a", "new", "2026-01-02T00:00:00+00:00"),
            ("b", "won", "2026-01-03T00:00:00+00:00"),
            ("c", "new", "2026-01-01T00:00:00+00:00"),
        ] {
            store
                .insert(
                    "leads",
                    record(&[("id", json!(id)), ("stage", json!(stage)), ("created_at", json!(at))]),
                )
                .await
                .unwrap();
        }

        let news = store
            .select("leads", Some(("stage", json!("new"))), Some(("created_at", Order::Desc)))
            .await
            .unwrap();
        assert_eq!(news.len(), 2);
        assert_eq!(row_id(&news[0]), Some("a"));
        assert_eq!(row_id(&news[1]), Some("c"));
    }

    #[tokio::test]
    async fn update_merges_changes_and_echoes_row() {
        let store = MemoryStore::new().with_table("leads", &["id", "name", "stage"]);
        store
            .insert("leads", record(&[("id", json!("a")), ("name", json!("Jane")), ("stage", json!("new"))]))
            .await
            .unwrap();

        let echoed = store
            .update("leads", "a", record(&[("stage", json!("qualified"))]))
            .await
            .unwrap();
        assert_eq!(echoed.get("stage"), Some(&json!("qualified")));
        assert_eq!(echoed.get("name"), Some(&json!("Jane")));
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let store = MemoryStore::new().with_table("leads", &["id"]);
        store.fail_next_write("permission denied for table leads");

        let err = store.insert("leads", record(&[("id", json!("a"))])).await.unwrap_err();
        assert_eq!(err.message, "permission denied for table leads");

        // A falha é consumida: o write seguinte passa.
        store.insert("leads", record(&[("id", json!("a"))])).await.unwrap();
    }
}
