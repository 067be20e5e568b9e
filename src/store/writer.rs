// src/store/writer.rs
//
// O writer de fallback de schema. O backend não garante que a tabela
// tenha todas as colunas do shape mais rico, então cada write recebe uma
// lista ordenada de variantes de payload (da mais rica à mínima) e
// degrada variante a variante enquanto o erro for da classe "coluna não
// existe". Qualquer outro erro (permissão, rede, constraint) aborta na
// hora, sem tentar as variantes seguintes.

use super::{Record, RecordStore, StoreError};

enum WriteOp<'a> {
    Insert,
    Update(&'a str),
}

async fn write_with_fallback(
    store: &dyn RecordStore,
    table: &str,
    op: WriteOp<'_>,
    variants: &[Record],
) -> Result<Record, StoreError> {
    let total = variants.len();
    let mut last_err: Option<StoreError> = None;

    for (attempt, variant) in variants.iter().enumerate() {
        let result = match &op {
            WriteOp::Insert => store.insert(table, variant.clone()).await,
            WriteOp::Update(id) => store.update(table, id, variant.clone()).await,
        };

        match result {
            Ok(record) => {
                if attempt > 0 {
                    tracing::warn!(
                        table,
                        attempt = attempt + 1,
                        "write aceito com payload degradado"
                    );
                }
                return Ok(record);
            }
            Err(err) if err.is_missing_column() && attempt + 1 < total => {
                tracing::warn!(
                    table,
                    attempt = attempt + 1,
                    error = %err,
                    "coluna ausente, tentando a próxima variante de payload"
                );
                last_err = Some(err);
            }
            // Erro que não é de schema, ou a última variante também
            // falhou: devolve como está.
            Err(err) => return Err(err),
        }
    }

    Err(last_err.unwrap_or_else(|| StoreError::new("no payload variants provided")))
}

pub async fn insert_with_fallback(
    store: &dyn RecordStore,
    table: &str,
    variants: &[Record],
) -> Result<Record, StoreError> {
    write_with_fallback(store, table, WriteOp::Insert, variants).await
}

pub async fn update_with_fallback(
    store: &dyn RecordStore,
    table: &str,
    id: &str,
    variants: &[Record],
) -> Result<Record, StoreError> {
    write_with_fallback(store, table, WriteOp::Update(id), variants).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::{Value, json};

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    // A tabela só tem as colunas do shape mínimo: as duas primeiras
    // variantes falham com "coluna não existe" e a terceira entra.
    #[tokio::test]
    async fn degrades_through_variants_until_one_fits() {
        let store = MemoryStore::new().with_table("leads", &["id", "name"]);
        let variants = vec![
            record(&[("id", json!("a")), ("name", json!("Jane")), ("country", json!("BR"))]),
            record(&[("id", json!("a")), ("name", json!("Jane")), ("budget", json!("$130K"))]),
            record(&[("id", json!("a")), ("name", json!("Jane"))]),
        ];

        let saved = insert_with_fallback(&store, "leads", &variants).await.unwrap();
        assert_eq!(saved.get("name"), Some(&json!("Jane")));
        assert!(saved.get("country").is_none());

        // Só a terceira variante foi persistida.
        let rows = store.select("leads", None, None).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn non_schema_error_aborts_immediately() {
        let store = MemoryStore::new().with_table("leads", &["id", "name"]);
        store.fail_next_write("permission denied for table leads");

        let variants = vec![
            record(&[("id", json!("a")), ("name", json!("Jane"))]),
            // Esta variante entraria se o writer (errado) re-tentasse:
            record(&[("id", json!("a"))]),
        ];
        let err = insert_with_fallback(&store, "leads", &variants).await.unwrap_err();
        assert_eq!(err.message, "permission denied for table leads");

        // Nada foi persistido: a segunda variante nunca foi tentada.
        let rows = store.select("leads", None, None).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn exhausting_all_variants_returns_the_last_failure() {
        let store = MemoryStore::new().with_table("leads", &["id"]);
        let variants = vec![
            record(&[("id", json!("a")), ("country", json!("BR"))]),
            record(&[("id", json!("a")), ("budget", json!("$1M"))]),
        ];

        let err = insert_with_fallback(&store, "leads", &variants).await.unwrap_err();
        assert!(err.is_missing_column());
        assert!(err.message.contains("budget"));
    }

    #[tokio::test]
    async fn missing_relation_is_not_retried() {
        let store = MemoryStore::new();
        let variants = vec![
            record(&[("id", json!("a"))]),
            record(&[("id", json!("a"))]),
        ];
        let err = insert_with_fallback(&store, "leads", &variants).await.unwrap_err();
        assert!(err.is_missing_relation());
    }

    #[tokio::test]
    async fn update_fallback_works_the_same_way() {
        let store = MemoryStore::new().with_table("leads", &["id", "stage"]);
        store
            .insert("leads", record(&[("id", json!("a")), ("stage", json!("new"))]))
            .await
            .unwrap();

        let variants = vec![
            record(&[("stage", json!("qualified")), ("closed_at", json!("2026-08-06T10:00:00+00:00"))]),
            record(&[("stage", json!("qualified"))]),
        ];
        let echoed = update_with_fallback(&store, "leads", "a", &variants).await.unwrap();
        assert_eq!(echoed.get("stage"), Some(&json!("qualified")));
    }
}
