// src/store/postgres.rs
//
// Implementação Postgres do RecordStore. O SQL é montado dinamicamente a
// partir das chaves do record: o schema da tabela não é conhecido em
// tempo de compilação (é exatamente essa incerteza que o writer de
// fallback absorve), então nada aqui usa as macros checadas do sqlx.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column, Postgres, QueryBuilder, Row, TypeInfo};
use uuid::Uuid;

use super::{Order, Record, RecordStore, StoreError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Identificadores (tabelas/colunas) entram no SQL por interpolação, então
// só passam nomes simples: letras, dígitos e underscore.
fn ident(name: &str) -> Result<&str, StoreError> {
    let valid = !name.is_empty()
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(StoreError::new(format!("invalid identifier: {name}")))
    }
}

// Os valores chegam como JSON frouxo; o bind escolhe o tipo Postgres por
// heurística. Strings com cara de uuid/timestamp/data viram o tipo
// nativo para casarem com colunas uuid/timestamptz/date.
fn push_bind_json(qb: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value {
        // NULL sem tipo: atribuível a qualquer coluna.
        Value::Null => {
            qb.push("NULL");
        }
        Value::Bool(b) => {
            qb.push_bind(*b);
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                qb.push_bind(i);
            } else {
                qb.push_bind(n.as_f64().unwrap_or(0.0));
            }
        }
        Value::String(s) => {
            if let Ok(u) = Uuid::parse_str(s) {
                qb.push_bind(u);
            } else if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                qb.push_bind(dt.with_timezone(&Utc));
            } else if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                qb.push_bind(d);
            } else {
                qb.push_bind(s.clone());
            }
        }
        // Arrays e objetos vão como jsonb.
        other => {
            qb.push_bind(other.clone());
        }
    }
}

// Decodifica uma linha de volta para JSON, coluna a coluna, pelo nome do
// tipo. Tipos que não reconhecemos degradam para string (ou null).
fn row_to_record(row: &PgRow) -> Record {
    let mut rec = Record::new();
    for (i, column) in row.columns().iter().enumerate() {
        let name = column.name().to_string();
        let type_name = column.type_info().name();
        let value = match type_name {
            "BOOL" => row.try_get::<Option<bool>, _>(i).ok().flatten().map(Value::from),
            "INT2" => row
                .try_get::<Option<i16>, _>(i)
                .ok()
                .flatten()
                .map(|v| Value::from(v as i64)),
            "INT4" => row
                .try_get::<Option<i32>, _>(i)
                .ok()
                .flatten()
                .map(|v| Value::from(v as i64)),
            "INT8" => row.try_get::<Option<i64>, _>(i).ok().flatten().map(Value::from),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(i)
                .ok()
                .flatten()
                .map(|v| Value::from(v as f64)),
            "FLOAT8" => row.try_get::<Option<f64>, _>(i).ok().flatten().map(Value::from),
            "NUMERIC" => row
                .try_get::<Option<Decimal>, _>(i)
                .ok()
                .flatten()
                .and_then(|d| d.to_f64())
                .map(Value::from),
            "UUID" => row
                .try_get::<Option<Uuid>, _>(i)
                .ok()
                .flatten()
                .map(|u| Value::from(u.to_string())),
            "TIMESTAMPTZ" => row
                .try_get::<Option<DateTime<Utc>>, _>(i)
                .ok()
                .flatten()
                .map(|dt| Value::from(dt.to_rfc3339())),
            "DATE" => row
                .try_get::<Option<NaiveDate>, _>(i)
                .ok()
                .flatten()
                .map(|d| Value::from(d.format("%Y-%m-%d").to_string())),
            "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(i).ok().flatten(),
            _ => row.try_get::<Option<String>, _>(i).ok().flatten().map(Value::from),
        };
        rec.insert(name, value.unwrap_or(Value::Null));
    }
    rec
}

#[async_trait::async_trait]
impl RecordStore for PgStore {
    async fn select(
        &self,
        table: &str,
        filter: Option<(&str, Value)>,
        order: Option<(&str, Order)>,
    ) -> Result<Vec<Record>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        qb.push(ident(table)?);
        if let Some((column, value)) = &filter {
            qb.push(" WHERE ");
            qb.push(ident(column)?);
            qb.push(" = ");
            push_bind_json(&mut qb, value);
        }
        if let Some((column, direction)) = &order {
            qb.push(" ORDER BY ");
            qb.push(ident(column)?);
            qb.push(match direction {
                Order::Asc => " ASC",
                Order::Desc => " DESC",
            });
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn insert(&self, table: &str, record: Record) -> Result<Record, StoreError> {
        if record.is_empty() {
            return Err(StoreError::new("empty record"));
        }
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
        qb.push(ident(table)?);
        qb.push(" (");
        for (i, key) in record.keys().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(ident(key)?);
        }
        qb.push(") VALUES (");
        for (i, value) in record.values().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_bind_json(&mut qb, value);
        }
        qb.push(") RETURNING *");

        let row = qb.build().fetch_one(&self.pool).await?;
        Ok(row_to_record(&row))
    }

    async fn update(&self, table: &str, id: &str, changes: Record) -> Result<Record, StoreError> {
        if changes.is_empty() {
            return Err(StoreError::new("empty record"));
        }
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
        qb.push(ident(table)?);
        qb.push(" SET ");
        for (i, (key, value)) in changes.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(ident(key)?);
            qb.push(" = ");
            push_bind_json(&mut qb, value);
        }
        qb.push(" WHERE id = ");
        push_bind_json(&mut qb, &Value::from(id));
        qb.push(" RETURNING *");

        let row = qb.build().fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Ok(row_to_record(&row)),
            None => Err(StoreError::new(format!("record {id} not found in {table}"))),
        }
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM ");
        qb.push(ident(table)?);
        qb.push(" WHERE id = ");
        push_bind_json(&mut qb, &Value::from(id));

        qb.build().execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_rejects_injection() {
        assert!(ident("leads").is_ok());
        assert!(ident("lead_name").is_ok());
        assert!(ident("leads; DROP TABLE leads").is_err());
        assert!(ident("").is_err());
        assert!(ident("1abc").is_err());
    }
}
