// src/models/fields.rs
//
// Resolução de aliases de colunas. O backend não garante um shape único
// de linha (snake_case, camelCase, nomes legados), então todo campo é
// lido pelo primeiro alias presente. Nenhum helper aqui falha: campo
// ausente vira o valor neutro documentado no model.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::store::Record;

/// Primeiro alias presente e não-nulo.
pub fn raw<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
}

pub fn text(record: &Record, keys: &[&str]) -> String {
    match raw(record, keys) {
        Some(Value::String(s)) => s.clone(),
        // Valores não-string (número de telefone salvo como número, etc.)
        // viram a representação textual em vez de quebrar.
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

pub fn opt_text(record: &Record, keys: &[&str]) -> Option<String> {
    let value = text(record, keys);
    if value.is_empty() { None } else { Some(value) }
}

pub fn boolean(record: &Record, keys: &[&str], default: bool) -> bool {
    match raw(record, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "t" | "1"),
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        _ => default,
    }
}

pub fn integer(record: &Record, keys: &[&str], default: i64) -> i64 {
    match raw(record, keys) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

pub fn float(record: &Record, keys: &[&str], default: f64) -> f64 {
    match raw(record, keys) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

pub fn uuid(record: &Record, keys: &[&str]) -> Uuid {
    opt_text(record, keys)
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .unwrap_or(Uuid::nil())
}

/// Data de calendário, sem conversão de fuso: `YYYY-MM-DD` ou o prefixo
/// de um timestamp ISO.
pub fn date(record: &Record, keys: &[&str]) -> Option<NaiveDate> {
    let value = opt_text(record, keys)?;
    parse_date(&value)
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let prefix = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

pub fn datetime(record: &Record, keys: &[&str]) -> Option<DateTime<Utc>> {
    let value = opt_text(record, keys)?;
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    // Linhas antigas guardavam só a data.
    parse_date(trimmed).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc())
}

/// O valor bruto (para campos que aceitam texto OU número, como budget).
pub fn value(record: &Record, keys: &[&str]) -> Value {
    raw(record, keys).cloned().unwrap_or(Value::Null)
}
