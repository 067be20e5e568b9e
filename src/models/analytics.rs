// src/models/analytics.rs

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Janela de tempo selecionada na página de analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    ThisWeek,
    ThisMonth,
    ThisQuarter,
    #[default]
    AllTime,
}

impl TimeRange {
    /// Primeiro dia da janela; `None` = sem corte (all time).
    pub fn start(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            TimeRange::ThisWeek => {
                let back = today.weekday().num_days_from_monday() as i64;
                Some(today - chrono::Duration::days(back))
            }
            TimeRange::ThisMonth => today.with_day(1),
            TimeRange::ThisQuarter => {
                let quarter_month = (today.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(today.year(), quarter_month, 1)
            }
            TimeRange::AllTime => None,
        }
    }
}

// Um degrau do funil. `drop_off` é o percentual perdido em relação ao
// degrau anterior; `None` quando o anterior está zerado (o cliente
// mostra "—").
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStage {
    pub id: String,
    pub label: String,
    pub count: usize,
    pub drop_off: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
    pub won: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// "2026-03"
    pub month: String,
    /// "Mar"
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub range: TimeRange,

    pub total_leads: usize,
    pub won_leads: usize,
    pub lost_leads: usize,

    // Percentuais 0..100, sempre 0 com denominador zerado (nunca NaN).
    pub conversion_rate: f64,
    pub win_rate: f64,

    pub average_deal_size: f64,
    // Dias inteiros; None quando nenhum lead terminal tem as duas datas.
    pub average_days_to_close: Option<i64>,

    pub funnel: Vec<FunnelStage>,
    pub sources: Vec<SourceCount>,
    pub best_source: Option<String>,
    pub monthly_trend: Vec<TrendPoint>,
    pub insights: Vec<String>,
}
