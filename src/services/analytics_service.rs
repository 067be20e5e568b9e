// src/services/analytics_service.rs
//
// O agregador de analytics. Tudo aqui é função pura sobre um snapshot de
// leads + a data de hoje; o service só busca o snapshot e injeta o
// relógio. Nenhum parse falha: valor inparseável degrada para 0/None e o
// cliente mostra "—".

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde_json::Value;

use crate::{
    common::error::AppError,
    models::analytics::{AnalyticsReport, FunnelStage, SourceCount, TimeRange, TrendPoint},
    models::lead::{Lead, Stage},
    store::RecordStore,
};

const LEADS_TABLE: &str = "leads";

// Quantos meses a linha do tempo mostra, sempre.
const TREND_MONTHS: u32 = 6;
// Leads ativos sem contato há mais que isso contam como "esquecidos".
const STALE_DAYS: i64 = 7;
// Fontes com pelo menos este volume têm prioridade no "melhor conversor".
const SOURCE_VOLUME_FLOOR: usize = 3;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn RecordStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn report(&self, range: TimeRange) -> Result<AnalyticsReport, AppError> {
        let rows = self.store.select(LEADS_TABLE, None, None).await?;
        let leads: Vec<Lead> = rows.iter().map(Lead::from_record).collect();
        Ok(build_report(&leads, range, Utc::now().date_naive()))
    }
}

// =========================================================================
//  RELATÓRIO
// =========================================================================

pub fn build_report(leads: &[Lead], range: TimeRange, today: NaiveDate) -> AnalyticsReport {
    let start = range.start(today);
    let in_range: Vec<&Lead> = leads
        .iter()
        .filter(|lead| match start {
            None => true,
            // Sem data de criação, fica de fora das janelas recortadas.
            Some(s) => lead.created_at.map(|c| c.date_naive() >= s).unwrap_or(false),
        })
        .collect();

    let total = in_range.len();
    let won = in_range.iter().filter(|l| l.stage == Stage::Won).count();
    let lost = in_range.iter().filter(|l| l.stage == Stage::Lost).count();

    let average_deal_size = if total == 0 {
        0.0
    } else {
        round1(in_range.iter().map(|l| parse_budget(&l.budget)).sum::<f64>() / total as f64)
    };

    let sources = source_distribution(&in_range);
    let best_source = best_converting_source(&sources);
    let funnel = build_funnel(&in_range);
    let monthly_trend = monthly_trend(leads, today);
    let insights = build_insights(leads, &in_range, &sources, best_source.as_deref(), today);

    AnalyticsReport {
        range,
        total_leads: total,
        won_leads: won,
        lost_leads: lost,
        conversion_rate: percent(won, total),
        win_rate: percent(won, won + lost),
        average_deal_size,
        average_days_to_close: average_days_to_close(&in_range),
        funnel,
        sources,
        best_source,
        monthly_trend,
        insights,
    }
}

// Percentual 0..100 com denominador guardado (0, nunca NaN).
fn percent(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        round1(numerator as f64 / denominator as f64 * 100.0)
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

// =========================================================================
//  PARSE DE BUDGET
// =========================================================================

/// Budget é texto livre OU número. Regras: números passam direto; faixas
/// "A-B" ficam com o teto; "+" final cai; K/M multiplicam (case-
/// insensitive); o resto degrada para 0.
pub fn parse_budget(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_budget_text(s),
        _ => 0.0,
    }
}

fn parse_budget_text(raw: &str) -> f64 {
    let cleaned = raw.trim().to_lowercase().replace(['$', ','], "");
    if cleaned.is_empty() {
        return 0.0;
    }
    // Faixa "100k-130k": o teto é o que interessa.
    let segment = cleaned.rsplit('-').next().unwrap_or(&cleaned);
    let segment = segment.trim().trim_end_matches('+');

    let multiplier = if segment.contains('m') {
        1_000_000.0
    } else if segment.contains('k') {
        1_000.0
    } else {
        1.0
    };

    // Primeiro token numérico do segmento.
    let mut token = String::new();
    for c in segment.chars() {
        if c.is_ascii_digit() || c == '.' {
            token.push(c);
        } else if !token.is_empty() {
            break;
        }
    }
    token.parse::<f64>().map(|n| n * multiplier).unwrap_or(0.0)
}

// =========================================================================
//  FUNIL
// =========================================================================

// A sequência do funil. "closing" legado já virou negotiating na
// normalização de estágio; "closed" agrega won+lost.
fn build_funnel(leads: &[&Lead]) -> Vec<FunnelStage> {
    let steps: [(&str, &str, usize); 7] = [
        ("new", "New Lead", count_stage(leads, Stage::New)),
        ("contacted", "Contacted", count_stage(leads, Stage::Contacted)),
        ("qualified", "Qualified", count_stage(leads, Stage::Qualified)),
        ("pdf_sent", "PDF Sent", count_stage(leads, Stage::PdfSent)),
        ("site_visit", "Site Visit", count_stage(leads, Stage::SiteVisit)),
        ("negotiating", "Negotiating", count_stage(leads, Stage::Negotiating)),
        ("closed", "Closed", count_stage(leads, Stage::Won) + count_stage(leads, Stage::Lost)),
    ];

    let mut funnel = Vec::with_capacity(steps.len());
    let mut prev: Option<usize> = None;
    for (id, label, count) in steps {
        funnel.push(FunnelStage {
            id: id.to_string(),
            label: label.to_string(),
            count,
            drop_off: prev.and_then(|p| drop_off(p, count)),
        });
        prev = Some(count);
    }
    funnel
}

fn count_stage(leads: &[&Lead], stage: Stage) -> usize {
    leads.iter().filter(|l| l.stage == stage).count()
}

/// Percentual perdido entre degraus adjacentes; indefinido quando o
/// degrau anterior está zerado.
fn drop_off(prev: usize, current: usize) -> Option<i64> {
    if prev == 0 {
        return None;
    }
    Some(((prev as f64 - current as f64) / prev as f64 * 100.0).round() as i64)
}

// =========================================================================
//  TEMPO DE FECHAMENTO
// =========================================================================

fn average_days_to_close(leads: &[&Lead]) -> Option<i64> {
    let days: Vec<i64> = leads
        .iter()
        .filter(|l| l.stage.is_terminal())
        .filter_map(|l| match (l.created_at, l.closed_at) {
            (Some(created), Some(closed)) => Some((closed - created).num_days()),
            _ => None,
        })
        .collect();
    if days.is_empty() {
        return None;
    }
    Some((days.iter().sum::<i64>() as f64 / days.len() as f64).round() as i64)
}

// =========================================================================
//  FONTES
// =========================================================================

// Distribuição na ordem de primeira aparição; fonte vazia vira "Other".
fn source_distribution(leads: &[&Lead]) -> Vec<SourceCount> {
    let mut sources: Vec<SourceCount> = Vec::new();
    for lead in leads {
        let label = if lead.source.trim().is_empty() { "Other" } else { lead.source.trim() };
        let won = lead.stage == Stage::Won;
        match sources.iter_mut().find(|s| s.source == label) {
            Some(entry) => {
                entry.count += 1;
                if won {
                    entry.won += 1;
                }
            }
            None => sources.push(SourceCount {
                source: label.to_string(),
                count: 1,
                won: usize::from(won),
            }),
        }
    }
    sources
}

/// Melhor taxa de vitória entre fontes com volume (≥3 leads); sem
/// nenhuma com volume, a melhor taxa geral; sem nenhuma vitória, None.
/// Empate fica com a fonte vista primeiro (comparação estrita).
fn best_converting_source(sources: &[SourceCount]) -> Option<String> {
    let rate = |s: &SourceCount| s.won as f64 / s.count as f64;

    let pick = |floor: usize| -> Option<&SourceCount> {
        let mut best: Option<&SourceCount> = None;
        for source in sources.iter().filter(|s| s.won > 0 && s.count >= floor) {
            if best.map(|b| rate(source) > rate(b)).unwrap_or(true) {
                best = Some(source);
            }
        }
        best
    };

    pick(SOURCE_VOLUME_FLOOR)
        .or_else(|| pick(0))
        .map(|s| s.source.clone())
}

// =========================================================================
//  LINHA DO TEMPO
// =========================================================================

// Mês `back` meses atrás de (year, month).
fn month_shift(year: i32, month: u32, back: u32) -> (i32, u32) {
    let total = year * 12 + month as i32 - 1 - back as i32;
    (total.div_euclid(12), (total.rem_euclid(12) + 1) as u32)
}

/// Sempre emite os 6 meses da janela, zerados ou não. Bucketiza pelo
/// snapshot completo, independente do range selecionado.
fn monthly_trend(leads: &[Lead], today: NaiveDate) -> Vec<TrendPoint> {
    (0..TREND_MONTHS)
        .rev()
        .map(|back| {
            let (year, month) = month_shift(today.year(), today.month(), back);
            let count = leads
                .iter()
                .filter_map(|l| l.created_at)
                .filter(|c| c.year() == year && c.month() == month)
                .count();
            TrendPoint {
                month: format!("{year:04}-{month:02}"),
                label: MONTH_LABELS[(month - 1) as usize].to_string(),
                count,
            }
        })
        .collect()
}

// =========================================================================
//  INSIGHTS
// =========================================================================

// Frases templadas, geradas independentes umas das outras e cortadas em
// 6. Nada de ranking além da ordem fixa abaixo.
fn build_insights(
    all_leads: &[Lead],
    in_range: &[&Lead],
    sources: &[SourceCount],
    best_source: Option<&str>,
    today: NaiveDate,
) -> Vec<String> {
    let mut insights = Vec::new();
    let total = in_range.len();

    // 1. Participação da maior fonte no período.
    if let Some(top) = sources.iter().max_by_key(|s| s.count) {
        if total > 0 && top.count > 0 {
            insights.push(format!(
                "{} responde por {}% dos leads do período.",
                top.source,
                percent(top.count, total).round() as i64
            ));
        }
    }

    // 2. Leads ativos esquecidos (corte de 7 dias de último contato).
    let cutoff = today - chrono::Duration::days(STALE_DAYS);
    let stale = all_leads
        .iter()
        .filter(|l| !l.stage.is_terminal())
        .filter(|l| l.last_contact_date.map(|d| d < cutoff).unwrap_or(false))
        .count();
    if stale > 0 {
        insights.push(format!(
            "{stale} leads ativos estão há mais de {STALE_DAYS} dias sem contato."
        ));
    }

    // 3. Volume deste mês contra o anterior.
    let this_month = count_created_in(all_leads, today.year(), today.month());
    let (prev_year, prev_month) = month_shift(today.year(), today.month(), 1);
    let prev = count_created_in(all_leads, prev_year, prev_month);
    if prev > 0 {
        let delta = ((this_month as f64 - prev as f64) / prev as f64 * 100.0).round() as i64;
        if delta >= 0 {
            insights.push(format!("Volume de novos leads {delta}% acima do mês anterior."));
        } else {
            insights.push(format!("Volume de novos leads {}% abaixo do mês anterior.", -delta));
        }
    }

    // 4. Fonte que melhor converte.
    if let Some(source) = best_source {
        if let Some(entry) = sources.iter().find(|s| s.source == source) {
            insights.push(format!(
                "{} é a fonte que melhor converte ({}% de taxa de vitória).",
                source,
                percent(entry.won, entry.count).round() as i64
            ));
        }
    }

    insights.truncate(6);
    insights
}

fn count_created_in(leads: &[Lead], year: i32, month: u32) -> usize {
    leads
        .iter()
        .filter_map(|l| l.created_at)
        .filter(|c| c.year() == year && c.month() == month)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lead::Priority;
    use chrono::{DateTime, TimeZone};
    use serde_json::json;
    use uuid::Uuid;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        Utc.from_utc_datetime(&day(s).and_hms_opt(12, 0, 0).unwrap())
    }

    fn lead(stage: Stage, source: &str, created: &str) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            name: "x".into(),
            email: String::new(),
            phone: String::new(),
            stage,
            priority: Priority::Medium,
            source: source.into(),
            budget: Value::Null,
            interested_project: String::new(),
            notes: String::new(),
            last_contact_date: None,
            country: String::new(),
            investment_type: String::new(),
            created_at: Some(at(created)),
            closed_at: None,
        }
    }

    // --- budget ---

    #[test]
    fn budget_parses_the_documented_shapes() {
        assert_eq!(parse_budget(&json!("$130K")), 130_000.0);
        assert_eq!(parse_budget(&json!("$100K-130K")), 130_000.0);
        assert_eq!(parse_budget(&json!("$300K+")), 300_000.0);
        assert_eq!(parse_budget(&json!("1.5m")), 1_500_000.0);
        assert_eq!(parse_budget(&json!(250_000)), 250_000.0);
        assert_eq!(parse_budget(&json!("")), 0.0);
        assert_eq!(parse_budget(&Value::Null), 0.0);
        assert_eq!(parse_budget(&json!("a combinar")), 0.0);
    }

    // --- funil ---

    #[test]
    fn drop_off_matches_the_contract() {
        // [100, 80, 0, 0] -> 20%, 100%, indefinido.
        assert_eq!(drop_off(100, 80), Some(20));
        assert_eq!(drop_off(80, 0), Some(100));
        assert_eq!(drop_off(0, 0), None);
    }

    #[test]
    fn funnel_merges_won_and_lost_into_closed() {
        let leads = vec![
            lead(Stage::New, "Website", "2026-08-01"),
            lead(Stage::Won, "Website", "2026-08-01"),
            lead(Stage::Lost, "Website", "2026-08-01"),
        ];
        let refs: Vec<&Lead> = leads.iter().collect();
        let funnel = build_funnel(&refs);
        assert_eq!(funnel.last().unwrap().id, "closed");
        assert_eq!(funnel.last().unwrap().count, 2);
        // Primeiro degrau nunca tem drop-off.
        assert_eq!(funnel[0].drop_off, None);
    }

    // --- taxas ---

    #[test]
    fn rates_are_zero_with_empty_denominator() {
        let report = build_report(&[], TimeRange::AllTime, day("2026-08-06"));
        assert_eq!(report.conversion_rate, 0.0);
        assert_eq!(report.win_rate, 0.0);
        assert_eq!(report.average_deal_size, 0.0);
        assert_eq!(report.average_days_to_close, None);
    }

    #[test]
    fn conversion_counts_won_over_total_and_win_rate_over_closed() {
        let leads = vec![
            lead(Stage::Won, "Website", "2026-08-01"),
            lead(Stage::Lost, "Website", "2026-08-01"),
            lead(Stage::New, "Website", "2026-08-02"),
            lead(Stage::New, "Website", "2026-08-03"),
        ];
        let report = build_report(&leads, TimeRange::AllTime, day("2026-08-06"));
        assert_eq!(report.conversion_rate, 25.0);
        assert_eq!(report.win_rate, 50.0);
    }

    // --- tempo de fechamento ---

    #[test]
    fn average_days_to_close_uses_only_terminal_leads_with_both_dates() {
        let mut fast = lead(Stage::Won, "Website", "2026-07-01");
        fast.closed_at = Some(at("2026-07-11")); // 10 dias
        let mut slow = lead(Stage::Lost, "Website", "2026-07-01");
        slow.closed_at = Some(at("2026-07-21")); // 20 dias
        // Terminal sem closed_at: fora da média.
        let dateless = lead(Stage::Won, "Website", "2026-07-01");
        // Não-terminal: fora.
        let open = lead(Stage::Negotiating, "Website", "2026-07-01");

        let leads = vec![fast, slow, dateless, open];
        let refs: Vec<&Lead> = leads.iter().collect();
        assert_eq!(average_days_to_close(&refs), Some(15));
    }

    // --- fontes ---

    #[test]
    fn best_source_prefers_volume_floor() {
        // Referral: 1/1 = 100% mas volume 1. Website: 2/4 = 50% com
        // volume 4, ganha por ter volume.
        let mut leads = vec![lead(Stage::Won, "Referral", "2026-08-01")];
        leads.push(lead(Stage::Won, "Website", "2026-08-01"));
        leads.push(lead(Stage::Won, "Website", "2026-08-01"));
        leads.push(lead(Stage::Lost, "Website", "2026-08-01"));
        leads.push(lead(Stage::New, "Website", "2026-08-01"));

        let refs: Vec<&Lead> = leads.iter().collect();
        let sources = source_distribution(&refs);
        assert_eq!(best_converting_source(&sources).as_deref(), Some("Website"));
    }

    #[test]
    fn best_source_falls_back_to_low_volume_and_then_none() {
        let leads = vec![
            lead(Stage::Won, "Referral", "2026-08-01"),
            lead(Stage::New, "Website", "2026-08-01"),
        ];
        let refs: Vec<&Lead> = leads.iter().collect();
        let sources = source_distribution(&refs);
        assert_eq!(best_converting_source(&sources).as_deref(), Some("Referral"));

        let cold = vec![lead(Stage::New, "Website", "2026-08-01")];
        let refs: Vec<&Lead> = cold.iter().collect();
        assert_eq!(best_converting_source(&source_distribution(&refs)), None);
    }

    #[test]
    fn empty_source_buckets_as_other() {
        let leads = vec![lead(Stage::New, "  ", "2026-08-01")];
        let refs: Vec<&Lead> = leads.iter().collect();
        let sources = source_distribution(&refs);
        assert_eq!(sources[0].source, "Other");
    }

    // --- linha do tempo ---

    #[test]
    fn trend_always_emits_six_months() {
        let leads = vec![lead(Stage::New, "Website", "2026-08-01")];
        let trend = monthly_trend(&leads, day("2026-08-06"));
        assert_eq!(trend.len(), 6);
        assert_eq!(trend[0].month, "2026-03");
        assert_eq!(trend[5].month, "2026-08");
        assert_eq!(trend[5].count, 1);
        assert!(trend[..5].iter().all(|p| p.count == 0));
    }

    #[test]
    fn trend_window_crosses_year_boundary() {
        let trend = monthly_trend(&[], day("2026-02-10"));
        assert_eq!(trend[0].month, "2025-09");
        assert_eq!(trend[0].label, "Sep");
        assert_eq!(trend[5].month, "2026-02");
    }

    // --- janelas ---

    #[test]
    fn ranges_cut_by_creation_date() {
        let leads = vec![
            lead(Stage::New, "Website", "2026-08-03"), // semana atual (qui 2026-08-06)
            lead(Stage::New, "Website", "2026-07-15"), // só no mês passado
            lead(Stage::New, "Website", "2026-01-02"), // só no all time
        ];
        let today = day("2026-08-06");

        let week = build_report(&leads, TimeRange::ThisWeek, today);
        assert_eq!(week.total_leads, 1);

        let quarter = build_report(&leads, TimeRange::ThisQuarter, today);
        assert_eq!(quarter.total_leads, 2);

        let all = build_report(&leads, TimeRange::AllTime, today);
        assert_eq!(all.total_leads, 3);
    }

    // --- insights ---

    #[test]
    fn insights_are_capped_and_cover_the_templates() {
        let mut stale = lead(Stage::Qualified, "Website", "2026-07-01");
        stale.last_contact_date = Some(day("2026-07-01"));
        let leads = vec![
            stale,
            lead(Stage::Won, "Website", "2026-08-01"),
            lead(Stage::New, "Instagram", "2026-07-20"),
        ];
        let report = build_report(&leads, TimeRange::AllTime, day("2026-08-06"));

        assert!(report.insights.len() <= 6);
        assert!(report.insights.iter().any(|i| i.contains("sem contato")));
        assert!(report.insights.iter().any(|i| i.contains("mês anterior")));
    }
}
