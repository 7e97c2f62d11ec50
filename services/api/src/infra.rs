use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use recruiter_ai::workflows::vacancy::{VacancyPriority, VacancyStage};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_stage(raw: &str) -> Result<VacancyStage, String> {
    raw.parse().map_err(|err| {
        format!(
            "{err}; expected one of {}",
            labels(VacancyStage::ordered().map(VacancyStage::label))
        )
    })
}

pub(crate) fn parse_priority(raw: &str) -> Result<VacancyPriority, String> {
    raw.parse().map_err(|err| {
        format!(
            "{err}; expected one of {}",
            labels(VacancyPriority::ordered().map(VacancyPriority::label))
        )
    })
}

fn labels<const N: usize>(labels: [&str; N]) -> String {
    labels.join(", ")
}
