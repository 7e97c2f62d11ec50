use chrono::{Local, NaiveDate, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

use super::domain::{ResumeId, VacancyId};

/// Source of fresh identifiers and of "today" for new vacancies.
pub trait VacancyClock: Send + Sync {
    fn next_vacancy_id(&self) -> VacancyId;
    fn next_resume_id(&self) -> ResumeId;
    fn today(&self) -> NaiveDate;
}

/// Wall-clock identifiers: millisecond timestamp plus a process-wide sequence so
/// two ids minted in the same millisecond still differ.
#[derive(Debug, Default)]
pub struct SystemClock;

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn time_based_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let sequence = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{millis}-{sequence:04}")
}

impl VacancyClock for SystemClock {
    fn next_vacancy_id(&self) -> VacancyId {
        VacancyId(time_based_id("vac"))
    }

    fn next_resume_id(&self) -> ResumeId {
        ResumeId(time_based_id("res"))
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Deterministic clock for demos and tests: sequential ids, a pinned date.
#[derive(Debug)]
pub struct SequenceClock {
    today: NaiveDate,
    next: AtomicU64,
}

impl SequenceClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            next: AtomicU64::new(1),
        }
    }
}

impl VacancyClock for SequenceClock {
    fn next_vacancy_id(&self) -> VacancyId {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        VacancyId(format!("vac-{id:03}"))
    }

    fn next_resume_id(&self) -> ResumeId {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        ResumeId(format!("res-{id:03}"))
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_ids_are_unique_within_a_millisecond() {
        let clock = SystemClock;
        let first = clock.next_vacancy_id();
        let second = clock.next_vacancy_id();
        assert_ne!(first, second);
        assert!(first.0.starts_with("vac-"));
    }

    #[test]
    fn sequence_clock_is_deterministic() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date");
        let clock = SequenceClock::new(today);
        assert_eq!(clock.next_vacancy_id(), VacancyId("vac-001".to_string()));
        assert_eq!(clock.next_resume_id(), ResumeId("res-002".to_string()));
        assert_eq!(clock.today(), today);
    }
}
