//! Vacancy board: the pure reducer, the store controller that owns the list,
//! and the service and HTTP surface on top of them.

mod clock;
pub mod domain;
pub mod import;
pub mod reducer;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use clock::{SequenceClock, SystemClock, VacancyClock};
pub use domain::{
    AnalysisState, CandidateResume, DocumentRef, ParseLabelError, RecruiterId, ResumeAnalysis,
    ResumeId, Vacancy, VacancyDraft, VacancyId, VacancyPriority, VacancyStage,
};
pub use import::{ImportError, VacancyCsvImporter};
pub use reducer::{reduce, AnalysisTicket, DetailsUpdate, VacancyAction, VacancyTransform};
pub use router::vacancy_router;
pub use service::{UpsertOutcome, VacancyFilter, VacancyService, VacancyServiceError};
pub use store::{StoreObserver, VacancyStore};
