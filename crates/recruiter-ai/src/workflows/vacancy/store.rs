use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::clock::{SystemClock, VacancyClock};
use super::domain::{
    AnalysisState, CandidateResume, DocumentRef, RecruiterId, ResumeAnalysis, ResumeId, Vacancy,
    VacancyDraft, VacancyId, VacancyStage,
};
use super::reducer::{self, AnalysisTicket, VacancyAction};

/// Hook notified with the full list after every dispatch that changed it.
pub trait StoreObserver: Send {
    fn on_change(&mut self, vacancies: &[Vacancy]);
}

/// Authoritative in-memory vacancy list. Owned by a single controller; every
/// mutation goes through [`VacancyStore::dispatch`].
pub struct VacancyStore {
    vacancies: Vec<Vacancy>,
    clock: Box<dyn VacancyClock>,
    observers: Vec<Box<dyn StoreObserver>>,
}

impl fmt::Debug for VacancyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VacancyStore")
            .field("vacancies", &self.vacancies.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Default for VacancyStore {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl VacancyStore {
    pub fn new<C>(clock: C) -> Self
    where
        C: VacancyClock + 'static,
    {
        Self {
            vacancies: Vec::new(),
            clock: Box::new(clock),
            observers: Vec::new(),
        }
    }

    /// Seed the store without notifying observers (used right after loading).
    pub fn with_vacancies(mut self, vacancies: Vec<Vacancy>) -> Self {
        self.vacancies = vacancies;
        self
    }

    pub fn subscribe<O>(&mut self, observer: O)
    where
        O: StoreObserver + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn dispatch(&mut self, action: VacancyAction) -> &[Vacancy] {
        let name = action.name();
        let current = std::mem::take(&mut self.vacancies);
        let next = reducer::reduce(current.clone(), action, self.clock.as_ref());
        self.commit(name, current, next);
        &self.vacancies
    }

    /// Add-or-update returning the entry that now holds the draft.
    pub fn upsert(&mut self, draft: VacancyDraft) -> Option<Vacancy> {
        let current = std::mem::take(&mut self.vacancies);
        let mut next = current.clone();
        let id = reducer::upsert(&mut next, draft, self.clock.as_ref());
        self.commit("upsert", current, next);
        self.get(&id).cloned()
    }

    /// Attach a new resume with a freshly minted id.
    pub fn attach_resume(
        &mut self,
        vacancy_id: &VacancyId,
        file_name: impl Into<String>,
        document: DocumentRef,
    ) -> Option<CandidateResume> {
        self.get(vacancy_id)?;

        let resume = CandidateResume {
            id: self.clock.next_resume_id(),
            file_name: file_name.into(),
            document,
            analysis: AnalysisState::NotStarted,
            revision: 0,
        };
        let resume_id = resume.id.clone();
        self.dispatch(VacancyAction::AttachResume {
            vacancy_id: vacancy_id.clone(),
            resume,
        });

        self.get(vacancy_id)
            .and_then(|vacancy| vacancy.resume(&resume_id))
            .cloned()
    }

    /// Mark a resume as loading and hand back the ticket the result must present.
    pub fn begin_analysis(
        &mut self,
        vacancy_id: &VacancyId,
        resume_id: &ResumeId,
    ) -> Option<AnalysisTicket> {
        self.dispatch(VacancyAction::BeginAnalysis {
            vacancy_id: vacancy_id.clone(),
            resume_id: resume_id.clone(),
        });

        let resume = self.get(vacancy_id)?.resume(resume_id)?;
        Some(AnalysisTicket {
            vacancy_id: vacancy_id.clone(),
            resume_id: resume_id.clone(),
            revision: resume.revision,
        })
    }

    /// Apply an analysis outcome; returns false when the ticket is stale.
    pub fn resolve_analysis(
        &mut self,
        ticket: AnalysisTicket,
        outcome: Result<ResumeAnalysis, String>,
    ) -> bool {
        let accepted = self
            .get(&ticket.vacancy_id)
            .and_then(|vacancy| vacancy.resume(&ticket.resume_id))
            .is_some_and(|resume| {
                resume.revision == ticket.revision && resume.analysis.is_loading()
            });

        if accepted {
            self.dispatch(VacancyAction::ResolveAnalysis { ticket, outcome });
        } else {
            debug!(
                vacancy_id = %ticket.vacancy_id,
                resume_id = %ticket.resume_id,
                revision = ticket.revision,
                "dropping stale analysis result"
            );
        }
        accepted
    }

    pub fn vacancies(&self) -> &[Vacancy] {
        &self.vacancies
    }

    pub fn get(&self, id: &VacancyId) -> Option<&Vacancy> {
        self.vacancies.iter().find(|vacancy| &vacancy.id == id)
    }

    pub fn by_stage(&self, stage: VacancyStage) -> Vec<&Vacancy> {
        self.vacancies
            .iter()
            .filter(|vacancy| vacancy.stage == stage)
            .collect()
    }

    pub fn assigned_to(&self, recruiter: &RecruiterId) -> Vec<&Vacancy> {
        self.vacancies
            .iter()
            .filter(|vacancy| vacancy.assigned_recruiter.as_ref() == Some(recruiter))
            .collect()
    }

    /// Count per stage, every stage present even when empty.
    pub fn stage_counts(&self) -> BTreeMap<VacancyStage, usize> {
        let mut counts: BTreeMap<VacancyStage, usize> = VacancyStage::ordered()
            .into_iter()
            .map(|stage| (stage, 0))
            .collect();
        for vacancy in &self.vacancies {
            *counts.entry(vacancy.stage).or_default() += 1;
        }
        counts
    }

    fn commit(&mut self, action: &'static str, previous: Vec<Vacancy>, next: Vec<Vacancy>) {
        let changed = previous != next;
        self.vacancies = next;
        debug!(action, changed, total = self.vacancies.len(), "vacancy action applied");

        if changed {
            for observer in &mut self.observers {
                observer.on_change(&self.vacancies);
            }
        }
    }
}
