//! Pure state transitions over the vacancy list.
//!
//! Every action is total: naming an id that is not in the list leaves the list
//! unchanged and reports nothing.

use std::fmt;

use super::clock::VacancyClock;
use super::domain::{
    AnalysisState, CandidateResume, RecruiterId, ResumeAnalysis, ResumeId, Vacancy, VacancyDraft,
    VacancyId, VacancyPriority, VacancyStage,
};

pub type VacancyTransform = Box<dyn FnOnce(&Vacancy) -> Vacancy + Send>;

/// Replacement applied by [`VacancyAction::UpdateDetails`].
pub enum DetailsUpdate {
    ReplaceWith(Vacancy),
    ApplyTransform(VacancyTransform),
}

impl DetailsUpdate {
    pub fn transform<F>(f: F) -> Self
    where
        F: FnOnce(&Vacancy) -> Vacancy + Send + 'static,
    {
        Self::ApplyTransform(Box::new(f))
    }

    fn apply(self, current: &Vacancy) -> Vacancy {
        match self {
            Self::ReplaceWith(vacancy) => vacancy,
            Self::ApplyTransform(transform) => transform(current),
        }
    }
}

impl fmt::Debug for DetailsUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReplaceWith(vacancy) => f.debug_tuple("ReplaceWith").field(vacancy).finish(),
            Self::ApplyTransform(_) => f.write_str("ApplyTransform(..)"),
        }
    }
}

/// Proof that an analysis was started against a specific resume revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    pub vacancy_id: VacancyId,
    pub resume_id: ResumeId,
    pub revision: u64,
}

#[derive(Debug)]
pub enum VacancyAction {
    ReplaceAll(Vec<Vacancy>),
    Upsert(VacancyDraft),
    Delete(VacancyId),
    ChangePriority {
        id: VacancyId,
        priority: VacancyPriority,
    },
    ChangeStage {
        id: VacancyId,
        stage: VacancyStage,
    },
    AssignRecruiter {
        id: VacancyId,
        recruiter: Option<RecruiterId>,
    },
    UpdateDetails {
        id: VacancyId,
        update: DetailsUpdate,
    },
    AttachResume {
        vacancy_id: VacancyId,
        resume: CandidateResume,
    },
    RemoveResume {
        vacancy_id: VacancyId,
        resume_id: ResumeId,
    },
    BeginAnalysis {
        vacancy_id: VacancyId,
        resume_id: ResumeId,
    },
    ResolveAnalysis {
        ticket: AnalysisTicket,
        outcome: Result<ResumeAnalysis, String>,
    },
}

impl VacancyAction {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReplaceAll(_) => "replace_all",
            Self::Upsert(_) => "upsert",
            Self::Delete(_) => "delete",
            Self::ChangePriority { .. } => "change_priority",
            Self::ChangeStage { .. } => "change_stage",
            Self::AssignRecruiter { .. } => "assign_recruiter",
            Self::UpdateDetails { .. } => "update_details",
            Self::AttachResume { .. } => "attach_resume",
            Self::RemoveResume { .. } => "remove_resume",
            Self::BeginAnalysis { .. } => "begin_analysis",
            Self::ResolveAnalysis { .. } => "resolve_analysis",
        }
    }
}

pub fn reduce(
    mut vacancies: Vec<Vacancy>,
    action: VacancyAction,
    clock: &dyn VacancyClock,
) -> Vec<Vacancy> {
    match action {
        VacancyAction::ReplaceAll(replacement) => return replacement,
        VacancyAction::Upsert(draft) => {
            upsert(&mut vacancies, draft, clock);
        }
        VacancyAction::Delete(id) => vacancies.retain(|vacancy| vacancy.id != id),
        VacancyAction::ChangePriority { id, priority } => {
            if let Some(vacancy) = find_mut(&mut vacancies, &id) {
                vacancy.priority = priority;
            }
        }
        VacancyAction::ChangeStage { id, stage } => {
            if let Some(vacancy) = find_mut(&mut vacancies, &id) {
                vacancy.stage = stage;
            }
        }
        VacancyAction::AssignRecruiter { id, recruiter } => {
            if let Some(vacancy) = find_mut(&mut vacancies, &id) {
                vacancy.assigned_recruiter = recruiter;
            }
        }
        VacancyAction::UpdateDetails { id, update } => {
            if let Some(vacancy) = find_mut(&mut vacancies, &id) {
                let mut next = update.apply(vacancy);
                // The slot keeps its id so the collection never gains a duplicate.
                next.id = id;
                *vacancy = next;
            }
        }
        VacancyAction::AttachResume { vacancy_id, resume } => {
            if let Some(vacancy) = find_mut(&mut vacancies, &vacancy_id) {
                attach_resume(vacancy, resume);
            }
        }
        VacancyAction::RemoveResume {
            vacancy_id,
            resume_id,
        } => {
            if let Some(vacancy) = find_mut(&mut vacancies, &vacancy_id) {
                vacancy.resumes.retain(|resume| resume.id != resume_id);
            }
        }
        VacancyAction::BeginAnalysis {
            vacancy_id,
            resume_id,
        } => {
            if let Some(resume) =
                find_mut(&mut vacancies, &vacancy_id).and_then(|v| v.resume_mut(&resume_id))
            {
                resume.revision += 1;
                resume.analysis = AnalysisState::Loading;
            }
        }
        VacancyAction::ResolveAnalysis { ticket, outcome } => {
            if let Some(resume) = find_mut(&mut vacancies, &ticket.vacancy_id)
                .and_then(|v| v.resume_mut(&ticket.resume_id))
            {
                if resume.revision == ticket.revision && resume.analysis.is_loading() {
                    resume.analysis = match outcome {
                        Ok(result) => AnalysisState::Done { result },
                        Err(error) => AnalysisState::Failed { error },
                    };
                }
            }
        }
    }

    vacancies
}

/// Merge into the entry with the draft's id, or append a new entry with a fresh
/// id. Returns the id of the entry that now holds the draft.
pub(crate) fn upsert(
    vacancies: &mut Vec<Vacancy>,
    mut draft: VacancyDraft,
    clock: &dyn VacancyClock,
) -> VacancyId {
    if let Some(id) = draft.id.take() {
        if let Some(existing) = find_mut(vacancies, &id) {
            draft.merge_into(existing);
            return id;
        }
    }

    let id = clock.next_vacancy_id();
    vacancies.push(draft.into_vacancy(id.clone(), clock.today()));
    id
}

fn attach_resume(vacancy: &mut Vacancy, mut resume: CandidateResume) {
    match vacancy.resume_mut(&resume.id) {
        Some(existing) => {
            resume.revision = existing.revision + 1;
            *existing = resume;
        }
        None => vacancy.resumes.push(resume),
    }
}

fn find_mut<'a>(vacancies: &'a mut [Vacancy], id: &VacancyId) -> Option<&'a mut Vacancy> {
    vacancies.iter_mut().find(|vacancy| &vacancy.id == id)
}
