use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;
use tracing::{error, info, warn};

use super::domain::{
    CandidateResume, DocumentRef, RecruiterId, ResumeId, Vacancy, VacancyDraft, VacancyId,
    VacancyPriority, VacancyStage,
};
use super::reducer::{DetailsUpdate, VacancyAction};
use super::store::VacancyStore;
use crate::workflows::assistant::{
    AssistantError, ChatTurn, GenerativeModel, InterviewAnalysis, RecruiterAssistant,
};
use crate::workflows::persistence::{RecruiterPreferences, SavedLink, WorkspaceRepository};

#[derive(Debug, thiserror::Error)]
pub enum VacancyServiceError {
    #[error("vacancy '{0}' not found")]
    VacancyNotFound(VacancyId),
    #[error("resume '{resume_id}' not found on vacancy '{vacancy_id}'")]
    ResumeNotFound {
        vacancy_id: VacancyId,
        resume_id: ResumeId,
    },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Assistant(#[from] AssistantError),
    #[error("workspace state lock poisoned")]
    Poisoned,
}

/// Optional filters for listing vacancies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VacancyFilter {
    #[serde(default)]
    pub stage: Option<VacancyStage>,
    #[serde(default)]
    pub recruiter: Option<RecruiterId>,
}

impl VacancyFilter {
    fn matches(&self, vacancy: &Vacancy) -> bool {
        self.stage.map_or(true, |stage| vacancy.stage == stage)
            && self
                .recruiter
                .as_ref()
                .map_or(true, |recruiter| vacancy.assigned_recruiter.as_ref() == Some(recruiter))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub vacancy: Vacancy,
    pub created: bool,
}

/// Shared entry point for the HTTP layer: the store behind one mutex, the
/// assistant, and the recruiter preferences.
pub struct VacancyService<M> {
    store: Arc<Mutex<VacancyStore>>,
    assistant: RecruiterAssistant<M>,
    repository: WorkspaceRepository,
    preferences: Mutex<RecruiterPreferences>,
}

impl<M> VacancyService<M>
where
    M: GenerativeModel,
{
    pub fn new(
        store: VacancyStore,
        assistant: RecruiterAssistant<M>,
        repository: WorkspaceRepository,
        preferences: RecruiterPreferences,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            assistant,
            repository,
            preferences: Mutex::new(preferences),
        }
    }

    /// Handle to the underlying store, e.g. for shutdown or tests.
    pub fn store(&self) -> Arc<Mutex<VacancyStore>> {
        Arc::clone(&self.store)
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, VacancyStore>, VacancyServiceError> {
        self.store.lock().map_err(|_| VacancyServiceError::Poisoned)
    }

    fn lock_preferences(
        &self,
    ) -> Result<MutexGuard<'_, RecruiterPreferences>, VacancyServiceError> {
        self.preferences
            .lock()
            .map_err(|_| VacancyServiceError::Poisoned)
    }

    pub fn list(&self, filter: &VacancyFilter) -> Result<Vec<Vacancy>, VacancyServiceError> {
        let store = self.lock_store()?;
        Ok(store
            .vacancies()
            .iter()
            .filter(|vacancy| filter.matches(vacancy))
            .cloned()
            .collect())
    }

    pub fn get(&self, id: &VacancyId) -> Result<Vacancy, VacancyServiceError> {
        let store = self.lock_store()?;
        store
            .get(id)
            .cloned()
            .ok_or_else(|| VacancyServiceError::VacancyNotFound(id.clone()))
    }

    pub fn stage_counts(&self) -> Result<BTreeMap<VacancyStage, usize>, VacancyServiceError> {
        Ok(self.lock_store()?.stage_counts())
    }

    pub fn upsert(&self, draft: VacancyDraft) -> Result<UpsertOutcome, VacancyServiceError> {
        let mut store = self.lock_store()?;
        let created = draft
            .id
            .as_ref()
            .map_or(true, |id| store.get(id).is_none());
        let vacancy = store
            .upsert(draft)
            .ok_or_else(|| VacancyServiceError::InvalidRequest("draft was not stored".into()))?;
        Ok(UpsertOutcome { vacancy, created })
    }

    pub fn delete(&self, id: &VacancyId) -> Result<(), VacancyServiceError> {
        self.lock_store()?.dispatch(VacancyAction::Delete(id.clone()));
        Ok(())
    }

    pub fn change_stage(
        &self,
        id: &VacancyId,
        stage: VacancyStage,
    ) -> Result<Vacancy, VacancyServiceError> {
        self.apply(
            id,
            VacancyAction::ChangeStage {
                id: id.clone(),
                stage,
            },
        )
    }

    pub fn change_priority(
        &self,
        id: &VacancyId,
        priority: VacancyPriority,
    ) -> Result<Vacancy, VacancyServiceError> {
        self.apply(
            id,
            VacancyAction::ChangePriority {
                id: id.clone(),
                priority,
            },
        )
    }

    pub fn assign_recruiter(
        &self,
        id: &VacancyId,
        recruiter: Option<RecruiterId>,
    ) -> Result<Vacancy, VacancyServiceError> {
        self.apply(
            id,
            VacancyAction::AssignRecruiter {
                id: id.clone(),
                recruiter,
            },
        )
    }

    pub fn update_details(
        &self,
        id: &VacancyId,
        update: DetailsUpdate,
    ) -> Result<Vacancy, VacancyServiceError> {
        self.apply(
            id,
            VacancyAction::UpdateDetails {
                id: id.clone(),
                update,
            },
        )
    }

    /// Dispatch, then report a missing vacancy; the store itself stays silent.
    fn apply(&self, id: &VacancyId, action: VacancyAction) -> Result<Vacancy, VacancyServiceError> {
        let mut store = self.lock_store()?;
        store.dispatch(action);
        store
            .get(id)
            .cloned()
            .ok_or_else(|| VacancyServiceError::VacancyNotFound(id.clone()))
    }

    pub fn attach_resume(
        &self,
        vacancy_id: &VacancyId,
        file_name: String,
        document: DocumentRef,
    ) -> Result<CandidateResume, VacancyServiceError> {
        let mut store = self.lock_store()?;
        store
            .attach_resume(vacancy_id, file_name, document)
            .ok_or_else(|| VacancyServiceError::VacancyNotFound(vacancy_id.clone()))
    }

    pub fn remove_resume(
        &self,
        vacancy_id: &VacancyId,
        resume_id: &ResumeId,
    ) -> Result<(), VacancyServiceError> {
        self.lock_store()?.dispatch(VacancyAction::RemoveResume {
            vacancy_id: vacancy_id.clone(),
            resume_id: resume_id.clone(),
        });
        Ok(())
    }

    /// Run the resume analysis outside the store lock. The outcome, success or
    /// failure, is recorded on the resume unless a newer analysis superseded it.
    pub async fn analyze_resume(
        &self,
        vacancy_id: &VacancyId,
        resume_id: &ResumeId,
    ) -> Result<CandidateResume, VacancyServiceError> {
        let resume_missing = || VacancyServiceError::ResumeNotFound {
            vacancy_id: vacancy_id.clone(),
            resume_id: resume_id.clone(),
        };

        let (vacancy, resume, ticket) = {
            let mut store = self.lock_store()?;
            let vacancy = store
                .get(vacancy_id)
                .cloned()
                .ok_or_else(|| VacancyServiceError::VacancyNotFound(vacancy_id.clone()))?;
            let resume = vacancy.resume(resume_id).cloned().ok_or_else(resume_missing)?;
            let ticket = store
                .begin_analysis(vacancy_id, resume_id)
                .ok_or_else(resume_missing)?;
            (vacancy, resume, ticket)
        };

        let outcome = self
            .assistant
            .analyze_resume(&vacancy, &resume)
            .await
            .map_err(|err| {
                warn!(
                    vacancy_id = %vacancy_id,
                    resume_id = %resume_id,
                    error = %err,
                    "resume analysis failed"
                );
                err.user_message()
            });

        let mut store = self.lock_store()?;
        store.resolve_analysis(ticket, outcome);
        store
            .get(vacancy_id)
            .and_then(|vacancy| vacancy.resume(resume_id))
            .cloned()
            .ok_or_else(resume_missing)
    }

    pub async fn analyze_interview(
        &self,
        vacancy_id: Option<&VacancyId>,
        transcript: &str,
    ) -> Result<InterviewAnalysis, VacancyServiceError> {
        if transcript.trim().is_empty() {
            return Err(VacancyServiceError::InvalidRequest(
                "transcript is empty".to_string(),
            ));
        }
        let vacancy = vacancy_id.map(|id| self.get(id)).transpose()?;
        let analysis = self
            .assistant
            .analyze_interview(vacancy.as_ref(), transcript)
            .await?;
        Ok(analysis)
    }

    pub async fn chat(&self, turns: Vec<ChatTurn>) -> Result<String, VacancyServiceError> {
        if turns.is_empty() {
            return Err(VacancyServiceError::InvalidRequest(
                "at least one message is required".to_string(),
            ));
        }
        Ok(self.assistant.chat(turns).await?)
    }

    pub fn active_vacancy(
        &self,
        recruiter: &RecruiterId,
    ) -> Result<Option<Vacancy>, VacancyServiceError> {
        let preferences = self.lock_preferences()?;
        let store = self.lock_store()?;
        Ok(preferences
            .active_vacancy_for(recruiter, store.vacancies())
            .cloned())
    }

    pub fn set_active_vacancy(
        &self,
        recruiter: RecruiterId,
        vacancy_id: VacancyId,
    ) -> Result<Vacancy, VacancyServiceError> {
        let vacancy = self.get(&vacancy_id)?;
        self.update_preferences(|preferences| {
            preferences.set_active_vacancy(recruiter, vacancy_id);
        })?;
        Ok(vacancy)
    }

    pub fn clear_active_vacancy(&self, recruiter: &RecruiterId) -> Result<(), VacancyServiceError> {
        self.update_preferences(|preferences| preferences.clear_active_vacancy(recruiter))
    }

    pub fn links(&self, recruiter: &RecruiterId) -> Result<Vec<SavedLink>, VacancyServiceError> {
        Ok(self.lock_preferences()?.links_for(recruiter).to_vec())
    }

    pub fn add_link(
        &self,
        recruiter: RecruiterId,
        link: SavedLink,
    ) -> Result<Vec<SavedLink>, VacancyServiceError> {
        if link.url.trim().is_empty() {
            return Err(VacancyServiceError::InvalidRequest(
                "link url is empty".to_string(),
            ));
        }
        let key = recruiter.clone();
        self.update_preferences(|preferences| preferences.add_link(recruiter, link))?;
        self.links(&key)
    }

    pub fn remove_link(&self, recruiter: &RecruiterId, url: &str) -> Result<(), VacancyServiceError> {
        self.update_preferences(|preferences| preferences.remove_link(recruiter, url))
    }

    pub fn voice_enabled(&self) -> Result<bool, VacancyServiceError> {
        Ok(self.lock_preferences()?.voice_enabled)
    }

    pub fn set_voice_enabled(&self, enabled: bool) -> Result<bool, VacancyServiceError> {
        self.update_preferences(|preferences| preferences.voice_enabled = enabled)?;
        info!(enabled, "voice assistant toggled");
        Ok(enabled)
    }

    /// Mutate preferences and save them. A failed save is logged; the change
    /// stays in memory and is retried with the next save.
    fn update_preferences<F>(&self, change: F) -> Result<(), VacancyServiceError>
    where
        F: FnOnce(&mut RecruiterPreferences),
    {
        let mut preferences = self.lock_preferences()?;
        change(&mut preferences);
        if let Err(err) = self.repository.save_preferences(&preferences) {
            error!(error = %err, "failed to save recruiter preferences");
        }
        Ok(())
    }
}
