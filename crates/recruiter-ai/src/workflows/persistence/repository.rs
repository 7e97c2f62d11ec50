use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::kv::KeyValueStore;
use super::{
    PersistenceError, ACTIVE_VACANCY_KEY, RECRUITER_LINKS_KEY, VACANCIES_KEY, VOICE_ENABLED_KEY,
};
use crate::workflows::vacancy::domain::{RecruiterId, Vacancy, VacancyId, VacancyStage};

/// Link a recruiter saved for quick access (job boards, sourcing searches).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLink {
    pub title: String,
    pub url: String,
}

/// Auxiliary per-recruiter state persisted next to the vacancy list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecruiterPreferences {
    pub active_vacancy: BTreeMap<RecruiterId, VacancyId>,
    pub saved_links: BTreeMap<RecruiterId, Vec<SavedLink>>,
    pub voice_enabled: bool,
}

impl RecruiterPreferences {
    pub fn set_active_vacancy(&mut self, recruiter: RecruiterId, vacancy: VacancyId) {
        self.active_vacancy.insert(recruiter, vacancy);
    }

    pub fn clear_active_vacancy(&mut self, recruiter: &RecruiterId) {
        self.active_vacancy.remove(recruiter);
    }

    /// The active vacancy, ignoring pointers to vacancies that no longer exist.
    pub fn active_vacancy_for<'a>(
        &self,
        recruiter: &RecruiterId,
        vacancies: &'a [Vacancy],
    ) -> Option<&'a Vacancy> {
        let id = self.active_vacancy.get(recruiter)?;
        vacancies.iter().find(|vacancy| &vacancy.id == id)
    }

    /// Save a link; saving the same url again only retitles it.
    pub fn add_link(&mut self, recruiter: RecruiterId, link: SavedLink) {
        let links = self.saved_links.entry(recruiter).or_default();
        match links.iter_mut().find(|existing| existing.url == link.url) {
            Some(existing) => existing.title = link.title,
            None => links.push(link),
        }
    }

    pub fn remove_link(&mut self, recruiter: &RecruiterId, url: &str) {
        if let Some(links) = self.saved_links.get_mut(recruiter) {
            links.retain(|link| link.url != url);
            if links.is_empty() {
                self.saved_links.remove(recruiter);
            }
        }
    }

    pub fn links_for(&self, recruiter: &RecruiterId) -> &[SavedLink] {
        self.saved_links
            .get(recruiter)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Reads and writes the workspace snapshot under fixed keys.
#[derive(Clone)]
pub struct WorkspaceRepository {
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for WorkspaceRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceRepository").finish_non_exhaustive()
    }
}

impl WorkspaceRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the stored vacancy list, upgrading records written by older builds.
    pub fn load_vacancies(&self) -> Result<Vec<Vacancy>, PersistenceError> {
        let Some(raw) = self.store.get(VACANCIES_KEY)? else {
            return Ok(Vec::new());
        };

        let mut records: Vec<Value> =
            serde_json::from_str(&raw).map_err(|source| PersistenceError::Corrupt {
                key: VACANCIES_KEY.to_string(),
                source,
            })?;

        let migrated = records
            .iter_mut()
            .map(migrate)
            .filter(|touched| *touched)
            .count();
        if migrated > 0 {
            info!(migrated, "upgraded stored vacancies to the current layout");
        }

        records
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Vacancy>, _>>()
            .map_err(|source| PersistenceError::Corrupt {
                key: VACANCIES_KEY.to_string(),
                source,
            })
    }

    pub fn save_vacancies(&self, vacancies: &[Vacancy]) -> Result<(), PersistenceError> {
        self.write(VACANCIES_KEY, vacancies)
    }

    pub fn load_preferences(&self) -> Result<RecruiterPreferences, PersistenceError> {
        Ok(RecruiterPreferences {
            active_vacancy: self.read(ACTIVE_VACANCY_KEY)?.unwrap_or_default(),
            saved_links: self.read(RECRUITER_LINKS_KEY)?.unwrap_or_default(),
            voice_enabled: self.read(VOICE_ENABLED_KEY)?.unwrap_or_default(),
        })
    }

    pub fn save_preferences(&self, preferences: &RecruiterPreferences) -> Result<(), PersistenceError> {
        self.write(ACTIVE_VACANCY_KEY, &preferences.active_vacancy)?;
        self.write(RECRUITER_LINKS_KEY, &preferences.saved_links)?;
        self.write(VOICE_ENABLED_KEY, &preferences.voice_enabled)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| PersistenceError::Corrupt {
                key: key.to_string(),
                source,
            })
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(value).map_err(|source| PersistenceError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, raw)
    }
}

/// Default a missing stage to Sourcing and a missing resume list to empty.
/// Returns whether the record was touched.
fn migrate(record: &mut Value) -> bool {
    let Some(fields) = record.as_object_mut() else {
        return false;
    };

    let mut touched = false;
    if fields.get("stage").map_or(true, Value::is_null) {
        fields.insert(
            "stage".to_string(),
            Value::String(VacancyStage::Sourcing.label().to_string()),
        );
        touched = true;
    }
    if fields.get("resumes").map_or(true, Value::is_null) {
        fields.insert("resumes".to_string(), Value::Array(Vec::new()));
        touched = true;
    }
    touched
}
