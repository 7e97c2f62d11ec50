//! Whole-snapshot persistence of the vacancy list and recruiter preferences.

pub mod kv;
pub mod repository;
pub mod writer;

pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use repository::{RecruiterPreferences, SavedLink, WorkspaceRepository};
pub use writer::{spawn_debounced_writer, DebouncedWriter, SnapshotWriter};

pub const VACANCIES_KEY: &str = "vacancies";
pub const ACTIVE_VACANCY_KEY: &str = "recruiter_active_vacancy";
pub const RECRUITER_LINKS_KEY: &str = "recruiter_links";
pub const VOICE_ENABLED_KEY: &str = "voice_enabled";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage io failure for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("stored value under '{key}' is not valid: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
