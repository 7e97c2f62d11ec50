use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use super::repository::WorkspaceRepository;
use crate::workflows::vacancy::domain::Vacancy;
use crate::workflows::vacancy::store::StoreObserver;

fn persist(repository: &WorkspaceRepository, vacancies: &[Vacancy]) {
    match repository.save_vacancies(vacancies) {
        Ok(()) => debug!(total = vacancies.len(), "vacancy snapshot saved"),
        Err(err) => error!(error = %err, "failed to save vacancy snapshot"),
    }
}

/// Saves the whole list synchronously on every change.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    repository: WorkspaceRepository,
}

impl SnapshotWriter {
    pub fn new(repository: WorkspaceRepository) -> Self {
        Self { repository }
    }
}

impl StoreObserver for SnapshotWriter {
    fn on_change(&mut self, vacancies: &[Vacancy]) {
        persist(&self.repository, vacancies);
    }
}

/// Hands snapshots to a background task that saves the latest one once changes
/// have been quiet for the debounce interval, or once the oldest unsaved change
/// has waited `max_delay`, whichever comes first.
#[derive(Debug, Clone)]
pub struct DebouncedWriter {
    sender: mpsc::UnboundedSender<Vec<Vacancy>>,
}

impl StoreObserver for DebouncedWriter {
    fn on_change(&mut self, vacancies: &[Vacancy]) {
        if self.sender.send(vacancies.to_vec()).is_err() {
            warn!("snapshot writer stopped; change will not be persisted");
        }
    }
}

/// Spawn the background saver. The task drains and flushes when every
/// [`DebouncedWriter`] clone has been dropped.
pub fn spawn_debounced_writer(
    repository: WorkspaceRepository,
    quiet_period: Duration,
    max_delay: Duration,
) -> (DebouncedWriter, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Vec<Vacancy>>();

    let handle = tokio::spawn(async move {
        while let Some(mut latest) = receiver.recv().await {
            let flush_by = Instant::now() + max_delay;
            let mut closed = false;
            loop {
                let deadline = (Instant::now() + quiet_period).min(flush_by);
                match tokio::time::timeout_at(deadline, receiver.recv()).await {
                    Ok(Some(snapshot)) => latest = snapshot,
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break,
                }
            }

            persist(&repository, &latest);
            if closed {
                break;
            }
        }
    });

    (DebouncedWriter { sender }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::persistence::{KeyValueStore, MemoryKeyValueStore, VACANCIES_KEY};
    use crate::workflows::vacancy::{SequenceClock, VacancyDraft, VacancyStore};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn store_with(observer: impl StoreObserver + 'static) -> VacancyStore {
        let today = NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid date");
        let mut store = VacancyStore::new(SequenceClock::new(today));
        store.subscribe(observer);
        store
    }

    #[test]
    fn snapshot_writer_saves_every_change() {
        let kv = Arc::new(MemoryKeyValueStore::default());
        let repository = WorkspaceRepository::new(kv.clone());
        let mut store = store_with(SnapshotWriter::new(repository.clone()));

        store.upsert(VacancyDraft::titled("Platform Engineer"));
        let saved = repository.load_vacancies().expect("loads");
        assert_eq!(saved, store.vacancies());
    }

    #[test]
    fn unchanged_dispatch_does_not_write() {
        let kv = Arc::new(MemoryKeyValueStore::default());
        let repository = WorkspaceRepository::new(kv.clone());
        let mut store = store_with(SnapshotWriter::new(repository));

        store.dispatch(crate::workflows::vacancy::VacancyAction::Delete(
            "missing".into(),
        ));
        assert_eq!(kv.get(VACANCIES_KEY).expect("read"), None);
    }

    #[tokio::test]
    async fn debounced_writer_coalesces_bursts_and_flushes_on_close() {
        let kv = Arc::new(MemoryKeyValueStore::default());
        let repository = WorkspaceRepository::new(kv.clone());
        let (writer, handle) =
            spawn_debounced_writer(
                repository.clone(),
                Duration::from_millis(20),
                Duration::from_secs(5),
            );
        let mut store = store_with(writer);

        for title in ["Designer", "Analyst", "Recruiter"] {
            store.upsert(VacancyDraft::titled(title));
        }
        drop(store);
        handle.await.expect("writer task completes");

        let saved = repository.load_vacancies().expect("loads");
        let titles: Vec<_> = saved.iter().map(|vacancy| vacancy.title.as_str()).collect();
        assert_eq!(titles, ["Designer", "Analyst", "Recruiter"]);
    }

    #[tokio::test]
    async fn steady_edits_are_saved_within_the_max_delay() {
        let kv = Arc::new(MemoryKeyValueStore::default());
        let repository = WorkspaceRepository::new(kv.clone());
        let (writer, handle) = spawn_debounced_writer(
            repository.clone(),
            Duration::from_millis(100),
            Duration::from_millis(200),
        );
        let mut store = store_with(writer);

        // Edits arrive faster than the quiet period, so only the max delay can flush.
        for n in 0..20 {
            store.upsert(VacancyDraft::titled(format!("Role {n}")));
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        let saved_while_busy = repository.load_vacancies().expect("loads");
        assert!(!saved_while_busy.is_empty());

        drop(store);
        handle.await.expect("writer task completes");
        assert_eq!(repository.load_vacancies().expect("loads").len(), 20);
    }
}
