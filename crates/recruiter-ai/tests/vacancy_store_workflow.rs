use std::sync::Arc;

use chrono::NaiveDate;
use recruiter_ai::workflows::persistence::{
    FileKeyValueStore, KeyValueStore, PersistenceError, SnapshotWriter, WorkspaceRepository,
    VACANCIES_KEY,
};
use recruiter_ai::workflows::vacancy::{
    DocumentRef, RecruiterId, SequenceClock, VacancyAction, VacancyDraft, VacancyPriority,
    VacancyStage, VacancyStore,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 10).expect("valid date")
}

fn file_repository(dir: &tempfile::TempDir) -> (WorkspaceRepository, Arc<FileKeyValueStore>) {
    let kv = Arc::new(FileKeyValueStore::open(dir.path()).expect("data dir opens"));
    (WorkspaceRepository::new(kv.clone()), kv)
}

#[test]
fn board_survives_a_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (repository, _) = file_repository(&dir);

    let mut store = VacancyStore::new(SequenceClock::new(today()));
    store.subscribe(SnapshotWriter::new(repository.clone()));

    let engineer = store
        .upsert(VacancyDraft::titled("Engineer").with_priority(VacancyPriority::High))
        .expect("created");
    store.upsert(VacancyDraft::titled("Designer").with_stage(VacancyStage::Sourcing));
    store.dispatch(VacancyAction::ChangeStage {
        id: engineer.id.clone(),
        stage: VacancyStage::Offer,
    });
    store.dispatch(VacancyAction::AssignRecruiter {
        id: engineer.id.clone(),
        recruiter: Some(RecruiterId::from("rec-3")),
    });
    store
        .attach_resume(
            &engineer.id,
            "alex.pdf",
            DocumentRef {
                url: Some("https://files.example.com/alex.pdf".to_string()),
                text: Some("Go, Kafka".to_string()),
            },
        )
        .expect("attached");
    let before = store.vacancies().to_vec();
    drop(store);

    let (reopened, _) = file_repository(&dir);
    let restored = reopened.load_vacancies().expect("loads");
    assert_eq!(restored, before);

    let restored_store =
        VacancyStore::new(SequenceClock::new(today())).with_vacancies(restored);
    let offer = restored_store.by_stage(VacancyStage::Offer);
    assert_eq!(offer.len(), 1);
    assert_eq!(offer[0].resumes[0].file_name, "alex.pdf");
}

#[test]
fn legacy_records_default_stage_and_resumes() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (repository, kv) = file_repository(&dir);
    kv.set(
        VACANCIES_KEY,
        r#"[{"id":"vac-legacy","title":"Support Lead","priority":"Low","start_date":"2024-05-01"},
            {"id":"vac-null","title":"QA","priority":"High","stage":null,"start_date":"2024-06-01","resumes":null}]"#
            .to_string(),
    )
    .expect("seeded");

    let loaded = repository.load_vacancies().expect("legacy data loads");
    assert_eq!(loaded.len(), 2);
    assert!(loaded
        .iter()
        .all(|vacancy| vacancy.stage == VacancyStage::Sourcing && vacancy.resumes.is_empty()));
    assert_eq!(loaded[0].end_date, None);
}

#[test]
fn corrupt_snapshot_is_reported_not_overwritten() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (repository, kv) = file_repository(&dir);
    kv.set(VACANCIES_KEY, "{ not json".to_string())
        .expect("seeded");

    let err = repository.load_vacancies().expect_err("corrupt data");
    assert!(matches!(err, PersistenceError::Corrupt { .. }));
    assert_eq!(
        kv.get(VACANCIES_KEY).expect("readable"),
        Some("{ not json".to_string())
    );
}
