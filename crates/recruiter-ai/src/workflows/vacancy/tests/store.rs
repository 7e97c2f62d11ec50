use super::common::*;
use crate::workflows::vacancy::{
    AnalysisState, RecruiterId, ResumeAnalysis, ResumeId, VacancyAction, VacancyDraft, VacancyId,
    VacancyStage,
};

fn analysis(score: u8) -> ResumeAnalysis {
    ResumeAnalysis {
        match_score: score,
        summary: "Solid match".to_string(),
        strengths: vec!["Rust".to_string()],
        gaps: Vec::new(),
        recommendation: None,
    }
}

#[test]
fn observers_hear_only_real_changes() {
    let observer = CountingObserver::default();
    let mut store = store();
    store.subscribe(observer.clone());

    let created = store
        .upsert(VacancyDraft::titled("Engineer"))
        .expect("created");
    assert_eq!(observer.calls(), 1);

    store.dispatch(VacancyAction::Delete(VacancyId::from("missing")));
    store.dispatch(VacancyAction::ChangeStage {
        id: created.id.clone(),
        stage: VacancyStage::New,
    });
    assert_eq!(observer.calls(), 1, "no-op dispatches must stay silent");

    store.dispatch(VacancyAction::ChangeStage {
        id: created.id,
        stage: VacancyStage::Sourcing,
    });
    assert_eq!(observer.calls(), 2);
}

#[test]
fn queries_filter_by_stage_and_recruiter() {
    let mut store = store();
    let first = store
        .upsert(VacancyDraft::titled("Engineer").with_stage(VacancyStage::Interview))
        .expect("created");
    store.upsert(VacancyDraft::titled("Designer"));
    store.dispatch(VacancyAction::AssignRecruiter {
        id: first.id.clone(),
        recruiter: Some(RecruiterId::from("rec-1")),
    });

    let interviewing = store.by_stage(VacancyStage::Interview);
    assert_eq!(interviewing.len(), 1);
    assert_eq!(interviewing[0].id, first.id);

    assert_eq!(store.assigned_to(&RecruiterId::from("rec-1")).len(), 1);
    assert!(store.assigned_to(&RecruiterId::from("rec-2")).is_empty());

    let counts = store.stage_counts();
    assert_eq!(counts.len(), VacancyStage::ordered().len());
    assert_eq!(counts[&VacancyStage::New], 1);
    assert_eq!(counts[&VacancyStage::Interview], 1);
    assert_eq!(counts[&VacancyStage::Archive], 0);
}

#[test]
fn attach_resume_needs_an_existing_vacancy() {
    let observer = CountingObserver::default();
    let mut store = store();
    store.subscribe(observer.clone());

    let attached = store.attach_resume(&VacancyId::from("missing"), "cv.pdf", resume_text());
    assert!(attached.is_none());
    assert_eq!(observer.calls(), 0);

    let vacancy = store
        .upsert(VacancyDraft::titled("Engineer"))
        .expect("created");
    let resume = store
        .attach_resume(&vacancy.id, "cv.pdf", resume_text())
        .expect("attached");
    assert_eq!(resume.id, ResumeId::from("res-002"));
    assert_eq!(resume.analysis, AnalysisState::NotStarted);
    assert_eq!(store.get(&vacancy.id).expect("present").resumes.len(), 1);
}

#[test]
fn only_the_latest_ticket_resolves_an_analysis() {
    let mut store = store();
    let vacancy = store
        .upsert(VacancyDraft::titled("Engineer"))
        .expect("created");
    let resume = store
        .attach_resume(&vacancy.id, "cv.pdf", resume_text())
        .expect("attached");

    let first = store
        .begin_analysis(&vacancy.id, &resume.id)
        .expect("ticket");
    let second = store
        .begin_analysis(&vacancy.id, &resume.id)
        .expect("ticket");
    assert_ne!(first, second);

    assert!(!store.resolve_analysis(first, Ok(analysis(40))));
    assert!(store.resolve_analysis(second, Ok(analysis(85))));

    let stored = store
        .get(&vacancy.id)
        .and_then(|vacancy| vacancy.resume(&resume.id))
        .expect("resume present");
    assert_eq!(
        stored.analysis,
        AnalysisState::Done {
            result: analysis(85)
        }
    );
}

#[test]
fn begin_analysis_on_unknown_resume_yields_no_ticket() {
    let mut store = store();
    let vacancy = store
        .upsert(VacancyDraft::titled("Engineer"))
        .expect("created");
    assert!(store
        .begin_analysis(&vacancy.id, &ResumeId::from("res-404"))
        .is_none());
    assert!(store
        .begin_analysis(&VacancyId::from("vac-404"), &ResumeId::from("res-404"))
        .is_none());
}

#[test]
fn results_for_a_deleted_vacancy_are_dropped() {
    let mut store = store();
    let vacancy = store
        .upsert(VacancyDraft::titled("Engineer"))
        .expect("created");
    let resume = store
        .attach_resume(&vacancy.id, "cv.pdf", resume_text())
        .expect("attached");
    let ticket = store
        .begin_analysis(&vacancy.id, &resume.id)
        .expect("ticket");

    store.dispatch(VacancyAction::Delete(vacancy.id));
    assert!(!store.resolve_analysis(ticket, Ok(analysis(90))));
    assert!(store.vacancies().is_empty());
}
