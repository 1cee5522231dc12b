use super::common::*;
use crate::matching::domain::{ApplicationId, ApplicationStatus, ProgramId};
use crate::matching::intake::IntakeViolation;
use crate::matching::repository::{ProgramCatalog, RepositoryError};
use crate::matching::service::LenderMatchServiceError;

#[test]
fn submit_stores_pending_application() {
    let (service, repository, _) = build_service();

    let record = service.submit(submission()).expect("submission accepted");

    assert!(record.application.id.0.starts_with("app-"));
    assert_eq!(record.application.status, ApplicationStatus::Pending);
    assert!(record.results.is_empty());
    assert_eq!(repository.status_history(), vec!["pending"]);
}

#[test]
fn submit_rejects_invalid_submission_without_storing() {
    let (service, repository, _) = build_service();
    let mut submission = submission();
    submission.fico_score = 120;

    let error = service.submit(submission).unwrap_err();

    assert!(matches!(
        error,
        LenderMatchServiceError::Intake(IntakeViolation::OutOfRange { .. })
    ));
    assert!(repository.status_history().is_empty());
}

#[test]
fn run_matching_walks_status_and_persists_results() {
    let (service, repository, catalog) = build_service();
    let mut strict = open_program(2);
    strict.min_fico = Some(780);
    let mut inactive = open_program(3);
    inactive.active = false;
    for program in [open_program(1), strict, inactive] {
        catalog.insert(program).expect("program stored");
    }

    let record = service.submit(submission()).expect("submission accepted");
    let results = service
        .run_matching(&record.application.id)
        .expect("match run");

    assert_eq!(results.len(), 2);
    assert_eq!(
        repository.status_history(),
        vec!["pending", "processing", "completed"]
    );

    let stored = service.get(&record.application.id).expect("record");
    assert_eq!(stored.application.status, ApplicationStatus::Completed);
    assert_eq!(stored.results, results);
    assert_eq!(stored.application.submission, record.application.submission);

    let view = stored.status_view();
    assert_eq!(view.programs_evaluated, Some(2));
    assert_eq!(view.eligible_programs, Some(1));
    assert_eq!(view.best_fit_score, Some(100));
}

#[test]
fn rerun_replaces_results_after_program_change() {
    let (service, _, catalog) = build_service();
    catalog.insert(open_program(1)).expect("program stored");
    let record = service.submit(submission()).expect("submission accepted");
    let id = record.application.id;

    let first = service.run_matching(&id).expect("first run");
    assert!(first[0].is_eligible);

    let mut tightened = open_program(1);
    tightened.min_revenue = Some(1_000_000.0);
    catalog.replace(tightened);

    let second = service.run_matching(&id).expect("second run");
    assert_eq!(second.len(), 1);
    assert!(!second[0].is_eligible);
    assert_eq!(service.get(&id).expect("record").results, second);
}

#[test]
fn results_are_ranked_by_eligibility_score_and_priority() {
    let mut strict = open_program(1);
    strict.min_fico = Some(800);
    let mut low = open_program(2);
    low.priority = 1;
    let mut high = open_program(3);
    high.priority = 9;
    let catalog_programs = vec![strict, low, high];

    let (service, _, catalog) = build_service();
    for program in catalog_programs {
        catalog.insert(program).expect("program stored");
    }
    let record = service.submit(submission()).expect("submission accepted");
    service
        .run_matching(&record.application.id)
        .expect("match run");

    let ranked = service.results(&record.application.id).expect("results");
    let order: Vec<_> = ranked.iter().map(|result| result.program_id).collect();

    assert_eq!(order, vec![ProgramId(3), ProgramId(2), ProgramId(1)]);
}

#[test]
fn unknown_application_is_not_found() {
    let (service, _, _) = build_service();
    let missing = ApplicationId("app-missing".to_string());

    assert!(matches!(
        service.get(&missing),
        Err(LenderMatchServiceError::Repository(RepositoryError::NotFound))
    ));
    assert!(matches!(
        service.run_matching(&missing),
        Err(LenderMatchServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn programs_are_listed_by_priority_and_duplicates_conflict() {
    let (service, _, _) = build_service();
    let mut urgent = open_program(7);
    urgent.priority = 10;
    service.register_program(open_program(2)).expect("registered");
    service.register_program(urgent).expect("registered");

    let ids: Vec<_> = service
        .programs()
        .expect("programs")
        .into_iter()
        .map(|program| program.id)
        .collect();
    assert_eq!(ids, vec![ProgramId(7), ProgramId(2)]);

    assert!(matches!(
        service.register_program(open_program(2)),
        Err(LenderMatchServiceError::Repository(RepositoryError::Conflict))
    ));
}

#[test]
fn updated_program_takes_effect_on_next_run() {
    let (service, _, _) = build_service_with(vec![open_program(1)]);
    let record = service.submit(submission()).expect("submission accepted");
    let id = record.application.id;
    assert!(service.run_matching(&id).expect("first run")[0].is_eligible);

    let mut tightened = service.program(ProgramId(1)).expect("program exists");
    tightened.max_term_months = Some(24);
    service.update_program(tightened).expect("program updated");

    assert_eq!(
        service.program(ProgramId(1)).expect("program").max_term_months,
        Some(24)
    );
    assert!(service.get(&id).expect("record").results[0].is_eligible);

    let rerun = service.run_matching(&id).expect("second run");
    assert!(!rerun[0].is_eligible);
    assert_eq!(rerun[0].rejection_reasons, vec!["Term 36 months exceeds maximum 24"]);
}

#[test]
fn unknown_program_cannot_be_read_updated_or_removed() {
    let (service, _, _) = build_service_with(vec![open_program(1)]);

    for result in [
        service.program(ProgramId(9)),
        service.update_program(open_program(9)),
        service.remove_program(ProgramId(9)),
    ] {
        assert!(matches!(
            result,
            Err(LenderMatchServiceError::Repository(RepositoryError::NotFound))
        ));
    }
}

#[test]
fn removed_program_is_no_longer_matched() {
    let (service, _, _) = build_service_with(vec![open_program(1), open_program(2)]);
    let record = service.submit(submission()).expect("submission accepted");

    let removed = service.remove_program(ProgramId(2)).expect("removed");
    assert_eq!(removed.id, ProgramId(2));

    let results = service
        .run_matching(&record.application.id)
        .expect("match run");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].program_id, ProgramId(1));
}

#[test]
fn applications_are_listed_newest_first() {
    let (service, _, _) = build_service();
    let first = service.submit(submission()).expect("first");
    let second = service.submit(submission()).expect("second");

    let ids: Vec<_> = service
        .applications()
        .expect("applications")
        .into_iter()
        .map(|record| record.application.id)
        .collect();

    assert_eq!(ids, vec![second.application.id, first.application.id]);
}
