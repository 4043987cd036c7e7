use std::sync::Arc;

use super::common::*;
use crate::workflows::sampling::advance::PartitionPolicy;
use crate::workflows::sampling::coverage::Requirement;
use crate::workflows::sampling::domain::{CompanyId, RatingType};
use crate::workflows::sampling::group::ConsistencyViolation;
use crate::workflows::sampling::repository::{RepositoryError, SampleGroupRepository};
use crate::workflows::sampling::service::{SamplingService, SamplingServiceError};

fn seeded_service(id: &str) -> (TestService, Arc<crate::workflows::sampling::MemoryGroupRepository>, Arc<MemoryRatings>) {
    let (service, repository, ratings) = build_service();
    service
        .create_group(group_id(id), CompanyId("provider-1".to_string()), "Riverbend", false)
        .expect("group created");
    service
        .add_membership(&group_id(id), home("t1"), true, 0)
        .expect("test home");
    service
        .add_membership(&group_id(id), home("s1"), false, 0)
        .expect("sampled home");
    (service, repository, ratings)
}

#[test]
fn mutations_commit_through_the_repository() {
    let (service, repository, _) = seeded_service("commit");

    let stored = repository
        .fetch(&group_id("commit"))
        .expect("fetch succeeds")
        .expect("group present");
    assert_eq!(stored.memberships().len(), 2);
    assert_eq!(stored.version(), 2);

    let added = service
        .contribute_answers(&group_id("commit"), &home("t1"), 0, answer_ids(&[101, 102, 103]))
        .expect("contribution");
    assert_eq!(added, 3);
    assert!(service
        .coverage_status(&group_id("commit"), 0)
        .expect("status")
        .is_passing());
}

#[test]
fn consistency_errors_are_not_committed() {
    let (service, repository, _) = seeded_service("reject");

    match service.add_membership(&group_id("reject"), home("t2"), true, 0) {
        Err(SamplingServiceError::Consistency(ConsistencyViolation::RoleConflict { .. })) => {}
        other => panic!("expected role conflict, got {other:?}"),
    }
    let stored = repository
        .fetch(&group_id("reject"))
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.memberships().len(), 2);
}

#[test]
fn stale_snapshot_is_rejected_as_conflict() {
    let (service, repository, _) = seeded_service("stale");
    let mut stale = repository
        .fetch(&group_id("stale"))
        .expect("fetch")
        .expect("present");

    service
        .add_membership(&group_id("stale"), home("s2"), false, 0)
        .expect("concurrent writer commits first");

    stale
        .add_membership(home("s3"), false, 0)
        .expect("valid against the stale snapshot");
    match repository.update(stale) {
        Err(RepositoryError::Conflict { expected, found }) => {
            assert_eq!(expected, 2);
            assert_eq!(found, 3);
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn advance_and_certify_end_to_end() {
    let (service, _, ratings) = seeded_service("flow");
    service
        .contribute_answers(&group_id("flow"), &home("t1"), 0, answer_ids(&[101, 102, 103, 104]))
        .expect("contribution");
    assert!(service.readiness(&group_id("flow")).expect("readiness").is_passing());

    let outcome = service
        .advance(&group_id("flow"), &PartitionPolicy::Single)
        .expect("advance");
    assert_eq!(outcome.new_revision(), Some(1));
    assert_eq!(
        service
            .current_membership(&home("s1"))
            .expect("lookup")
            .map(|membership| membership.revision),
        Some(1)
    );

    let blocked = service.can_certify(&home("s1")).expect("verdict");
    assert_eq!(
        blocked.status.failure().map(|failure| failure.requirement),
        Some(Requirement::TestHomeIneligible)
    );

    ratings.complete(home("t1"));
    assert!(service.can_certify(&home("s1")).expect("verdict").is_eligible());
    assert!(service.can_certify(&home("t1")).expect("verdict").is_eligible());
    assert_eq!(service.classify(&home("t1")).expect("classify"), RatingType::SampledTestHouse);
    assert_eq!(service.contributed_answers(&home("t1")).expect("answers").len(), 4);
    assert!(service.failing_contributed_answers(&home("t1")).expect("answers").is_empty());
    assert!(service.failure_summary(&group_id("flow"), 1).expect("summary").is_empty());
    assert_eq!(service.completion_percentage(&group_id("flow")).expect("percent"), 100.0);
    assert_eq!(service.source_answers(&home("t1")).len(), 4);
}

#[test]
fn remove_is_idempotent_through_service() {
    let (service, repository, _) = seeded_service("idempotent");
    let version = repository
        .fetch(&group_id("idempotent"))
        .expect("fetch")
        .expect("present")
        .version();

    assert_eq!(service.remove(&group_id("idempotent"), &home("s1")).expect("remove"), 1);
    assert_eq!(service.remove(&group_id("idempotent"), &home("s1")).expect("remove"), 0);
    let stored = repository
        .fetch(&group_id("idempotent"))
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.version(), version + 1, "no-op removal writes nothing");
    assert_eq!(service.classify(&home("s1")).expect("classify"), RatingType::SampledHouse);
}

#[test]
fn missing_group_and_storage_failures_propagate() {
    let (service, _, _) = build_service();
    match service.coverage_status(&group_id("missing"), 0) {
        Err(SamplingServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }

    let offline = SamplingService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryChecklist::standard()),
        Arc::new(MemoryRatings::default()),
    );
    match offline.classify(&home("t1")) {
        Err(SamplingServiceError::Repository(RepositoryError::Unavailable(reason))) => {
            assert!(reason.contains("offline"))
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[test]
fn uncovered_questions_reported_by_service() {
    let (service, _, _) = seeded_service("gaps");
    let uncovered = service
        .find_uncovered_required_questions(&group_id("gaps"), 0)
        .expect("questions");
    assert_eq!(uncovered.len(), 3);

    match service.advance(&group_id("gaps"), &PartitionPolicy::Count(0)) {
        Err(SamplingServiceError::Configuration(_)) => {}
        other => panic!("expected configuration error, got {other:?}"),
    }
}
