use std::sync::Arc;

use super::common::*;
use crate::workflows::assessment::campaign::{CampaignStatus, GroupingMode};
use crate::workflows::assessment::catalog::{BlockKey, QuestionCatalog};
use crate::workflows::assessment::questionnaire::domain::{
    AnswerItem, BlockState, CommitRequest, RecoveryPayload, WizardStep,
};
use crate::workflows::assessment::questionnaire::repository::ResponseStore;
use crate::workflows::assessment::questionnaire::service::{
    RestartReason, SubmissionError, SubmissionService,
};

#[test]
fn begin_refuses_campaigns_that_are_not_active() {
    let (service, _) = build_service();
    for status in [
        CampaignStatus::Planned,
        CampaignStatus::Paused,
        CampaignStatus::Finished,
    ] {
        match service.begin(
            &campaign(status),
            &context(GroupingMode::BroadUnit),
            &identity_form(),
        ) {
            Err(SubmissionError::CampaignClosed(found)) => assert_eq!(found, status),
            other => panic!("expected closed campaign, got {other:?}"),
        }
    }
}

#[test]
fn begin_opens_state_on_first_block() {
    let (service, _) = build_service();
    let state = service
        .begin(
            &campaign(CampaignStatus::Active),
            &context(GroupingMode::BroadUnit),
            &identity_form(),
        )
        .expect("identity accepted");

    assert_eq!(state.step, WizardStep::Block(BlockKey::Step2));
    assert!(state.answers.is_empty());
    assert!(state.comment.is_empty());
}

#[test]
fn blocks_cannot_be_skipped_but_can_be_revisited() {
    let (service, _) = build_service();
    let mut state = service
        .begin(
            &campaign(CampaignStatus::Active),
            &context(GroupingMode::BroadUnit),
            &identity_form(),
        )
        .expect("identity accepted");

    let control = full_answers(service.catalog(), BlockKey::Step3);
    match service.answer_block(&mut state, BlockKey::Step3, &control) {
        Err(SubmissionError::OutOfOrder { current, requested }) => {
            assert_eq!((current, requested), (2, 3))
        }
        other => panic!("expected out of order, got {other:?}"),
    }

    let demands = full_answers(service.catalog(), BlockKey::Step2);
    let next = service
        .answer_block(&mut state, BlockKey::Step2, &demands)
        .expect("first block accepted");
    assert_eq!(next, WizardStep::Block(BlockKey::Step3));

    let revised = vec!["Never".to_string(); demands.len()];
    let still = service
        .answer_block(&mut state, BlockKey::Step2, &revised)
        .expect("revisit accepted");
    assert_eq!(still, WizardStep::Block(BlockKey::Step3));
    let stored = state.answers.block(BlockKey::Step2).expect("block stored");
    assert!(stored.iter().all(|item| item.answer == "Never"));
}

#[test]
fn incomplete_block_reports_missing_positions_and_keeps_step() {
    let (service, _) = build_service();
    let mut state = service
        .begin(
            &campaign(CampaignStatus::Active),
            &context(GroupingMode::BroadUnit),
            &identity_form(),
        )
        .expect("identity accepted");

    let mut answers = full_answers(service.catalog(), BlockKey::Step2);
    answers[2] = "  ".to_string();
    answers.truncate(7);

    match service.answer_block(&mut state, BlockKey::Step2, &answers) {
        Err(SubmissionError::IncompleteBlock { block, missing }) => {
            assert_eq!(block, BlockKey::Step2);
            assert_eq!(missing, vec![3, 8]);
        }
        other => panic!("expected incomplete block, got {other:?}"),
    }
    assert_eq!(state.step, WizardStep::Block(BlockKey::Step2));
    assert!(state.answers.block(BlockKey::Step2).is_none());
}

#[test]
fn commit_stores_once_and_rejects_second_identity_use() {
    let (service, store) = build_service();
    let active = campaign(CampaignStatus::Active);
    let tenant = context(GroupingMode::BroadUnit);

    let mut state = service
        .begin(&active, &tenant, &identity_form())
        .expect("identity accepted");
    answer_all_blocks(&service, &mut state);

    let receipt = service
        .commit(
            &active,
            &tenant,
            Some(state),
            CommitRequest {
                comment: Some("  More breaks please ".to_string()),
                recovery: None,
            },
        )
        .expect("commit succeeds");
    assert_eq!(receipt.step, WizardStep::Done);
    assert_eq!(store.len(), 1);

    let stored = store.records.lock().expect("store mutex")[0].clone();
    assert_eq!(stored.response.comment, "More breaks please");
    assert_eq!(stored.response.tenant_id, active.tenant_id);

    match service.begin(&active, &tenant, &identity_form()) {
        Err(SubmissionError::DuplicateIdentity) => {}
        other => panic!("expected duplicate identity, got {other:?}"),
    }
}

#[test]
fn commit_requires_reaching_the_comment_step() {
    let (service, store) = build_service();
    let active = campaign(CampaignStatus::Active);
    let tenant = context(GroupingMode::BroadUnit);
    let state = service
        .begin(&active, &tenant, &identity_form())
        .expect("identity accepted");

    let failure = service
        .commit(&active, &tenant, Some(state), CommitRequest::default())
        .expect_err("commit rejected");
    assert!(matches!(
        failure.error,
        SubmissionError::OutOfOrder {
            current: 2,
            requested: 9
        }
    ));
    assert!(failure.state.is_some());
    assert_eq!(store.len(), 0);
}

#[test]
fn commit_duplicate_at_insert_preserves_state() {
    let service = SubmissionService::new(
        Arc::new(ConflictStore),
        Arc::new(QuestionCatalog::standard()),
    );
    let active = campaign(CampaignStatus::Active);
    let tenant = context(GroupingMode::BroadUnit);
    let mut state = service
        .begin(&active, &tenant, &identity_form())
        .expect("identity accepted");
    answer_all_blocks(&service, &mut state);

    let failure = service
        .commit(&active, &tenant, Some(state.clone()), CommitRequest::default())
        .expect_err("duplicate rejected");
    assert!(matches!(failure.error, SubmissionError::DuplicateIdentity));
    assert_eq!(failure.state, Some(state));
}

#[test]
fn commit_storage_failure_preserves_state_for_retry() {
    let service = SubmissionService::new(
        Arc::new(UnavailableStore),
        Arc::new(QuestionCatalog::standard()),
    );
    let active = campaign(CampaignStatus::Active);
    let tenant = context(GroupingMode::BroadUnit);
    let mut state = service
        .begin(&active, &tenant, &identity_form())
        .expect("identity accepted");
    answer_all_blocks(&service, &mut state);

    let failure = service
        .commit(
            &active,
            &tenant,
            Some(state),
            CommitRequest {
                comment: Some("retry later".to_string()),
                recovery: None,
            },
        )
        .expect_err("store offline");
    assert!(matches!(failure.error, SubmissionError::Store(_)));
    let preserved = failure.state.expect("state preserved");
    assert_eq!(preserved.step, WizardStep::Comment);
    assert_eq!(preserved.comment, "retry later");
    assert_eq!(preserved.answers.blocks().count(), 7);
}

#[test]
fn recovery_payload_rebuilds_the_same_response() {
    let active = campaign(CampaignStatus::Active);
    let tenant = context(GroupingMode::BroadUnit);

    let (normal, normal_store) = build_service();
    let mut state = normal
        .begin(&active, &tenant, &identity_form())
        .expect("identity accepted");
    answer_all_blocks(&normal, &mut state);
    let answers = state.answers.clone();
    normal
        .commit(
            &active,
            &tenant,
            Some(state),
            CommitRequest {
                comment: Some("ok".to_string()),
                recovery: None,
            },
        )
        .expect("normal commit");

    let (recovering, recovered_store) = build_service();
    recovering
        .commit(
            &active,
            &tenant,
            None,
            CommitRequest {
                comment: None,
                recovery: Some(RecoveryPayload {
                    meta: identity_form(),
                    responses: answers,
                    comments: Some("ok".to_string()),
                }),
            },
        )
        .expect("recovered commit");

    let normal_row = normal_store.records.lock().expect("store mutex")[0].clone();
    let recovered_row = recovered_store.records.lock().expect("store mutex")[0].clone();
    assert_eq!(normal_row.response, recovered_row.response);
}

#[test]
fn recovery_fails_closed_for_used_or_invalid_identity() {
    let (service, store) = build_service();
    let active = campaign(CampaignStatus::Active);
    let tenant = context(GroupingMode::BroadUnit);

    let mut invalid = identity_form();
    invalid.external_id = "42".to_string();
    let failure = service
        .commit(
            &active,
            &tenant,
            None,
            CommitRequest {
                comment: None,
                recovery: Some(RecoveryPayload {
                    meta: invalid,
                    ..RecoveryPayload::default()
                }),
            },
        )
        .expect_err("invalid recovery");
    assert!(matches!(
        failure.error,
        SubmissionError::RestartRequired(RestartReason::InvalidRecovery(_))
    ));
    assert!(failure.state.is_none());

    let mut state = service
        .begin(&active, &tenant, &identity_form())
        .expect("identity accepted");
    answer_all_blocks(&service, &mut state);
    service
        .commit(&active, &tenant, Some(state), CommitRequest::default())
        .expect("first commit");

    let failure = service
        .commit(
            &active,
            &tenant,
            None,
            CommitRequest {
                comment: None,
                recovery: Some(RecoveryPayload {
                    meta: identity_form(),
                    ..RecoveryPayload::default()
                }),
            },
        )
        .expect_err("already used");
    assert!(matches!(
        failure.error,
        SubmissionError::RestartRequired(RestartReason::AlreadySubmitted)
    ));
    assert_eq!(
        store.count(&active.token).expect("count"),
        1,
        "second submission must not be stored"
    );
}

#[test]
fn commit_without_state_or_payload_asks_for_restart() {
    let (service, _) = build_service();
    let failure = service
        .commit(
            &campaign(CampaignStatus::Active),
            &context(GroupingMode::BroadUnit),
            None,
            CommitRequest::default(),
        )
        .expect_err("nothing to commit");
    assert!(matches!(
        failure.error,
        SubmissionError::RestartRequired(RestartReason::MissingState)
    ));
}

#[test]
fn recovery_comment_fills_in_when_request_comment_is_blank() {
    let (service, store) = build_service();
    let active = campaign(CampaignStatus::Active);
    let tenant = context(GroupingMode::BroadUnit);
    let mut state = service
        .begin(&active, &tenant, &identity_form())
        .expect("identity accepted");
    answer_all_blocks(&service, &mut state);
    state.comment = "stored".to_string();

    service
        .commit(
            &active,
            &tenant,
            Some(state),
            CommitRequest {
                comment: Some("   ".to_string()),
                recovery: Some(RecoveryPayload {
                    comments: Some("from device".to_string()),
                    ..RecoveryPayload::default()
                }),
            },
        )
        .expect("commit succeeds");

    let stored = store.records.lock().expect("store mutex")[0].clone();
    assert_eq!(stored.response.comment, "from device");
}

#[test]
fn identity_check_does_not_open_state() {
    let (service, _) = build_service();
    let active = campaign(CampaignStatus::Active);
    let availability = service
        .check_identity(&active, EXTERNAL_ID)
        .expect("check runs");
    assert!(availability.available);

    match service.check_identity(&active, "123") {
        Err(SubmissionError::Validation(issues)) => assert_eq!(issues.len(), 1),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn step_view_lists_global_numbers_and_saved_answers() {
    let (service, _) = build_service();
    let mut state = service
        .begin(
            &campaign(CampaignStatus::Active),
            &context(GroupingMode::BroadUnit),
            &identity_form(),
        )
        .expect("identity accepted");
    let demands = full_answers(service.catalog(), BlockKey::Step2);
    service
        .answer_block(&mut state, BlockKey::Step2, &demands)
        .expect("block accepted");

    let view = service
        .step_view(WizardStep::Block(BlockKey::Step3), Some(&state))
        .expect("control view");
    assert_eq!(view.title, "Control");
    assert_eq!(view.options.len(), 5);
    assert_eq!(view.questions.first().map(|q| q.number), Some(9));
    assert!(view.questions.iter().all(|q| q.saved_answer.is_none()));

    let revisit = service
        .step_view(WizardStep::Block(BlockKey::Step2), Some(&state))
        .expect("demands view");
    assert!(revisit
        .questions
        .iter()
        .all(|q| q.saved_answer.as_deref() == Some("Often")));

    assert!(matches!(
        service.step_view(WizardStep::Block(BlockKey::Step5), Some(&state)),
        Err(SubmissionError::OutOfOrder { .. })
    ));
}

#[test]
fn step_view_reports_how_much_of_the_block_is_saved() {
    let (service, _) = build_service();
    let mut state = service
        .begin(
            &campaign(CampaignStatus::Active),
            &context(GroupingMode::BroadUnit),
            &identity_form(),
        )
        .expect("identity accepted");
    let demands = full_answers(service.catalog(), BlockKey::Step2);
    service
        .answer_block(&mut state, BlockKey::Step2, &demands)
        .expect("block accepted");

    let answered = service
        .step_view(WizardStep::Block(BlockKey::Step2), Some(&state))
        .expect("demands view");
    assert_eq!(answered.block_state, Some(BlockState::Complete));

    let fresh = service
        .step_view(WizardStep::Block(BlockKey::Step3), Some(&state))
        .expect("control view");
    assert_eq!(fresh.block_state, Some(BlockState::Absent));

    // A client-held payload may carry a block only half filled in.
    let expected = service
        .catalog()
        .domain(BlockKey::Step3)
        .map(|domain| domain.question_count())
        .expect("control block");
    state.answers.insert(
        BlockKey::Step3,
        vec![
            AnswerItem {
                question: "first".to_string(),
                answer: "Rarely".to_string(),
            },
            AnswerItem {
                question: "second".to_string(),
                answer: "  ".to_string(),
            },
        ],
    );
    let partial = service
        .step_view(WizardStep::Block(BlockKey::Step3), Some(&state))
        .expect("control view");
    assert_eq!(
        partial.block_state,
        Some(BlockState::Partial {
            answered: 1,
            expected
        })
    );
    assert_eq!(partial.questions[0].saved_answer.as_deref(), Some("Rarely"));
    assert!(partial.questions[1].saved_answer.is_none());

    let identity = service
        .step_view(WizardStep::Identity, None)
        .expect("identity view");
    assert_eq!(identity.block_state, None);
}
