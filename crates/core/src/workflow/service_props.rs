//! Property-based tests for the workflow state machine.

use proptest::prelude::*;

use paraledger_shared::types::{CompanyId, DocumentId, UserId, WorkflowInstanceId};

use crate::document::DocumentStatus;
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::WorkflowInstance;

/// Strategy for generating random document statuses.
fn arb_status() -> impl Strategy<Value = DocumentStatus> {
    prop_oneof![
        Just(DocumentStatus::Draft),
        Just(DocumentStatus::PendingApproval),
        Just(DocumentStatus::Approved),
        Just(DocumentStatus::Rejected),
        Just(DocumentStatus::Posted),
    ]
}

fn instance_with_pool(submitter: UserId, pool: Vec<UserId>) -> WorkflowInstance {
    WorkflowInstance {
        id: WorkflowInstanceId::new(),
        document_id: DocumentId::new(),
        company: CompanyId::new(),
        required_level_order: 1,
        required_level_name: "Supervisor".to_string(),
        eligible_approvers: pool,
        submitter,
        submitted_at: chrono::Utc::now(),
        deadline: None,
        decision: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every transition a service method accepts is also accepted by
    /// the transition table, and vice versa for the submit path.
    #[test]
    fn prop_service_agrees_with_transition_table(status in arb_status()) {
        let user = UserId::new();

        let submit_ok = WorkflowService::submit(status, user).is_ok();
        prop_assert_eq!(
            submit_ok,
            WorkflowService::is_valid_transition(status, DocumentStatus::PendingApproval)
        );

        let approve_ok = WorkflowService::approve(status, user, None).is_ok();
        prop_assert_eq!(
            approve_ok,
            WorkflowService::is_valid_transition(status, DocumentStatus::Approved)
        );

        let post_ok = WorkflowService::post(status).is_ok();
        prop_assert_eq!(
            post_ok,
            WorkflowService::is_valid_transition(status, DocumentStatus::Posted)
                && status == DocumentStatus::Approved
        );
    }

    /// Posted documents accept no further transitions.
    #[test]
    fn prop_posted_is_terminal(target in arb_status()) {
        prop_assert!(!WorkflowService::is_valid_transition(
            DocumentStatus::Posted,
            target
        ));
    }

    /// Segregation of duties holds for every pool composition: the
    /// submitter is never authorized, even when present in the pool.
    #[test]
    fn prop_submitter_never_authorized(pool_size in 0usize..5) {
        let submitter = UserId::new();
        let mut pool: Vec<UserId> = (0..pool_size).map(|_| UserId::new()).collect();
        pool.push(submitter);

        let instance = instance_with_pool(submitter, pool);
        let result = WorkflowService::authorize_decision(&instance, submitter);
        prop_assert!(
            matches!(result, Err(WorkflowError::SelfApproval { .. })),
            "expected SelfApproval error, got {:?}",
            result
        );
    }
}
