//! Property-based tests for the approval state machine.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::approval::error::ApprovalError;
use crate::approval::machine::ApprovalMachine;
use crate::approval::types::{
    ApprovalModule, ApproverRole, Decision, RequestStatus, StepDefinition, WorkflowDefinition,
};

fn arb_role() -> impl Strategy<Value = ApproverRole> {
    prop_oneof![
        Just(ApproverRole::Employee),
        Just(ApproverRole::Finance),
        Just(ApproverRole::Director),
        Just(ApproverRole::Admin),
    ]
}

fn arb_workflow() -> impl Strategy<Value = WorkflowDefinition> {
    prop::collection::vec((arb_role(), any::<bool>()), 1..6).prop_map(|specs| {
        let mut steps: Vec<StepDefinition> = specs
            .into_iter()
            .enumerate()
            .map(|(i, (role, is_optional))| StepDefinition {
                id: Uuid::new_v4(),
                step_order: i32::try_from(i).unwrap() + 1,
                name: format!("step {i}"),
                approver_role: role,
                is_optional,
                time_limit_hours: 24,
            })
            .collect();
        steps[0].is_optional = false;
        WorkflowDefinition {
            id: Uuid::new_v4(),
            name: "generated".to_string(),
            module: ApprovalModule::General,
            min_amount: Decimal::ZERO,
            max_amount: Decimal::ZERO,
            is_active: true,
            created_at: Utc::now(),
            steps,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approving with the exact role at each step completes after one approval per required step.
    #[test]
    fn prop_required_steps_each_need_one_approval(workflow in arb_workflow()) {
        let mut state = ApprovalMachine::start(&workflow).unwrap();
        let required = workflow.steps.iter().filter(|s| !s.is_optional).count();
        prop_assert_eq!(state.approvals_required(), required);

        let mut approvals = 0;
        while let Some(action) = state.current_action().cloned() {
            let t = ApprovalMachine::record(&mut state, action.step_order, action.approver_role, &Decision::Approve)
                .unwrap();
            approvals += 1;
            prop_assert_eq!(t.is_final_approval(), approvals == required);
        }

        prop_assert_eq!(approvals, required);
        prop_assert_eq!(state.status, RequestStatus::Approved);
    }

    /// Once terminal, no decision by any role on any step succeeds.
    #[test]
    fn prop_terminal_requests_accept_nothing(
        workflow in arb_workflow(),
        ending in 0u8..3,
        role in arb_role(),
        step in 0i32..8,
        approve in any::<bool>(),
    ) {
        let mut state = ApprovalMachine::start(&workflow).unwrap();
        match ending {
            0 => {
                while let Some(action) = state.current_action().cloned() {
                    ApprovalMachine::record(&mut state, action.step_order, ApproverRole::Admin, &Decision::Approve).unwrap();
                }
            }
            1 => {
                let first = state.current_step.unwrap();
                ApprovalMachine::record(
                    &mut state,
                    first,
                    ApproverRole::Admin,
                    &Decision::Reject { reason: "no".to_string() },
                )
                .unwrap();
            }
            _ => {
                ApprovalMachine::cancel(&mut state).unwrap();
            }
        }
        prop_assert!(state.status.is_terminal());

        let decision = if approve {
            Decision::Approve
        } else {
            Decision::Reject { reason: "late".to_string() }
        };
        let is_terminal_error = matches!(
            ApprovalMachine::record(&mut state, step, role, &decision),
            Err(ApprovalError::RequestAlreadyTerminal { .. })
        );
        prop_assert!(is_terminal_error);
    }

    /// At most one action is the active gate at any time.
    #[test]
    fn prop_single_active_gate(workflow in arb_workflow(), approvals in 0usize..6) {
        let mut state = ApprovalMachine::start(&workflow).unwrap();
        for _ in 0..approvals {
            let Some(action) = state.current_action().cloned() else { break };
            ApprovalMachine::record(&mut state, action.step_order, ApproverRole::Admin, &Decision::Approve).unwrap();
        }
        let active = state.actions.iter().filter(|a| state.is_active(a.step_order)).count();
        prop_assert!(active <= 1);
        prop_assert_eq!(active == 1, state.status == RequestStatus::Pending);
    }
}
