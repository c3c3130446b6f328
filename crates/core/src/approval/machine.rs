//! Approval request state machine.
//!
//! Each request has exactly one authoritative pointer, `current_step`, to
//! the step whose action is the gate. Action rows only carry their decision;
//! whether an action is active is derived from the pointer.
//!
//! ```text
//! PENDING --approve (more steps)--> PENDING (next step)
//! PENDING --approve (last step)---> APPROVED
//! PENDING --reject----------------> REJECTED
//! PENDING --cancel----------------> CANCELLED
//! ```

use uuid::Uuid;

use super::error::ApprovalError;
use super::types::{
    ActionStatus, ApproverRole, Decision, HistoryAction, RequestStatus, WorkflowDefinition,
};

/// One instantiated step of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAction {
    /// Workflow step this action executes.
    pub step_id: Uuid,
    /// Step position.
    pub step_order: i32,
    /// Role required.
    pub approver_role: ApproverRole,
    /// Decision so far.
    pub status: ActionStatus,
    /// Pulled in by escalation rather than instantiated up front.
    pub escalated: bool,
}

/// Runtime state of one approval request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestState {
    /// Overall status.
    pub status: RequestStatus,
    /// Order of the gating step; `None` once terminal.
    pub current_step: Option<i32>,
    /// Instantiated actions sorted by step order.
    pub actions: Vec<ChainAction>,
}

impl RequestState {
    /// The action currently gating the request.
    #[must_use]
    pub fn current_action(&self) -> Option<&ChainAction> {
        let current = self.current_step?;
        self.actions.iter().find(|a| a.step_order == current)
    }

    /// Whether the action for `step_order` is the current gate.
    #[must_use]
    pub fn is_active(&self, step_order: i32) -> bool {
        self.status == RequestStatus::Pending && self.current_step == Some(step_order)
    }

    /// Number of approvals the request needs in total.
    #[must_use]
    pub fn approvals_required(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| a.status != ActionStatus::Skipped)
            .count()
    }

    fn ensure_pending(&self) -> Result<i32, ApprovalError> {
        match (self.status, self.current_step) {
            (RequestStatus::Pending, Some(current)) => Ok(current),
            (status, _) => Err(ApprovalError::RequestAlreadyTerminal { status }),
        }
    }

    fn skip_pending(&mut self) {
        for action in &mut self.actions {
            if action.status == ActionStatus::Pending {
                action.status = ActionStatus::Skipped;
            }
        }
    }
}

/// Outcome of a successful state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Current step approved, pointer moved on.
    Advanced {
        /// Step just approved.
        from: i32,
        /// New current step.
        to: i32,
    },
    /// Last step approved; the document must now be posted.
    Completed {
        /// Step just approved.
        last_step: i32,
    },
    /// Current step rejected the request.
    Rejected {
        /// Rejecting step.
        step: i32,
    },
    /// Requester withdrew.
    Cancelled,
    /// Optional step added to the chain.
    Escalated {
        /// Added step.
        step: i32,
    },
}

impl Transition {
    /// History event recorded for this transition.
    #[must_use]
    pub const fn history_action(self) -> HistoryAction {
        match self {
            Self::Advanced { .. } | Self::Completed { .. } => HistoryAction::Approved,
            Self::Rejected { .. } => HistoryAction::Rejected,
            Self::Cancelled => HistoryAction::Cancelled,
            Self::Escalated { .. } => HistoryAction::Escalated,
        }
    }

    /// The request reached APPROVED with this transition.
    #[must_use]
    pub const fn is_final_approval(self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Stateless transition rules.
pub struct ApprovalMachine;

impl ApprovalMachine {
    /// Instantiates the chain for a new request.
    ///
    /// One action per required step; optional steps wait for escalation.
    ///
    /// # Errors
    ///
    /// Returns `NoRequiredSteps` if the workflow has only optional steps.
    pub fn start(workflow: &WorkflowDefinition) -> Result<RequestState, ApprovalError> {
        let actions: Vec<ChainAction> = workflow
            .ordered_steps()
            .into_iter()
            .filter(|s| !s.is_optional)
            .map(|s| ChainAction {
                step_id: s.id,
                step_order: s.step_order,
                approver_role: s.approver_role,
                status: ActionStatus::Pending,
                escalated: false,
            })
            .collect();

        let first = actions
            .first()
            .map(|a| a.step_order)
            .ok_or(ApprovalError::NoRequiredSteps)?;

        Ok(RequestState {
            status: RequestStatus::Pending,
            current_step: Some(first),
            actions,
        })
    }

    /// Records a decision on the current step.
    ///
    /// `step_order` is the step the actor believes is current; a stale value
    /// (double submit, outdated screen) is refused instead of acting twice.
    ///
    /// # Errors
    ///
    /// - `RequestAlreadyTerminal` once the request left PENDING
    /// - `StepNotActive` if `step_order` is not the current step
    /// - `RoleMismatch` if the actor cannot act for the step's role
    /// - `RejectionReasonRequired` for a blank rejection reason
    pub fn record(
        state: &mut RequestState,
        step_order: i32,
        actor: ApproverRole,
        decision: &Decision,
    ) -> Result<Transition, ApprovalError> {
        let current = state.ensure_pending()?;
        if step_order != current {
            return Err(ApprovalError::StepNotActive {
                requested: step_order,
                current,
            });
        }

        let idx = state
            .actions
            .iter()
            .position(|a| a.step_order == current)
            .ok_or(ApprovalError::StepNotFound(current))?;

        let required = state.actions[idx].approver_role;
        if !actor.can_act_for(required) {
            return Err(ApprovalError::RoleMismatch {
                required,
                actual: actor,
            });
        }

        match decision {
            Decision::Approve => {
                state.actions[idx].status = ActionStatus::Approved;
                let next = state
                    .actions
                    .iter()
                    .skip(idx + 1)
                    .find(|a| a.status == ActionStatus::Pending)
                    .map(|a| a.step_order);

                if let Some(to) = next {
                    state.current_step = Some(to);
                    Ok(Transition::Advanced { from: current, to })
                } else {
                    state.current_step = None;
                    state.status = RequestStatus::Approved;
                    Ok(Transition::Completed { last_step: current })
                }
            }
            Decision::Reject { reason } => {
                if reason.trim().is_empty() {
                    return Err(ApprovalError::RejectionReasonRequired);
                }
                state.actions[idx].status = ActionStatus::Rejected;
                state.skip_pending();
                state.current_step = None;
                state.status = RequestStatus::Rejected;
                Ok(Transition::Rejected { step: current })
            }
        }
    }

    /// Pulls an optional step into the chain.
    ///
    /// Only a role that may act on the current step can escalate, and only
    /// to an optional step ahead of it. The current step stays pending with
    /// its approver; the new action becomes the gate when the chain reaches it.
    ///
    /// # Errors
    ///
    /// - `RequestAlreadyTerminal` once the request left PENDING
    /// - `StepNotFound` / `NotOptional` / `AlreadyEscalated` for a bad target
    /// - `EscalationWouldRewind` for a target at or behind the current step
    /// - `RoleMismatch` if the actor has no authority over the current step
    pub fn escalate(
        state: &mut RequestState,
        workflow: &WorkflowDefinition,
        actor: ApproverRole,
        target_step_order: i32,
    ) -> Result<Transition, ApprovalError> {
        let current = state.ensure_pending()?;

        let target = workflow
            .steps
            .iter()
            .find(|s| s.step_order == target_step_order)
            .ok_or(ApprovalError::StepNotFound(target_step_order))?;

        if !target.is_optional {
            return Err(ApprovalError::NotOptional(target_step_order));
        }
        if state
            .actions
            .iter()
            .any(|a| a.step_order == target_step_order)
        {
            return Err(ApprovalError::AlreadyEscalated(target_step_order));
        }
        if target_step_order <= current {
            return Err(ApprovalError::EscalationWouldRewind {
                target: target_step_order,
                current,
            });
        }

        let required = state
            .current_action()
            .map(|a| a.approver_role)
            .ok_or(ApprovalError::StepNotFound(current))?;
        if !actor.can_act_for(required) {
            return Err(ApprovalError::RoleMismatch {
                required,
                actual: actor,
            });
        }

        let at = state
            .actions
            .iter()
            .position(|a| a.step_order > target_step_order)
            .unwrap_or(state.actions.len());
        state.actions.insert(
            at,
            ChainAction {
                step_id: target.id,
                step_order: target.step_order,
                approver_role: target.approver_role,
                status: ActionStatus::Pending,
                escalated: true,
            },
        );

        Ok(Transition::Escalated {
            step: target_step_order,
        })
    }

    /// Withdraws a pending request.
    ///
    /// # Errors
    ///
    /// Returns `RequestAlreadyTerminal` once the request left PENDING.
    pub fn cancel(state: &mut RequestState) -> Result<Transition, ApprovalError> {
        state.ensure_pending()?;
        state.skip_pending();
        state.current_step = None;
        state.status = RequestStatus::Cancelled;
        Ok(Transition::Cancelled)
    }
}
