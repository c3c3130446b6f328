//! Approval workflow error types.
//!
//! Chain errors are returned synchronously so the caller can tell the user
//! exactly why an action was refused.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::types::{ApprovalModule, ApproverRole, RequestStatus};
use crate::ledger::LedgerError;

/// Errors that can occur while configuring or running approvals.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// No active workflow covers the document.
    #[error("No approval workflow configured for {module} amount {amount}")]
    NoWorkflowConfigured {
        /// Requested module.
        module: ApprovalModule,
        /// Document amount.
        amount: Decimal,
    },

    /// Actor cannot act on the current step.
    #[error("Role {actual} cannot act on a step requiring {required}")]
    RoleMismatch {
        /// Role the step requires.
        required: ApproverRole,
        /// Role of the actor.
        actual: ApproverRole,
    },

    /// Request is no longer pending.
    #[error("Approval request is already {status}")]
    RequestAlreadyTerminal {
        /// Terminal status.
        status: RequestStatus,
    },

    /// Actor targeted a step other than the current one.
    #[error("Step {requested} is not the active step (current: {current})")]
    StepNotActive {
        /// Step the actor targeted.
        requested: i32,
        /// Current step.
        current: i32,
    },

    /// Workflow has no step with this order.
    #[error("Workflow has no step {0}")]
    StepNotFound(i32),

    /// Only optional steps can be escalated to.
    #[error("Step {0} is not optional and cannot be escalated to")]
    NotOptional(i32),

    /// Optional step is already part of the chain.
    #[error("Step {0} has already been escalated")]
    AlreadyEscalated(i32),

    /// Escalation may only add steps ahead of the current one.
    #[error("Cannot escalate to step {target}: chain is already at step {current}")]
    EscalationWouldRewind {
        /// Targeted step.
        target: i32,
        /// Current step.
        current: i32,
    },

    /// Rejections must be explained.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Only the requester may cancel.
    #[error("Only the requester can cancel request {0}")]
    NotRequester(Uuid),

    /// Document amount is negative.
    #[error("Approval amount {0} cannot be negative")]
    NegativeAmount(Decimal),

    /// Workflow has no mandatory step.
    #[error("Workflow must have at least one required step")]
    NoRequiredSteps,

    /// Two steps share an order.
    #[error("Duplicate step order {0}")]
    DuplicateStepOrder(i32),

    /// Tier bounds are inverted or negative.
    #[error("Invalid amount range {min}..{max}")]
    InvalidAmountRange {
        /// Lower bound.
        min: Decimal,
        /// Upper bound (0 = unbounded).
        max: Decimal,
    },

    /// Tier overlaps another active workflow of the same module.
    #[error("Amount range overlaps active workflow {0}")]
    OverlappingTier(Uuid),

    /// A pending request already exists for the document.
    #[error("{entity_type} {entity_id} already has a pending approval request")]
    DuplicateRequest {
        /// Document type.
        entity_type: String,
        /// Document id.
        entity_id: Uuid,
    },

    /// Workflow not found.
    #[error("Approval workflow {0} not found")]
    WorkflowNotFound(Uuid),

    /// Request not found.
    #[error("Approval request {0} not found")]
    RequestNotFound(Uuid),

    /// Posting on final approval failed; the approval was rolled back.
    #[error("Posting on final approval failed: {0}")]
    Posting(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ApprovalError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotOptional(_)
            | Self::RejectionReasonRequired
            | Self::NegativeAmount(_)
            | Self::NoRequiredSteps
            | Self::DuplicateStepOrder(_)
            | Self::InvalidAmountRange { .. } => 400,

            Self::RoleMismatch { .. } | Self::NotRequester(_) => 403,

            Self::NoWorkflowConfigured { .. }
            | Self::StepNotFound(_)
            | Self::WorkflowNotFound(_)
            | Self::RequestNotFound(_) => 404,

            Self::RequestAlreadyTerminal { .. }
            | Self::StepNotActive { .. }
            | Self::AlreadyEscalated(_)
            | Self::EscalationWouldRewind { .. }
            | Self::OverlappingTier(_)
            | Self::DuplicateRequest { .. } => 409,

            Self::Posting(inner) => inner.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoWorkflowConfigured { .. } => "NO_WORKFLOW_CONFIGURED",
            Self::RoleMismatch { .. } => "ROLE_MISMATCH",
            Self::RequestAlreadyTerminal { .. } => "REQUEST_ALREADY_TERMINAL",
            Self::StepNotActive { .. } => "STEP_NOT_ACTIVE",
            Self::StepNotFound(_) => "STEP_NOT_FOUND",
            Self::NotOptional(_) => "STEP_NOT_OPTIONAL",
            Self::AlreadyEscalated(_) => "ALREADY_ESCALATED",
            Self::EscalationWouldRewind { .. } => "ESCALATION_WOULD_REWIND",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::NotRequester(_) => "NOT_REQUESTER",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::NoRequiredSteps => "NO_REQUIRED_STEPS",
            Self::DuplicateStepOrder(_) => "DUPLICATE_STEP_ORDER",
            Self::InvalidAmountRange { .. } => "INVALID_AMOUNT_RANGE",
            Self::OverlappingTier(_) => "OVERLAPPING_TIER",
            Self::DuplicateRequest { .. } => "DUPLICATE_REQUEST",
            Self::WorkflowNotFound(_) => "WORKFLOW_NOT_FOUND",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::Posting(inner) => inner.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
