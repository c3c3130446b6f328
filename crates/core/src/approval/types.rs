//! Approval workflow domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Business area a workflow gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalModule {
    /// Purchase documents.
    Purchase,
    /// Sales documents.
    Sales,
    /// Cash and bank movements.
    CashBank,
    /// Anything else.
    General,
}

impl ApprovalModule {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::Sales => "SALES",
            Self::CashBank => "CASH_BANK",
            Self::General => "GENERAL",
        }
    }

    /// Segment used in request codes.
    #[must_use]
    pub const fn code_segment(self) -> &'static str {
        match self {
            Self::Purchase => "PUR",
            Self::Sales => "SAL",
            Self::CashBank => "CSB",
            Self::General => "REQ",
        }
    }

    /// Parses the persisted representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PURCHASE" => Some(Self::Purchase),
            "SALES" => Some(Self::Sales),
            "CASH_BANK" => Some(Self::CashBank),
            "GENERAL" => Some(Self::General),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApprovalModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role that acts on an approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApproverRole {
    /// Department staff.
    Employee,
    /// Finance staff.
    Finance,
    /// Director; also covers finance steps.
    Director,
    /// Administrator; covers every step.
    Admin,
}

impl ApproverRole {
    /// Returns true if this role may act on a step requiring `required`.
    #[must_use]
    pub const fn can_act_for(self, required: Self) -> bool {
        matches!(
            (self, required),
            (Self::Admin, _)
                | (Self::Director, Self::Director | Self::Finance)
                | (Self::Finance, Self::Finance)
                | (Self::Employee, Self::Employee)
        )
    }

    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "EMPLOYEE",
            Self::Finance => "FINANCE",
            Self::Director => "DIRECTOR",
            Self::Admin => "ADMIN",
        }
    }

    /// Parses a role, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EMPLOYEE" => Some(Self::Employee),
            "FINANCE" => Some(Self::Finance),
            "DIRECTOR" => Some(Self::Director),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApproverRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Waiting on the current step.
    Pending,
    /// Every step approved.
    Approved,
    /// A step rejected.
    Rejected,
    /// Withdrawn by the requester.
    Cancelled,
}

impl RequestStatus {
    /// Terminal states accept no further actions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one step's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    /// Not decided yet.
    Pending,
    /// Approved by the step's role.
    Approved,
    /// Rejected by the step's role.
    Rejected,
    /// Never reached: the request ended first.
    Skipped,
}

impl ActionStatus {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Skipped => "SKIPPED",
        }
    }
}

/// Urgency shown to approvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Low.
    Low,
    /// Default.
    Normal,
    /// Escalated requests are at least high.
    High,
    /// Urgent.
    Urgent,
}

/// Audit trail event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    /// Request submitted.
    Created,
    /// A step approved.
    Approved,
    /// A step rejected.
    Rejected,
    /// Requester withdrew.
    Cancelled,
    /// An optional step was pulled into the chain.
    Escalated,
}

/// Decision recorded on the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Approve and advance.
    Approve,
    /// Reject the whole request.
    Reject {
        /// Mandatory explanation.
        reason: String,
    },
}

/// One configured step of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Step id.
    pub id: Uuid,
    /// Position in the chain, ascending.
    pub step_order: i32,
    /// Display name.
    pub name: String,
    /// Role that acts on this step.
    pub approver_role: ApproverRole,
    /// Only instantiated on escalation.
    pub is_optional: bool,
    /// Hours before the step counts as overdue.
    pub time_limit_hours: i32,
}

/// A configured, amount-tiered workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Workflow id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Gated module.
    pub module: ApprovalModule,
    /// Inclusive lower bound.
    pub min_amount: Decimal,
    /// Inclusive upper bound, zero means unbounded.
    pub max_amount: Decimal,
    /// Only active workflows are selectable.
    pub is_active: bool,
    /// Tie-break for equal lower bounds: newest wins.
    pub created_at: DateTime<Utc>,
    /// Steps in any order.
    pub steps: Vec<StepDefinition>,
}

impl WorkflowDefinition {
    /// Upper bound, `None` when unbounded.
    #[must_use]
    pub fn upper_bound(&self) -> Option<Decimal> {
        (!self.max_amount.is_zero()).then_some(self.max_amount)
    }

    /// Returns true if `amount` falls in this workflow's tier.
    #[must_use]
    pub fn covers(&self, amount: Decimal) -> bool {
        self.min_amount <= amount && self.upper_bound().is_none_or(|max| amount <= max)
    }

    /// Steps sorted by `step_order`.
    #[must_use]
    pub fn ordered_steps(&self) -> Vec<&StepDefinition> {
        let mut steps: Vec<_> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.step_order);
        steps
    }
}
