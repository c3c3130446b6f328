//! Amount-tiered, multi-step approval workflows.
//!
//! # Modules
//!
//! - `types` - Modules, roles, statuses, workflow and step definitions
//! - `error` - Approval-specific error types
//! - `selection` - Tier selection and configuration-time validation
//! - `machine` - Request state machine with a single current-step pointer
//! - `codes` - Request code generation

pub mod codes;
pub mod error;
pub mod machine;
pub mod selection;
pub mod types;

#[cfg(test)]
mod machine_props;

pub use codes::request_code;
pub use error::ApprovalError;
pub use machine::{ApprovalMachine, ChainAction, RequestState, Transition};
pub use selection::WorkflowSelector;
pub use types::{
    ActionStatus, ApprovalModule, ApproverRole, Decision, HistoryAction, Priority, RequestStatus,
    StepDefinition, WorkflowDefinition,
};
