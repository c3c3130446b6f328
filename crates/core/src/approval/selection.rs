//! Workflow selection and tier configuration rules.
//!
//! Selection picks the covering workflow with the greatest `min_amount`;
//! overlapping tiers are refused when a workflow is configured, so the
//! tie-break on `created_at` only matters for legacy data.

use rust_decimal::Decimal;
use std::collections::HashSet;

use super::error::ApprovalError;
use super::types::{ApprovalModule, WorkflowDefinition};

/// Stateless workflow selector.
pub struct WorkflowSelector;

impl WorkflowSelector {
    /// Selects the workflow gating a document.
    ///
    /// Among active workflows of `module` covering `amount`, returns the one
    /// with the greatest `min_amount`; ties go to the most recently created.
    ///
    /// # Errors
    ///
    /// Returns `NoWorkflowConfigured` if none match, and `NegativeAmount`
    /// for negative amounts.
    pub fn select(
        workflows: &[WorkflowDefinition],
        module: ApprovalModule,
        amount: Decimal,
    ) -> Result<&WorkflowDefinition, ApprovalError> {
        if amount < Decimal::ZERO {
            return Err(ApprovalError::NegativeAmount(amount));
        }

        workflows
            .iter()
            .filter(|w| w.is_active && w.module == module && w.covers(amount))
            .max_by(|a, b| {
                a.min_amount
                    .cmp(&b.min_amount)
                    .then(a.created_at.cmp(&b.created_at))
                    .then(a.id.cmp(&b.id))
            })
            .ok_or(ApprovalError::NoWorkflowConfigured { module, amount })
    }

    /// Validates a workflow definition before it is stored or activated.
    ///
    /// `existing` may include the candidate itself; it is skipped by id.
    ///
    /// # Errors
    ///
    /// Returns an error for bad bounds, bad steps, or an overlapping tier.
    pub fn validate_definition(
        candidate: &WorkflowDefinition,
        existing: &[WorkflowDefinition],
    ) -> Result<(), ApprovalError> {
        if candidate.min_amount < Decimal::ZERO
            || candidate
                .upper_bound()
                .is_some_and(|max| max < candidate.min_amount)
        {
            return Err(ApprovalError::InvalidAmountRange {
                min: candidate.min_amount,
                max: candidate.max_amount,
            });
        }

        let mut orders = HashSet::new();
        for step in &candidate.steps {
            if !orders.insert(step.step_order) {
                return Err(ApprovalError::DuplicateStepOrder(step.step_order));
            }
        }
        if !candidate.steps.iter().any(|s| !s.is_optional) {
            return Err(ApprovalError::NoRequiredSteps);
        }

        if candidate.is_active
            && let Some(clash) = existing.iter().find(|w| {
                w.id != candidate.id
                    && w.is_active
                    && w.module == candidate.module
                    && Self::ranges_overlap(w, candidate)
            })
        {
            return Err(ApprovalError::OverlappingTier(clash.id));
        }

        Ok(())
    }

    /// Returns true if the two inclusive tiers share at least one amount.
    #[must_use]
    pub fn ranges_overlap(a: &WorkflowDefinition, b: &WorkflowDefinition) -> bool {
        let a_below_b_max = b.upper_bound().is_none_or(|max| a.min_amount <= max);
        let b_below_a_max = a.upper_bound().is_none_or(|max| b.min_amount <= max);
        a_below_b_max && b_below_a_max
    }
}
