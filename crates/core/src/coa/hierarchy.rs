//! Account tree rules.
//!
//! The tree is the only source of truth for `is_header`: an account is a
//! header exactly when it has at least one active child.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::CoaError;
use super::types::{AccountNode, NewAccount};

/// Stateless rules for the chart of accounts.
pub struct CoaService;

impl CoaService {
    /// Validates a new account against its parent and returns its level.
    ///
    /// `code_taken` reports whether a live account already uses the code.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is blank, the code is taken, or the parent
    /// is inactive or of a different type.
    pub fn validate_new_account<F>(
        account: &NewAccount,
        parent: Option<&AccountNode>,
        code_taken: F,
    ) -> Result<i32, CoaError>
    where
        F: Fn(&str) -> bool,
    {
        let code = account.code.trim();
        if code.is_empty() {
            return Err(CoaError::EmptyCode);
        }
        if account.name.trim().is_empty() {
            return Err(CoaError::EmptyName);
        }
        if code_taken(code) {
            return Err(CoaError::DuplicateCode(code.to_string()));
        }

        let Some(parent) = parent else {
            if let Some(parent_id) = account.parent_id {
                return Err(CoaError::ParentNotFound(parent_id));
            }
            return Ok(1);
        };

        if !parent.is_active {
            return Err(CoaError::ParentInactive(parent.id));
        }
        let child_type = account.category.account_type();
        if parent.account_type != child_type {
            return Err(CoaError::ParentTypeMismatch {
                parent: parent.account_type,
                child: child_type,
            });
        }

        Ok(parent.level + 1)
    }

    /// Checks that an account may be deactivated or soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if it still has active children or a balance.
    pub fn validate_retirement(
        account: &AccountNode,
        balance: Decimal,
        active_children: usize,
    ) -> Result<(), CoaError> {
        if active_children > 0 {
            return Err(CoaError::HasActiveChildren {
                account_id: account.id,
                count: active_children,
            });
        }
        if !balance.is_zero() {
            return Err(CoaError::NonZeroBalance {
                account_id: account.id,
                balance,
            });
        }
        Ok(())
    }

    /// Lists accounts whose cached `is_header` disagrees with their children.
    #[must_use]
    pub fn header_mismatches(nodes: &[AccountNode]) -> Vec<Uuid> {
        let with_active_children: HashSet<Uuid> = nodes
            .iter()
            .filter(|n| n.is_active)
            .filter_map(|n| n.parent_id)
            .collect();

        nodes
            .iter()
            .filter(|n| n.is_header != with_active_children.contains(&n.id))
            .map(|n| n.id)
            .collect()
    }

    /// Walks parent links from `account_id` upwards, nearest ancestor first.
    ///
    /// # Errors
    ///
    /// Returns `HierarchyCycle` if a parent link revisits an account.
    pub fn ancestors(
        account_id: Uuid,
        parents: &HashMap<Uuid, Option<Uuid>>,
    ) -> Result<Vec<Uuid>, CoaError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([account_id]);
        let mut cursor = parents.get(&account_id).copied().flatten();

        while let Some(id) = cursor {
            if !seen.insert(id) {
                return Err(CoaError::HierarchyCycle(id));
            }
            chain.push(id);
            cursor = parents.get(&id).copied().flatten();
        }

        Ok(chain)
    }
}
