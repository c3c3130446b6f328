//! Chart of accounts error types.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::types::AccountType;

/// Errors raised while maintaining the account tree.
#[derive(Debug, Error)]
pub enum CoaError {
    /// Account code is blank.
    #[error("Account code is required")]
    EmptyCode,

    /// Account name is blank.
    #[error("Account name is required")]
    EmptyName,

    /// A live account already uses this code.
    #[error("Account code {0} is already in use")]
    DuplicateCode(String),

    /// Parent account does not exist or was deleted.
    #[error("Parent account {0} not found")]
    ParentNotFound(Uuid),

    /// Children must share their parent's type.
    #[error("Account type {child} does not match parent type {parent}")]
    ParentTypeMismatch {
        /// Parent's type.
        parent: AccountType,
        /// Requested type.
        child: AccountType,
    },

    /// Cannot attach children to an inactive account.
    #[error("Parent account {0} is inactive")]
    ParentInactive(Uuid),

    /// Account not found.
    #[error("Account {0} not found")]
    AccountNotFound(Uuid),

    /// Only zero-balance accounts may be retired.
    #[error("Account {account_id} still carries balance {balance}")]
    NonZeroBalance {
        /// The account.
        account_id: Uuid,
        /// Its cached balance.
        balance: Decimal,
    },

    /// Only accounts without active children may be retired.
    #[error("Account {account_id} has {count} active child account(s)")]
    HasActiveChildren {
        /// The account.
        account_id: Uuid,
        /// Number of active children.
        count: usize,
    },

    /// Parent links loop back on themselves.
    #[error("Account hierarchy contains a cycle at {0}")]
    HierarchyCycle(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl CoaError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::EmptyCode
            | Self::EmptyName
            | Self::ParentTypeMismatch { .. }
            | Self::ParentInactive(_) => 400,
            Self::ParentNotFound(_) | Self::AccountNotFound(_) => 404,
            Self::DuplicateCode(_)
            | Self::NonZeroBalance { .. }
            | Self::HasActiveChildren { .. } => 409,
            Self::HierarchyCycle(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyCode => "EMPTY_ACCOUNT_CODE",
            Self::EmptyName => "EMPTY_ACCOUNT_NAME",
            Self::DuplicateCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::ParentTypeMismatch { .. } => "PARENT_TYPE_MISMATCH",
            Self::ParentInactive(_) => "PARENT_INACTIVE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::NonZeroBalance { .. } => "NON_ZERO_BALANCE",
            Self::HasActiveChildren { .. } => "HAS_ACTIVE_CHILDREN",
            Self::HierarchyCycle(_) => "HIERARCHY_CYCLE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
