//! Error types for the EarnHub core
//!
//! Every failed command surfaces one of these unchanged to the caller and
//! leaves stored state untouched. The core performs no silent recovery.

use crate::{ApprovalStatus, WalletKind};
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for EarnHub core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// EarnHub core error taxonomy
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Referenced user/job/transaction/submission absent
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Amount is zero, negative, or otherwise malformed
    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// Entry was not `pending` at transition time
    #[error("Invalid transition: entry is already {current}")]
    InvalidTransition { current: ApprovalStatus },

    /// Debit exceeds the current wallet balance
    #[error("Insufficient balance in {wallet}: have {available}, need {required}")]
    InsufficientBalance {
        wallet: WalletKind,
        available: Decimal,
        required: Decimal,
    },

    /// Rejection without the required reason
    #[error("A rejection reason is required")]
    MissingReason,

    /// Daily submission cap reached
    #[error("Daily submission quota of {limit} reached")]
    QuotaExceeded { limit: u32 },

    /// User's withdrawals are frozen by a moderator
    #[error("Withdrawals are frozen for this account{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    WithdrawalFrozen { reason: Option<String> },

    /// User has no currently active verification
    #[error("Account is not verified")]
    NotVerified,

    /// Contact identity already registered
    #[error("Identity already registered: {identity}")]
    DuplicateIdentity { identity: String },
}

impl CoreError {
    /// Create a not-found error
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::MissingReason => "MISSING_REASON",
            Self::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            Self::WithdrawalFrozen { .. } => "WITHDRAWAL_FROZEN",
            Self::NotVerified => "NOT_VERIFIED",
            Self::DuplicateIdentity { .. } => "DUPLICATE_IDENTITY",
        }
    }
}
