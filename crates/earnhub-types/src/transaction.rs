//! Ledger transaction types
//!
//! A transaction is a discrete money-movement intent with an auditable
//! approval lifecycle. Deposits and withdrawals are born `pending` and only
//! touch wallets on approval; system credits (job rewards and referral
//! bonuses) are born `approved` and credit their wallet at creation.

use crate::{TransactionId, UserId, WalletKind};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Approval lifecycle shared by ledger and workflow entries
///
/// The status is monotonic: `Pending → Approved | Rejected`, never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Check if the entry still awaits moderation
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        write!(f, "{}", name)
    }
}

/// Mobile-money payout channel for withdrawals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Bkash,
    Nagad,
    Rocket,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bkash => "bkash",
            Self::Nagad => "nagad",
            Self::Rocket => "rocket",
        };
        write!(f, "{}", name)
    }
}

/// Kind of money movement, with its kind-specific fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// User-reported deposit awaiting moderation
    Deposit {
        /// External transaction reference supplied by the user
        external_ref: String,
    },
    /// Payout request awaiting moderation
    Withdrawal {
        /// Mobile-money number to pay out to
        payout_number: String,
        method: PaymentMethod,
        /// Wallet the user chose to withdraw from; debited at approval
        wallet: WalletKind,
    },
    /// System-originated task reward (born approved)
    JobReward,
    /// System-originated referral bonus (born approved)
    ReferralBonus,
}

impl TransactionKind {
    /// Check if this kind is system-originated rather than moderator-arbitrated
    pub fn is_system_credit(&self) -> bool {
        matches!(self, Self::JobReward | Self::ReferralBonus)
    }

    pub fn is_deposit(&self) -> bool {
        matches!(self, Self::Deposit { .. })
    }

    pub fn is_withdrawal(&self) -> bool {
        matches!(self, Self::Withdrawal { .. })
    }

    /// Human-readable kind label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Withdrawal { .. } => "withdrawal",
            Self::JobReward => "job-reward",
            Self::ReferralBonus => "referral-bonus",
        }
    }
}

/// System credit channels and the wallet each one feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemCredit {
    JobReward,
    ReferralBonus,
}

impl SystemCredit {
    /// The wallet this credit channel feeds
    pub fn wallet(self) -> WalletKind {
        match self {
            Self::JobReward => WalletKind::JobBalance,
            Self::ReferralBonus => WalletKind::Referral,
        }
    }

    pub fn kind(self) -> TransactionKind {
        match self {
            Self::JobReward => TransactionKind::JobReward,
            Self::ReferralBonus => TransactionKind::ReferralBonus,
        }
    }
}

/// A ledger entry for one money movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    /// Denormalized for moderator tables
    pub user_name: String,
    pub kind: TransactionKind,
    /// Always positive; direction comes from the kind
    pub amount: Decimal,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub details: Option<String>,
    /// Required whenever status is `Rejected`
    pub rejection_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        assert!(ApprovalStatus::Pending.is_pending());
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(ApprovalStatus::Approved.is_terminal());
        assert!(ApprovalStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_kind_predicates() {
        let deposit = TransactionKind::Deposit {
            external_ref: "TX123".to_string(),
        };
        assert!(deposit.is_deposit());
        assert!(!deposit.is_system_credit());
        assert_eq!(deposit.label(), "deposit");

        assert!(TransactionKind::JobReward.is_system_credit());
        assert!(TransactionKind::ReferralBonus.is_system_credit());
    }

    #[test]
    fn test_system_credit_wallets() {
        assert_eq!(SystemCredit::JobReward.wallet(), WalletKind::JobBalance);
        assert_eq!(SystemCredit::ReferralBonus.wallet(), WalletKind::Referral);
        assert_eq!(SystemCredit::JobReward.kind(), TransactionKind::JobReward);
    }
}
