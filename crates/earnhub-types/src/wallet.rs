//! Wallet kinds and the fixed-cardinality per-user wallet set
//!
//! Every user carries one balance per wallet kind. Six kinds are earning
//! channels fed by distinct product surfaces; the seventh (`Deposit`) holds
//! spendable deposit credit and is never a bonus or withdrawal target.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the independently tracked balances per user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WalletKind {
    /// Task reward balance
    JobBalance,
    /// Pro-job earnings (moderator-gated surface)
    ProJob,
    /// Referral bonus balance
    Referral,
    /// Gmail sale proceeds
    Gmail,
    /// Server earnings
    Server,
    /// Salary balance
    Salary,
    /// Spendable deposit credit (funds the verification path)
    Deposit,
}

impl WalletKind {
    /// The six earning wallets, in display order
    pub const EARNING: [WalletKind; 6] = [
        WalletKind::JobBalance,
        WalletKind::ProJob,
        WalletKind::Referral,
        WalletKind::Gmail,
        WalletKind::Server,
        WalletKind::Salary,
    ];

    /// Check if this wallet is an earning channel (bonus/withdrawal target)
    pub fn is_earning(&self) -> bool {
        !matches!(self, Self::Deposit)
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::JobBalance => "jobBalance",
            Self::ProJob => "proJob",
            Self::Referral => "referral",
            Self::Gmail => "gmail",
            Self::Server => "server",
            Self::Salary => "salary",
            Self::Deposit => "deposit",
        };
        write!(f, "{}", name)
    }
}

/// The fixed set of wallet balances owned by one user
///
/// Balances are plain decimals in BDT. The no-negative-balance invariant is
/// enforced by the account store, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSet {
    pub job_balance: Decimal,
    pub pro_job: Decimal,
    pub referral: Decimal,
    pub gmail: Decimal,
    pub server: Decimal,
    pub salary: Decimal,
    pub deposit: Decimal,
}

impl WalletSet {
    /// A wallet set with every balance zeroed
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Get the balance of one wallet
    pub fn get(&self, kind: WalletKind) -> Decimal {
        match kind {
            WalletKind::JobBalance => self.job_balance,
            WalletKind::ProJob => self.pro_job,
            WalletKind::Referral => self.referral,
            WalletKind::Gmail => self.gmail,
            WalletKind::Server => self.server,
            WalletKind::Salary => self.salary,
            WalletKind::Deposit => self.deposit,
        }
    }

    /// Get a mutable reference to one wallet's balance
    pub fn get_mut(&mut self, kind: WalletKind) -> &mut Decimal {
        match kind {
            WalletKind::JobBalance => &mut self.job_balance,
            WalletKind::ProJob => &mut self.pro_job,
            WalletKind::Referral => &mut self.referral,
            WalletKind::Gmail => &mut self.gmail,
            WalletKind::Server => &mut self.server,
            WalletKind::Salary => &mut self.salary,
            WalletKind::Deposit => &mut self.deposit,
        }
    }

    /// Sum of the six earning wallets (excludes deposit credit)
    pub fn earning_total(&self) -> Decimal {
        WalletKind::EARNING
            .iter()
            .map(|&kind| self.get(kind))
            .sum()
    }

    /// Sum of every balance in the set
    pub fn total(&self) -> Decimal {
        self.earning_total() + self.deposit
    }
}
