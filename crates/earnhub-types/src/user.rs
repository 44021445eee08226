//! User records: identity, status flags, and the wallet set

use crate::{UserId, WalletSet};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Days a granted verification stays active before lazy expiry
pub const VERIFICATION_VALIDITY_DAYS: i64 = 30;

/// A platform user and their wallet state
///
/// Users are soft-state only: they are created at signup and never deleted.
/// Status flags and wallet values are mutated only by the approval engine or
/// an explicit moderator override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Free-text team/leader label captured at signup
    pub leader: String,
    /// Unique code other users sign up with to credit this user
    pub referral_code: String,
    /// Referrer, set at most once at account creation and never retargeted
    pub referred_by: Option<UserId>,
    pub joined_at: DateTime<Utc>,
    /// Verification was granted at some point (see `verification_active`)
    pub is_verified: bool,
    /// When verification was last granted; re-granting resets the window
    pub verification_date: Option<DateTime<Utc>>,
    /// Moderator-gated access to the pro-job surface
    pub pro_job_active: bool,
    /// Login eligibility (sessions already open are unaffected)
    pub is_blocked: bool,
    /// Withdrawal eligibility only, independent of login eligibility
    pub is_withdrawal_blocked: bool,
    pub withdrawal_block_reason: Option<String>,
    pub is_admin: bool,
    pub wallets: WalletSet,
}

impl User {
    /// Whether verification is currently active at `now`
    ///
    /// Expiry is lazy: a grant stays stored and this predicate re-evaluates
    /// it against the 30-day window. The boundary is exclusive, so a user
    /// verified at `T` is active strictly before `T + 30 days` and not at it.
    pub fn verification_active(&self, now: DateTime<Utc>) -> bool {
        self.is_verified
            && self
                .verification_date
                .map(|granted| now < granted + Duration::days(VERIFICATION_VALIDITY_DAYS))
                .unwrap_or(false)
    }

    /// Withdrawal eligibility: currently verified and not frozen
    pub fn can_withdraw(&self, now: DateTime<Utc>) -> bool {
        self.verification_active(now) && !self.is_withdrawal_blocked
    }
}

/// Profile fields supplied at signup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub leader: String,
}
