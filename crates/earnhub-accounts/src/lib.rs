//! EarnHub Accounts - the shared account store
//!
//! Holds user records and their wallet balances and exposes atomic balance
//! mutation. Wallet values and status flags are mutated only by the approval
//! engine or an explicit moderator override.
//!
//! # Invariants
//!
//! 1. Wallet balances never go negative
//! 2. Referral linkage is set at account creation and never retargeted
//! 3. Users are never deleted
//! 4. Each individual mutation is atomic under the store lock; read-then-write
//!    sequences spanning several calls are serialized per user by the engine

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use earnhub_types::{CoreError, NewUserProfile, Result, User, UserId, WalletKind, WalletSet};

pub use earnhub_types::VERIFICATION_VALIDITY_DAYS;

/// The shared account store
///
/// Thread-safe; every public method takes `&self` and locks internally.
pub struct AccountStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl AccountStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new user with zeroed wallets
    ///
    /// Fails with `DuplicateIdentity` if the email or phone is already
    /// registered, and with `NotFound` if `referred_by` names no user.
    /// The check and the insert happen under one write lock.
    pub fn create_user(
        &self,
        profile: NewUserProfile,
        referred_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let mut users = self.users.write();

        let email = profile.email.trim().to_ascii_lowercase();
        if let Some(existing) = users
            .values()
            .find(|u| u.email == email || u.phone == profile.phone)
        {
            let identity = if existing.email == email {
                email
            } else {
                profile.phone
            };
            return Err(CoreError::DuplicateIdentity { identity });
        }

        if let Some(referrer) = referred_by {
            if !users.contains_key(&referrer) {
                return Err(CoreError::not_found("user", referrer));
            }
        }

        let id = UserId::new();
        let user = User {
            id,
            name: profile.name,
            email,
            phone: profile.phone,
            leader: profile.leader,
            referral_code: generate_referral_code(),
            referred_by,
            joined_at: now,
            is_verified: false,
            verification_date: None,
            pro_job_active: false,
            is_blocked: false,
            is_withdrawal_blocked: false,
            withdrawal_block_reason: None,
            is_admin: false,
            wallets: WalletSet::zeroed(),
        };

        debug!(user = %id, name = %user.name, "user created");
        users.insert(id, user.clone());
        Ok(user)
    }

    /// Get a snapshot of one user
    pub fn get(&self, id: UserId) -> Result<User> {
        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("user", id))
    }

    /// Look a user up by their referral code
    pub fn find_by_referral_code(&self, code: &str) -> Option<User> {
        self.users
            .read()
            .values()
            .find(|u| u.referral_code == code)
            .cloned()
    }

    /// Snapshot of every user, in no particular order
    pub fn list(&self) -> Vec<User> {
        self.users.read().values().cloned().collect()
    }

    /// Overwrite one wallet's balance (privileged moderator override)
    ///
    /// Returns the new balance. Fails with `InvalidAmount` for negative
    /// values and `NotFound` for unknown users.
    pub fn set_wallet_balance(
        &self,
        id: UserId,
        wallet: WalletKind,
        value: Decimal,
    ) -> Result<Decimal> {
        if value < Decimal::ZERO {
            return Err(CoreError::InvalidAmount { amount: value });
        }

        let mut users = self.users.write();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("user", id))?;

        *user.wallets.get_mut(wallet) = value;
        debug!(user = %id, %wallet, %value, "wallet balance overridden");
        Ok(value)
    }

    /// Atomically add `delta` to one wallet's balance
    ///
    /// The delta may be negative only if the result stays non-negative;
    /// otherwise fails with `InsufficientBalance` and changes nothing.
    /// This is the only mutation path the approval engine uses.
    pub fn adjust_wallet_balance(
        &self,
        id: UserId,
        wallet: WalletKind,
        delta: Decimal,
    ) -> Result<Decimal> {
        let mut users = self.users.write();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("user", id))?;

        let current = user.wallets.get(wallet);
        let new_balance = current + delta;
        if new_balance < Decimal::ZERO {
            return Err(CoreError::InsufficientBalance {
                wallet,
                available: current,
                required: -delta,
            });
        }

        *user.wallets.get_mut(wallet) = new_balance;
        debug!(user = %id, %wallet, %delta, balance = %new_balance, "wallet adjusted");
        Ok(new_balance)
    }

    /// Toggle login eligibility
    ///
    /// Independent of the withdrawal freeze; already-open sessions are not
    /// invalidated retroactively.
    pub fn set_blocked(&self, id: UserId, blocked: bool) -> Result<()> {
        let mut users = self.users.write();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("user", id))?;
        user.is_blocked = blocked;
        Ok(())
    }

    /// Toggle the withdrawal freeze; unfreezing clears the reason
    pub fn set_withdrawal_blocked(
        &self,
        id: UserId,
        blocked: bool,
        reason: Option<String>,
    ) -> Result<()> {
        let mut users = self.users.write();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("user", id))?;
        user.is_withdrawal_blocked = blocked;
        user.withdrawal_block_reason = if blocked { reason } else { None };
        Ok(())
    }

    /// Toggle the moderator-gated pro-job surface
    pub fn set_pro_job(&self, id: UserId, active: bool) -> Result<()> {
        let mut users = self.users.write();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("user", id))?;
        user.pro_job_active = active;
        Ok(())
    }

    /// Grant verification as of `at`
    ///
    /// Idempotent: re-granting resets the 30-day window.
    pub fn grant_verification(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        let mut users = self.users.write();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("user", id))?;
        user.is_verified = true;
        user.verification_date = Some(at);
        debug!(user = %id, granted_at = %at, "verification granted");
        Ok(())
    }

    /// Pure derived predicate: verification granted and still inside the
    /// 30-day window at `now`. Does not mutate stored state.
    pub fn is_currently_verified(&self, id: UserId, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.get(id)?.verification_active(now))
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Short, unique referral code handed out at signup
fn generate_referral_code() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("EH-{}", raw[..8].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn profile(name: &str, email: &str, phone: &str) -> NewUserProfile {
        NewUserProfile {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            leader: "Team A".to_string(),
        }
    }

    fn new_user(store: &AccountStore) -> User {
        store
            .create_user(
                profile("Rahim", "rahim@example.com", "01700000001"),
                None,
                Utc::now(),
            )
            .unwrap()
    }

    #[test]
    fn test_create_user_zeroes_wallets() {
        let store = AccountStore::new();
        let user = new_user(&store);
        assert_eq!(user.wallets.total(), Decimal::ZERO);
        assert!(!user.is_verified);
        assert!(user.referral_code.starts_with("EH-"));
    }

    #[test]
    fn test_duplicate_identity() {
        let store = AccountStore::new();
        new_user(&store);

        let same_email = store.create_user(
            profile("Other", "RAHIM@example.com", "01700000099"),
            None,
            Utc::now(),
        );
        assert!(matches!(same_email, Err(CoreError::DuplicateIdentity { .. })));

        let same_phone = store.create_user(
            profile("Other", "other@example.com", "01700000001"),
            None,
            Utc::now(),
        );
        assert!(matches!(same_phone, Err(CoreError::DuplicateIdentity { .. })));
    }

    #[test]
    fn test_referrer_must_exist() {
        let store = AccountStore::new();
        let ghost = UserId::new();
        let result = store.create_user(
            profile("Rahim", "rahim@example.com", "01700000001"),
            Some(ghost),
            Utc::now(),
        );
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn test_adjust_balance() {
        let store = AccountStore::new();
        let user = new_user(&store);

        let balance = store
            .adjust_wallet_balance(user.id, WalletKind::JobBalance, dec!(50))
            .unwrap();
        assert_eq!(balance, dec!(50));

        let balance = store
            .adjust_wallet_balance(user.id, WalletKind::JobBalance, dec!(-20))
            .unwrap();
        assert_eq!(balance, dec!(30));
    }

    #[test]
    fn test_no_negative_balance() {
        let store = AccountStore::new();
        let user = new_user(&store);
        store
            .adjust_wallet_balance(user.id, WalletKind::Referral, dec!(10))
            .unwrap();

        let result = store.adjust_wallet_balance(user.id, WalletKind::Referral, dec!(-10.01));
        assert!(matches!(result, Err(CoreError::InsufficientBalance { .. })));

        // Failed debit left the balance untouched
        assert_eq!(
            store.get(user.id).unwrap().wallets.get(WalletKind::Referral),
            dec!(10)
        );
    }

    #[test]
    fn test_set_balance_rejects_negative() {
        let store = AccountStore::new();
        let user = new_user(&store);
        let result = store.set_wallet_balance(user.id, WalletKind::Salary, dec!(-1));
        assert!(matches!(result, Err(CoreError::InvalidAmount { .. })));
    }

    #[test]
    fn test_verification_window() {
        let store = AccountStore::new();
        let user = new_user(&store);
        let granted = Utc::now();
        store.grant_verification(user.id, granted).unwrap();

        assert!(store
            .is_currently_verified(user.id, granted + Duration::days(29))
            .unwrap());
        assert!(!store
            .is_currently_verified(user.id, granted + Duration::days(30))
            .unwrap());

        // Re-granting resets the window
        let regranted = granted + Duration::days(30);
        store.grant_verification(user.id, regranted).unwrap();
        assert!(store
            .is_currently_verified(user.id, regranted + Duration::days(29))
            .unwrap());
    }

    #[test]
    fn test_unfreeze_clears_reason() {
        let store = AccountStore::new();
        let user = new_user(&store);

        store
            .set_withdrawal_blocked(user.id, true, Some("chargeback review".to_string()))
            .unwrap();
        let frozen = store.get(user.id).unwrap();
        assert!(frozen.is_withdrawal_blocked);
        assert_eq!(
            frozen.withdrawal_block_reason.as_deref(),
            Some("chargeback review")
        );

        store.set_withdrawal_blocked(user.id, false, None).unwrap();
        let thawed = store.get(user.id).unwrap();
        assert!(!thawed.is_withdrawal_blocked);
        assert!(thawed.withdrawal_block_reason.is_none());
    }

    #[test]
    fn test_find_by_referral_code() {
        let store = AccountStore::new();
        let user = new_user(&store);
        let found = store.find_by_referral_code(&user.referral_code).unwrap();
        assert_eq!(found.id, user.id);
        assert!(store.find_by_referral_code("EH-NOPE").is_none());
    }
}
