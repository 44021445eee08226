//! EarnHub Ledger - money-movement intents and their lifecycle
//!
//! The ledger records every deposit, withdrawal, job reward, and referral
//! bonus. Deposits and withdrawals enter `pending` with no balance effect;
//! system credits are born `approved` and credit their wallet in the same
//! operation. Approval-time effects go through the account store's atomic
//! `adjust_wallet_balance`, never a second caller-orchestrated step.
//!
//! # Invariants
//!
//! 1. Entries are append-only; only their status and rejection reason mutate
//! 2. Status is monotonic: pending → approved | rejected
//! 3. Withdrawal sufficiency is checked against the balance at approval
//!    time, not at request time
//! 4. A failed transition leaves the entry and every wallet untouched
//! 5. The entries lock is held across a wallet effect and the status flip
//!    that owns it, so no reader observes one without the other. Lock order
//!    is entries before accounts; the account store never takes the entries
//!    lock.
//!
//! Transition and record calls that read-then-write one user's state must
//! run inside that user's critical section (the engine guarantees this).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, info};

use earnhub_accounts::AccountStore;
use earnhub_types::{
    ApprovalStatus, CoreError, PaymentMethod, Result, SystemCredit, Transaction, TransactionId,
    TransactionKind, UserId, WalletKind,
};

/// The transaction ledger
///
/// Owns a reference to the account store so that every balance effect is
/// applied synchronously with the ledger write it belongs to.
pub struct TransactionLedger {
    accounts: Arc<AccountStore>,
    entries: RwLock<Vec<Transaction>>,
}

impl TransactionLedger {
    /// Create an empty ledger over the given account store
    pub fn new(accounts: Arc<AccountStore>) -> Self {
        Self {
            accounts,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Record a user-reported deposit, status `pending`
    ///
    /// No balance effect until approval. Fails with `InvalidAmount` for
    /// non-positive amounts.
    pub fn record_deposit(
        &self,
        user_id: UserId,
        amount: Decimal,
        external_ref: String,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount { amount });
        }
        let user = self.accounts.get(user_id)?;

        let entry = Transaction {
            id: TransactionId::new(),
            user_id,
            user_name: user.name,
            kind: TransactionKind::Deposit { external_ref },
            amount,
            status: ApprovalStatus::Pending,
            created_at: now,
            details: None,
            rejection_reason: None,
        };
        debug!(tx = %entry.id, user = %user_id, %amount, "deposit recorded");
        self.entries.write().push(entry.clone());
        Ok(entry)
    }

    /// Record a payout request, status `pending`
    ///
    /// Only the six earning wallets are valid sources; deposit credit is not
    /// withdrawable. Fails with `WithdrawalFrozen` if the user's withdrawals
    /// are frozen and `NotVerified` if verification is not currently active.
    /// Balance sufficiency is deliberately not checked here; it is enforced
    /// at approval time against the balance of the moment.
    pub fn record_withdrawal(
        &self,
        user_id: UserId,
        amount: Decimal,
        payout_number: String,
        method: PaymentMethod,
        wallet: WalletKind,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount { amount });
        }
        if !wallet.is_earning() {
            return Err(CoreError::not_found("earning wallet", wallet));
        }
        let user = self.accounts.get(user_id)?;
        if user.is_withdrawal_blocked {
            return Err(CoreError::WithdrawalFrozen {
                reason: user.withdrawal_block_reason,
            });
        }
        if !user.verification_active(now) {
            return Err(CoreError::NotVerified);
        }

        let entry = Transaction {
            id: TransactionId::new(),
            user_id,
            user_name: user.name,
            kind: TransactionKind::Withdrawal {
                payout_number,
                method,
                wallet,
            },
            amount,
            status: ApprovalStatus::Pending,
            created_at: now,
            details: None,
            rejection_reason: None,
        };
        debug!(tx = %entry.id, user = %user_id, %amount, %wallet, "withdrawal requested");
        self.entries.write().push(entry.clone());
        Ok(entry)
    }

    /// Record a system-originated credit, status `approved`
    ///
    /// Credits the channel's wallet and appends the approved entry as one
    /// operation: if the wallet credit fails, no entry is written, and the
    /// entries lock is held across both so readers see neither or both.
    pub fn record_system_credit(
        &self,
        user_id: UserId,
        credit: SystemCredit,
        amount: Decimal,
        details: String,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount { amount });
        }
        let user = self.accounts.get(user_id)?;

        let mut entries = self.entries.write();
        self.accounts
            .adjust_wallet_balance(user_id, credit.wallet(), amount)?;

        let entry = Transaction {
            id: TransactionId::new(),
            user_id,
            user_name: user.name,
            kind: credit.kind(),
            amount,
            status: ApprovalStatus::Approved,
            created_at: now,
            details: Some(details),
            rejection_reason: None,
        };
        info!(tx = %entry.id, user = %user_id, kind = entry.kind.label(), %amount, "system credit");
        entries.push(entry.clone());
        Ok(entry)
    }

    /// Transition a pending entry to `approved` or `rejected`
    ///
    /// Approving a deposit credits the deposit wallet; approving a
    /// withdrawal debits the wallet the user chose, failing with
    /// `InsufficientBalance` (entry stays pending) if the balance of the
    /// moment is short. Rejecting requires a reason and never touches
    /// wallets. The entries lock is held across the balance effect and the
    /// status flip, so no reader observes one without the other.
    pub fn transition(
        &self,
        id: TransactionId,
        new_status: ApprovalStatus,
        reason: Option<String>,
    ) -> Result<Transaction> {
        let mut entries = self.entries.write();
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CoreError::not_found("transaction", id))?;
        if !entry.status.is_pending() {
            return Err(CoreError::InvalidTransition {
                current: entry.status,
            });
        }

        match new_status {
            ApprovalStatus::Pending => Err(CoreError::InvalidTransition {
                current: entry.status,
            }),
            ApprovalStatus::Rejected => {
                let reason = reason
                    .filter(|r| !r.trim().is_empty())
                    .ok_or(CoreError::MissingReason)?;
                info!(tx = %id, %reason, "entry rejected");
                entry.status = ApprovalStatus::Rejected;
                entry.rejection_reason = Some(reason);
                Ok(entry.clone())
            }
            ApprovalStatus::Approved => {
                match &entry.kind {
                    TransactionKind::Deposit { .. } => {
                        self.accounts.adjust_wallet_balance(
                            entry.user_id,
                            WalletKind::Deposit,
                            entry.amount,
                        )?;
                    }
                    TransactionKind::Withdrawal { wallet, .. } => {
                        self.accounts.adjust_wallet_balance(
                            entry.user_id,
                            *wallet,
                            -entry.amount,
                        )?;
                    }
                    // System credits are born approved and never reach here;
                    // the pending check above already rejected them.
                    TransactionKind::JobReward | TransactionKind::ReferralBonus => unreachable!(),
                }
                info!(tx = %id, kind = entry.kind.label(), amount = %entry.amount, "entry approved");
                entry.status = ApprovalStatus::Approved;
                Ok(entry.clone())
            }
        }
    }

    /// Get one entry by id
    pub fn get(&self, id: TransactionId) -> Result<Transaction> {
        self.entries
            .read()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("transaction", id))
    }

    /// All entries, oldest first
    pub fn list(&self) -> Vec<Transaction> {
        self.entries.read().clone()
    }

    /// All entries owned by one user, oldest first
    pub fn for_user(&self, user_id: UserId) -> Vec<Transaction> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    /// All deposit entries
    pub fn deposits(&self) -> Vec<Transaction> {
        self.filtered(|e| e.kind.is_deposit())
    }

    /// All withdrawal entries
    pub fn withdrawals(&self) -> Vec<Transaction> {
        self.filtered(|e| e.kind.is_withdrawal())
    }

    /// All entries with the given status
    pub fn with_status(&self, status: ApprovalStatus) -> Vec<Transaction> {
        self.filtered(|e| e.status == status)
    }

    fn filtered(&self, keep: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
        self.entries
            .read()
            .iter()
            .filter(|e| keep(e))
            .cloned()
            .collect()
    }
}
