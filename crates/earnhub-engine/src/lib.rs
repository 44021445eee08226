//! EarnHub Engine - the approval engine
//!
//! The engine is the single path by which a pending entry leaves that state
//! and the only component permitted to mutate wallet balances as a side
//! effect of a status transition. Every approval or rejection is one atomic
//! unit of work: validate the status, validate the business preconditions,
//! apply the wallet/account side effect, flip the status, and emit a
//! notification where applicable.
//!
//! # Concurrency
//!
//! Commands that read-then-write one user's wallets or flags run inside that
//! user's exclusive critical section: a lock keyed by user id in a `DashMap`.
//! Unrelated users proceed in parallel; two commands against the same user
//! serialize. The gmail quota check and the submission it gates share the
//! same guard. A failed command returns before any mutation, so callers
//! observe either the pre-command state or the fully post-command state.
//!
//! The engine is an injected service instance: construct it, share it via
//! `Arc`, and call methods. There is no ambient singleton.

pub mod clock;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tracing::info;

use earnhub_accounts::AccountStore;
use earnhub_ledger::TransactionLedger;
use earnhub_notify::{NoticeBoard, NotificationStore};
use earnhub_workflow::{JobCatalog, SubmissionStore};

pub use clock::{Clock, SystemClock};
pub use earnhub_types::{
    AppSettings, ApprovalStatus, CoreError, GmailSubmission, Job, JobId, JobSubmission,
    NewJob, NewUserProfile, Notice, NoticeId, Notification, NotificationKind, PaymentMethod,
    PaymentNumbers, Result, SubmissionId, SubmittedProof, TelegramLinks, Transaction,
    TransactionId, User, UserId, WalletKind,
};

use earnhub_types::SystemCredit;

/// The approval engine and platform facade
pub struct ApprovalEngine {
    accounts: Arc<AccountStore>,
    ledger: Arc<TransactionLedger>,
    jobs: Arc<JobCatalog>,
    submissions: Arc<SubmissionStore>,
    notifications: Arc<NotificationStore>,
    notices: Arc<NoticeBoard>,
    settings: RwLock<AppSettings>,
    clock: Arc<dyn Clock>,
    user_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl ApprovalEngine {
    /// Create an engine over fresh in-memory stores
    pub fn new(settings: AppSettings, clock: Arc<dyn Clock>) -> Self {
        let accounts = Arc::new(AccountStore::new());
        Self {
            ledger: Arc::new(TransactionLedger::new(accounts.clone())),
            accounts,
            jobs: Arc::new(JobCatalog::new()),
            submissions: Arc::new(SubmissionStore::new()),
            notifications: Arc::new(NotificationStore::new()),
            notices: Arc::new(NoticeBoard::new()),
            settings: RwLock::new(settings),
            clock,
            user_locks: DashMap::new(),
        }
    }

    /// Create an engine on the real system clock
    pub fn with_system_clock(settings: AppSettings) -> Self {
        Self::new(settings, Arc::new(SystemClock))
    }

    /// The per-user critical section guard
    fn user_lock(&self, id: UserId) -> Arc<Mutex<()>> {
        self.user_locks.entry(id).or_default().clone()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ------------------------------------------------------------------
    // Signup & referral
    // ------------------------------------------------------------------

    /// Register a new user, crediting the referrer's bonus if any
    ///
    /// The bonus is unconditional at signup: it does not wait for the
    /// referred user's verification or first deposit. It lands as a
    /// born-approved referral-bonus ledger entry under the referrer's
    /// critical section.
    pub fn sign_up(
        &self,
        profile: NewUserProfile,
        referred_by: Option<UserId>,
    ) -> Result<User> {
        let now = self.now();
        let user = self.accounts.create_user(profile, referred_by, now)?;
        info!(user = %user.id, name = %user.name, "signup");

        if let Some(referrer) = user.referred_by {
            let bonus = self.settings.read().referral_bonus;
            if bonus > Decimal::ZERO {
                let cell = self.user_lock(referrer);
                let _guard = cell.lock();
                self.ledger.record_system_credit(
                    referrer,
                    SystemCredit::ReferralBonus,
                    bonus,
                    format!("Referral bonus for inviting {}", user.name),
                    now,
                )?;
            }
        }

        self.notifications.emit(
            NotificationKind::Signup,
            format!("New user signup: {}", user.name),
            "/admin/users",
            now,
        );
        Ok(user)
    }

    /// Resolve a referral code to its owner, for the signup form
    pub fn referrer_by_code(&self, code: &str) -> Option<User> {
        self.accounts.find_by_referral_code(code)
    }

    // ------------------------------------------------------------------
    // Ledger commands
    // ------------------------------------------------------------------

    /// Record a user-reported deposit and notify moderators
    pub fn request_deposit(
        &self,
        user_id: UserId,
        amount: Decimal,
        external_ref: String,
    ) -> Result<Transaction> {
        let now = self.now();
        let cell = self.user_lock(user_id);
        let _guard = cell.lock();

        let tx = self.ledger.record_deposit(user_id, amount, external_ref, now)?;
        self.notifications.emit(
            NotificationKind::Deposit,
            format!("New deposit request from {}", tx.user_name),
            "/admin/deposits",
            now,
        );
        Ok(tx)
    }

    /// Record a payout request
    pub fn request_withdrawal(
        &self,
        user_id: UserId,
        amount: Decimal,
        payout_number: String,
        method: PaymentMethod,
        wallet: WalletKind,
    ) -> Result<Transaction> {
        let now = self.now();
        let cell = self.user_lock(user_id);
        let _guard = cell.lock();
        self.ledger
            .record_withdrawal(user_id, amount, payout_number, method, wallet, now)
    }

    /// Approve a pending transaction, applying its balance effect
    ///
    /// Approving a deposit also activates verification for the owning user,
    /// atomically with the approval.
    pub fn approve_transaction(&self, id: TransactionId) -> Result<Transaction> {
        let pending = self.ledger.get(id)?;
        let now = self.now();
        let cell = self.user_lock(pending.user_id);
        let _guard = cell.lock();

        let tx = self.ledger.transition(id, ApprovalStatus::Approved, None)?;
        if tx.kind.is_deposit() {
            self.accounts.grant_verification(tx.user_id, now)?;
        }
        info!(tx = %id, kind = tx.kind.label(), "transaction approved");
        Ok(tx)
    }

    /// Reject a pending transaction with a reason
    pub fn reject_transaction(&self, id: TransactionId, reason: String) -> Result<Transaction> {
        let pending = self.ledger.get(id)?;
        let cell = self.user_lock(pending.user_id);
        let _guard = cell.lock();
        self.ledger
            .transition(id, ApprovalStatus::Rejected, Some(reason))
    }

    // ------------------------------------------------------------------
    // Workflow commands
    // ------------------------------------------------------------------

    /// Submit proofs for a task
    ///
    /// Only currently verified users may enter the task-reward flow.
    pub fn submit_job_proofs(
        &self,
        user_id: UserId,
        job_id: JobId,
        proofs: Vec<SubmittedProof>,
    ) -> Result<JobSubmission> {
        let now = self.now();
        let cell = self.user_lock(user_id);
        let _guard = cell.lock();

        let user = self.accounts.get(user_id)?;
        if !user.verification_active(now) {
            return Err(CoreError::NotVerified);
        }
        let job = self.jobs.get(job_id)?;

        let sub = self.submissions.submit_job(&user, &job, proofs, now)?;
        self.notifications.emit(
            NotificationKind::Submission,
            format!("{} submitted proofs for \"{}\"", user.name, job.title),
            "/admin/submissions",
            now,
        );
        Ok(sub)
    }

    /// Submit a gmail credential sale, subject to the daily quota
    pub fn submit_gmail_sale(
        &self,
        user_id: UserId,
        gmail_address: String,
        password: String,
        recovery_phone: String,
    ) -> Result<GmailSubmission> {
        let now = self.now();
        let limit = self.settings.read().gmail_daily_limit;
        let cell = self.user_lock(user_id);
        let _guard = cell.lock();

        let user = self.accounts.get(user_id)?;
        let sub = self.submissions.submit_gmail(
            &user,
            gmail_address,
            password,
            recovery_phone,
            limit,
            now,
        )?;
        self.notifications.emit(
            NotificationKind::Submission,
            format!("{} submitted a gmail sale", user.name),
            "/admin/gmail-sales",
            now,
        );
        Ok(sub)
    }

    /// Approve a pending job submission, crediting the job's reward
    ///
    /// The credit lands in the user's job balance via a born-approved
    /// job-reward ledger entry, exactly once per submission. The credit runs
    /// under the submission store's lock so neither it nor the flip is
    /// visible without the other.
    pub fn approve_job_submission(&self, id: SubmissionId) -> Result<JobSubmission> {
        let pending = self.submissions.get_job_submission(id)?;
        let now = self.now();
        let cell = self.user_lock(pending.user_id);
        let _guard = cell.lock();

        let sub = self.submissions.get_job_submission(id)?;
        let job = self.jobs.get(sub.job_id)?;

        self.submissions.approve_job(id, || {
            self.ledger.record_system_credit(
                sub.user_id,
                SystemCredit::JobReward,
                job.reward,
                format!("Reward: {}", sub.job_title),
                now,
            )
        })
    }

    /// Reject a pending job submission; the reason is optional
    pub fn reject_job_submission(
        &self,
        id: SubmissionId,
        reason: Option<String>,
    ) -> Result<JobSubmission> {
        let pending = self.submissions.get_job_submission(id)?;
        let cell = self.user_lock(pending.user_id);
        let _guard = cell.lock();
        self.submissions.reject_job(id, reason)
    }

    /// Approve a pending gmail sale at the given price
    ///
    /// `price` defaults to the configured sell price; the chosen price is
    /// stored on the record and credited to the user's gmail wallet under
    /// the submission store's lock.
    pub fn approve_gmail_sale(
        &self,
        id: SubmissionId,
        price: Option<Decimal>,
    ) -> Result<GmailSubmission> {
        let pending = self.submissions.get_gmail_submission(id)?;
        let price = price.unwrap_or_else(|| self.settings.read().gmail_sell_price);
        let cell = self.user_lock(pending.user_id);
        let _guard = cell.lock();

        self.submissions.approve_gmail(id, price, || {
            self.accounts
                .adjust_wallet_balance(pending.user_id, WalletKind::Gmail, price)
        })
    }

    /// Reject a pending gmail sale; a reason is required
    pub fn reject_gmail_sale(&self, id: SubmissionId, reason: String) -> Result<GmailSubmission> {
        let pending = self.submissions.get_gmail_submission(id)?;
        let cell = self.user_lock(pending.user_id);
        let _guard = cell.lock();
        self.submissions.reject_gmail(id, reason)
    }

    // ------------------------------------------------------------------
    // Moderator account commands
    // ------------------------------------------------------------------

    /// Credit a bonus into one of the six earning wallets
    pub fn send_bonus(
        &self,
        user_id: UserId,
        wallet: WalletKind,
        amount: Decimal,
    ) -> Result<Decimal> {
        if !wallet.is_earning() {
            return Err(CoreError::not_found("earning wallet", wallet));
        }
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount { amount });
        }
        let cell = self.user_lock(user_id);
        let _guard = cell.lock();
        info!(user = %user_id, %wallet, %amount, "bonus sent");
        self.accounts.adjust_wallet_balance(user_id, wallet, amount)
    }

    /// Privileged balance override for one wallet
    pub fn override_wallet_balance(
        &self,
        user_id: UserId,
        wallet: WalletKind,
        value: Decimal,
    ) -> Result<Decimal> {
        let cell = self.user_lock(user_id);
        let _guard = cell.lock();
        self.accounts.set_wallet_balance(user_id, wallet, value)
    }

    /// Toggle login eligibility
    pub fn set_user_blocked(&self, user_id: UserId, blocked: bool) -> Result<()> {
        let cell = self.user_lock(user_id);
        let _guard = cell.lock();
        self.accounts.set_blocked(user_id, blocked)
    }

    /// Toggle the withdrawal freeze; unfreezing clears the reason
    pub fn set_withdrawal_blocked(
        &self,
        user_id: UserId,
        blocked: bool,
        reason: Option<String>,
    ) -> Result<()> {
        let cell = self.user_lock(user_id);
        let _guard = cell.lock();
        self.accounts.set_withdrawal_blocked(user_id, blocked, reason)
    }

    /// Toggle the pro-job surface for one user
    pub fn set_pro_job(&self, user_id: UserId, active: bool) -> Result<()> {
        let cell = self.user_lock(user_id);
        let _guard = cell.lock();
        self.accounts.set_pro_job(user_id, active)
    }

    // ------------------------------------------------------------------
    // Eligibility & queries
    // ------------------------------------------------------------------

    /// Whether the user may initiate withdrawals right now
    pub fn withdrawal_eligibility(&self, user_id: UserId) -> Result<bool> {
        Ok(self.accounts.get(user_id)?.can_withdraw(self.now()))
    }

    /// Whether the user may enter the task-reward flow right now
    pub fn job_access(&self, user_id: UserId) -> Result<bool> {
        self.accounts.is_currently_verified(user_id, self.now())
    }

    pub fn user(&self, id: UserId) -> Result<User> {
        self.accounts.get(id)
    }

    pub fn users(&self) -> Vec<User> {
        self.accounts.list()
    }

    pub fn transaction(&self, id: TransactionId) -> Result<Transaction> {
        self.ledger.get(id)
    }

    pub fn transactions_for_user(&self, user_id: UserId) -> Vec<Transaction> {
        self.ledger.for_user(user_id)
    }

    pub fn deposits(&self) -> Vec<Transaction> {
        self.ledger.deposits()
    }

    pub fn withdrawals(&self) -> Vec<Transaction> {
        self.ledger.withdrawals()
    }

    pub fn transactions_with_status(&self, status: ApprovalStatus) -> Vec<Transaction> {
        self.ledger.with_status(status)
    }

    pub fn job_submissions(&self) -> Vec<JobSubmission> {
        self.submissions.job_submissions()
    }

    pub fn job_submissions_for_user(&self, user_id: UserId) -> Vec<JobSubmission> {
        self.submissions.job_submissions_for_user(user_id)
    }

    pub fn gmail_submissions(&self) -> Vec<GmailSubmission> {
        self.submissions.gmail_submissions()
    }

    pub fn gmail_submissions_for_user(&self, user_id: UserId) -> Vec<GmailSubmission> {
        self.submissions.gmail_submissions_for_user(user_id)
    }

    // ------------------------------------------------------------------
    // Job catalog
    // ------------------------------------------------------------------

    pub fn create_job(&self, job: NewJob) -> Result<Job> {
        self.jobs.create(job)
    }

    pub fn update_job(&self, job: Job) -> Result<Job> {
        self.jobs.update(job)
    }

    pub fn remove_job(&self, id: JobId) -> Result<()> {
        self.jobs.remove(id)
    }

    pub fn job(&self, id: JobId) -> Result<Job> {
        self.jobs.get(id)
    }

    pub fn list_jobs(&self) -> Vec<Job> {
        self.jobs.list()
    }

    // ------------------------------------------------------------------
    // Notices & notifications
    // ------------------------------------------------------------------

    pub fn publish_notice(&self, title: String, content: String) -> Notice {
        self.notices.publish(title, content, self.now())
    }

    pub fn update_notice(&self, id: NoticeId, title: String, content: String) -> Result<Notice> {
        self.notices.update(id, title, content)
    }

    pub fn set_notice_active(&self, id: NoticeId, active: bool) -> Result<()> {
        self.notices.set_active(id, active)
    }

    pub fn remove_notice(&self, id: NoticeId) -> Result<()> {
        self.notices.remove(id)
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.list()
    }

    pub fn active_notices(&self) -> Vec<Notice> {
        self.notices.active()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.list()
    }

    pub fn notifications_of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.notifications.of_kind(kind)
    }

    pub fn unread_notification_count(&self) -> usize {
        self.notifications.unread_count()
    }

    pub fn mark_all_notifications_read(&self) {
        self.notifications.mark_all_read()
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Snapshot of the current settings
    pub fn settings(&self) -> AppSettings {
        self.settings.read().clone()
    }

    pub fn set_verification_fee(&self, fee: Decimal) {
        self.settings.write().set_verification_fee(fee);
    }

    pub fn set_referral_bonus(&self, bonus: Decimal) {
        self.settings.write().set_referral_bonus(bonus);
    }

    pub fn set_gmail_sell_price(&self, price: Decimal) {
        self.settings.write().set_gmail_sell_price(price);
    }

    pub fn set_gmail_daily_limit(&self, limit: u32) {
        self.settings.write().set_gmail_daily_limit(limit);
    }

    pub fn set_payment_numbers(&self, numbers: PaymentNumbers) {
        self.settings.write().set_payment_numbers(numbers);
    }

    pub fn set_telegram_links(&self, links: TelegramLinks) {
        self.settings.write().set_telegram_links(links);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use earnhub_types::{ProofKind, ProofSpec};
    use rust_decimal_macros::dec;
    use std::thread;

    /// Test clock that only moves when told to
    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn starting_at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self { now: Mutex::new(now) })
        }

        fn advance(&self, by: Duration) {
            *self.now.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock()
        }
    }

    fn start() -> (Arc<ApprovalEngine>, Arc<ManualClock>) {
        let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let engine = Arc::new(ApprovalEngine::new(AppSettings::default(), clock.clone()));
        (engine, clock)
    }

    fn profile(name: &str, email: &str, phone: &str) -> NewUserProfile {
        NewUserProfile {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            leader: "Team A".to_string(),
        }
    }

    fn signed_up(engine: &ApprovalEngine) -> User {
        engine
            .sign_up(profile("Rahim", "rahim@example.com", "01700000001"), None)
            .unwrap()
    }

    fn verified(engine: &ApprovalEngine) -> User {
        let user = signed_up(engine);
        let tx = engine
            .request_deposit(user.id, dec!(100), "TX-VERIFY".to_string())
            .unwrap();
        engine.approve_transaction(tx.id).unwrap();
        engine.user(user.id).unwrap()
    }

    fn sample_job(engine: &ApprovalEngine, reward: Decimal) -> Job {
        engine
            .create_job(NewJob {
                title: "Subscribe and screenshot".to_string(),
                description: "Subscribe to the channel".to_string(),
                thumbnail: String::new(),
                reward,
                proof_specs: vec![ProofSpec {
                    kind: ProofKind::Image,
                    label: "Screenshot".to_string(),
                }],
                task_url: None,
                rules: None,
            })
            .unwrap()
    }

    #[test]
    fn test_deposit_approval_activates_verification() {
        let (engine, clock) = start();
        let user = signed_up(&engine);
        assert!(!engine.job_access(user.id).unwrap());

        let tx = engine
            .request_deposit(user.id, dec!(100), "TX1".to_string())
            .unwrap();
        engine.approve_transaction(tx.id).unwrap();

        assert!(engine.job_access(user.id).unwrap());
        assert_eq!(
            engine.user(user.id).unwrap().wallets.get(WalletKind::Deposit),
            dec!(100)
        );

        // Verification lapses 30 days later, without any stored mutation
        clock.advance(Duration::days(30));
        assert!(!engine.job_access(user.id).unwrap());
    }

    #[test]
    fn test_double_approval_credits_once() {
        let (engine, _clock) = start();
        let user = signed_up(&engine);
        let tx = engine
            .request_deposit(user.id, dec!(100), "TX1".to_string())
            .unwrap();

        engine.approve_transaction(tx.id).unwrap();
        let second = engine.approve_transaction(tx.id);
        assert!(matches!(second, Err(CoreError::InvalidTransition { .. })));
        assert_eq!(
            engine.user(user.id).unwrap().wallets.get(WalletKind::Deposit),
            dec!(100)
        );
    }

    #[test]
    fn test_referral_bonus_at_signup() {
        let (engine, _clock) = start();
        let referrer = signed_up(&engine);
        let referred = engine
            .sign_up(
                profile("Karim", "karim@example.com", "01800000002"),
                Some(referrer.id),
            )
            .unwrap();
        assert_eq!(referred.referred_by, Some(referrer.id));

        let wallets = engine.user(referrer.id).unwrap().wallets;
        assert_eq!(wallets.get(WalletKind::Referral), dec!(25));

        let bonuses: Vec<Transaction> = engine
            .transactions_for_user(referrer.id)
            .into_iter()
            .filter(|t| t.kind.label() == "referral-bonus")
            .collect();
        assert_eq!(bonuses.len(), 1);
        assert_eq!(bonuses[0].status, ApprovalStatus::Approved);
    }

    #[test]
    fn test_job_approval_credits_reward_exactly_once() {
        let (engine, _clock) = start();
        let user = verified(&engine);
        let job = sample_job(&engine, dec!(50.00));

        let sub = engine
            .submit_job_proofs(
                user.id,
                job.id,
                vec![SubmittedProof {
                    kind: ProofKind::Image,
                    label: "Screenshot".to_string(),
                    value: "aGVsbG8=".to_string(),
                }],
            )
            .unwrap();
        engine.approve_job_submission(sub.id).unwrap();

        assert_eq!(
            engine
                .user(user.id)
                .unwrap()
                .wallets
                .get(WalletKind::JobBalance),
            dec!(50.00)
        );
        let rewards: Vec<Transaction> = engine
            .transactions_for_user(user.id)
            .into_iter()
            .filter(|t| t.kind.label() == "job-reward")
            .collect();
        assert_eq!(rewards.len(), 1);

        let again = engine.approve_job_submission(sub.id);
        assert!(matches!(again, Err(CoreError::InvalidTransition { .. })));
        assert_eq!(
            engine
                .user(user.id)
                .unwrap()
                .wallets
                .get(WalletKind::JobBalance),
            dec!(50.00)
        );
    }

    #[test]
    fn test_unverified_user_cannot_submit_proofs() {
        let (engine, _clock) = start();
        let user = signed_up(&engine);
        let job = sample_job(&engine, dec!(50));
        let result = engine.submit_job_proofs(user.id, job.id, vec![]);
        assert!(matches!(result, Err(CoreError::NotVerified)));
    }

    #[test]
    fn test_gmail_quota_and_next_day_reset() {
        let (engine, clock) = start();
        let user = signed_up(&engine);

        for i in 0..5 {
            engine
                .submit_gmail_sale(
                    user.id,
                    format!("sold{i}@gmail.com"),
                    "hunter2".to_string(),
                    "01900000003".to_string(),
                )
                .unwrap();
        }
        let sixth = engine.submit_gmail_sale(
            user.id,
            "sold5@gmail.com".to_string(),
            "hunter2".to_string(),
            "01900000003".to_string(),
        );
        assert!(matches!(sixth, Err(CoreError::QuotaExceeded { limit: 5 })));

        clock.advance(Duration::days(1));
        assert!(engine
            .submit_gmail_sale(
                user.id,
                "sold6@gmail.com".to_string(),
                "hunter2".to_string(),
                "01900000003".to_string(),
            )
            .is_ok());
    }

    #[test]
    fn test_gmail_approval_defaults_to_configured_price() {
        let (engine, _clock) = start();
        let user = signed_up(&engine);
        let sub = engine
            .submit_gmail_sale(
                user.id,
                "sold@gmail.com".to_string(),
                "hunter2".to_string(),
                "01900000003".to_string(),
            )
            .unwrap();

        let approved = engine.approve_gmail_sale(sub.id, None).unwrap();
        assert_eq!(approved.price, Some(dec!(120)));
        assert_eq!(
            engine.user(user.id).unwrap().wallets.get(WalletKind::Gmail),
            dec!(120)
        );
    }

    #[test]
    fn test_gmail_approval_with_override_price() {
        let (engine, _clock) = start();
        let user = signed_up(&engine);
        let sub = engine
            .submit_gmail_sale(
                user.id,
                "sold@gmail.com".to_string(),
                "hunter2".to_string(),
                "01900000003".to_string(),
            )
            .unwrap();

        let approved = engine.approve_gmail_sale(sub.id, Some(dec!(150))).unwrap();
        assert_eq!(approved.price, Some(dec!(150)));
    }

    #[test]
    fn test_gmail_rejection_requires_reason_and_moves_no_money() {
        let (engine, _clock) = start();
        let user = signed_up(&engine);
        let sub = engine
            .submit_gmail_sale(
                user.id,
                "sold@gmail.com".to_string(),
                "hunter2".to_string(),
                "01900000003".to_string(),
            )
            .unwrap();

        engine
            .reject_gmail_sale(sub.id, "Recovery phone invalid".to_string())
            .unwrap();
        assert_eq!(
            engine.user(user.id).unwrap().wallets.get(WalletKind::Gmail),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_rejected_withdrawal_changes_no_balance() {
        let (engine, _clock) = start();
        let user = verified(&engine);
        engine
            .send_bonus(user.id, WalletKind::JobBalance, dec!(100))
            .unwrap();

        let tx = engine
            .request_withdrawal(
                user.id,
                dec!(80),
                "01700000001".to_string(),
                PaymentMethod::Bkash,
                WalletKind::JobBalance,
            )
            .unwrap();
        engine
            .reject_transaction(tx.id, "Security check failed".to_string())
            .unwrap();

        assert_eq!(
            engine
                .user(user.id)
                .unwrap()
                .wallets
                .get(WalletKind::JobBalance),
            dec!(100)
        );
    }

    #[test]
    fn test_frozen_user_cannot_request_withdrawal() {
        let (engine, _clock) = start();
        let user = verified(&engine);
        engine
            .set_withdrawal_blocked(user.id, true, Some("chargeback review".to_string()))
            .unwrap();
        assert!(!engine.withdrawal_eligibility(user.id).unwrap());

        let result = engine.request_withdrawal(
            user.id,
            dec!(10),
            "01700000001".to_string(),
            PaymentMethod::Nagad,
            WalletKind::JobBalance,
        );
        assert!(matches!(result, Err(CoreError::WithdrawalFrozen { .. })));
    }

    #[test]
    fn test_bonus_cannot_target_deposit_wallet() {
        let (engine, _clock) = start();
        let user = signed_up(&engine);
        let result = engine.send_bonus(user.id, WalletKind::Deposit, dec!(10));
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn test_withdrawal_cannot_target_deposit_wallet() {
        let (engine, _clock) = start();
        let user = verified(&engine);

        let result = engine.request_withdrawal(
            user.id,
            dec!(50),
            "01700000001".to_string(),
            PaymentMethod::Bkash,
            WalletKind::Deposit,
        );
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
        assert!(engine.withdrawals().is_empty());
        assert_eq!(
            engine.user(user.id).unwrap().wallets.get(WalletKind::Deposit),
            dec!(100)
        );
    }

    // A reader that sees the gmail credit must also see the approved status:
    // the credit runs under the submission store's lock.
    #[test]
    fn test_gmail_approval_is_never_partially_visible() {
        let (engine, _clock) = start();
        let user = signed_up(&engine);
        engine.set_gmail_daily_limit(1000);

        for i in 0..200u32 {
            let sub = engine
                .submit_gmail_sale(
                    user.id,
                    format!("sold{i}@gmail.com"),
                    "hunter2".to_string(),
                    "01900000003".to_string(),
                )
                .unwrap();
            let credited = dec!(120) * Decimal::from(i + 1);

            let reader = {
                let engine = engine.clone();
                let user_id = user.id;
                let sub_id = sub.id;
                thread::spawn(move || {
                    let mut partial = 0u32;
                    loop {
                        let balance = engine
                            .user(user_id)
                            .unwrap()
                            .wallets
                            .get(WalletKind::Gmail);
                        let status = engine
                            .gmail_submissions_for_user(user_id)
                            .into_iter()
                            .find(|s| s.id == sub_id)
                            .unwrap()
                            .status;
                        if balance >= credited && status.is_pending() {
                            partial += 1;
                        }
                        if status.is_terminal() {
                            break;
                        }
                    }
                    partial
                })
            };

            engine.approve_gmail_sale(sub.id, None).unwrap();
            assert_eq!(reader.join().unwrap(), 0);
        }
    }

    #[test]
    fn test_notifications_observe_events() {
        let (engine, _clock) = start();
        let user = verified(&engine);
        let job = sample_job(&engine, dec!(50));
        engine.submit_job_proofs(user.id, job.id, vec![]).unwrap();

        // signup + deposit + submission
        assert_eq!(engine.unread_notification_count(), 3);
        engine.mark_all_notifications_read();
        assert_eq!(engine.unread_notification_count(), 0);
    }

    #[test]
    fn test_ledger_balance_reconciliation_across_flows() {
        let (engine, _clock) = start();
        let user = verified(&engine);
        let job = sample_job(&engine, dec!(50));
        let sub = engine.submit_job_proofs(user.id, job.id, vec![]).unwrap();
        engine.approve_job_submission(sub.id).unwrap();

        let wd = engine
            .request_withdrawal(
                user.id,
                dec!(30),
                "01700000001".to_string(),
                PaymentMethod::Bkash,
                WalletKind::JobBalance,
            )
            .unwrap();
        engine.approve_transaction(wd.id).unwrap();

        let approved: Decimal = engine
            .transactions_for_user(user.id)
            .iter()
            .filter(|t| t.status == ApprovalStatus::Approved)
            .map(|t| if t.kind.is_withdrawal() { -t.amount } else { t.amount })
            .sum();
        let wallets = engine.user(user.id).unwrap().wallets;
        assert!(wallets.total() >= Decimal::ZERO);
        assert_eq!(wallets.total(), approved);
    }

    #[test]
    fn test_concurrent_withdrawal_approvals_never_both_succeed() {
        let (engine, _clock) = start();
        let user = verified(&engine);
        engine
            .send_bonus(user.id, WalletKind::JobBalance, dec!(100))
            .unwrap();

        let first = engine
            .request_withdrawal(
                user.id,
                dec!(80),
                "01700000001".to_string(),
                PaymentMethod::Bkash,
                WalletKind::JobBalance,
            )
            .unwrap();
        let second = engine
            .request_withdrawal(
                user.id,
                dec!(80),
                "01700000001".to_string(),
                PaymentMethod::Bkash,
                WalletKind::JobBalance,
            )
            .unwrap();

        let handles: Vec<_> = [first.id, second.id]
            .into_iter()
            .map(|tx| {
                let engine = engine.clone();
                thread::spawn(move || engine.approve_transaction(tx))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let approvals = results.iter().filter(|r| r.is_ok()).count();
        let shortfalls = results
            .iter()
            .filter(|r| matches!(r, Err(CoreError::InsufficientBalance { .. })))
            .count();
        assert_eq!(approvals, 1);
        assert_eq!(shortfalls, 1);
        assert_eq!(
            engine
                .user(user.id)
                .unwrap()
                .wallets
                .get(WalletKind::JobBalance),
            dec!(20)
        );
    }

    #[test]
    fn test_concurrent_double_approval_of_one_entry() {
        let (engine, _clock) = start();
        let user = verified(&engine);
        engine
            .send_bonus(user.id, WalletKind::JobBalance, dec!(100))
            .unwrap();
        let tx = engine
            .request_withdrawal(
                user.id,
                dec!(80),
                "01700000001".to_string(),
                PaymentMethod::Bkash,
                WalletKind::JobBalance,
            )
            .unwrap();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let engine = engine.clone();
                thread::spawn(move || engine.approve_transaction(tx.id))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(CoreError::InvalidTransition { .. })))
                .count(),
            1
        );
        assert_eq!(
            engine
                .user(user.id)
                .unwrap()
                .wallets
                .get(WalletKind::JobBalance),
            dec!(20)
        );
    }

    #[test]
    fn test_settings_setters() {
        let (engine, _clock) = start();
        engine.set_gmail_daily_limit(2);
        engine.set_gmail_sell_price(dec!(90));
        engine.set_payment_numbers(PaymentNumbers {
            bkash: "01700000000".to_string(),
            nagad: "01800000000".to_string(),
            rocket: "01900000000".to_string(),
        });

        let settings = engine.settings();
        assert_eq!(settings.gmail_daily_limit, 2);
        assert_eq!(settings.gmail_sell_price, dec!(90));

        let user = signed_up(&engine);
        for i in 0..2 {
            engine
                .submit_gmail_sale(
                    user.id,
                    format!("sold{i}@gmail.com"),
                    "hunter2".to_string(),
                    "01900000003".to_string(),
                )
                .unwrap();
        }
        let third = engine.submit_gmail_sale(
            user.id,
            "sold2@gmail.com".to_string(),
            "hunter2".to_string(),
            "01900000003".to_string(),
        );
        assert!(matches!(third, Err(CoreError::QuotaExceeded { limit: 2 })));
    }

    #[test]
    fn test_notice_board_roundtrip() {
        let (engine, _clock) = start();
        let notice = engine.publish_notice(
            "Payout schedule".to_string(),
            "Payouts run on Fridays".to_string(),
        );
        assert_eq!(engine.active_notices().len(), 1);
        engine.set_notice_active(notice.id, false).unwrap();
        assert!(engine.active_notices().is_empty());
    }
}
