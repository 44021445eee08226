//! Submission stores and the daily quota tracker

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, info};

use earnhub_types::{
    ApprovalStatus, CoreError, GmailSubmission, Job, JobSubmission, Result, SubmissionId,
    SubmittedProof, User, UserId,
};

/// Store of job-proof and gmail-sale submissions
///
/// Quota counting and the gated insert happen under one write lock, so two
/// concurrent gmail submissions can never both pass the limit check.
pub struct SubmissionStore {
    job_subs: RwLock<Vec<JobSubmission>>,
    gmail_subs: RwLock<Vec<GmailSubmission>>,
}

impl SubmissionStore {
    pub fn new() -> Self {
        Self {
            job_subs: RwLock::new(Vec::new()),
            gmail_subs: RwLock::new(Vec::new()),
        }
    }

    // ------------------------------------------------------------------
    // Job submissions
    // ------------------------------------------------------------------

    /// Record a proof-of-completion for a task, status `pending`
    pub fn submit_job(
        &self,
        user: &User,
        job: &Job,
        proofs: Vec<SubmittedProof>,
        now: DateTime<Utc>,
    ) -> Result<JobSubmission> {
        let sub = JobSubmission {
            id: SubmissionId::new(),
            user_id: user.id,
            user_name: user.name.clone(),
            job_id: job.id,
            job_title: job.title.clone(),
            proofs,
            status: ApprovalStatus::Pending,
            submitted_at: now,
            rejection_reason: None,
        };
        debug!(submission = %sub.id, user = %user.id, job = %job.id, "job proofs submitted");
        self.job_subs.write().push(sub.clone());
        Ok(sub)
    }

    /// Approve a pending job submission
    ///
    /// `credit` runs while the store lock is held, so the reward credit and
    /// the status flip are never individually visible to readers. If the
    /// credit fails, the submission stays pending.
    pub fn approve_job<T>(
        &self,
        id: SubmissionId,
        credit: impl FnOnce() -> Result<T>,
    ) -> Result<JobSubmission> {
        let mut subs = self.job_subs.write();
        let sub = subs
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::not_found("job submission", id))?;
        if !sub.status.is_pending() {
            return Err(CoreError::InvalidTransition {
                current: sub.status,
            });
        }

        credit()?;
        sub.status = ApprovalStatus::Approved;
        info!(submission = %id, "job submission approved");
        Ok(sub.clone())
    }

    /// Reject a pending job submission; the reason is optional
    pub fn reject_job(&self, id: SubmissionId, reason: Option<String>) -> Result<JobSubmission> {
        let mut subs = self.job_subs.write();
        let sub = subs
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::not_found("job submission", id))?;
        if !sub.status.is_pending() {
            return Err(CoreError::InvalidTransition {
                current: sub.status,
            });
        }

        sub.status = ApprovalStatus::Rejected;
        sub.rejection_reason = reason;
        info!(submission = %id, "job submission rejected");
        Ok(sub.clone())
    }

    /// Get one job submission by id
    pub fn get_job_submission(&self, id: SubmissionId) -> Result<JobSubmission> {
        self.job_subs
            .read()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("job submission", id))
    }

    /// All job submissions, oldest first
    pub fn job_submissions(&self) -> Vec<JobSubmission> {
        self.job_subs.read().clone()
    }

    /// Job submissions owned by one user
    pub fn job_submissions_for_user(&self, user_id: UserId) -> Vec<JobSubmission> {
        self.job_subs
            .read()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Gmail submissions & quota
    // ------------------------------------------------------------------

    /// Count gmail submissions this user created on `now`'s calendar day
    ///
    /// Counts every entry regardless of status; rejected sales still consume
    /// quota for the day they were submitted.
    pub fn count_gmail_today(&self, user_id: UserId, now: DateTime<Utc>) -> u32 {
        let today = now.date_naive();
        self.gmail_subs
            .read()
            .iter()
            .filter(|s| s.user_id == user_id && s.submitted_at.date_naive() == today)
            .count() as u32
    }

    /// Whether one more gmail submission would stay under the daily cap
    pub fn can_submit_gmail(&self, user_id: UserId, now: DateTime<Utc>, limit: u32) -> bool {
        self.count_gmail_today(user_id, now) < limit
    }

    /// Record a credential sale, status `pending`
    ///
    /// Fails with `QuotaExceeded` once `limit` submissions exist for the
    /// calendar day of `now`. Check and insert share one write lock.
    pub fn submit_gmail(
        &self,
        user: &User,
        gmail_address: String,
        password: String,
        recovery_phone: String,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<GmailSubmission> {
        let mut subs = self.gmail_subs.write();

        let today = now.date_naive();
        let submitted_today = subs
            .iter()
            .filter(|s| s.user_id == user.id && s.submitted_at.date_naive() == today)
            .count() as u32;
        if submitted_today >= limit {
            return Err(CoreError::QuotaExceeded { limit });
        }

        let sub = GmailSubmission {
            id: SubmissionId::new(),
            user_id: user.id,
            user_name: user.name.clone(),
            gmail_address,
            password,
            recovery_phone,
            status: ApprovalStatus::Pending,
            submitted_at: now,
            price: None,
            rejection_reason: None,
        };
        debug!(submission = %sub.id, user = %user.id, "gmail sale submitted");
        subs.push(sub.clone());
        Ok(sub)
    }

    /// Approve a pending gmail submission at `price`
    ///
    /// The price must be positive and is stored on the record. `credit`
    /// runs while the store lock is held, so the gmail-wallet credit and
    /// the status flip are never individually visible to readers.
    pub fn approve_gmail<T>(
        &self,
        id: SubmissionId,
        price: Decimal,
        credit: impl FnOnce() -> Result<T>,
    ) -> Result<GmailSubmission> {
        let mut subs = self.gmail_subs.write();
        let sub = subs
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::not_found("gmail submission", id))?;
        if !sub.status.is_pending() {
            return Err(CoreError::InvalidTransition {
                current: sub.status,
            });
        }
        if price <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount { amount: price });
        }

        credit()?;
        sub.status = ApprovalStatus::Approved;
        sub.price = Some(price);
        info!(submission = %id, %price, "gmail submission approved");
        Ok(sub.clone())
    }

    /// Reject a pending gmail submission; a non-blank reason is required
    pub fn reject_gmail(&self, id: SubmissionId, reason: String) -> Result<GmailSubmission> {
        if reason.trim().is_empty() {
            return Err(CoreError::MissingReason);
        }
        let mut subs = self.gmail_subs.write();
        let sub = subs
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::not_found("gmail submission", id))?;
        if !sub.status.is_pending() {
            return Err(CoreError::InvalidTransition {
                current: sub.status,
            });
        }

        sub.status = ApprovalStatus::Rejected;
        sub.rejection_reason = Some(reason);
        info!(submission = %id, "gmail submission rejected");
        Ok(sub.clone())
    }

    /// Get one gmail submission by id
    pub fn get_gmail_submission(&self, id: SubmissionId) -> Result<GmailSubmission> {
        self.gmail_subs
            .read()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("gmail submission", id))
    }

    /// All gmail submissions, oldest first
    pub fn gmail_submissions(&self) -> Vec<GmailSubmission> {
        self.gmail_subs.read().clone()
    }

    /// Gmail submissions owned by one user
    pub fn gmail_submissions_for_user(&self, user_id: UserId) -> Vec<GmailSubmission> {
        self.gmail_subs
            .read()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }
}

impl Default for SubmissionStore {
    fn default() -> Self {
        Self::new()
    }
}
