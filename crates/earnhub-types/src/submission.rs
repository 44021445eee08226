//! Workflow entries: job-proof and gmail-sale submissions
//!
//! Both share the approval lifecycle of ledger entries but carry no money
//! until approved. Approving a job submission credits the job's reward;
//! approving a gmail sale credits a moderator-chosen price.

use crate::{ApprovalStatus, JobId, SubmissionId, SubmittedProof, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Proof-of-completion record for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSubmission {
    pub id: SubmissionId,
    pub user_id: UserId,
    pub user_name: String,
    pub job_id: JobId,
    /// Denormalized at submit time; survives later job edits
    pub job_title: String,
    /// Ordered to match the job's proof specs
    pub proofs: Vec<SubmittedProof>,
    pub status: ApprovalStatus,
    pub submitted_at: DateTime<Utc>,
    /// Optional for job submissions (unlike gmail sales)
    pub rejection_reason: Option<String>,
}

/// Credential-sale record for one gmail account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmailSubmission {
    pub id: SubmissionId,
    pub user_id: UserId,
    pub user_name: String,
    pub gmail_address: String,
    pub password: String,
    pub recovery_phone: String,
    pub status: ApprovalStatus,
    pub submitted_at: DateTime<Utc>,
    /// Moderator-chosen sale price, set at approval
    pub price: Option<Decimal>,
    /// Required whenever status is `Rejected`
    pub rejection_reason: Option<String>,
}
