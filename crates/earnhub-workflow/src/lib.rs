//! EarnHub Workflow - task proofs, credential sales, and daily quotas
//!
//! Workflow entries are non-monetary-until-approved proof records sharing
//! the ledger's approval lifecycle. This crate holds the job catalog, both
//! submission stores, and the quota tracker that caps gmail sales per user
//! per calendar day.
//!
//! The stores flip statuses and validate transition rules; the balance
//! effect of an approval is supplied by the approval engine as a closure
//! and runs while the store lock is held, so readers never observe a
//! credit without its status flip or the reverse.

pub mod catalog;
pub mod submissions;

pub use catalog::JobCatalog;
pub use submissions::SubmissionStore;
