//! EarnHub Types - Canonical domain types for the EarnHub ledger core
//!
//! This crate contains all foundational types for the EarnHub micro-earning
//! platform with zero dependencies on other earnhub crates. It defines:
//!
//! - Identity types (UserId, TransactionId, SubmissionId, etc.)
//! - The per-user wallet set and wallet kinds
//! - Transaction and approval-lifecycle types
//! - Job, proof, and submission types
//! - Notice, notification, and settings types
//!
//! # Architectural Invariants
//!
//! These types support the core EarnHub ledger invariants:
//!
//! 1. Wallet balances are never negative
//! 2. Approval status is monotonic: pending → approved | rejected
//! 3. Only the approval engine couples a status flip with its balance effect
//! 4. Failed commands are no-ops on stored state

pub mod identity;
pub mod wallet;
pub mod user;
pub mod job;
pub mod transaction;
pub mod submission;
pub mod notice;
pub mod notification;
pub mod settings;
pub mod error;

pub use identity::*;
pub use wallet::*;
pub use user::*;
pub use job::*;
pub use transaction::*;
pub use submission::*;
pub use notice::*;
pub use notification::*;
pub use settings::*;
pub use error::*;

/// Version of the EarnHub types schema
pub const TYPES_VERSION: &str = "0.1.0";
