//! Job (task) definitions and proof types

use crate::JobId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What shape of proof a job asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofKind {
    /// Encoded image data (screenshot uploads)
    Image,
    /// Raw text (usernames, links, codes)
    Text,
}

/// One required proof in a job definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSpec {
    pub kind: ProofKind,
    /// Instruction shown to the user
    pub label: String,
}

/// One proof as submitted by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedProof {
    pub kind: ProofKind,
    pub label: String,
    /// Encoded image data or raw text, depending on `kind`
    pub value: String,
}

/// A task definition users complete for a reward
///
/// Jobs are not workflow entities themselves; submissions reference them and
/// denormalize the title, so later edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    /// Amount credited to `jobBalance` when a submission is approved
    pub reward: Decimal,
    /// Ordered proof requirements shown on the submission form
    pub proof_specs: Vec<ProofSpec>,
    pub task_url: Option<String>,
    pub rules: Option<String>,
}

/// Fields supplied when a moderator creates a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub reward: Decimal,
    pub proof_specs: Vec<ProofSpec>,
    pub task_url: Option<String>,
    pub rules: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_job_serde_roundtrip() {
        let job = Job {
            id: JobId::new(),
            title: "Subscribe and screenshot".to_string(),
            description: "Subscribe to the channel".to_string(),
            thumbnail: String::new(),
            reward: dec!(50.00),
            proof_specs: vec![ProofSpec {
                kind: ProofKind::Image,
                label: "Screenshot of subscription".to_string(),
            }],
            task_url: Some("https://example.com/task".to_string()),
            rules: None,
        };
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }
}
