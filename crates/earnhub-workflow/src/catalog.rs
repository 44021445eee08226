//! Moderator-maintained catalog of task definitions

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use earnhub_types::{CoreError, Job, JobId, NewJob, Result};

/// The job catalog
///
/// Jobs are definitions, not workflow entities: submissions reference them
/// by id and denormalize the title, so edits and removals never rewrite
/// submission history.
pub struct JobCatalog {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobCatalog {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Add a new job definition
    pub fn create(&self, new: NewJob) -> Result<Job> {
        if new.reward <= rust_decimal::Decimal::ZERO {
            return Err(CoreError::InvalidAmount { amount: new.reward });
        }
        let job = Job {
            id: JobId::new(),
            title: new.title,
            description: new.description,
            thumbnail: new.thumbnail,
            reward: new.reward,
            proof_specs: new.proof_specs,
            task_url: new.task_url,
            rules: new.rules,
        };
        debug!(job = %job.id, title = %job.title, "job created");
        self.jobs.write().insert(job.id, job.clone());
        Ok(job)
    }

    /// Replace an existing job definition
    pub fn update(&self, job: Job) -> Result<Job> {
        if job.reward <= rust_decimal::Decimal::ZERO {
            return Err(CoreError::InvalidAmount { amount: job.reward });
        }
        let mut jobs = self.jobs.write();
        if !jobs.contains_key(&job.id) {
            return Err(CoreError::not_found("job", job.id));
        }
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    /// Remove a job definition
    pub fn remove(&self, id: JobId) -> Result<()> {
        self.jobs
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("job", id))
    }

    /// Get one job by id
    pub fn get(&self, id: JobId) -> Result<Job> {
        self.jobs
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("job", id))
    }

    /// Snapshot of every job
    pub fn list(&self) -> Vec<Job> {
        self.jobs.read().values().cloned().collect()
    }
}

impl Default for JobCatalog {
    fn default() -> Self {
        Self::new()
    }
}
