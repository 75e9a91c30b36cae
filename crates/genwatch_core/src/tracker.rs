use std::collections::BTreeMap;

use crate::{Job, JobId, JobStatus, JobUpdate};

/// Result of feeding one observation into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// The recorded status moved forward (or the job was first seen).
    Advanced {
        from: Option<JobStatus>,
        to: JobStatus,
    },
    /// Same status, but informational fields changed.
    Refreshed,
    Discarded(DiscardReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The job already reached `completed` or `failed`.
    AlreadyTerminal,
    /// The observation is older than what is recorded.
    Regression,
    /// Nothing new.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TrackedJob {
    job: Job,
    first_seen: u64,
}

/// Authoritative per-job status, fed by push events and poll results alike.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobTracker {
    jobs: BTreeMap<JobId, TrackedJob>,
    next_seen: u64,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the ordering rule: a status is accepted only when it is equal
    /// to or later than the recorded one, and a terminal status is final.
    pub fn ingest(&mut self, update: JobUpdate) -> Ingest {
        let Some(tracked) = self.jobs.get_mut(&update.job_id) else {
            let to = update.status;
            let mut job = Job::new(update.job_id.clone(), to);
            merge_fields(&mut job, &update);
            self.next_seen += 1;
            self.jobs.insert(
                update.job_id,
                TrackedJob {
                    job,
                    first_seen: self.next_seen,
                },
            );
            return Ingest::Advanced { from: None, to };
        };

        let job = &mut tracked.job;
        let current = job.status;
        if current.is_terminal() {
            if update.status != current {
                return Ingest::Discarded(DiscardReason::AlreadyTerminal);
            }
            // The first recorded result is final; a missing one may still be filled in.
            let before = job.clone();
            if let Some(published) = update.is_published {
                job.is_published = published;
            }
            match current {
                JobStatus::Completed if job.result_url.is_none() => {
                    job.result_url.clone_from(&update.result_url);
                }
                JobStatus::Failed if job.error_message.is_none() => {
                    job.error_message.clone_from(&update.error_message);
                }
                _ => {}
            }
            return if *job == before {
                Ingest::Discarded(DiscardReason::AlreadyTerminal)
            } else {
                Ingest::Refreshed
            };
        }
        if update.status.rank() < current.rank() {
            return Ingest::Discarded(DiscardReason::Regression);
        }
        if update.status == current {
            let before = job.clone();
            merge_fields(job, &update);
            return if *job == before {
                Ingest::Discarded(DiscardReason::Duplicate)
            } else {
                Ingest::Refreshed
            };
        }

        job.status = update.status;
        merge_fields(job, &update);
        Ingest::Advanced {
            from: Some(current),
            to: update.status,
        }
    }

    pub fn job(&self, job_id: &JobId) -> Option<&Job> {
        self.jobs.get(job_id).map(|tracked| &tracked.job)
    }

    pub fn status(&self, job_id: &JobId) -> Option<JobStatus> {
        self.job(job_id).map(|job| job.status)
    }

    /// Newest non-terminal job, ordered by `createdAt` then by first sighting.
    pub fn active_job(&self) -> Option<&Job> {
        self.jobs
            .values()
            .filter(|tracked| !tracked.job.status.is_terminal())
            .max_by_key(|tracked| (tracked.job.created_at, tracked.first_seen))
            .map(|tracked| &tracked.job)
    }

    pub fn has_active_job(&self) -> bool {
        self.jobs
            .values()
            .any(|tracked| !tracked.job.status.is_terminal())
    }

    /// Records a successful publish. Returns false for unknown or unfinished jobs.
    pub fn mark_published(&mut self, job_id: &JobId) -> bool {
        match self.jobs.get_mut(job_id) {
            Some(tracked) if tracked.job.status == JobStatus::Completed => {
                tracked.job.is_published = true;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

fn merge_fields(job: &mut Job, update: &JobUpdate) {
    if update.service.is_some() {
        job.service = update.service;
    }
    if update.prompt.is_some() {
        job.prompt.clone_from(&update.prompt);
    }
    if update.tokens_spent.is_some() {
        job.tokens_spent = update.tokens_spent;
    }
    if update.created_at.is_some() {
        job.created_at = update.created_at;
    }
    if let Some(published) = update.is_published {
        job.is_published = published;
    }
    // Result and error only ever exist alongside their terminal status.
    match job.status {
        JobStatus::Completed => {
            if update.result_url.is_some() {
                job.result_url.clone_from(&update.result_url);
            }
            job.error_message = None;
        }
        JobStatus::Failed => {
            if update.error_message.is_some() {
                job.error_message.clone_from(&update.error_message);
            }
            job.result_url = None;
        }
        JobStatus::Pending | JobStatus::Processing => {
            job.result_url = None;
            job.error_message = None;
        }
    }
}
