use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

pub type PublicationId = String;
pub type UserId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Position in the progression `pending < processing < completed|failed`.
    pub fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Provider that executed the job. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Kling,
    Higgsfield,
    Gpt,
    Nano,
    Replicate,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Service::Kling => "kling",
            Service::Higgsfield => "higgsfield",
            Service::Gpt => "gpt",
            Service::Nano => "nano",
            Service::Replicate => "replicate",
            Service::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// One generation request as the server reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub service: Option<Service>,
    #[serde(default)]
    pub result_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub tokens_spent: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Job {
    /// A bare record for a job first learned about through a push event.
    pub fn new(id: JobId, status: JobStatus) -> Self {
        Self {
            id,
            status,
            service: None,
            result_url: None,
            error_message: None,
            is_published: false,
            prompt: None,
            tokens_spent: None,
            created_at: None,
        }
    }
}

/// Payload of the server's `jobUpdate` push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEvent {
    #[serde(rename = "type")]
    pub kind: JobStatus,
    pub job_id: JobId,
    #[serde(default)]
    pub service: Option<Service>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result_url: Option<String>,
}

/// A status observation for one job, from either the push channel or a poll.
///
/// `None` fields carry no information and never clear recorded values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpdate {
    pub job_id: JobId,
    pub status: JobStatus,
    pub service: Option<Service>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub is_published: Option<bool>,
    pub prompt: Option<String>,
    pub tokens_spent: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    pub fn status(job_id: impl Into<JobId>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            service: None,
            result_url: None,
            error_message: None,
            is_published: None,
            prompt: None,
            tokens_spent: None,
            created_at: None,
        }
    }
}

impl From<PushEvent> for JobUpdate {
    fn from(event: PushEvent) -> Self {
        Self {
            service: event.service,
            result_url: event.result_url,
            error_message: event.error,
            ..JobUpdate::status(event.job_id, event.kind)
        }
    }
}

impl From<Job> for JobUpdate {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            service: job.service,
            result_url: job.result_url,
            error_message: job.error_message,
            is_published: Some(job.is_published),
            prompt: job.prompt,
            tokens_spent: job.tokens_spent,
            created_at: job.created_at,
        }
    }
}

/// Where an observation came from. Both go through the same ordering rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Push,
    Poll,
}
