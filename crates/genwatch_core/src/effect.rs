use std::time::Duration;

use crate::{CacheTarget, Job, JobId, PublicationId, TimerKind, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Invalidate(CacheTarget),
    /// Store the reconciled job under its `Generation` key.
    CacheJob(Job),
    ScheduleTimer {
        timer: TimerKind,
        generation: u64,
        after: Duration,
    },
    CancelTimer(TimerKind),
    StartActivePolling,
    StopActivePolling,
    WatchJob(JobId),
    UnwatchJob(JobId),
    SendLike {
        publication_id: PublicationId,
        liked: bool,
    },
    SendFollow {
        user_id: UserId,
        following: bool,
    },
    Publish(JobId),
}
