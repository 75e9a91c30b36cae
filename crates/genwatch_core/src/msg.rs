use crate::{
    EventSource, FollowState, Job, JobId, JobUpdate, LikeState, PublicationId, TimerKind, UserId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted a generation request; announced before the server confirms it.
    GenerationSubmitted,
    /// Status observation from the push channel or a job-by-id poll.
    JobObserved {
        source: EventSource,
        update: JobUpdate,
    },
    /// Result of fetching the user's active generation.
    ActiveJobFetched(Option<Job>),
    /// A consumer wants a specific job kept fresh until it finishes.
    WatchRequested(JobId),
    /// A scheduled indicator timer fired.
    TimerElapsed { timer: TimerKind, generation: u64 },
    /// Scroll position sample, in pixels from the top.
    Scrolled { offset: i64 },
    /// Publications loaded from the server.
    LikesLoaded(Vec<(PublicationId, LikeState)>),
    LikeClicked(PublicationId),
    LikeSettled {
        publication_id: PublicationId,
        accepted: bool,
    },
    /// Profiles loaded from the server.
    FollowsLoaded(Vec<(UserId, FollowState)>),
    FollowClicked(UserId),
    FollowSettled { user_id: UserId, accepted: bool },
    PublishRequested(JobId),
    PublishSettled { job_id: JobId, accepted: bool },
}
