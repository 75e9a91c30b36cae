use crate::{FollowState, Job, JobId, LikeState, Phase, PublicationId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndicatorView {
    pub phase: Phase,
    pub job_id: Option<JobId>,
    pub minimized: bool,
    pub hidden_by_scroll: bool,
    pub message: &'static str,
    pub error: Option<String>,
}

impl IndicatorView {
    pub fn is_visible(&self) -> bool {
        self.phase != Phase::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub indicator: IndicatorView,
    pub active_job: Option<Job>,
    pub likes: Vec<(PublicationId, LikeState)>,
    pub follows: Vec<(UserId, FollowState)>,
    pub publishing: Vec<JobId>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn like(&self, publication_id: &str) -> Option<LikeState> {
        self.likes
            .iter()
            .find(|(id, _)| id == publication_id)
            .map(|(_, state)| *state)
    }

    pub fn follow(&self, user_id: &str) -> Option<FollowState> {
        self.follows
            .iter()
            .find(|(id, _)| id == user_id)
            .map(|(_, state)| *state)
    }
}
