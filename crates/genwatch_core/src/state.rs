use std::collections::BTreeSet;

use crate::view_model::{AppViewModel, IndicatorView};
use crate::{
    CacheTarget, Effect, FollowState, Indicator, IndicatorSettings, Ingest, Job, JobId,
    JobStatus, JobTracker, JobUpdate, LikeState, OptimisticSet, PublicationId, UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    tracker: JobTracker,
    indicator: Indicator,
    likes: OptimisticSet<PublicationId, LikeState>,
    follows: OptimisticSet<UserId, FollowState>,
    watched: BTreeSet<JobId>,
    publishing: BTreeSet<JobId>,
    active_polling: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: IndicatorSettings) -> Self {
        Self {
            indicator: Indicator::new(settings),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let indicator = &self.indicator;
        AppViewModel {
            indicator: IndicatorView {
                phase: indicator.phase(),
                job_id: indicator.tracked().cloned(),
                minimized: indicator.minimized(),
                hidden_by_scroll: indicator.hidden_by_scroll(),
                message: indicator.phase().message(),
                error: indicator.error().map(ToOwned::to_owned),
            },
            active_job: self.tracker.active_job().cloned(),
            likes: self
                .likes
                .iter()
                .map(|(id, state)| (id.clone(), *state))
                .collect(),
            follows: self
                .follows
                .iter()
                .map(|(id, state)| (id.clone(), *state))
                .collect(),
            publishing: self.publishing.iter().cloned().collect(),
            dirty: self.dirty,
        }
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    pub fn indicator(&self) -> &Indicator {
        &self.indicator
    }

    pub fn like(&self, publication_id: &PublicationId) -> Option<LikeState> {
        self.likes.get(publication_id).copied()
    }

    pub fn follow(&self, user_id: &UserId) -> Option<FollowState> {
        self.follows.get(user_id).copied()
    }

    pub fn is_active_polling(&self) -> bool {
        self.active_polling
    }

    pub fn is_watching(&self, job_id: &JobId) -> bool {
        self.watched.contains(job_id)
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn submit(&mut self, effects: &mut Vec<Effect>) {
        self.indicator.submitted(effects);
        self.mark_dirty();
    }

    /// The single entry point for job status, whatever its source.
    pub(crate) fn observe(&mut self, update: JobUpdate, effects: &mut Vec<Effect>) {
        let job_id = update.job_id.clone();
        match self.tracker.ingest(update) {
            Ingest::Advanced { to, .. } => {
                let Some(job) = self.tracker.job(&job_id).cloned() else {
                    return;
                };
                effects.push(Effect::CacheJob(job.clone()));
                effects.extend(
                    invalidation_targets(to)
                        .into_iter()
                        .map(Effect::Invalidate),
                );
                if to.is_terminal() {
                    self.unwatch(&job_id, effects);
                } else {
                    self.watch(&job_id, effects);
                }
                self.indicator
                    .observed(&job_id, to, job.error_message.as_deref(), effects);
                self.mark_dirty();
            }
            Ingest::Refreshed => {
                if let Some(job) = self.tracker.job(&job_id).cloned() {
                    effects.push(Effect::CacheJob(job));
                }
                self.mark_dirty();
            }
            Ingest::Discarded(_) => {}
        }
    }

    pub(crate) fn request_watch(&mut self, job_id: JobId, effects: &mut Vec<Effect>) {
        match self.tracker.status(&job_id) {
            Some(status) if status.is_terminal() => {}
            _ => self.watch(&job_id, effects),
        }
    }

    fn watch(&mut self, job_id: &JobId, effects: &mut Vec<Effect>) {
        if self.watched.insert(job_id.clone()) {
            effects.push(Effect::WatchJob(job_id.clone()));
        }
    }

    fn unwatch(&mut self, job_id: &JobId, effects: &mut Vec<Effect>) {
        if self.watched.remove(job_id) {
            effects.push(Effect::UnwatchJob(job_id.clone()));
        }
    }

    /// Active polling runs only while a non-terminal job is believed to exist.
    pub(crate) fn sync_active_polling(&mut self, effects: &mut Vec<Effect>) {
        let wanted = self.tracker.has_active_job() || self.indicator.awaiting_job();
        if wanted == self.active_polling {
            return;
        }
        self.active_polling = wanted;
        effects.push(if wanted {
            Effect::StartActivePolling
        } else {
            Effect::StopActivePolling
        });
    }

    pub(crate) fn indicator_mut(&mut self) -> &mut Indicator {
        &mut self.indicator
    }

    pub(crate) fn likes_mut(&mut self) -> &mut OptimisticSet<PublicationId, LikeState> {
        &mut self.likes
    }

    pub(crate) fn follows_mut(&mut self) -> &mut OptimisticSet<UserId, FollowState> {
        &mut self.follows
    }

    pub(crate) fn begin_publish(&mut self, job_id: &JobId) -> bool {
        let publishable = self
            .tracker
            .job(job_id)
            .is_some_and(|job| job.status == JobStatus::Completed && !job.is_published);
        publishable && self.publishing.insert(job_id.clone())
    }

    pub(crate) fn finish_publish(&mut self, job_id: &JobId, accepted: bool) -> Option<Job> {
        if !self.publishing.remove(job_id) {
            return None;
        }
        if !accepted || !self.tracker.mark_published(job_id) {
            return None;
        }
        self.tracker.job(job_id).cloned()
    }
}

/// Cache families made stale by a job reaching `status`. The job's own
/// `Generation` entry is rewritten with the reconciled record instead.
pub fn invalidation_targets(status: JobStatus) -> Vec<CacheTarget> {
    let mut targets = vec![CacheTarget::ActiveGeneration, CacheTarget::GenerationHistory];
    if status == JobStatus::Completed {
        targets.extend([
            CacheTarget::Gallery,
            CacheTarget::Publications,
            CacheTarget::Transactions,
        ]);
    }
    targets
}
