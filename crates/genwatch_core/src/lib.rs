//! Genwatch core: pure job reconciliation, indicator state machine and
//! optimistic toggles.
mod cache;
mod effect;
mod indicator;
mod job;
mod msg;
mod optimistic;
mod state;
mod tracker;
mod update;
mod view_model;

pub use cache::{CacheKey, CacheObserver, CacheStore, CacheTarget, CachedValue, Snapshot};
pub use effect::Effect;
pub use indicator::{
    Indicator, IndicatorSettings, Phase, TimerKind, DEFAULT_DWELL, DEFAULT_MINIMIZE_AFTER,
    DEFAULT_SCROLL_THRESHOLD,
};
pub use job::{
    EventSource, Job, JobId, JobStatus, JobUpdate, PublicationId, PushEvent, Service, UserId,
};
pub use msg::Msg;
pub use optimistic::{apply, Applied, FollowState, LikeState, OptimisticSet, Toggle};
pub use state::{invalidation_targets, AppState};
pub use tracker::{DiscardReason, Ingest, JobTracker};
pub use update::update;
pub use view_model::{AppViewModel, IndicatorView};
