//! Session lifecycle: one push channel, one cache and one reducer per user.
//!
//! The reducer task owns [`AppState`] and is the only writer of job status.
//! Every helper (push channel, pollers, timers, REST calls) reports back
//! through the same message channel, so ordering is decided in one place.

use std::future::Future;
use std::sync::Arc;

use genwatch_core::{
    update, AppState, AppViewModel, CacheKey, CacheStore, CachedValue, Effect, FollowState, Job,
    JobId, LikeState, Msg, PublicationId, UserId,
};
use genwatch_logging::{genwatch_debug, genwatch_info, genwatch_warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::poller::Poller;
use crate::timers::Timers;
use crate::{
    spawn_push_channel, ApiError, ClientSettings, ConfigError, JobApi, Notifier,
    PushChannelConfig, PushTransport,
};

pub struct SessionHandle {
    user_id: UserId,
    msg_tx: mpsc::UnboundedSender<Msg>,
    view_rx: watch::Receiver<AppViewModel>,
    cache: Arc<CacheStore>,
    api: Arc<dyn JobApi>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionHandle {
    /// Opens the push channel, fetches the active generation once and starts
    /// the reducer. Must be called from within a tokio runtime.
    pub fn start(
        user_id: UserId,
        settings: &ClientSettings,
        api: Arc<dyn JobApi>,
        transport: Arc<dyn PushTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let push_url = settings.push_url()?;
        let cache = Arc::new(CacheStore::new());
        let cancel = CancellationToken::new();
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        let state = AppState::with_settings(settings.indicator);
        let (view_tx, view_rx) = watch::channel(state.view());

        genwatch_info!(session: user_id; "Starting session");
        let channel = spawn_push_channel(
            PushChannelConfig {
                url: push_url,
                user_id: user_id.clone(),
                reconnect_delay: settings.reconnect_delay,
            },
            transport,
            notifier,
            msg_tx.clone(),
            cancel.clone(),
        );

        let runtime = EffectRuntime {
            cache: cache.clone(),
            api: api.clone(),
            msg_tx: msg_tx.clone(),
            cancel: cancel.clone(),
            timers: Timers::new(msg_tx.clone()),
            poller: Poller::new(
                api.clone(),
                cache.clone(),
                msg_tx.clone(),
                cancel.clone(),
                settings.active_poll_interval,
                settings.job_poll_interval,
            ),
        };
        runtime.poller.fetch_active_once();
        let reducer = tokio::spawn(run_reducer(state, runtime, msg_rx, view_tx, cancel.clone()));

        Ok(Self {
            user_id,
            msg_tx,
            view_rx,
            cache,
            api,
            cancel,
            tasks: vec![channel, reducer],
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn send(&self, msg: Msg) {
        if self.msg_tx.send(msg).is_err() {
            genwatch_debug!(session: self.user_id; "Session already stopped");
        }
    }

    /// Announces a submission before the server has confirmed it.
    pub fn generation_started(&self) {
        self.send(Msg::GenerationSubmitted);
    }

    pub fn scrolled(&self, offset: i64) {
        self.send(Msg::Scrolled { offset });
    }

    pub fn toggle_like(&self, publication_id: impl Into<PublicationId>) {
        self.send(Msg::LikeClicked(publication_id.into()));
    }

    pub fn toggle_follow(&self, user_id: impl Into<UserId>) {
        self.send(Msg::FollowClicked(user_id.into()));
    }

    pub fn publish(&self, job_id: impl Into<JobId>) {
        self.send(Msg::PublishRequested(job_id.into()));
    }

    /// Keeps `job_id` polled until it reaches a terminal status.
    pub fn watch_job(&self, job_id: impl Into<JobId>) {
        self.send(Msg::WatchRequested(job_id.into()));
    }

    pub fn seed_likes(&self, likes: Vec<(PublicationId, LikeState)>) {
        self.send(Msg::LikesLoaded(likes));
    }

    pub fn seed_follows(&self, follows: Vec<(UserId, FollowState)>) {
        self.send(Msg::FollowsLoaded(follows));
    }

    pub fn view(&self) -> AppViewModel {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppViewModel> {
        self.view_rx.clone()
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Read-through load of one history page.
    pub async fn history(&self, page: u32, limit: u32) -> Result<Vec<Job>, ApiError> {
        let key = CacheKey::GenerationHistory { page, limit };
        if let Some(snapshot) = self.cache.get(&key) {
            match snapshot.value.as_ref() {
                CachedValue::Jobs(jobs) if !snapshot.stale => return Ok(jobs.clone()),
                _ => {}
            }
        }
        let seen = self.cache.version(&key);
        let jobs = self.api.history(page, limit).await?;
        if !self.cache.fill(key, CachedValue::Jobs(jobs.clone()), seen) {
            genwatch_debug!("History page {} changed while loading; not cached", page);
        }
        Ok(jobs)
    }

    /// Stops every task of the session and waits for them to exit.
    pub async fn teardown(mut self) {
        genwatch_info!(session: self.user_id; "Tearing down session");
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            let _ = task.await;
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Owns the session for whichever user is signed in.
pub struct SessionContext {
    settings: ClientSettings,
    api: Arc<dyn JobApi>,
    transport: Arc<dyn PushTransport>,
    notifier: Arc<dyn Notifier>,
    session: Option<SessionHandle>,
}

impl SessionContext {
    pub fn new(
        settings: ClientSettings,
        api: Arc<dyn JobApi>,
        transport: Arc<dyn PushTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            api,
            transport,
            notifier,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }

    /// Tears the current session down and starts a new one when the
    /// identity changes. `None` signs out.
    pub async fn set_user(&mut self, user_id: Option<UserId>) -> Result<(), ConfigError> {
        let current = self.session.as_ref().map(SessionHandle::user_id);
        if current == user_id.as_deref() {
            return Ok(());
        }
        self.teardown().await;
        if let Some(user_id) = user_id {
            self.session = Some(SessionHandle::start(
                user_id,
                &self.settings,
                self.api.clone(),
                self.transport.clone(),
                self.notifier.clone(),
            )?);
        }
        Ok(())
    }

    pub async fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            session.teardown().await;
        }
    }
}

struct EffectRuntime {
    cache: Arc<CacheStore>,
    api: Arc<dyn JobApi>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    cancel: CancellationToken,
    timers: Timers,
    poller: Poller,
}

impl EffectRuntime {
    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            genwatch_debug!("Effect {:?}", effect);
            match effect {
                Effect::Invalidate(target) => {
                    self.cache.invalidate(&target);
                }
                Effect::CacheJob(job) => {
                    self.cache
                        .put(CacheKey::Generation(job.id.clone()), CachedValue::Job(job));
                }
                Effect::ScheduleTimer {
                    timer,
                    generation,
                    after,
                } => self.timers.schedule(timer, generation, after),
                Effect::CancelTimer(timer) => self.timers.cancel(timer),
                Effect::StartActivePolling => self.poller.start_active(),
                Effect::StopActivePolling => self.poller.stop_active(),
                Effect::WatchJob(job_id) => self.poller.watch(job_id),
                Effect::UnwatchJob(job_id) => self.poller.unwatch(&job_id),
                Effect::SendLike {
                    publication_id,
                    liked,
                } => {
                    let api = self.api.clone();
                    let id = publication_id.clone();
                    self.spawn_call(
                        format!("Like of {publication_id}"),
                        async move { api.set_like(&id, liked).await },
                        move |accepted| Msg::LikeSettled {
                            publication_id,
                            accepted,
                        },
                    );
                }
                Effect::SendFollow { user_id, following } => {
                    let api = self.api.clone();
                    let id = user_id.clone();
                    self.spawn_call(
                        format!("Follow of {user_id}"),
                        async move { api.set_follow(&id, following).await },
                        move |accepted| Msg::FollowSettled { user_id, accepted },
                    );
                }
                Effect::Publish(job_id) => {
                    let api = self.api.clone();
                    let id = job_id.clone();
                    self.spawn_call(
                        format!("Publish of {job_id}"),
                        async move { api.publish(&id).await },
                        move |accepted| Msg::PublishSettled { job_id, accepted },
                    );
                }
            }
        }
    }

    /// Runs a REST mutation and reports whether the server accepted it.
    fn spawn_call<F, S>(&self, what: String, call: F, settled: S)
    where
        F: Future<Output = Result<(), ApiError>> + Send + 'static,
        S: FnOnce(bool) -> Msg + Send + 'static,
    {
        let msg_tx = self.msg_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = call => result,
            };
            let accepted = match result {
                Ok(()) => true,
                Err(err) => {
                    genwatch_warn!("{} rejected: {}", what, err);
                    false
                }
            };
            let _ = msg_tx.send(settled(accepted));
        });
    }

    fn shutdown(&mut self) {
        self.timers.cancel_all();
        self.poller.stop_all();
    }
}

async fn run_reducer(
    mut state: AppState,
    mut runtime: EffectRuntime,
    mut msg_rx: mpsc::UnboundedReceiver<Msg>,
    view_tx: watch::Sender<AppViewModel>,
    cancel: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = msg_rx.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };
        let (next, effects) = update(std::mem::take(&mut state), msg);
        state = next;
        runtime.execute(effects);
        if state.consume_dirty() {
            view_tx.send_replace(state.view());
        }
    }
    runtime.shutdown();
}
