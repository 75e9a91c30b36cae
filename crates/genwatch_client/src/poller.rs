//! Interval polling of the REST surface. Pollers only report what they
//! fetched; the reducer decides what it means.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use genwatch_core::{CacheKey, CacheStore, CachedValue, EventSource, JobId, Msg};
use genwatch_logging::{genwatch_debug, genwatch_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::JobApi;

#[derive(Clone)]
struct PollContext {
    api: Arc<dyn JobApi>,
    cache: Arc<CacheStore>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    cancel: CancellationToken,
}

pub(crate) struct Poller {
    context: PollContext,
    active_interval: Duration,
    job_interval: Duration,
    active: Option<JoinHandle<()>>,
    watchers: HashMap<JobId, JoinHandle<()>>,
}

impl Poller {
    pub(crate) fn new(
        api: Arc<dyn JobApi>,
        cache: Arc<CacheStore>,
        msg_tx: mpsc::UnboundedSender<Msg>,
        cancel: CancellationToken,
        active_interval: Duration,
        job_interval: Duration,
    ) -> Self {
        Self {
            context: PollContext {
                api,
                cache,
                msg_tx,
                cancel,
            },
            active_interval,
            job_interval,
            active: None,
            watchers: HashMap::new(),
        }
    }

    /// One active-job fetch, independent of the interval loop.
    pub(crate) fn fetch_active_once(&self) {
        let context = self.context.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = context.cancel.cancelled() => {}
                _ = fetch_active(&context) => {}
            }
        });
    }

    pub(crate) fn start_active(&mut self) {
        if self.active.is_some() {
            return;
        }
        genwatch_debug!("Active polling started ({:?})", self.active_interval);
        let context = self.context.clone();
        let period = self.active_interval;
        self.active = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = context.cancel.cancelled() => return,
                    _ = ticks.tick() => {}
                }
                if !fetch_active(&context).await {
                    return;
                }
            }
        }));
    }

    pub(crate) fn stop_active(&mut self) {
        if let Some(handle) = self.active.take() {
            genwatch_debug!("Active polling stopped");
            handle.abort();
        }
    }

    pub(crate) fn watch(&mut self, job_id: JobId) {
        if self.watchers.get(&job_id).is_some_and(|h| !h.is_finished()) {
            return;
        }
        genwatch_debug!("Watching job {}", job_id);
        let context = self.context.clone();
        let period = self.job_interval;
        let handle = tokio::spawn(watch_job(context, job_id.clone(), period));
        self.watchers.insert(job_id, handle);
    }

    pub(crate) fn unwatch(&mut self, job_id: &JobId) {
        if let Some(handle) = self.watchers.remove(job_id) {
            genwatch_debug!("Stopped watching job {}", job_id);
            handle.abort();
        }
    }

    pub(crate) fn stop_all(&mut self) {
        self.stop_active();
        for (_, handle) in self.watchers.drain() {
            handle.abort();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Returns false once the session stopped listening.
async fn fetch_active(context: &PollContext) -> bool {
    let seen = context.cache.version(&CacheKey::ActiveGeneration);
    match context.api.active_job().await {
        Ok(job) => {
            context.cache.fill(
                CacheKey::ActiveGeneration,
                CachedValue::ActiveGeneration(job.clone()),
                seen,
            );
            context.msg_tx.send(Msg::ActiveJobFetched(job)).is_ok()
        }
        Err(err) => {
            genwatch_warn!("Active generation poll failed: {}", err);
            true
        }
    }
}

async fn watch_job(context: PollContext, job_id: JobId, period: Duration) {
    let mut ticks = tokio::time::interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = context.cancel.cancelled() => return,
            _ = ticks.tick() => {}
        }
        match context.api.job(&job_id).await {
            Ok(job) => {
                let terminal = job.status.is_terminal();
                let sent = context
                    .msg_tx
                    .send(Msg::JobObserved {
                        source: EventSource::Poll,
                        update: job.into(),
                    })
                    .is_ok();
                if terminal || !sent {
                    return;
                }
            }
            Err(err) => genwatch_warn!("Poll of job {} failed: {}", job_id, err),
        }
    }
}
