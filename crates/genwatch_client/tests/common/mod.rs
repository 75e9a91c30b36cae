#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use genwatch_client::{
    ApiError, ChannelError, FailureKind, JobApi, Notice, Notifier, PushConnection, PushTransport,
};
use genwatch_core::{Job, JobId, JobStatus};
use tokio::sync::mpsc;
use url::Url;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        genwatch_logging::initialize_for_tests();
    });
}

/// Lets every ready task run. Under a paused clock this also advances time by 1ms.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
    settle().await;
}

pub fn job(id: &str, status: JobStatus) -> Job {
    Job::new(JobId::from(id), status)
}

pub fn job_update_frame(status: &str, job_id: &str) -> String {
    format!(r#"{{"event":"jobUpdate","data":{{"type":"{status}","jobId":"{job_id}"}}}}"#)
}

#[derive(Default)]
struct FakeState {
    active: Option<Job>,
    jobs: HashMap<JobId, Job>,
    history: Vec<Job>,
    reject_mutations: bool,
    calls: Vec<String>,
}

/// Scripted REST surface that records every call.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_active(&self, job: Option<Job>) {
        self.state.lock().unwrap().active = job;
    }

    pub fn set_job(&self, job: Job) {
        self.state.lock().unwrap().jobs.insert(job.id.clone(), job);
    }

    pub fn set_history(&self, jobs: Vec<Job>) {
        self.state.lock().unwrap().history = jobs;
    }

    pub fn reject_mutations(&self) {
        self.state.lock().unwrap().reject_mutations = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) -> std::sync::MutexGuard<'_, FakeState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }

    fn mutation(&self, call: String) -> Result<(), ApiError> {
        if self.record(call).reject_mutations {
            Err(ApiError {
                kind: FailureKind::HttpStatus(500),
                message: "Internal Server Error".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl JobApi for FakeApi {
    async fn active_job(&self) -> Result<Option<Job>, ApiError> {
        Ok(self.record("active".to_string()).active.clone())
    }

    async fn history(&self, page: u32, limit: u32) -> Result<Vec<Job>, ApiError> {
        Ok(self.record(format!("history {page} {limit}")).history.clone())
    }

    async fn job(&self, job_id: &JobId) -> Result<Job, ApiError> {
        self.record(format!("job {job_id}"))
            .jobs
            .get(job_id)
            .cloned()
            .ok_or_else(|| ApiError {
                kind: FailureKind::HttpStatus(404),
                message: "Not Found".to_string(),
            })
    }

    async fn publish(&self, job_id: &JobId) -> Result<(), ApiError> {
        self.mutation(format!("publish {job_id}"))
    }

    async fn set_like(&self, publication_id: &str, liked: bool) -> Result<(), ApiError> {
        self.mutation(format!("like {publication_id} {liked}"))
    }

    async fn set_follow(&self, user_id: &str, following: bool) -> Result<(), ApiError> {
        self.mutation(format!("follow {user_id} {following}"))
    }
}

#[derive(Default)]
struct TransportState {
    connects: usize,
    refusals: usize,
    urls: Vec<Url>,
    server: Option<mpsc::UnboundedSender<String>>,
}

/// In-memory push server. Each connect replaces the previous connection.
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<TransportState>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl MemoryTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn urls(&self) -> Vec<Url> {
        self.state.lock().unwrap().urls.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .server
            .as_ref()
            .is_some_and(|server| !server.is_closed())
    }

    /// Frames the client wrote, across all connections.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn refuse_next(&self, count: usize) {
        self.state.lock().unwrap().refusals = count;
    }

    pub fn emit(&self, frame: impl Into<String>) {
        let state = self.state.lock().unwrap();
        let server = state.server.as_ref().expect("client connected");
        server.send(frame.into()).expect("connection open");
    }

    pub fn drop_connection(&self) {
        self.state.lock().unwrap().server = None;
    }
}

#[async_trait::async_trait]
impl PushTransport for MemoryTransport {
    async fn connect(&self, url: &Url) -> Result<Box<dyn PushConnection>, ChannelError> {
        let mut state = self.state.lock().unwrap();
        state.urls.push(url.clone());
        if state.refusals > 0 {
            state.refusals -= 1;
            return Err(ChannelError::Connect("connection refused".to_string()));
        }
        let (server, frames) = mpsc::unbounded_channel();
        state.connects += 1;
        state.server = Some(server);
        Ok(Box::new(MemoryConnection {
            frames,
            sent: self.sent.clone(),
        }))
    }
}

struct MemoryConnection {
    frames: mpsc::UnboundedReceiver<String>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl PushConnection for MemoryConnection {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String, ChannelError>> {
        self.frames.recv().await.map(Ok)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
