//! Push channel: one WebSocket per session, re-registered on every connect.
//!
//! Every `jobUpdate` is forwarded to the session unfiltered. Lost connections
//! are retried after a fixed delay and missed events are not replayed; the
//! pollers bound how stale the session can get.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use genwatch_core::{EventSource, JobStatus, Msg, PushEvent, Service, UserId};
use genwatch_logging::{genwatch_debug, genwatch_info, genwatch_warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::ChannelError;

/// Frames the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerFrame {
    #[serde(rename = "jobUpdate")]
    JobUpdate(PushEvent),
}

impl ServerFrame {
    pub fn decode(text: &str) -> Result<Self, ChannelError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Frames the client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientFrame {
    #[serde(rename = "registerUser")]
    RegisterUser(UserId),
}

impl ClientFrame {
    pub fn encode(&self) -> Result<String, ChannelError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[async_trait::async_trait]
pub trait PushTransport: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn PushConnection>, ChannelError>;
}

#[async_trait::async_trait]
pub trait PushConnection: Send {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError>;

    /// Next text frame; `None` once the peer closed the connection.
    async fn next_text(&mut self) -> Option<Result<String, ChannelError>>;
}

/// Decorative notification attached to terminal push events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Completed { service: Option<Service> },
    Failed { error: Option<String> },
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Completed { service } => match service {
                Some(service) => genwatch_info!("Generation completed! ({})", service),
                None => genwatch_info!("Generation completed!"),
            },
            Notice::Failed { error } => genwatch_warn!(
                "Generation failed: {}",
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct WsTransport;

#[async_trait::async_trait]
impl PushTransport for WsTransport {
    async fn connect(&self, url: &Url) -> Result<Box<dyn PushConnection>, ChannelError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|err| ChannelError::Connect(err.to_string()))?;
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait::async_trait]
impl PushConnection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|err| ChannelError::Transport(err.to_string()))
    }

    async fn next_text(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    genwatch_info!("Push channel closed by server: {:?}", frame);
                    return None;
                }
                // Ping/pong are answered by tungstenite; binary frames carry nothing for us.
                Ok(_) => continue,
                Err(err) => return Some(Err(ChannelError::Transport(err.to_string()))),
            }
        }
    }
}

pub struct PushChannelConfig {
    pub url: Url,
    pub user_id: UserId,
    pub reconnect_delay: Duration,
}

/// Spawns the connection loop. It stops when `cancel` fires.
pub fn spawn_push_channel(
    config: PushChannelConfig,
    transport: Arc<dyn PushTransport>,
    notifier: Arc<dyn Notifier>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run(config, transport.as_ref(), notifier.as_ref(), &msg_tx, &cancel).await;
    })
}

async fn run(
    config: PushChannelConfig,
    transport: &dyn PushTransport,
    notifier: &dyn Notifier,
    msg_tx: &mpsc::UnboundedSender<Msg>,
    cancel: &CancellationToken,
) {
    loop {
        genwatch_info!(session: config.user_id; "Connecting push channel to {}", config.url);
        let connected = tokio::select! {
            _ = cancel.cancelled() => return,
            connected = transport.connect(&config.url) => connected,
        };
        match connected {
            Ok(connection) => {
                run_connection(connection, &config.user_id, notifier, msg_tx, cancel).await;
                if cancel.is_cancelled() || msg_tx.is_closed() {
                    return;
                }
                genwatch_warn!(session: config.user_id; "Push channel lost, reconnecting");
            }
            Err(err) => {
                genwatch_warn!(session: config.user_id; "Push channel connect failed: {}", err)
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
}

async fn run_connection(
    mut connection: Box<dyn PushConnection>,
    user_id: &UserId,
    notifier: &dyn Notifier,
    msg_tx: &mpsc::UnboundedSender<Msg>,
    cancel: &CancellationToken,
) {
    let register = match ClientFrame::RegisterUser(user_id.clone()).encode() {
        Ok(text) => text,
        Err(err) => {
            genwatch_warn!(session: user_id; "Could not encode registration: {}", err);
            return;
        }
    };
    if let Err(err) = connection.send_text(register).await {
        genwatch_warn!(session: user_id; "Push channel registration failed: {}", err);
        return;
    }
    genwatch_info!(session: user_id; "Push channel registered");

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            next = connection.next_text() => next,
        };
        match next {
            Some(Ok(text)) => {
                if !forward_frame(&text, notifier, msg_tx) {
                    return;
                }
            }
            Some(Err(err)) => {
                genwatch_warn!(session: user_id; "Push channel receive error: {}", err);
                return;
            }
            None => return,
        }
    }
}

/// Returns false once the session stopped listening.
fn forward_frame(
    text: &str,
    notifier: &dyn Notifier,
    msg_tx: &mpsc::UnboundedSender<Msg>,
) -> bool {
    let event = match ServerFrame::decode(text) {
        Ok(ServerFrame::JobUpdate(event)) => event,
        Err(err) => {
            genwatch_debug!("Ignoring push frame ({}): {}", err, text);
            return true;
        }
    };
    genwatch_debug!("jobUpdate {} {}", event.job_id, event.kind);

    match event.kind {
        JobStatus::Completed => notifier.notify(Notice::Completed {
            service: event.service,
        }),
        JobStatus::Failed => notifier.notify(Notice::Failed {
            error: event.error.clone(),
        }),
        JobStatus::Pending | JobStatus::Processing => {}
    }

    msg_tx
        .send(Msg::JobObserved {
            source: EventSource::Push,
            update: event.into(),
        })
        .is_ok()
}
