//! Genwatch client: REST adapter, push channel, pollers and the session
//! runtime that executes core effects.
mod api;
mod channel;
mod config;
mod poller;
mod session;
mod timers;
mod types;

pub use api::{JobApi, ReqwestJobApi};
pub use channel::{
    spawn_push_channel, ClientFrame, LogNotifier, Notice, Notifier, PushChannelConfig,
    PushConnection, PushTransport, ServerFrame, WsTransport,
};
pub use config::{ClientSettings, DEFAULT_API_URL};
pub use session::{SessionContext, SessionHandle};
pub use types::{ApiError, ChannelError, ConfigError, FailureKind};
