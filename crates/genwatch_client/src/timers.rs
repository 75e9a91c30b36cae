use std::collections::HashMap;
use std::time::Duration;

use genwatch_core::{Msg, TimerKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One pending timer per kind. Rescheduling a kind replaces its timer.
pub(crate) struct Timers {
    handles: HashMap<TimerKind, JoinHandle<()>>,
    msg_tx: mpsc::UnboundedSender<Msg>,
}

impl Timers {
    pub(crate) fn new(msg_tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self {
            handles: HashMap::new(),
            msg_tx,
        }
    }

    pub(crate) fn schedule(&mut self, timer: TimerKind, generation: u64, after: Duration) {
        let msg_tx = self.msg_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = msg_tx.send(Msg::TimerElapsed { timer, generation });
        });
        if let Some(previous) = self.handles.insert(timer, handle) {
            previous.abort();
        }
    }

    pub(crate) fn cancel(&mut self, timer: TimerKind) {
        if let Some(handle) = self.handles.remove(&timer) {
            handle.abort();
        }
    }

    pub(crate) fn cancel_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
