//! Transient status messages with timed auto-clear

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::core::models::{StatusKind, StatusMessage};

/// Default lifetime of a status message
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Default)]
struct ClearTimer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Holds the current status and clears it after a fixed delay.
///
/// Every emission aborts the pending clear and starts a new window, and the
/// generation check keeps a stale clear from wiping a newer message.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    sender: Arc<watch::Sender<StatusMessage>>,
    timer: Arc<Mutex<ClearTimer>>,
    ttl: Duration,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_TTL)
    }
}

impl StatusBoard {
    pub fn new(ttl: Duration) -> Self {
        let (sender, _) = watch::channel(StatusMessage::default());
        Self {
            sender: Arc::new(sender),
            timer: Arc::new(Mutex::new(ClearTimer::default())),
            ttl,
        }
    }

    /// Current status
    pub fn current(&self) -> StatusMessage {
        self.sender.borrow().clone()
    }

    /// Observe every status change
    pub fn subscribe(&self) -> watch::Receiver<StatusMessage> {
        self.sender.subscribe()
    }

    /// Show `text` and schedule its removal
    pub async fn emit(&self, text: impl Into<String>, kind: StatusKind) {
        let message = StatusMessage::new(text, kind);
        debug!("Status [{}]: {}", message.kind, message.text);

        let mut timer = self.timer.lock().await;
        if let Some(handle) = timer.handle.take() {
            handle.abort();
        }
        timer.generation += 1;
        let generation = timer.generation;
        self.sender.send_replace(message);

        let deadline = Instant::now() + self.ttl;
        let sender = Arc::clone(&self.sender);
        let shared = Arc::clone(&self.timer);
        timer.handle = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            let mut timer = shared.lock().await;
            if timer.generation == generation {
                sender.send_replace(StatusMessage::default());
                timer.handle = None;
            }
        }));
    }

    pub async fn success(&self, text: impl Into<String>) {
        self.emit(text, StatusKind::Success).await;
    }

    pub async fn error(&self, text: impl Into<String>) {
        self.emit(text, StatusKind::Error).await;
    }

    pub async fn info(&self, text: impl Into<String>) {
        self.emit(text, StatusKind::Info).await;
    }
}
