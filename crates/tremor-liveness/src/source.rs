//! Sensor source seam.
//!
//! A source owns the platform subscription and forwards every reading to the
//! [`IngestHandle`] it was given on `subscribe`. Sources must tolerate
//! `subscribe`/`unsubscribe` being called more than once over their lifetime.

use crate::types::{SensorEvent, SensorKind};
use crate::IngestHandle;
use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Trait for platform-specific motion sensor subscriptions.
pub trait SensorSource: Send {
    /// Begin delivering samples to `sink`.
    fn subscribe(&mut self, sink: IngestHandle) -> Result<()>;

    /// Stop delivering samples. Must be safe when not subscribed.
    fn unsubscribe(&mut self);

    /// Whether the hardware for `kind` is present.
    fn has_sensor(&self, _kind: SensorKind) -> bool {
        true
    }
}

/// Event tagged with the subscription epoch current when it was sent.
type Tagged = (u64, SensorEvent);

/// Producer half of a [`ChannelSource`].
#[derive(Debug, Clone)]
pub struct SensorSender {
    tx: mpsc::UnboundedSender<Tagged>,
    epoch: Arc<AtomicU64>,
}

impl SensorSender {
    /// Queue a reading. Returns `false` once the source has been dropped.
    pub fn send(&self, event: SensorEvent) -> bool {
        let epoch = self.epoch.load(Ordering::SeqCst);
        self.tx.send((epoch, event)).is_ok()
    }
}

/// Source fed through a channel, for bridges that receive sensor callbacks
/// on their own threads.
///
/// Only events sent after the latest `subscribe` are delivered. Anything
/// queued before it, including while unsubscribed, is discarded.
pub struct ChannelSource {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Tagged>>>,
    epoch: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl ChannelSource {
    pub fn new() -> (Self, SensorSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        let epoch = Arc::new(AtomicU64::new(0));
        let source = Self {
            rx: Arc::new(Mutex::new(rx)),
            epoch: Arc::clone(&epoch),
            task: None,
        };
        (source, SensorSender { tx, epoch })
    }

    pub fn is_subscribed(&self) -> bool {
        self.task.is_some()
    }
}

impl SensorSource for ChannelSource {
    fn subscribe(&mut self, sink: IngestHandle) -> Result<()> {
        if self.task.is_some() {
            return Ok(());
        }
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let rx = Arc::clone(&self.rx);
        self.task = Some(tokio::spawn(drain_loop(rx, epoch, sink)));
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ChannelSource {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Background task: forward events of `epoch` into the ingest until all senders drop.
async fn drain_loop(
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Tagged>>>,
    epoch: u64,
    sink: IngestHandle,
) {
    let mut rx = rx.lock().await;
    let mut stale: u64 = 0;
    while let Some((tag, event)) = rx.recv().await {
        if tag < epoch {
            stale += 1;
            continue;
        }
        if stale > 0 {
            tracing::debug!(stale, "Discarded sensor events queued before subscribe");
            stale = 0;
        }
        sink.on_sample(event);
    }
    tracing::warn!("Sensor channel closed");
}
