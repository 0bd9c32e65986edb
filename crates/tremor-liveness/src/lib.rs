pub mod classifier;
pub mod ingest;
pub mod source;
pub mod synthetic;
pub mod types;
pub mod window;

pub use classifier::{ClassifierConfig, ConfigError, MotionClassifier};
pub use ingest::StreamIngest;
pub use source::{ChannelSource, SensorSender, SensorSource};
pub use synthetic::{Scenario, SyntheticSource};
pub use types::{ClassifierOutput, IngestState, Quality, SensorEvent, SensorKind};
pub use window::{SlidingMagnitudeWindow, VarianceReading};

use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

struct Session {
    ingest: StreamIngest,
    /// Session allowed to feed samples; `None` while stopped.
    attached: Option<u64>,
    next_id: u64,
}

struct Shared {
    session: Mutex<Session>,
    output_tx: watch::Sender<ClassifierOutput>,
}

/// Shared entry point for sensor callbacks.
///
/// Cloned into every source. Append, classification and publication happen
/// under one lock, so observers never see a quality paired with stale
/// variances and passes are published in the order they ran.
///
/// Each handle belongs to one subscription session. Once that session is
/// closed its samples are dropped, even if the source is still delivering.
#[derive(Clone)]
pub struct IngestHandle {
    shared: Arc<Shared>,
    session: u64,
}

impl IngestHandle {
    /// Standalone handle, attached and accepting samples immediately.
    pub fn new(config: ClassifierConfig) -> Result<Self, ConfigError> {
        Self::build(config, Some(0))
    }

    fn detached(config: ClassifierConfig) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    fn build(config: ClassifierConfig, attached: Option<u64>) -> Result<Self, ConfigError> {
        let ingest = StreamIngest::new(config)?;
        let (output_tx, _) = watch::channel(ClassifierOutput::default());
        let shared = Shared {
            session: Mutex::new(Session {
                ingest,
                attached,
                next_id: 1,
            }),
            output_tx,
        };
        Ok(Self {
            shared: Arc::new(shared),
            session: 0,
        })
    }

    /// Process one reading to completion.
    pub fn on_sample(&self, event: SensorEvent) {
        let mut session = self.lock();
        if session.attached != Some(self.session) {
            tracing::trace!(session = self.session, "Dropping sample from closed session");
            return;
        }

        let ingest = &mut session.ingest;
        if let Some(output) = ingest.on_sample(&event) {
            self.shared.output_tx.send_replace(output);
        }

        let total = ingest.total_samples();
        if total % 1000 == 0 {
            tracing::debug!(total, state = ?ingest.state(), "Motion samples processed");
        }
    }

    /// Receiver that sees the current output immediately, then every update.
    pub fn subscribe(&self) -> watch::Receiver<ClassifierOutput> {
        self.shared.output_tx.subscribe()
    }

    pub fn output(&self) -> ClassifierOutput {
        *self.shared.output_tx.borrow()
    }

    pub fn state(&self) -> IngestState {
        self.lock().ingest.state()
    }

    pub fn sample_count(&self, kind: SensorKind) -> u64 {
        self.lock().ingest.sample_count(kind)
    }

    /// Start a new session and return the handle that feeds it.
    fn open_session(&self) -> IngestHandle {
        let mut session = self.lock();
        let id = session.next_id;
        session.next_id += 1;
        session.attached = Some(id);
        IngestHandle {
            shared: Arc::clone(&self.shared),
            session: id,
        }
    }

    /// Detach the current session, clear both windows and publish the
    /// default output, all under the ingest lock.
    fn close_session(&self) {
        let mut session = self.lock();
        session.attached = None;
        session.ingest.reset();
        self.shared.output_tx.send_replace(session.ingest.output());
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        // Every critical section leaves the session consistent.
        self.shared
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Liveness monitor over a motion sensor source.
///
/// Owns the source subscription and the shared ingest; publishes a
/// [`ClassifierOutput`] after every classification pass.
pub struct LivenessMonitor<S: SensorSource> {
    source: S,
    handle: IngestHandle,
    active: bool,
}

impl<S: SensorSource> LivenessMonitor<S> {
    /// Build a stopped monitor. Fails if `config` does not validate.
    pub fn new(source: S, config: ClassifierConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            source,
            handle: IngestHandle::detached(config)?,
            active: false,
        })
    }

    /// Subscribe to the source. No-op when already active.
    ///
    /// A missing sensor is not an error: its window never fills and the
    /// output stays at the default `Unstable`.
    pub fn start(&mut self) -> Result<()> {
        if self.active {
            tracing::debug!("Liveness monitor already active");
            return Ok(());
        }

        for kind in [SensorKind::Acceleration, SensorKind::AngularRate] {
            if !self.source.has_sensor(kind) {
                tracing::warn!(?kind, "Sensor not available, classification will not run");
            }
        }

        let sink = self.handle.open_session();
        if let Err(e) = self.source.subscribe(sink) {
            self.handle.close_session();
            return Err(e);
        }
        self.active = true;
        tracing::info!("Liveness monitor started");
        Ok(())
    }

    /// Unsubscribe and clear buffered samples. Safe when never started.
    ///
    /// Samples the source delivers after this returns are dropped.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.handle.close_session();
        self.source.unsubscribe();
        self.active = false;
        tracing::info!("Liveness monitor stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Latest published output (non-blocking).
    pub fn output(&self) -> ClassifierOutput {
        self.handle.output()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClassifierOutput> {
        self.handle.subscribe()
    }

    pub fn ingest_state(&self) -> IngestState {
        self.handle.state()
    }

    pub fn sample_count(&self, kind: SensorKind) -> u64 {
        self.handle.sample_count(kind)
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: SensorSource> Drop for LivenessMonitor<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
