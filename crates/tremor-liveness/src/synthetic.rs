//! Deterministic motion scenarios for demos and tests.

use crate::source::SensorSource;
use crate::types::{SensorEvent, SensorKind};
use crate::IngestHandle;
use anyhow::{ensure, Result};
use glam::Vec3;
use std::f32::consts::TAU;
use std::time::Duration;
use tokio::task::JoinHandle;

const GRAVITY: f32 = 9.81;

/// Motion pattern produced by a [`SyntheticSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Phone held in a hand: small tremor on both streams.
    HandHeld,
    /// Phone on a tripod: gravity plus sensor-level dither.
    Tripod,
    /// Emulator feeding zero vectors.
    Emulator,
    /// Violent shaking, well above the tremor band.
    Shaking,
}

impl Scenario {
    /// Accelerometer and gyroscope readings for sample index `k`.
    pub fn sample(self, k: u64) -> (Vec3, Vec3) {
        let k = k as f32;
        let wave = |period: f32, phase: f32| (TAU * k / period + phase).sin();

        match self {
            Scenario::HandHeld => (
                Vec3::new(
                    0.3 * wave(7.0, 0.0),
                    0.2 * wave(7.0, TAU / 4.0),
                    GRAVITY + 0.25 * wave(5.0, 0.4),
                ),
                Vec3::new(
                    0.1 + 0.05 * wave(6.0, 0.0),
                    0.01 * wave(9.0, TAU / 4.0),
                    0.01 * wave(4.0, 0.0),
                ),
            ),
            Scenario::Tripod => {
                let d = 1e-4 * wave(3.0, 0.0);
                (Vec3::new(d, 0.0, GRAVITY + d), Vec3::new(d, d, 0.0))
            }
            Scenario::Emulator => (Vec3::ZERO, Vec3::ZERO),
            Scenario::Shaking => (
                Vec3::new(4.0 * wave(3.0, 0.0), 0.0, GRAVITY + 4.0 * wave(4.0, 0.0)),
                Vec3::new(3.0 + 2.0 * wave(5.0, 0.0), 1.0, 0.0),
            ),
        }
    }
}

/// Source that replays a [`Scenario`] at a fixed rate on a tokio interval.
///
/// Each tick delivers one accelerometer and one gyroscope sample.
pub struct SyntheticSource {
    scenario: Scenario,
    period: Duration,
    gyro_present: bool,
    task: Option<JoinHandle<()>>,
}

impl SyntheticSource {
    pub fn new(scenario: Scenario, rate_hz: u32) -> Result<Self> {
        ensure!(rate_hz > 0, "Synthetic sample rate must be positive");
        Ok(Self {
            scenario,
            period: Duration::from_secs_f64(1.0 / rate_hz as f64),
            gyro_present: true,
            task: None,
        })
    }

    /// Simulate a device without a gyroscope.
    pub fn without_gyro(mut self) -> Self {
        self.gyro_present = false;
        self
    }
}

impl SensorSource for SyntheticSource {
    fn subscribe(&mut self, sink: IngestHandle) -> Result<()> {
        if self.task.is_some() {
            return Ok(());
        }
        tracing::info!(
            scenario = ?self.scenario,
            period = ?self.period,
            "Synthetic sensor stream started"
        );
        self.task = Some(tokio::spawn(emit_loop(
            self.scenario,
            self.period,
            self.gyro_present,
            sink,
        )));
        Ok(())
    }

    fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!(scenario = ?self.scenario, "Synthetic sensor stream stopped");
        }
    }

    fn has_sensor(&self, kind: SensorKind) -> bool {
        kind == SensorKind::Acceleration || self.gyro_present
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

async fn emit_loop(scenario: Scenario, period: Duration, gyro_present: bool, sink: IngestHandle) {
    let mut interval = tokio::time::interval(period);
    let period_ns = period.as_nanos() as u64;
    let mut k: u64 = 0;

    loop {
        interval.tick().await;
        let (accel, gyro) = scenario.sample(k);
        let timestamp_ns = k * period_ns;

        sink.on_sample(SensorEvent::new(SensorKind::Acceleration, accel, timestamp_ns));
        if gyro_present {
            sink.on_sample(SensorEvent::new(SensorKind::AngularRate, gyro, timestamp_ns));
        }
        k += 1;
    }
}
