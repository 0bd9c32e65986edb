use crate::classifier::{ClassifierConfig, ConfigError, MotionClassifier};
use crate::types::{ClassifierOutput, IngestState, SensorEvent, SensorKind};
use crate::window::SlidingMagnitudeWindow;

/// Routes samples into the per-stream windows and runs the classifier once
/// both windows are warm.
///
/// Not synchronised on its own; [`IngestHandle`](crate::IngestHandle) wraps it
/// in the single lock shared with the sensor callbacks.
#[derive(Debug, Clone)]
pub struct StreamIngest {
    classifier: MotionClassifier,
    accel: SlidingMagnitudeWindow,
    gyro: SlidingMagnitudeWindow,
    state: IngestState,
    output: ClassifierOutput,
    accel_count: u64,
    gyro_count: u64,
    last_timestamp_ns: [Option<u64>; 2],
}

impl StreamIngest {
    /// Build an ingest for `config`, rejecting tunings that could never reach `Ready`.
    pub fn new(config: ClassifierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ClassifierConfig) -> Self {
        let capacity = config.window_capacity;
        Self {
            classifier: MotionClassifier::new(config),
            accel: SlidingMagnitudeWindow::new(capacity),
            gyro: SlidingMagnitudeWindow::new(capacity),
            state: IngestState::Empty,
            output: ClassifierOutput::default(),
            accel_count: 0,
            gyro_count: 0,
            last_timestamp_ns: [None; 2],
        }
    }

    /// Append one sample to its window and classify if warm.
    ///
    /// Returns the new output when a classification pass ran, `None` while
    /// still warming up (the previous output is kept).
    pub fn on_sample(&mut self, event: &SensorEvent) -> Option<ClassifierOutput> {
        match event.kind {
            SensorKind::Acceleration => {
                self.accel.append(event.sample);
                self.accel_count += 1;
            }
            SensorKind::AngularRate => {
                self.gyro.append(event.sample);
                self.gyro_count += 1;
            }
        }
        self.last_timestamp_ns[slot(event.kind)] = Some(event.timestamp_ns);

        if self.state != IngestState::Ready {
            let warmup = self.classifier.config().warmup_samples;
            if self.accel.len() >= warmup && self.gyro.len() >= warmup {
                self.state = IngestState::Ready;
                tracing::info!(
                    accel_samples = self.accel_count,
                    gyro_samples = self.gyro_count,
                    "Motion windows warm, classification running"
                );
            } else {
                self.state = IngestState::Filling;
                return None;
            }
        }

        let output = self.classifier.classify(&self.accel, &self.gyro);
        if output.quality != self.output.quality {
            tracing::debug!(
                from = ?self.output.quality,
                to = ?output.quality,
                accel_variance = output.accel_variance,
                gyro_variance = output.gyro_variance,
                "Motion quality changed"
            );
        } else {
            tracing::trace!(?output, "Classification pass");
        }
        self.output = output;
        Some(output)
    }

    /// Drop all buffered samples and return to `Empty`.
    pub fn reset(&mut self) {
        self.accel.clear();
        self.gyro.clear();
        self.state = IngestState::Empty;
        self.output = ClassifierOutput::default();
        self.accel_count = 0;
        self.gyro_count = 0;
        self.last_timestamp_ns = [None; 2];
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Last published output.
    pub fn output(&self) -> ClassifierOutput {
        self.output
    }

    pub fn window(&self, kind: SensorKind) -> &SlidingMagnitudeWindow {
        match kind {
            SensorKind::Acceleration => &self.accel,
            SensorKind::AngularRate => &self.gyro,
        }
    }

    /// Samples received for `kind` since the last reset.
    pub fn sample_count(&self, kind: SensorKind) -> u64 {
        match kind {
            SensorKind::Acceleration => self.accel_count,
            SensorKind::AngularRate => self.gyro_count,
        }
    }

    pub fn last_timestamp_ns(&self, kind: SensorKind) -> Option<u64> {
        self.last_timestamp_ns[slot(kind)]
    }

    pub fn total_samples(&self) -> u64 {
        self.accel_count + self.gyro_count
    }
}

impl Default for StreamIngest {
    fn default() -> Self {
        Self::build(ClassifierConfig::default())
    }
}

fn slot(kind: SensorKind) -> usize {
    match kind {
        SensorKind::Acceleration => 0,
        SensorKind::AngularRate => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quality;

    fn tremor_accel(i: u64) -> SensorEvent {
        let d = if i % 2 == 0 { 0.2 } else { -0.2 };
        SensorEvent::accel(0.0, 0.0, 9.81 + d, i)
    }

    fn tremor_gyro(i: u64) -> SensorEvent {
        let d = if i % 2 == 0 { 0.05 } else { -0.05 };
        SensorEvent::gyro(0.3 + d, 0.0, 0.0, i)
    }

    #[test]
    fn starts_empty_then_fills() {
        let mut ingest = StreamIngest::default();
        assert_eq!(ingest.state(), IngestState::Empty);

        assert!(ingest.on_sample(&tremor_accel(0)).is_none());
        assert_eq!(ingest.state(), IngestState::Filling);
    }

    #[test]
    fn routes_by_sensor_kind() {
        let mut ingest = StreamIngest::default();
        for i in 0..5 {
            ingest.on_sample(&tremor_accel(i));
        }
        for i in 0..3 {
            ingest.on_sample(&tremor_gyro(100 + i));
        }
        assert_eq!(ingest.window(SensorKind::Acceleration).len(), 5);
        assert_eq!(ingest.window(SensorKind::AngularRate).len(), 3);
        assert_eq!(ingest.sample_count(SensorKind::AngularRate), 3);
        assert_eq!(ingest.last_timestamp_ns(SensorKind::AngularRate), Some(102));
        assert_eq!(ingest.last_timestamp_ns(SensorKind::Acceleration), Some(4));
        assert_eq!(ingest.total_samples(), 8);
    }

    #[test]
    fn skips_classification_until_both_windows_warm() {
        let mut ingest = StreamIngest::default();
        // Plenty of accel, gyro one short of warm-up.
        for i in 0..40 {
            assert!(ingest.on_sample(&tremor_accel(i)).is_none());
        }
        for i in 0..9 {
            assert!(ingest.on_sample(&tremor_gyro(i)).is_none());
        }
        assert_eq!(ingest.state(), IngestState::Filling);
        assert_eq!(ingest.output(), ClassifierOutput::default());

        let out = ingest.on_sample(&tremor_gyro(9)).expect("warm after tenth gyro sample");
        assert_eq!(ingest.state(), IngestState::Ready);
        assert_eq!(out.quality, Quality::Locked);
        assert_eq!(ingest.output(), out);
    }

    #[test]
    fn ready_classifies_every_sample() {
        let mut ingest = StreamIngest::default();
        for i in 0..10 {
            ingest.on_sample(&tremor_accel(i));
            ingest.on_sample(&tremor_gyro(i));
        }
        assert_eq!(ingest.state(), IngestState::Ready);
        for i in 10..50 {
            assert!(ingest.on_sample(&tremor_accel(i)).is_some());
            assert!(ingest.on_sample(&tremor_gyro(i)).is_some());
        }
        assert_eq!(ingest.state(), IngestState::Ready);
        assert_eq!(ingest.window(SensorKind::Acceleration).len(), 30);
    }

    #[test]
    fn missing_gyro_never_becomes_ready() {
        let mut ingest = StreamIngest::default();
        for i in 0..1000 {
            assert!(ingest.on_sample(&tremor_accel(i)).is_none());
        }
        assert_eq!(ingest.state(), IngestState::Filling);
        assert_eq!(ingest.output().quality, Quality::Unstable);
    }

    #[test]
    fn reset_returns_to_empty() {
        let mut ingest = StreamIngest::default();
        for i in 0..10 {
            ingest.on_sample(&tremor_accel(i));
            ingest.on_sample(&tremor_gyro(i));
        }
        assert_eq!(ingest.state(), IngestState::Ready);

        ingest.reset();
        assert_eq!(ingest.state(), IngestState::Empty);
        assert!(ingest.window(SensorKind::Acceleration).is_empty());
        assert!(ingest.window(SensorKind::AngularRate).is_empty());
        assert_eq!(ingest.output(), ClassifierOutput::default());
        assert_eq!(ingest.last_timestamp_ns(SensorKind::Acceleration), None);

        assert!(ingest.on_sample(&tremor_accel(0)).is_none());
    }

    #[test]
    fn custom_warmup_is_honoured() {
        let config = ClassifierConfig {
            warmup_samples: 3,
            ..Default::default()
        };
        let mut ingest = StreamIngest::new(config).unwrap();
        for i in 0..3 {
            ingest.on_sample(&tremor_accel(i));
        }
        ingest.on_sample(&tremor_gyro(0));
        ingest.on_sample(&tremor_gyro(1));
        assert!(ingest.on_sample(&tremor_gyro(2)).is_some());
    }

    #[test]
    fn rejects_config_that_cannot_warm_up() {
        let zero_warmup = ClassifierConfig {
            warmup_samples: 0,
            ..Default::default()
        };
        assert!(matches!(
            StreamIngest::new(zero_warmup),
            Err(ConfigError::WarmupOutOfRange { warmup: 0, .. })
        ));

        let zero_capacity = ClassifierConfig {
            window_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            StreamIngest::new(zero_capacity),
            Err(ConfigError::ZeroCapacity)
        ));
    }
}
