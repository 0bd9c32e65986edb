use glam::Vec3;

/// Which motion stream a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Linear acceleration (m/s^2), gravity included.
    Acceleration,
    /// Angular rate from the gyroscope (rad/s).
    AngularRate,
}

/// One timestamped reading from a sensor source.
#[derive(Debug, Clone, Copy)]
pub struct SensorEvent {
    pub kind: SensorKind,
    /// Raw 3-axis reading.
    pub sample: Vec3,
    /// Source timestamp in nanoseconds. Only used for diagnostics.
    pub timestamp_ns: u64,
}

impl SensorEvent {
    pub fn new(kind: SensorKind, sample: Vec3, timestamp_ns: u64) -> Self {
        Self {
            kind,
            sample,
            timestamp_ns,
        }
    }

    pub fn accel(x: f32, y: f32, z: f32, timestamp_ns: u64) -> Self {
        Self::new(SensorKind::Acceleration, Vec3::new(x, y, z), timestamp_ns)
    }

    pub fn gyro(x: f32, y: f32, z: f32, timestamp_ns: u64) -> Self {
        Self::new(SensorKind::AngularRate, Vec3::new(x, y, z), timestamp_ns)
    }
}

/// Signal quality verdict.
///
/// `Searching` also covers variance far above the natural band: the
/// classifier has no separate "too violent" state, so violent shaking reads
/// as `Searching` rather than `Unstable`. Consumers that need to tell the
/// two apart should inspect the variances in [`ClassifierOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quality {
    /// No usable motion signal, or a flat (synthetic/mounted) accelerometer.
    #[default]
    Unstable,
    /// Some motion, but not inside the hand-tremor band on both streams.
    Searching,
    /// Both streams inside the hand-tremor band.
    Locked,
}

/// Externally observable classifier state, always published as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassifierOutput {
    pub quality: Quality,
    pub is_natural_motion: bool,
    pub accel_variance: f32,
    pub gyro_variance: f32,
}

impl ClassifierOutput {
    /// Build an output, deriving `is_natural_motion` from the quality.
    pub fn new(quality: Quality, accel_variance: f32, gyro_variance: f32) -> Self {
        Self {
            quality,
            is_natural_motion: quality == Quality::Locked,
            accel_variance,
            gyro_variance,
        }
    }
}

/// Warm-up state of the ingest pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestState {
    /// No sample seen since start (or since the last reset).
    #[default]
    Empty,
    /// At least one window is still below the warm-up count.
    Filling,
    /// Both windows warm; every sample triggers a classification pass.
    Ready,
}
