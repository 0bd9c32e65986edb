use crate::types::{ClassifierOutput, Quality};
use crate::window::{SlidingMagnitudeWindow, DEFAULT_NEAR_ZERO_MAGNITUDE, DEFAULT_WINDOW_CAPACITY};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Samples each window needs before classification runs.
pub const DEFAULT_WARMUP_SAMPLES: usize = 10;

/// Natural hand-tremor band for accelerometer magnitude variance.
pub const DEFAULT_ACCEL_VARIANCE_MIN: f32 = 0.001;
pub const DEFAULT_ACCEL_VARIANCE_MAX: f32 = 2.0;

/// Natural hand-tremor band for gyroscope magnitude variance.
pub const DEFAULT_GYRO_VARIANCE_MIN: f32 = 0.0001;
pub const DEFAULT_GYRO_VARIANCE_MAX: f32 = 3.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Window capacity must be at least 1")]
    ZeroCapacity,
    #[error("Warm-up of {warmup} samples is unreachable with window capacity {capacity}")]
    WarmupOutOfRange { warmup: usize, capacity: usize },
    #[error("Invalid {name} variance band [{min}, {max}]")]
    InvalidBand {
        name: &'static str,
        min: f32,
        max: f32,
    },
    #[error("Near-zero magnitude threshold must be positive and finite, got {0}")]
    InvalidNearZero(f32),
}

/// Tuning for the windows and the decision table.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub window_capacity: usize,
    pub warmup_samples: usize,
    pub accel_variance_min: f32,
    pub accel_variance_max: f32,
    pub gyro_variance_min: f32,
    pub gyro_variance_max: f32,
    pub near_zero_magnitude: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            warmup_samples: DEFAULT_WARMUP_SAMPLES,
            accel_variance_min: DEFAULT_ACCEL_VARIANCE_MIN,
            accel_variance_max: DEFAULT_ACCEL_VARIANCE_MAX,
            gyro_variance_min: DEFAULT_GYRO_VARIANCE_MIN,
            gyro_variance_max: DEFAULT_GYRO_VARIANCE_MAX,
            near_zero_magnitude: DEFAULT_NEAR_ZERO_MAGNITUDE,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.warmup_samples == 0 || self.warmup_samples > self.window_capacity {
            return Err(ConfigError::WarmupOutOfRange {
                warmup: self.warmup_samples,
                capacity: self.window_capacity,
            });
        }
        check_band("accel", self.accel_variance_min, self.accel_variance_max)?;
        check_band("gyro", self.gyro_variance_min, self.gyro_variance_max)?;
        if !(self.near_zero_magnitude.is_finite() && self.near_zero_magnitude > 0.0) {
            return Err(ConfigError::InvalidNearZero(self.near_zero_magnitude));
        }
        Ok(())
    }

    fn accel_band(&self) -> RangeInclusive<f32> {
        self.accel_variance_min..=self.accel_variance_max
    }

    fn gyro_band(&self) -> RangeInclusive<f32> {
        self.gyro_variance_min..=self.gyro_variance_max
    }
}

fn check_band(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min.is_finite() && max.is_finite() && min >= 0.0 && min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidBand { name, min, max })
    }
}

/// Tri-state liveness classifier over an accelerometer and a gyroscope window.
///
/// Rules are evaluated in priority order, first match wins:
///
/// 1. flat accelerometer (every magnitude below the near-zero threshold): `Unstable`
/// 2. both variances inside their closed bands: `Locked`
/// 3. either variance above its band minimum: `Searching`
/// 4. otherwise: `Unstable`
///
/// Rule 3 also catches variances above the band maximum, so violent shaking
/// reports `Searching`. There is no separate excessive-motion state.
#[derive(Debug, Clone, Default)]
pub struct MotionClassifier {
    config: ClassifierConfig,
}

impl MotionClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify the current window contents.
    ///
    /// Callers are expected to gate this on warm-up; see [`StreamIngest`](crate::StreamIngest).
    pub fn classify(
        &self,
        accel: &SlidingMagnitudeWindow,
        gyro: &SlidingMagnitudeWindow,
    ) -> ClassifierOutput {
        let accel_flat = accel.all_near_zero(self.config.near_zero_magnitude);
        let accel_variance = accel.variance();
        let gyro_variance = gyro.variance();

        let quality = self.verdict(accel_flat, accel_variance, gyro_variance);
        ClassifierOutput::new(quality, accel_variance, gyro_variance)
    }

    /// Decision table over precomputed readings.
    ///
    /// NaN variances fail every comparison and fall through to `Unstable`
    /// unless the other stream still shows motion.
    pub fn verdict(&self, accel_flat: bool, accel_variance: f32, gyro_variance: f32) -> Quality {
        if accel_flat {
            return Quality::Unstable;
        }

        if self.config.accel_band().contains(&accel_variance)
            && self.config.gyro_band().contains(&gyro_variance)
        {
            return Quality::Locked;
        }

        if accel_variance > self.config.accel_variance_min
            || gyro_variance > self.config.gyro_variance_min
        {
            return Quality::Searching;
        }

        Quality::Unstable
    }
}
