use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Classifier tuning.
    pub liveness: LivenessConfig,
    /// Synthetic stream driven by the demo binary.
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Samples kept per sensor stream.
    pub window_capacity: usize,
    /// Samples each stream needs before classification starts.
    pub warmup_samples: usize,
    /// Closed accelerometer variance band for natural hand tremor.
    pub accel_variance_min: f32,
    pub accel_variance_max: f32,
    /// Closed gyroscope variance band for natural hand tremor.
    pub gyro_variance_min: f32,
    pub gyro_variance_max: f32,
    /// Accelerometer magnitude below which a sample reads as a flat signal.
    pub near_zero_magnitude: f32,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            window_capacity: 30,
            warmup_samples: 10,
            accel_variance_min: 0.001,
            accel_variance_max: 2.0,
            gyro_variance_min: 0.0001,
            gyro_variance_max: 3.0,
            near_zero_magnitude: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Motion pattern to simulate.
    pub scenario: ScenarioName,
    /// Samples per second per sensor.
    pub sample_rate_hz: u32,
    /// How long to run before stopping.
    pub duration_secs: u64,
    /// Simulate a device without a gyroscope.
    pub gyro_present: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            scenario: ScenarioName::HandHeld,
            sample_rate_hz: 50,
            duration_secs: 10,
            gyro_present: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioName {
    /// Device held in a hand.
    HandHeld,
    /// Device mounted on a tripod.
    Tripod,
    /// Emulator feeding zero vectors.
    Emulator,
    /// Violent shaking.
    Shaking,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [liveness]
            warmup_samples = 15

            [demo]
            scenario = "tripod"
            "#,
        )
        .unwrap();

        assert_eq!(config.liveness.warmup_samples, 15);
        assert_eq!(config.liveness.window_capacity, 30);
        assert!((config.liveness.accel_variance_max - 2.0).abs() < 1e-6);
        assert_eq!(config.demo.scenario, ScenarioName::Tripod);
        assert_eq!(config.demo.sample_rate_hz, 50);
        assert!(config.demo.gyro_present);
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[demo]\nscenario = \"orbit\"\n");
        assert!(result.is_err());
    }
}
