use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};
use tremor_config::{AppConfig, LivenessConfig, ScenarioName};
use tremor_liveness::{ClassifierConfig, LivenessMonitor, Scenario, SyntheticSource};

fn classifier_config(config: &LivenessConfig) -> ClassifierConfig {
    ClassifierConfig {
        window_capacity: config.window_capacity,
        warmup_samples: config.warmup_samples,
        accel_variance_min: config.accel_variance_min,
        accel_variance_max: config.accel_variance_max,
        gyro_variance_min: config.gyro_variance_min,
        gyro_variance_max: config.gyro_variance_max,
        near_zero_magnitude: config.near_zero_magnitude,
    }
}

fn scenario(name: ScenarioName) -> Scenario {
    match name {
        ScenarioName::HandHeld => Scenario::HandHeld,
        ScenarioName::Tripod => Scenario::Tripod,
        ScenarioName::Emulator => Scenario::Emulator,
        ScenarioName::Shaking => Scenario::Shaking,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tremor_guard=info,tremor_liveness=info".into()),
        )
        .init();

    info!("Tremor liveness demo starting");

    // Load config.
    let config = tremor_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let demo = &config.demo;
    info!(
        scenario = ?demo.scenario,
        rate_hz = demo.sample_rate_hz,
        duration_secs = demo.duration_secs,
        "Config loaded"
    );

    let mut source = SyntheticSource::new(scenario(demo.scenario), demo.sample_rate_hz)?;
    if !demo.gyro_present {
        source = source.without_gyro();
    }

    let mut monitor = LivenessMonitor::new(source, classifier_config(&config.liveness))
        .context("Invalid liveness configuration")?;
    let mut updates = monitor.subscribe();
    monitor.start()?;

    let deadline = tokio::time::sleep(Duration::from_secs(demo.duration_secs));
    tokio::pin!(deadline);
    let mut last_quality = updates.borrow().quality;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("Classifier output channel closed");
                    break;
                }
                let output = *updates.borrow_and_update();
                if output.quality != last_quality {
                    info!(
                        quality = ?output.quality,
                        natural = output.is_natural_motion,
                        accel_variance = output.accel_variance,
                        gyro_variance = output.gyro_variance,
                        "Verdict"
                    );
                    last_quality = output.quality;
                }
            }
            _ = &mut deadline => {
                info!("Demo duration elapsed");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    let final_output = monitor.output();
    monitor.stop();
    info!(
        quality = ?final_output.quality,
        natural = final_output.is_natural_motion,
        "Final verdict"
    );

    Ok(())
}
