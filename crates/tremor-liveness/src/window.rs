use glam::Vec3;
use std::collections::VecDeque;

/// Default number of samples kept per stream.
pub const DEFAULT_WINDOW_CAPACITY: usize = 30;

/// Magnitude below which a sample counts as a flat (zero-vector) reading.
pub const DEFAULT_NEAR_ZERO_MAGNITUDE: f32 = 0.1;

/// Mean and population variance of the magnitudes in a window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VarianceReading {
    pub mean_magnitude: f32,
    pub variance: f32,
}

/// Fixed-capacity FIFO of 3-axis samples with magnitude statistics.
///
/// Statistics are recomputed over the whole window on demand. The window is
/// small enough that a running sum buys nothing and would drift under
/// eviction.
#[derive(Debug, Clone)]
pub struct SlidingMagnitudeWindow {
    capacity: usize,
    samples: VecDeque<Vec3>,
}

impl SlidingMagnitudeWindow {
    /// A zero `capacity` is raised to 1. Configs that reach the ingest are
    /// validated first, so only direct callers can hit this.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Vec3> {
        self.samples.iter()
    }

    /// Append a sample, evicting the oldest one first when at capacity.
    pub fn append(&mut self, sample: Vec3) {
        if self.is_full() {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Mean magnitude and population variance of the magnitudes.
    ///
    /// Fewer than two samples is not enough data and yields all zeros.
    pub fn reading(&self) -> VarianceReading {
        if self.samples.len() < 2 {
            return VarianceReading::default();
        }

        let n = self.samples.len() as f32;
        let mean = self.magnitudes().sum::<f32>() / n;
        let variance = self.magnitudes().map(|m| (m - mean).powi(2)).sum::<f32>() / n;

        VarianceReading {
            mean_magnitude: mean,
            variance,
        }
    }

    /// Population variance of the sample magnitudes (0 below two samples).
    pub fn variance(&self) -> f32 {
        self.reading().variance
    }

    /// True iff every stored magnitude is strictly below `threshold`.
    ///
    /// NaN magnitudes compare false, so a NaN sample makes this false.
    pub fn all_near_zero(&self, threshold: f32) -> bool {
        self.magnitudes().all(|m| m < threshold)
    }

    fn magnitudes(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().map(|s| s.length())
    }
}

impl Default for SlidingMagnitudeWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn along_x(values: &[f32]) -> SlidingMagnitudeWindow {
        let mut window = SlidingMagnitudeWindow::default();
        for &v in values {
            window.append(Vec3::new(v, 0.0, 0.0));
        }
        window
    }

    #[test]
    fn variance_is_zero_below_two_samples() {
        let empty = SlidingMagnitudeWindow::default();
        assert_eq!(empty.variance(), 0.0);

        let single = along_x(&[7.5]);
        assert_eq!(single.variance(), 0.0);
        assert_eq!(single.reading().mean_magnitude, 0.0);
    }

    #[test]
    fn variance_of_magnitudes_is_population_variance() {
        // Magnitudes 1, 2, 3, 4: mean 2.5, population variance 1.25.
        let window = along_x(&[1.0, -2.0, 3.0, -4.0]);
        let reading = window.reading();
        assert!((reading.mean_magnitude - 2.5).abs() < 1e-6);
        assert!((reading.variance - 1.25).abs() < 1e-6);
    }

    #[test]
    fn magnitude_uses_all_three_axes() {
        let mut window = SlidingMagnitudeWindow::default();
        window.append(Vec3::new(3.0, 4.0, 0.0)); // 5
        window.append(Vec3::new(0.0, 0.0, 1.0)); // 1
        // mean 3, deviations +-2
        assert!((window.variance() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn constant_magnitude_has_zero_variance() {
        let mut window = SlidingMagnitudeWindow::default();
        for i in 0..20 {
            // Rotating vector with fixed length 9.81.
            let a = i as f32 * 0.3;
            window.append(Vec3::new(9.81 * a.cos(), 9.81 * a.sin(), 0.0));
        }
        assert!(window.variance().abs() < 1e-4);
    }

    #[test]
    fn append_at_capacity_evicts_oldest() {
        let mut window = SlidingMagnitudeWindow::default();
        for i in 0..DEFAULT_WINDOW_CAPACITY {
            window.append(Vec3::new(i as f32, 0.0, 0.0));
        }
        assert!(window.is_full());
        assert_eq!(window.len(), 30);

        window.append(Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(window.len(), 30);

        let xs: Vec<f32> = window.iter().map(|s| s.x).collect();
        assert_eq!(xs[0], 1.0);
        assert_eq!(xs[28], 29.0);
        assert_eq!(xs[29], 100.0);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut window = SlidingMagnitudeWindow::new(5);
        for i in 0..50 {
            window.append(Vec3::splat(i as f32));
            assert!(window.len() <= 5);
        }
        assert_eq!(window.capacity(), 5);
    }

    #[test]
    fn all_near_zero_on_flat_window() {
        let window = along_x(&[0.0; 12]);
        assert!(window.all_near_zero(DEFAULT_NEAR_ZERO_MAGNITUDE));
    }

    #[test]
    fn all_near_zero_fails_on_single_large_sample() {
        let mut window = along_x(&[0.0; 12]);
        window.append(Vec3::new(0.0, 0.1, 0.0));
        // 0.1 is not strictly below the threshold.
        assert!(!window.all_near_zero(DEFAULT_NEAR_ZERO_MAGNITUDE));

        let mut window = along_x(&[0.01; 12]);
        window.append(Vec3::new(0.05, 0.05, 0.05));
        assert!(window.all_near_zero(DEFAULT_NEAR_ZERO_MAGNITUDE));
    }

    #[test]
    fn nan_sample_propagates() {
        let mut window = along_x(&[1.0, 2.0, 3.0]);
        window.append(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(window.variance().is_nan());
        assert!(!window.all_near_zero(DEFAULT_NEAR_ZERO_MAGNITUDE));
    }

    #[test]
    fn clear_empties_window() {
        let mut window = along_x(&[1.0, 2.0]);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.variance(), 0.0);
    }
}
