//! ADC signal filtering — smooths thermistor readings before they reach the
//! PID controller or the safety checks.

use num_traits::{Float, FromPrimitive};

/// A generic trait for signal filters.
pub trait Filter<T> {
    /// Adds a new sample to the filter.
    fn add_sample(&mut self, sample: T);
    /// Returns the current filtered output value.
    fn output(&self) -> T;
}

/// A first-order low-pass filter.
///
/// `output = alpha * new_sample + (1 - alpha) * old_output`
#[derive(Debug, Clone, Copy)]
pub struct LowPassFilter<T: Float> {
    alpha: T,
    last_output: T,
}

impl<T: Float> LowPassFilter<T> {
    /// `alpha` is the smoothing factor in `[0, 1]`: smaller means more
    /// smoothing and slower response.
    pub fn new(alpha: T, initial_value: T) -> Self {
        assert!(alpha >= T::zero() && alpha <= T::one());
        Self { alpha, last_output: initial_value }
    }
}

impl<T: Float> Filter<T> for LowPassFilter<T> {
    fn add_sample(&mut self, sample: T) {
        self.last_output = self.alpha * sample + (T::one() - self.alpha) * self.last_output;
    }

    fn output(&self) -> T {
        self.last_output
    }
}

/// A moving average over the last `N` samples.
#[derive(Debug, Clone)]
pub struct MovingAverageFilter<T, const N: usize>
where
    T: FromPrimitive + Copy + Default + core::ops::Add<Output = T> + core::ops::Sub<Output = T> + core::ops::Div<Output = T>,
{
    samples: [T; N],
    index: usize,
    sum: T,
    count: usize,
}

impl<T, const N: usize> MovingAverageFilter<T, N>
where
    T: FromPrimitive + Copy + Default + core::ops::Add<Output = T> + core::ops::Sub<Output = T> + core::ops::Div<Output = T>,
{
    pub fn new() -> Self {
        assert!(N > 0, "window size must be greater than zero");
        Self { samples: [T::default(); N], index: 0, sum: T::default(), count: 0 }
    }
}

impl<T, const N: usize> Default for MovingAverageFilter<T, N>
where
    T: FromPrimitive + Copy + Default + core::ops::Add<Output = T> + core::ops::Sub<Output = T> + core::ops::Div<Output = T>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Filter<T> for MovingAverageFilter<T, N>
where
    T: FromPrimitive + Copy + Default + core::ops::Add<Output = T> + core::ops::Sub<Output = T> + core::ops::Div<Output = T>,
{
    fn add_sample(&mut self, sample: T) {
        self.sum = self.sum - self.samples[self.index];
        self.sum = self.sum + sample;
        self.samples[self.index] = sample;
        self.index = (self.index + 1) % N;

        if self.count < N {
            self.count += 1;
        }
    }

    fn output(&self) -> T {
        if self.count == 0 {
            T::default()
        } else {
            self.sum / T::from_usize(self.count).unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_pass_filter_blends_toward_new_sample() {
        let mut filter = LowPassFilter::new(0.5, 0.0);
        filter.add_sample(10.0);
        assert!((filter.output() - 5.0).abs() < 1e-3);
        filter.add_sample(10.0);
        assert!((filter.output() - 7.5).abs() < 1e-3);
    }

    #[test]
    fn moving_average_drops_oldest_sample_once_full() {
        let mut filter: MovingAverageFilter<f32, 4> = MovingAverageFilter::new();
        filter.add_sample(10.0);
        filter.add_sample(12.0);
        filter.add_sample(11.0);
        filter.add_sample(13.0);
        assert!((filter.output() - 11.5).abs() < 1e-3);
        filter.add_sample(8.0); // 10.0 falls out of the window
        assert!((filter.output() - 11.0).abs() < 1e-3);
    }
}
