//! Parameter smoothing for click-free parameter changes
//!
//! A linear ramp with a fixed length in samples. Unlike a one-pole smoother it
//! lands exactly on the target once the ramp has run, which lets the block
//! scheduler advance it a whole sub-block at a time.

/// Default ramp time in seconds (5 ms)
pub const DEFAULT_RAMP_SECONDS: f64 = 0.005;

/// Linearly ramped parameter value
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSmoother {
    /// Current smoothed value
    current: f32,
    /// Target value we're ramping towards
    target: f32,
    /// Per-sample increment of the active ramp
    step: f32,
    /// Samples left in the active ramp
    countdown: usize,
    /// Ramp length in samples
    steps_to_target: usize,
}

impl LinearSmoother {
    /// Create a smoother resting at `value` with no ramp configured yet
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            countdown: 0,
            steps_to_target: 0,
        }
    }

    /// Configure the ramp length and cancel any in-flight ramp
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `ramp_seconds` - Time to reach a new target
    pub fn reset(&mut self, sample_rate: f64, ramp_seconds: f64) {
        self.steps_to_target = (ramp_seconds.max(0.0) * sample_rate).round() as usize;
        self.set_current_and_target(self.target);
    }

    /// Jump straight to `value`, no ramp
    pub fn set_current_and_target(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.countdown = 0;
    }

    /// Jump to `value` and consume `skip` samples
    ///
    /// Used at prepare-time so the first block starts on the right value.
    pub fn set_target_and_skip(&mut self, value: f32, skip: usize) {
        self.set_current_and_target(value);
        self.advance(skip);
    }

    /// Start a ramp from the current value towards `value`
    ///
    /// Re-setting the same target keeps the active ramp untouched.
    pub fn set_target(&mut self, value: f32) {
        if value == self.target {
            return;
        }

        if self.steps_to_target == 0 {
            self.set_current_and_target(value);
            return;
        }

        self.target = value;
        self.countdown = self.steps_to_target;
        self.step = (self.target - self.current) / self.countdown as f32;
    }

    /// Move `num_samples` along the ramp
    #[inline]
    pub fn advance(&mut self, num_samples: usize) {
        if num_samples >= self.countdown {
            self.current = self.target;
            self.countdown = 0;
            return;
        }

        self.current += self.step * num_samples as f32;
        self.countdown -= num_samples;
    }

    /// The value modules should read
    #[inline]
    pub fn current_value(&self) -> f32 {
        self.current
    }

    /// The value being ramped towards
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True while a ramp is in flight
    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.countdown > 0
    }

    /// Ramp length in samples
    pub fn ramp_length(&self) -> usize {
        self.steps_to_target
    }
}

impl Default for LinearSmoother {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn smoother_at(value: f32) -> LinearSmoother {
        let mut smoother = LinearSmoother::new(value);
        smoother.reset(48000.0, DEFAULT_RAMP_SECONDS);
        smoother
    }

    #[test]
    fn test_ramp_length_from_sample_rate() {
        assert_eq!(smoother_at(0.0).ramp_length(), 240);
    }

    #[test]
    fn test_advance_moves_strictly_between() {
        let mut smoother = smoother_at(0.0);
        smoother.set_target(1.0);

        let mut previous = smoother.current_value();
        for _ in 0..3 {
            smoother.advance(64);
            let now = smoother.current_value();
            assert!(now > previous && now < 1.0, "{} not in ({}, 1.0)", now, previous);
            previous = now;
        }
    }

    #[test]
    fn test_reaches_target_after_ramp() {
        let mut smoother = smoother_at(10.0);
        smoother.set_target(-10.0);
        smoother.advance(200);
        assert!(smoother.is_smoothing());
        smoother.advance(40);
        assert_eq!(smoother.current_value(), -10.0);
        assert!(!smoother.is_smoothing());
    }

    #[test]
    fn test_partial_advance_is_linear() {
        let mut smoother = smoother_at(0.0);
        smoother.set_target(240.0);
        smoother.advance(60);
        assert_relative_eq!(smoother.current_value(), 60.0, epsilon = 1e-3);
    }

    #[test]
    fn test_same_target_keeps_ramp() {
        let mut smoother = smoother_at(0.0);
        smoother.set_target(1.0);
        smoother.advance(120);
        let midway = smoother.current_value();
        smoother.set_target(1.0);
        assert_eq!(smoother.current_value(), midway);
        smoother.advance(120);
        assert_eq!(smoother.current_value(), 1.0);
    }

    #[test]
    fn test_set_target_and_skip_has_no_ramp() {
        let mut smoother = smoother_at(0.0);
        smoother.set_target_and_skip(5.0, 1);
        assert_eq!(smoother.current_value(), 5.0);
        assert!(!smoother.is_smoothing());
    }

    #[test]
    fn test_reset_cancels_ramp() {
        let mut smoother = smoother_at(0.0);
        smoother.set_target(1.0);
        smoother.advance(10);
        smoother.reset(44100.0, DEFAULT_RAMP_SECONDS);
        assert_eq!(smoother.current_value(), 1.0);
        assert!(!smoother.is_smoothing());
    }

    #[test]
    fn test_zero_ramp_jumps() {
        let mut smoother = LinearSmoother::new(0.0);
        smoother.reset(48000.0, 0.0);
        smoother.set_target(3.0);
        assert_eq!(smoother.current_value(), 3.0);
    }
}
