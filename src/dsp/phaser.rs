//! Phaser
//!
//! Six cascaded first-order all-pass stages whose break frequency is swept by
//! a sine LFO in the log-frequency domain. The last stage feeds back into the
//! first, and the result is mixed linearly with the dry signal.

use std::f32::consts::PI;

use super::effect::{flush_denormal, Effect, ProcessContext, ProcessSpec};

/// Number of all-pass stages
pub const PHASER_STAGES: usize = 6;

/// Samples between break-frequency updates
const CONTROL_INTERVAL: usize = 10;

/// Sweep range in Hz; the log domain spans these two points
const SWEEP_MIN_HZ: f32 = 20.0;
const SWEEP_MAX_HZ: f32 = 20000.0;

/// Feedback limit, keeps the loop stable
const MAX_FEEDBACK: f32 = 0.99;

/// One first-order all-pass section
#[derive(Debug, Clone, Copy, Default)]
struct AllpassStage {
    z1: f32,
}

impl AllpassStage {
    #[inline]
    fn process(&mut self, input: f32, coeff: f32) -> f32 {
        let y = -coeff * input + self.z1;
        self.z1 = flush_denormal(input + coeff * y);
        y
    }
}

/// Mono phaser
#[derive(Debug, Clone)]
pub struct Phaser {
    sample_rate: f32,
    rate_hz: f32,
    centre_hz: f32,
    depth: f32,
    feedback: f32,
    mix: f32,
    stages: [AllpassStage; PHASER_STAGES],
    last_output: f32,
    /// LFO phase in cycles, 0..1
    phase: f32,
    coeff: f32,
    /// Samples until the next coefficient update
    control_countdown: usize,
}

impl Phaser {
    pub fn new() -> Self {
        Self {
            sample_rate: 48000.0,
            rate_hz: 1.0,
            centre_hz: 1300.0,
            depth: 0.5,
            feedback: 0.0,
            mix: 0.5,
            stages: [AllpassStage::default(); PHASER_STAGES],
            last_output: 0.0,
            phase: 0.0,
            coeff: 0.0,
            control_countdown: 0,
        }
    }

    /// LFO rate in Hz
    pub fn set_rate(&mut self, rate_hz: f32) {
        self.rate_hz = rate_hz.max(0.0);
    }

    /// Centre of the sweep in Hz
    pub fn set_centre_frequency(&mut self, centre_hz: f32) {
        self.centre_hz = centre_hz.clamp(SWEEP_MIN_HZ, SWEEP_MAX_HZ);
    }

    /// Sweep depth, 0..1
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    /// Feedback, -1..1 (clamped to ±0.99)
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-MAX_FEEDBACK, MAX_FEEDBACK);
    }

    /// Dry/wet mix, 0..1
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Break frequency for the current LFO phase
    fn swept_frequency(&self) -> f32 {
        let span = (SWEEP_MAX_HZ / SWEEP_MIN_HZ).ln();
        let centre = (self.centre_hz / SWEEP_MIN_HZ).ln() / span;
        let lfo = (2.0 * PI * self.phase).sin() * self.depth * 0.5;
        let normalised = (centre + lfo).clamp(0.0, 1.0);
        let freq = SWEEP_MIN_HZ * (normalised * span).exp();
        freq.min(self.sample_rate * 0.49)
    }

    fn update_coefficient(&mut self) {
        let omega = (PI * self.swept_frequency() / self.sample_rate).tan();
        self.coeff = (1.0 - omega) / (1.0 + omega);
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        if self.control_countdown == 0 {
            self.update_coefficient();
            self.control_countdown = CONTROL_INTERVAL;
        }
        self.control_countdown -= 1;

        let mut wet = input + self.feedback * self.last_output;
        for stage in &mut self.stages {
            wet = stage.process(wet, self.coeff);
        }
        self.last_output = flush_denormal(wet);

        self.phase += self.rate_hz / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        input * (1.0 - self.mix) + wet * self.mix
    }
}

impl Default for Phaser {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Phaser {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate as f32;
        self.reset();
    }

    fn reset(&mut self) {
        self.stages = [AllpassStage::default(); PHASER_STAGES];
        self.last_output = 0.0;
        self.phase = 0.0;
        self.control_countdown = 0;
    }

    fn process(&mut self, context: &mut ProcessContext<'_>) {
        if context.is_bypassed {
            return;
        }

        for sample in context.block().iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}
