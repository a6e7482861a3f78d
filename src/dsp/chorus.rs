//! Chorus
//!
//! LFO-modulated fractional delay line with feedback and a linear dry/wet
//! mix. The delay line is sized in `prepare` for the longest delay the
//! parameters allow, so processing never allocates.

use std::f32::consts::PI;

use super::effect::{flush_denormal, Effect, ProcessContext, ProcessSpec};

/// Longest centre delay the chorus accepts
pub const MAX_CENTRE_DELAY_MS: f32 = 100.0;

/// Shortest delay the modulation may reach
const MIN_DELAY_MS: f32 = 1.0;

/// Feedback limit, keeps the loop stable
const MAX_FEEDBACK: f32 = 0.99;

/// Mono chorus
#[derive(Debug, Clone)]
pub struct Chorus {
    sample_rate: f32,
    rate_hz: f32,
    depth: f32,
    centre_delay_ms: f32,
    feedback: f32,
    mix: f32,
    buffer: Vec<f32>,
    write_pos: usize,
    /// LFO phase in cycles, 0..1
    phase: f32,
}

impl Chorus {
    pub fn new() -> Self {
        Self {
            sample_rate: 48000.0,
            rate_hz: 1.0,
            depth: 0.25,
            centre_delay_ms: 7.0,
            feedback: 0.0,
            mix: 0.5,
            buffer: Vec::new(),
            write_pos: 0,
            phase: 0.0,
        }
    }

    /// LFO rate in Hz
    pub fn set_rate(&mut self, rate_hz: f32) {
        self.rate_hz = rate_hz.max(0.0);
    }

    /// Modulation depth, 0..1
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    /// Centre delay in milliseconds
    pub fn set_centre_delay(&mut self, delay_ms: f32) {
        self.centre_delay_ms = delay_ms.clamp(MIN_DELAY_MS, MAX_CENTRE_DELAY_MS);
    }

    /// Feedback, -1..1 (clamped to ±0.99)
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-MAX_FEEDBACK, MAX_FEEDBACK);
    }

    /// Dry/wet mix, 0..1
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    /// Delay line length in samples
    pub fn delay_line_len(&self) -> usize {
        self.buffer.len()
    }

    /// Current modulated delay in samples
    fn delay_samples(&self) -> f32 {
        let lfo = (2.0 * PI * self.phase).sin();
        let delay_ms = (self.centre_delay_ms * (1.0 + self.depth * 0.5 * lfo)).max(MIN_DELAY_MS);
        delay_ms * self.sample_rate / 1000.0
    }

    /// Linear interpolation between the two taps around `delay` samples back
    #[inline]
    fn read_interpolated(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        let delay_int = delay as usize;
        let frac = delay - delay_int as f32;

        let pos_0 = (self.write_pos + len - delay_int % len) % len;
        let pos_1 = (pos_0 + len - 1) % len;

        let s0 = self.buffer[pos_0];
        let s1 = self.buffer[pos_1];
        s0 + frac * (s1 - s0)
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        let max_delay = (self.buffer.len() - 2) as f32;
        let delay = self.delay_samples().clamp(1.0, max_delay);
        let wet = self.read_interpolated(delay);

        self.buffer[self.write_pos] = flush_denormal(input + self.feedback * wet);
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        self.phase += self.rate_hz / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        input * (1.0 - self.mix) + wet * self.mix
    }
}

impl Default for Chorus {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Chorus {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate as f32;
        // Centre delay plus half of it again for full-depth modulation, and
        // room for the interpolation tap
        let max_delay_ms = MAX_CENTRE_DELAY_MS * 1.5;
        let len = (max_delay_ms * 0.001 * self.sample_rate).ceil() as usize + 4;
        self.buffer = vec![0.0; len];
        self.reset();
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.phase = 0.0;
    }

    fn process(&mut self, context: &mut ProcessContext<'_>) {
        // Unprepared chorus has no delay line
        if context.is_bypassed || self.buffer.len() < 4 {
            return;
        }

        for sample in context.block().iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}
