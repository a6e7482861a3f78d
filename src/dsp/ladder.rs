//! Ladder Filter
//!
//! Moog-style four-stage ladder with tanh input saturation and resonance
//! feedback from the last stage. The six responses are weighted mixes of the
//! five stage outputs.

use std::f32::consts::PI;

use super::effect::{flush_denormal, Effect, ProcessContext, ProcessSpec};

// ============================================================================
// Constants
// ============================================================================

/// Lowest cutoff the filter accepts
const MIN_CUTOFF_HZ: f32 = 10.0;

/// Lowest drive (unity)
const MIN_DRIVE: f32 = 1.0;

/// Output scaling applied on top of the mode weights
const MODE_GAIN: f32 = 1.2;

// ============================================================================
// Mode
// ============================================================================

/// Filter response of the ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LadderMode {
    /// 12 dB/oct low-pass
    #[default]
    Lpf12,
    /// 12 dB/oct high-pass
    Hpf12,
    /// 12 dB/oct band-pass
    Bpf12,
    /// 24 dB/oct low-pass
    Lpf24,
    /// 24 dB/oct high-pass
    Hpf24,
    /// 24 dB/oct band-pass
    Bpf24,
}

impl LadderMode {
    pub const ALL: [LadderMode; 6] = [
        LadderMode::Lpf12,
        LadderMode::Hpf12,
        LadderMode::Bpf12,
        LadderMode::Lpf24,
        LadderMode::Hpf24,
        LadderMode::Bpf24,
    ];

    /// Mode for a choice-parameter index; out-of-range indices fall back to LPF12
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    /// Display names in choice-parameter order
    pub fn choice_names() -> &'static [&'static str] {
        &["LPF12", "HPF12", "BPF12", "LPF24", "HPF24", "BPF24"]
    }

    /// Stage weights and feedback compensation for this response
    fn weights(&self) -> ([f32; 5], f32) {
        let (weights, comp) = match self {
            LadderMode::Lpf12 => ([0.0, 0.0, 1.0, 0.0, 0.0], 0.5),
            LadderMode::Hpf12 => ([1.0, -2.0, 1.0, 0.0, 0.0], 0.0),
            LadderMode::Bpf12 => ([0.0, 0.0, -1.0, 1.0, 0.0], 0.5),
            LadderMode::Lpf24 => ([0.0, 0.0, 0.0, 0.0, 1.0], 0.5),
            LadderMode::Hpf24 => ([1.0, -4.0, 6.0, -4.0, 1.0], 0.0),
            LadderMode::Bpf24 => ([0.0, 0.0, 1.0, -2.0, 1.0], 0.5),
        };
        (weights.map(|w| w * MODE_GAIN), comp)
    }
}

// ============================================================================
// Ladder Filter
// ============================================================================

/// Mono four-pole ladder filter
#[derive(Debug, Clone)]
pub struct LadderFilter {
    mode: LadderMode,
    weights: [f32; 5],
    comp: f32,
    sample_rate: f32,
    cutoff_hz: f32,
    /// exp(-2*pi*fc/fs), the one-pole coefficient shared by every stage
    cutoff_transform: f32,
    /// Resonance mapped into 0.1..1.0
    scaled_resonance: f32,
    drive: f32,
    drive2: f32,
    gain: f32,
    gain2: f32,
    /// Stage outputs: input node plus four poles
    state: [f32; 5],
}

impl LadderFilter {
    pub fn new() -> Self {
        let mut filter = Self {
            mode: LadderMode::Lpf12,
            weights: [0.0; 5],
            comp: 0.0,
            sample_rate: 48000.0,
            cutoff_hz: 200.0,
            cutoff_transform: 0.0,
            scaled_resonance: 0.1,
            drive: MIN_DRIVE,
            drive2: MIN_DRIVE,
            gain: 1.0,
            gain2: 1.0,
            state: [0.0; 5],
        };
        filter.set_mode(LadderMode::Lpf12);
        filter.set_drive(MIN_DRIVE);
        filter.update_cutoff();
        filter
    }

    pub fn set_mode(&mut self, mode: LadderMode) {
        self.mode = mode;
        let (weights, comp) = mode.weights();
        self.weights = weights;
        self.comp = comp;
    }

    pub fn mode(&self) -> LadderMode {
        self.mode
    }

    /// Cutoff in Hz, kept below Nyquist
    pub fn set_cutoff_frequency_hz(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz;
        self.update_cutoff();
    }

    pub fn cutoff_frequency_hz(&self) -> f32 {
        self.cutoff_hz
    }

    /// Resonance 0..1; 1 is close to self-oscillation
    pub fn set_resonance(&mut self, resonance: f32) {
        let resonance = resonance.clamp(0.0, 1.0);
        self.scaled_resonance = 0.1 + resonance * 0.9;
    }

    /// Input drive, 1 and up
    pub fn set_drive(&mut self, drive: f32) {
        let drive = drive.max(MIN_DRIVE);
        self.drive = drive;
        self.gain = drive.powf(-2.642) * 0.6103 + 0.3903;
        self.drive2 = drive * 0.04 + 0.96;
        self.gain2 = self.drive2.powf(-2.642) * 0.6103 + 0.3903;
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    fn update_cutoff(&mut self) {
        let nyquist_guard = (self.sample_rate * 0.49).max(MIN_CUTOFF_HZ);
        let cutoff = self.cutoff_hz.clamp(MIN_CUTOFF_HZ, nyquist_guard);
        self.cutoff_transform = (cutoff * (-2.0 * PI / self.sample_rate)).exp();
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        let a1 = self.cutoff_transform;
        let g = 1.0 - a1;
        let b0 = g * 0.769_230_77;
        let b1 = g * 0.230_769_23;

        let s = &mut self.state;
        let dx = self.gain * (self.drive * input).tanh();
        let a = dx
            + self.scaled_resonance
                * -4.0
                * (self.gain2 * (self.drive2 * s[4]).tanh() - dx * self.comp);

        let b = b1 * s[0] + a1 * s[1] + b0 * a;
        let c = b1 * s[1] + a1 * s[2] + b0 * b;
        let d = b1 * s[2] + a1 * s[3] + b0 * c;
        let e = b1 * s[3] + a1 * s[4] + b0 * d;

        *s = [a, b, c, d, e].map(flush_denormal);

        let w = &self.weights;
        a * w[0] + b * w[1] + c * w[2] + d * w[3] + e * w[4]
    }
}

impl Default for LadderFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for LadderFilter {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate as f32;
        self.update_cutoff();
        self.reset();
    }

    fn reset(&mut self) {
        self.state = [0.0; 5];
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

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48000.0;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    fn filtered_rms(mode: LadderMode, cutoff: f32, freq: f32) -> f32 {
        let mut filter = LadderFilter::new();
        filter.prepare(&ProcessSpec::mono(SR, 512));
        filter.set_mode(mode);
        filter.set_cutoff_frequency_hz(cutoff);
        filter.set_resonance(0.0);

        let mut block = sine(freq, 9600);
        filter.process(&mut ProcessContext::new(&mut block));
        rms(&block[4800..])
    }

    #[test]
    fn test_lowpass_attenuates_highs() {
        let low = filtered_rms(LadderMode::Lpf24, 300.0, 100.0);
        let high = filtered_rms(LadderMode::Lpf24, 300.0, 6000.0);
        assert!(high < low * 0.01, "low {} high {}", low, high);
    }

    #[test]
    fn test_highpass_attenuates_lows() {
        let low = filtered_rms(LadderMode::Hpf24, 3000.0, 60.0);
        let high = filtered_rms(LadderMode::Hpf24, 3000.0, 12000.0);
        assert!(low < high * 0.05, "low {} high {}", low, high);
    }

    #[test]
    fn test_output_stays_finite_with_full_resonance_and_drive() {
        let mut filter = LadderFilter::new();
        filter.prepare(&ProcessSpec::mono(SR, 512));
        filter.set_mode(LadderMode::Bpf24);
        filter.set_cutoff_frequency_hz(1200.0);
        filter.set_resonance(1.0);
        filter.set_drive(100.0);

        let mut block = sine(440.0, 4800);
        filter.process(&mut ProcessContext::new(&mut block));
        assert!(block.iter().all(|s| s.is_finite() && s.abs() < 20.0));
    }

    #[test]
    fn test_bypass_leaves_block() {
        let mut filter = LadderFilter::new();
        filter.prepare(&ProcessSpec::mono(SR, 512));
        filter.set_cutoff_frequency_hz(100.0);

        let input = sine(5000.0, 128);
        let mut block = input.clone();
        filter.process(&mut ProcessContext::scoped(&mut block, true));
        assert_eq!(block, input);
    }

    #[test]
    fn test_cutoff_is_clamped_below_nyquist() {
        let mut filter = LadderFilter::new();
        filter.prepare(&ProcessSpec::mono(SR, 512));
        filter.set_cutoff_frequency_hz(1.0e6);
        assert!(filter.cutoff_transform > 0.0);
        assert_eq!(LadderMode::from_index(4), LadderMode::Hpf24);
        assert_eq!(LadderMode::from_index(42), LadderMode::Lpf12);
    }

    #[test]
    fn test_state_settles_to_zero_after_impulse() {
        let mut filter = LadderFilter::new();
        filter.prepare(&ProcessSpec::mono(SR, 512));
        filter.set_cutoff_frequency_hz(1000.0);
        filter.set_resonance(0.5);

        let mut block = vec![0.0_f32; 96000];
        block[0] = 1.0;
        filter.process(&mut ProcessContext::new(&mut block));
        assert!(filter.state.iter().all(|s| *s == 0.0), "{:?}", filter.state);
    }

    #[test]
    fn test_tiny_sample_rate_keeps_cutoff_in_range() {
        let mut filter = LadderFilter::new();
        filter.prepare(&ProcessSpec::mono(16.0, 64));
        filter.set_cutoff_frequency_hz(20000.0);
        assert!(filter.cutoff_transform.is_finite());
        assert!(filter.cutoff_transform > 0.0 && filter.cutoff_transform < 1.0);
    }
}
