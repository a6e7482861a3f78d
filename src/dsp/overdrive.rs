//! Overdrive
//!
//! The drive stage of the ladder filter on its own: a ladder in LPF12 mode
//! with the cutoff parked at the top of the audio band and no resonance, so
//! only the tanh saturation and its gain compensation colour the signal.

use super::effect::{Effect, ProcessContext, ProcessSpec};
use super::ladder::{LadderFilter, LadderMode};

/// Cutoff the internal ladder sits at
const OPEN_CUTOFF_HZ: f32 = 20000.0;

/// Saturation range (1 = gentle, 100 = heavy)
const MIN_SATURATION: f32 = 1.0;
const MAX_SATURATION: f32 = 100.0;

#[derive(Debug, Clone)]
pub struct Overdrive {
    ladder: LadderFilter,
}

impl Overdrive {
    pub fn new() -> Self {
        let mut ladder = LadderFilter::new();
        ladder.set_mode(LadderMode::Lpf12);
        ladder.set_resonance(0.0);
        ladder.set_cutoff_frequency_hz(OPEN_CUTOFF_HZ);
        Self { ladder }
    }

    /// Saturation amount, clamped to 1..100
    pub fn set_drive(&mut self, saturation: f32) {
        self.ladder
            .set_drive(saturation.clamp(MIN_SATURATION, MAX_SATURATION));
    }

    pub fn drive(&self) -> f32 {
        self.ladder.drive()
    }
}

impl Default for Overdrive {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Overdrive {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.ladder.prepare(spec);
        self.ladder.set_cutoff_frequency_hz(OPEN_CUTOFF_HZ);
    }

    fn reset(&mut self) {
        self.ladder.reset();
    }

    fn process(&mut self, context: &mut ProcessContext<'_>) {
        self.ladder.process(context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.8 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 48000.0).sin())
            .collect()
    }

    #[test]
    fn test_heavy_drive_squares_up_the_wave() {
        let mut overdrive = Overdrive::new();
        overdrive.prepare(&ProcessSpec::mono(48000.0, 512));
        overdrive.set_drive(100.0);

        let input = sine(4800);
        let mut block = input.clone();
        overdrive.process(&mut ProcessContext::new(&mut block));

        let peak = block.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(peak.is_finite() && peak < 2.0);

        // A saturated sine spends far more time near its peak than a clean one
        let near_peak = |b: &[f32], p: f32| b.iter().filter(|s| s.abs() > 0.8 * p).count();
        let input_peak = input.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(near_peak(&block[2400..], peak) > near_peak(&input[2400..], input_peak));
    }

    #[test]
    fn test_drive_is_clamped() {
        let mut overdrive = Overdrive::new();
        overdrive.set_drive(0.0);
        assert_eq!(overdrive.drive(), 1.0);
        overdrive.set_drive(1000.0);
        assert_eq!(overdrive.drive(), 100.0);
    }

    #[test]
    fn test_bypass_is_noop() {
        let mut overdrive = Overdrive::new();
        overdrive.prepare(&ProcessSpec::mono(48000.0, 512));
        overdrive.set_drive(80.0);

        let input = sine(256);
        let mut block = input.clone();
        overdrive.process(&mut ProcessContext::scoped(&mut block, true));
        assert_eq!(block, input);
    }
}
