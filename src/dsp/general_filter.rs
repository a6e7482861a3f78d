//! General Filter
//!
//! A single biquad with four selectable responses: peak, band-pass, notch and
//! all-pass. Coefficients are computed by the caller only when the settings
//! change; `process` just runs the difference equation.

use std::f64::consts::PI;

use super::effect::{Effect, ProcessContext, ProcessSpec};

/// Filter response of the general filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneralFilterMode {
    /// Bell curve boost/cut around the centre frequency
    #[default]
    Peak,
    /// Constant 0 dB peak gain band-pass
    Bandpass,
    /// Band-reject at the centre frequency
    Notch,
    /// Unity magnitude, phase shift around the centre frequency
    Allpass,
}

impl GeneralFilterMode {
    pub const ALL: [GeneralFilterMode; 4] = [
        GeneralFilterMode::Peak,
        GeneralFilterMode::Bandpass,
        GeneralFilterMode::Notch,
        GeneralFilterMode::Allpass,
    ];

    /// Mode for a choice-parameter index; out-of-range indices fall back to Peak
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    /// Display names in choice-parameter order
    pub fn choice_names() -> &'static [&'static str] {
        &["Peak", "bandpass", "notch", "allpass"]
    }
}

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (a0 + a1*z^-1 + a2*z^-2)
/// Normalized: all coefficients divided by a0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Default for BiquadCoeffs {
    /// Pass-through
    fn default() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

impl BiquadCoeffs {
    /// Calculate biquad coefficients using Audio EQ Cookbook formulas
    /// Reference: https://www.w3.org/2011/audio/audio-eq-cookbook.html
    ///
    /// `gain_db` only affects the peak response.
    pub fn calculate(
        mode: GeneralFilterMode,
        sample_rate: f64,
        frequency: f64,
        q: f64,
        gain_db: f64,
    ) -> Self {
        // Keep the centre frequency below Nyquist
        let freq = frequency.clamp(1.0, (sample_rate * 0.49).max(1.0));
        let q = q.max(1e-3);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match mode {
            GeneralFilterMode::Peak => {
                let a = 10.0_f64.powf(gain_db / 40.0);
                (
                    1.0 + alpha * a,
                    -2.0 * cos_w0,
                    1.0 - alpha * a,
                    1.0 + alpha / a,
                    -2.0 * cos_w0,
                    1.0 - alpha / a,
                )
            }
            GeneralFilterMode::Bandpass => (
                alpha,
                0.0,
                -alpha,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            GeneralFilterMode::Notch => (
                1.0,
                -2.0 * cos_w0,
                1.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            GeneralFilterMode::Allpass => (
                1.0 - alpha,
                -2.0 * cos_w0,
                1.0 + alpha,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude response at `frequency` (linear)
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (cos1, sin1) = (w.cos(), w.sin());
        let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * cos1 + self.b2 * cos2;
        let num_im = -(self.b1 * sin1 + self.b2 * sin2);
        let den_re = 1.0 + self.a1 * cos1 + self.a2 * cos2;
        let den_im = -(self.a1 * sin1 + self.a2 * sin2);

        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

/// Biquad filter state for one channel
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64, // x[n-1]
    x2: f64, // x[n-2]
    y1: f64, // y[n-1]
    y2: f64, // y[n-2]
}

impl BiquadState {
    /// Direct Form I
    #[inline]
    fn process(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Mono biquad whose coefficients are pushed in from outside
#[derive(Debug, Clone, Default)]
pub struct GeneralFilter {
    coeffs: BiquadCoeffs,
    state: BiquadState,
}

impl GeneralFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in new coefficients; filter history is kept
    pub fn set_coefficients(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    pub fn coefficients(&self) -> &BiquadCoeffs {
        &self.coeffs
    }
}

impl Effect for GeneralFilter {
    fn prepare(&mut self, _spec: &ProcessSpec) {
        self.reset();
    }

    fn reset(&mut self) {
        self.state = BiquadState::default();
    }

    fn process(&mut self, context: &mut ProcessContext<'_>) {
        if context.is_bypassed {
            return;
        }

        for sample in context.block().iter_mut() {
            *sample = self.state.process(*sample as f64, &self.coeffs) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    const SR: f64 = 48000.0;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test_case(GeneralFilterMode::Bandpass, 1.0 ; "bandpass is unity at centre")]
    #[test_case(GeneralFilterMode::Notch, 0.0 ; "notch rejects centre")]
    #[test_case(GeneralFilterMode::Allpass, 1.0 ; "allpass is unity at centre")]
    fn test_magnitude_at_centre(mode: GeneralFilterMode, expected: f64) {
        let coeffs = BiquadCoeffs::calculate(mode, SR, 1000.0, 0.72, 0.0);
        assert_relative_eq!(coeffs.magnitude_at(1000.0, SR), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_peak_gain_at_centre() {
        let coeffs = BiquadCoeffs::calculate(GeneralFilterMode::Peak, SR, 2000.0, 1.0, 12.0);
        let gain_db = 20.0 * coeffs.magnitude_at(2000.0, SR).log10();
        assert_relative_eq!(gain_db, 12.0, epsilon = 1e-6);
    }

    #[test]
    fn test_flat_peak_is_transparent() {
        let coeffs = BiquadCoeffs::calculate(GeneralFilterMode::Peak, SR, 750.0, 0.72, 0.0);
        for freq in [50.0, 750.0, 8000.0] {
            assert_relative_eq!(coeffs.magnitude_at(freq, SR), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_allpass_is_flat_everywhere() {
        let coeffs = BiquadCoeffs::calculate(GeneralFilterMode::Allpass, SR, 500.0, 3.0, 0.0);
        for freq in [30.0, 200.0, 500.0, 5000.0, 18000.0] {
            assert_relative_eq!(coeffs.magnitude_at(freq, SR), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_notch_processing_attenuates_centre() {
        let mut filter = GeneralFilter::new();
        filter.prepare(&ProcessSpec::mono(SR, 512));
        filter.set_coefficients(BiquadCoeffs::calculate(
            GeneralFilterMode::Notch,
            SR,
            1000.0,
            2.0,
            0.0,
        ));

        let mut block = sine(1000.0, 9600);
        filter.process(&mut ProcessContext::new(&mut block));
        // Skip the transient
        assert!(rms(&block[4800..]) < 0.01);
    }

    #[test]
    fn test_bypassed_filter_is_untouched() {
        let mut filter = GeneralFilter::new();
        filter.set_coefficients(BiquadCoeffs::calculate(
            GeneralFilterMode::Notch,
            SR,
            1000.0,
            2.0,
            0.0,
        ));

        let input = sine(1000.0, 256);
        let mut block = input.clone();
        filter.process(&mut ProcessContext::scoped(&mut block, true));
        assert_eq!(block, input);
    }

    #[test]
    fn test_coefficients_at_tiny_sample_rate_are_finite() {
        for mode in GeneralFilterMode::ALL {
            let coeffs = BiquadCoeffs::calculate(mode, 1.0, 1000.0, 1.0, 6.0);
            assert!(coeffs.b0.is_finite() && coeffs.a1.is_finite() && coeffs.a2.is_finite());
        }
    }

    #[test]
    fn test_mode_from_index() {
        assert_eq!(GeneralFilterMode::from_index(2), GeneralFilterMode::Notch);
        assert_eq!(GeneralFilterMode::from_index(99), GeneralFilterMode::Peak);
        assert_eq!(GeneralFilterMode::choice_names().len(), GeneralFilterMode::ALL.len());
    }
}
