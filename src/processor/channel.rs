//! Per-channel module chain
//!
//! One instance of each of the five modules for a single channel. Parameters
//! are pushed in from the smoothers before every sub-block, then the modules
//! run in the slot sequence of the active order.

use crate::dsp::{
    BiquadCoeffs, Chorus, Effect, GeneralFilter, GeneralFilterMode, LadderFilter, Overdrive,
    Phaser, ProcessContext, ProcessSpec,
};
use crate::order::{DspOption, DspOrder};
use crate::params::{FloatParamId, ParameterSet};

use super::smoothing::SmootherSet;

/// Percent parameters are stored 0..100, modules take 0..1
const PERCENT: f32 = 0.01;

/// The general-filter settings the current coefficients were built from
#[derive(Debug, Clone, Copy, PartialEq)]
struct FilterSettings {
    mode: GeneralFilterMode,
    freq: f32,
    q: f32,
    gain_db: f32,
}

/// Five modules for one channel
#[derive(Debug, Clone)]
pub struct MonoChannelDsp {
    phaser: Phaser,
    chorus: Chorus,
    overdrive: Overdrive,
    ladder: LadderFilter,
    general_filter: GeneralFilter,
    sample_rate: f64,
    filter_cache: Option<FilterSettings>,
    coefficient_recalculations: usize,
}

impl MonoChannelDsp {
    pub fn new() -> Self {
        Self {
            phaser: Phaser::new(),
            chorus: Chorus::new(),
            overdrive: Overdrive::new(),
            ladder: LadderFilter::new(),
            general_filter: GeneralFilter::new(),
            sample_rate: 48000.0,
            filter_cache: None,
            coefficient_recalculations: 0,
        }
    }

    /// Prepare every module; may allocate
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.phaser.prepare(spec);
        self.chorus.prepare(spec);
        self.overdrive.prepare(spec);
        self.ladder.prepare(spec);
        self.general_filter.prepare(spec);
        self.filter_cache = None;
    }

    /// Push the smoothed values (and the stepped choices) into the modules
    pub fn update_dsp_from_params(&mut self, params: &ParameterSet, smoothers: &SmootherSet) {
        use FloatParamId::*;
        let v = |id| smoothers.value(id);

        self.phaser.set_rate(v(PhaserRate));
        self.phaser.set_centre_frequency(v(PhaserCenterFreq));
        self.phaser.set_depth(v(PhaserDepth) * PERCENT);
        self.phaser.set_feedback(v(PhaserFeedback) * PERCENT);
        self.phaser.set_mix(v(PhaserMix) * PERCENT);

        self.chorus.set_rate(v(ChorusRate));
        self.chorus.set_depth(v(ChorusDepth) * PERCENT);
        self.chorus.set_centre_delay(v(ChorusCenterDelay));
        self.chorus.set_feedback(v(ChorusFeedback) * PERCENT);
        self.chorus.set_mix(v(ChorusMix) * PERCENT);

        self.overdrive.set_drive(v(OverdriveSaturation));

        self.ladder.set_mode(params.ladder_mode());
        self.ladder.set_cutoff_frequency_hz(v(LadderCutoff));
        self.ladder.set_resonance(v(LadderResonance) * PERCENT);
        self.ladder.set_drive(v(LadderDrive));

        let settings = FilterSettings {
            mode: params.general_filter_mode(),
            freq: v(GeneralFreq),
            q: v(GeneralQuality),
            gain_db: v(GeneralGain),
        };
        if self.filter_cache != Some(settings) {
            self.general_filter.set_coefficients(BiquadCoeffs::calculate(
                settings.mode,
                self.sample_rate,
                settings.freq as f64,
                settings.q as f64,
                settings.gain_db as f64,
            ));
            self.filter_cache = Some(settings);
            self.coefficient_recalculations += 1;
        }
    }

    /// Run the modules over `block` in `order`
    ///
    /// `order` must be a permutation of the five options; sentinel slots are
    /// skipped. Bypassed modules keep their slot and state but leave the
    /// samples alone.
    pub fn process(
        &mut self,
        block: &mut [f32],
        order: &DspOrder,
        bypass: &[bool; DspOption::COUNT],
    ) {
        debug_assert!(order.is_permutation(), "order is not a permutation: {}", order);

        let mut table = [(DspOption::EndOfList, false); DspOption::COUNT];
        for (entry, option) in table.iter_mut().zip(order.slots()) {
            let bypassed = bypass.get(option.index()).copied().unwrap_or(false);
            *entry = (*option, bypassed);
        }

        for (option, bypassed) in table {
            let mut context = ProcessContext::scoped(&mut *block, bypassed);
            match option {
                DspOption::Phase => self.phaser.process(&mut context),
                DspOption::Chorus => self.chorus.process(&mut context),
                DspOption::OverDrive => self.overdrive.process(&mut context),
                DspOption::LadderFilter => self.ladder.process(&mut context),
                DspOption::GeneralFilter => self.general_filter.process(&mut context),
                DspOption::EndOfList => {}
            }
        }
    }

    /// How many times the general-filter coefficients have been rebuilt
    pub fn coefficient_recalculations(&self) -> usize {
        self.coefficient_recalculations
    }

    pub fn general_filter_coefficients(&self) -> &BiquadCoeffs {
        self.general_filter.coefficients()
    }
}

impl Default for MonoChannelDsp {
    fn default() -> Self {
        Self::new()
    }
}
