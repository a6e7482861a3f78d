//! One smoother per continuous parameter

use crate::dsp::LinearSmoother;
use crate::params::{FloatParamId, ParameterSet};

/// Smoothers indexed by `FloatParamId`
#[derive(Debug, Clone)]
pub struct SmootherSet {
    smoothers: [LinearSmoother; FloatParamId::COUNT],
}

impl SmootherSet {
    /// Smoothers resting on the current raw values
    pub fn new(params: &ParameterSet) -> Self {
        Self {
            smoothers: FloatParamId::ALL.map(|id| LinearSmoother::new(params.get(id))),
        }
    }

    /// Set the ramp length and jump every smoother to its raw value
    pub fn reset(&mut self, params: &ParameterSet, sample_rate: f64, ramp_seconds: f64) {
        for (smoother, id) in self.smoothers.iter_mut().zip(FloatParamId::ALL) {
            smoother.reset(sample_rate, ramp_seconds);
            smoother.set_target_and_skip(params.get(id), 1);
        }
    }

    /// Retarget every smoother at its raw value
    #[inline]
    pub fn update_targets(&mut self, params: &ParameterSet) {
        for (smoother, id) in self.smoothers.iter_mut().zip(FloatParamId::ALL) {
            smoother.set_target(params.get(id));
        }
    }

    #[inline]
    pub fn advance(&mut self, num_samples: usize) {
        for smoother in &mut self.smoothers {
            smoother.advance(num_samples);
        }
    }

    /// Smoothed value modules should use
    #[inline]
    pub fn value(&self, id: FloatParamId) -> f32 {
        self.smoothers[id.index()].current_value()
    }

    pub fn target(&self, id: FloatParamId) -> f32 {
        self.smoothers[id.index()].target()
    }

    pub fn is_smoothing(&self, id: FloatParamId) -> bool {
        self.smoothers[id.index()].is_smoothing()
    }

    pub fn get(&self, id: FloatParamId) -> &LinearSmoother {
        &self.smoothers[id.index()]
    }
}
