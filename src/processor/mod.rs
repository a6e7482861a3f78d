//! Block scheduler
//!
//! `Processor` is the audio-thread end of the effect chain. It owns the active
//! order, the smoothers and the two channel chains. Each call:
//!
//! 1. retargets the smoothers from the raw parameters,
//! 2. adopts the newest queued order (if any),
//! 3. answers a pending UI resync request,
//! 4. meters the input,
//! 5. runs the chain over sub-blocks of at most `max_sub_block` samples,
//!    advancing the smoothers and re-applying parameters before each one,
//! 6. meters the output.
//!
//! Nothing in the processing path allocates, locks or logs.

mod channel;
mod controller;
mod meter;
mod smoothing;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ProcessorConfig;
use crate::dsp::ProcessSpec;
use crate::engine::{rms_level, AudioBuffer, BusLayout, ChannelLayout, SubBlock, SubBlocks};
use crate::error::{FxError, Result};
use crate::fifo::OrderFifo;
use crate::order::DspOrder;
use crate::params::ParameterSet;

/// Lowest sample rate `prepare` accepts
pub const MIN_SAMPLE_RATE: f64 = 1000.0;

pub use channel::MonoChannelDsp;
pub use controller::Controller;
pub use meter::{LevelMeter, Levels};
pub use smoothing::SmootherSet;
pub use state::{PersistedState, STATE_VERSION};

/// Everything both ends touch; atomics and lock-free queues only
#[derive(Debug)]
struct Shared {
    params: ParameterSet,
    /// Control -> audio reorder requests
    to_audio: OrderFifo,
    /// Audio -> control order reports
    to_ui: OrderFifo,
    resync_requested: AtomicBool,
    meter: LevelMeter,
}

/// Audio-thread end of a processor
///
/// Not `Clone`; see [`Controller`] for the other end.
#[derive(Debug)]
pub struct Processor {
    shared: Arc<Shared>,
    config: ProcessorConfig,
    smoothers: SmootherSet,
    channels: [MonoChannelDsp; 2],
    order: DspOrder,
    sample_rate: f64,
    max_block_size: usize,
}

impl Processor {
    /// Build a processor and its controller
    ///
    /// The default order is reported on the reverse queue straight away so a
    /// freshly attached UI learns it on its first poll.
    pub fn new(config: ProcessorConfig) -> Result<(Processor, Controller)> {
        config.validate()?;

        let params = ParameterSet::new();
        let smoothers = SmootherSet::new(&params);
        let shared = Arc::new(Shared {
            params,
            to_audio: OrderFifo::new(config.order_queue_capacity),
            to_ui: OrderFifo::new(config.order_queue_capacity),
            resync_requested: AtomicBool::new(false),
            meter: LevelMeter::new(),
        });

        let order = DspOrder::default();
        shared.to_ui.push(order);

        let processor = Processor {
            shared: Arc::clone(&shared),
            config,
            smoothers,
            channels: [MonoChannelDsp::new(), MonoChannelDsp::new()],
            order,
            sample_rate: 0.0,
            max_block_size: 0,
        };

        Ok((processor, Controller::new(shared)))
    }

    /// Whether a host bus layout can be served (stereo in, stereo out only)
    pub fn is_layout_supported(layout: &BusLayout) -> bool {
        layout.input == ChannelLayout::Stereo && layout.output == ChannelLayout::Stereo
    }

    /// Configuration-time layout check
    pub fn check_layout(layout: &BusLayout) -> Result<()> {
        if Self::is_layout_supported(layout) {
            return Ok(());
        }

        warn!(input = %layout.input, output = %layout.output, "Rejected channel layout");
        Err(FxError::UnsupportedLayout {
            input: layout.input.to_string(),
            output: layout.output.to_string(),
        })
    }

    /// (Re)configure for a sample rate and host block size
    ///
    /// Resets smoothers onto the current raw values and clears all module
    /// state. The active order is kept. Fails on a non-finite sample rate or
    /// one below [`MIN_SAMPLE_RATE`].
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) -> Result<()> {
        if !sample_rate.is_finite() || sample_rate < MIN_SAMPLE_RATE {
            warn!(sample_rate, "Rejected sample rate");
            return Err(FxError::InvalidConfig {
                reason: format!(
                    "sample rate {} Hz is below the minimum of {} Hz",
                    sample_rate, MIN_SAMPLE_RATE
                ),
            });
        }

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;

        let sub_block = self.config.max_sub_block.min(max_block_size.max(1));
        let spec = ProcessSpec::mono(sample_rate, sub_block);

        self.smoothers
            .reset(&self.shared.params, sample_rate, self.config.smoothing_seconds);
        for channel in &mut self.channels {
            channel.prepare(&spec);
        }

        info!(
            sample_rate,
            max_block_size,
            sub_block,
            order = %self.order,
            "Prepared processor"
        );
        Ok(())
    }

    /// Process a stereo buffer in place
    ///
    /// Buffers that are not stereo are left untouched; the layout is checked
    /// at configuration time.
    pub fn process_block(&mut self, buffer: &mut AudioBuffer) {
        if let Some((left, right)) = buffer.stereo_mut() {
            self.process_stereo(left, right);
        }
    }

    /// Process two channel slices in place
    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.process_stereo_with_hook(left, right, |_, _| {});
    }

    /// Like [`process_stereo`](Self::process_stereo), calling `hook` after the
    /// smoothers advance for each sub-block
    pub fn process_stereo_with_hook<F>(&mut self, left: &mut [f32], right: &mut [f32], mut hook: F)
    where
        F: FnMut(SubBlock, &SmootherSet),
    {
        let len = left.len().min(right.len());
        let (left, right) = (&mut left[..len], &mut right[..len]);
        let shared: &Shared = &self.shared;

        self.smoothers.update_targets(&shared.params);

        if let Some(order) = shared.to_audio.drain_latest() {
            if !order.is_sentinel() {
                self.order = order;
            }
        }

        if shared
            .resync_requested
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            shared.to_ui.push(self.order);
        }

        shared.meter.store_pre(rms_level(left), rms_level(right));

        for sub_block in SubBlocks::new(len, self.config.max_sub_block) {
            self.smoothers.update_targets(&shared.params);
            self.smoothers.advance(sub_block.len);
            hook(sub_block, &self.smoothers);

            let bypass = shared.params.bypass_flags();
            let range = sub_block.range();
            let [dsp_left, dsp_right] = &mut self.channels;

            dsp_left.update_dsp_from_params(&shared.params, &self.smoothers);
            dsp_right.update_dsp_from_params(&shared.params, &self.smoothers);
            dsp_left.process(&mut left[range.clone()], &self.order, &bypass);
            dsp_right.process(&mut right[range], &self.order, &bypass);
        }

        shared.meter.store_post(rms_level(left), rms_level(right));
    }

    /// The order the next sub-block will run in
    pub fn active_order(&self) -> DspOrder {
        self.order
    }

    pub fn params(&self) -> &ParameterSet {
        &self.shared.params
    }

    pub fn smoothers(&self) -> &SmootherSet {
        &self.smoothers
    }

    /// Chain of one channel (0 = left, 1 = right)
    pub fn channel(&self, index: usize) -> Option<&MonoChannelDsp> {
        self.channels.get(index)
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::DspOption;

    fn prepared() -> (Processor, Controller) {
        let (mut processor, controller) = Processor::new(ProcessorConfig::default()).unwrap();
        processor.prepare(48000.0, 512).unwrap();
        (processor, controller)
    }

    #[test]
    fn test_default_order_reported_at_construction() {
        let (processor, mut controller) = prepared();
        assert_eq!(processor.active_order(), DspOrder::default());
        assert_eq!(controller.poll_latest_order(), Some(DspOrder::default()));
        assert_eq!(controller.poll_latest_order(), None);
    }

    #[test]
    fn test_layout_support() {
        assert!(Processor::is_layout_supported(&BusLayout::stereo()));
        let mono_in = BusLayout::new(ChannelLayout::Mono, ChannelLayout::Stereo);
        assert!(!Processor::is_layout_supported(&mono_in));
        let err = Processor::check_layout(&mono_in).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_LAYOUT");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ProcessorConfig {
            order_queue_capacity: 1,
            ..ProcessorConfig::default()
        };
        assert!(Processor::new(config).is_err());
    }

    #[test]
    fn test_order_adopted_at_top_of_block() {
        use DspOption::*;
        let (mut processor, mut controller) = prepared();
        let order = DspOrder::new([Chorus, Phase, GeneralFilter, LadderFilter, OverDrive]);
        controller.push_reorder_request(order).unwrap();
        assert_eq!(processor.active_order(), DspOrder::default());

        let mut buffer = AudioBuffer::new(128, ChannelLayout::Stereo);
        processor.process_block(&mut buffer);
        assert_eq!(processor.active_order(), order);
    }

    #[test]
    fn test_prepare_rejects_unusable_sample_rates() {
        let (mut processor, _controller) = Processor::new(ProcessorConfig::default()).unwrap();
        for rate in [0.0, 16.0, -48000.0, f64::NAN, f64::INFINITY] {
            let err = processor.prepare(rate, 64).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_CONFIG");
        }
        assert_eq!(processor.sample_rate(), 0.0);

        processor.prepare(MIN_SAMPLE_RATE, 64).unwrap();
        let mut left = vec![0.25_f32; 64];
        let mut right = vec![-0.25_f32; 64];
        processor.process_stereo(&mut left, &mut right);
        assert!(left.iter().chain(&right).all(|s| s.is_finite()));
    }

    #[test]
    fn test_empty_buffer_is_fine() {
        let (mut processor, _controller) = prepared();
        let mut left: [f32; 0] = [];
        let mut right: [f32; 0] = [];
        let mut calls = 0;
        processor.process_stereo_with_hook(&mut left, &mut right, |_, _| calls += 1);
        assert_eq!(calls, 0);
    }
}
