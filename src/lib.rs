//! Reorder FX - a stereo effects processor with a reorderable chain
//!
//! Five modules (phaser, chorus, overdrive, ladder filter and a general
//! biquad filter) run in a processing order that can be changed at runtime.
//!
//! # Architecture
//!
//! [`Processor::new`] returns two ends that share only atomics and lock-free
//! queues:
//! - [`Processor`]: the audio thread. Owns the active order, the parameter
//!   smoothers and one module chain per channel. Never blocks or allocates.
//! - [`Controller`]: the control thread. Writes parameters, queues reorder
//!   requests, reads meters and loads/saves state.
//!
//! ```
//! use reorder_fx::{DspOption, DspOrder, Processor, ProcessorConfig};
//!
//! let (mut processor, mut controller) = Processor::new(ProcessorConfig::default())?;
//! processor.prepare(48000.0, 512)?;
//!
//! use DspOption::*;
//! controller.push_reorder_request(DspOrder::new([
//!     LadderFilter, OverDrive, Phase, Chorus, GeneralFilter,
//! ]))?;
//!
//! let mut left = vec![0.0_f32; 512];
//! let mut right = vec![0.0_f32; 512];
//! processor.process_stereo(&mut left, &mut right);
//! assert_eq!(processor.active_order().slots()[0], LadderFilter);
//! # Ok::<(), reorder_fx::FxError>(())
//! ```

pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod fifo;
pub mod order;
pub mod params;
pub mod processor;

pub mod cli;

pub use config::ProcessorConfig;
pub use error::{FxError, Result};
pub use order::{DspOption, DspOrder};
pub use params::{FloatParamId, ParameterSet};
pub use processor::{Controller, Levels, Processor};
