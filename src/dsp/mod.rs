//! DSP Effects Library
//!
//! The five effect modules of the chain plus the shared pieces they are built
//! on. All modules implement the `Effect` trait and process one mono block in
//! place.

mod chorus;
mod effect;
mod general_filter;
mod ladder;
mod overdrive;
mod phaser;
mod smoother;

pub use chorus::{Chorus, MAX_CENTRE_DELAY_MS};
pub use effect::{Effect, ProcessContext, ProcessSpec};
pub use general_filter::{BiquadCoeffs, GeneralFilter, GeneralFilterMode};
pub use ladder::{LadderFilter, LadderMode};
pub use overdrive::Overdrive;
pub use phaser::{Phaser, PHASER_STAGES};
pub use smoother::{LinearSmoother, DEFAULT_RAMP_SECONDS};
