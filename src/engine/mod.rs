//! Audio Engine Module
//!
//! Buffers, channel layouts, sub-block iteration and WAV file I/O.

pub mod buffer;
pub mod io;

pub use buffer::{
    linear_to_db, rms_level, AudioBuffer, BusLayout, ChannelLayout, SubBlock,
    SubBlocks, DEFAULT_SAMPLE_RATE, MAX_SUB_BLOCK_SIZE,
};
pub use io::{export_audio, generate_stereo_test_tone, import_audio};
