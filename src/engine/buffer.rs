//! Audio Buffer Management
//!
//! Planar audio buffers, channel layouts, level helpers and the sub-block
//! iterator used by the block scheduler.

use std::fmt;
use std::ops::Range;

use crate::error::{FxError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default sample rate for buffers created without an explicit rate
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Upper bound on the number of samples processed between parameter updates
pub const MAX_SUB_BLOCK_SIZE: usize = 64;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns `f32::NEG_INFINITY` for zero or negative input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Root-mean-square level of a slice of samples (linear)
///
/// Accumulates in f64. An empty slice has level 0.
pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelLayout::Mono => write!(f, "mono"),
            ChannelLayout::Stereo => write!(f, "stereo"),
        }
    }
}

/// Input/output bus configuration offered by a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusLayout {
    pub input: ChannelLayout,
    pub output: ChannelLayout,
}

impl BusLayout {
    pub fn new(input: ChannelLayout, output: ChannelLayout) -> Self {
        Self { input, output }
    }

    pub fn stereo() -> Self {
        Self::new(ChannelLayout::Stereo, ChannelLayout::Stereo)
    }
}

// ============================================================================
// Sub-blocks
// ============================================================================

/// One bounded slice of a larger buffer, processed atomically with respect to
/// parameter updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubBlock {
    /// Position of this sub-block within the buffer (0-based)
    pub index: usize,
    /// First sample of the sub-block
    pub start: usize,
    /// Number of samples in the sub-block
    pub len: usize,
}

impl SubBlock {
    /// Sample range covered by this sub-block
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Iterator splitting `total` samples into sub-blocks of at most `max_len`
///
/// Every sub-block but the last has exactly `min(total, max_len)` samples.
#[derive(Debug, Clone)]
pub struct SubBlocks {
    remaining: usize,
    max_len: usize,
    start: usize,
    index: usize,
}

impl SubBlocks {
    pub fn new(total: usize, max_len: usize) -> Self {
        Self {
            remaining: total,
            max_len: max_len.max(1).min(total.max(1)),
            start: 0,
            index: 0,
        }
    }
}

impl Iterator for SubBlocks {
    type Item = SubBlock;

    fn next(&mut self) -> Option<SubBlock> {
        if self.remaining == 0 {
            return None;
        }

        let len = self.remaining.min(self.max_len);
        let block = SubBlock {
            index: self.index,
            start: self.start,
            len,
        };

        self.start += len;
        self.remaining -= len;
        self.index += 1;
        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.div_ceil(self.max_len);
        (n, Some(n))
    }
}

impl ExactSizeIterator for SubBlocks {}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Core audio buffer type
///
/// Stores audio as non-interleaved 32-bit floating point samples.
/// Each channel is a separate `Vec<f32>`.
///
/// # Example
/// ```
/// use reorder_fx::engine::{AudioBuffer, ChannelLayout};
///
/// let buffer = AudioBuffer::new(512, ChannelLayout::Stereo);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 512);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new silent buffer with the given number of samples per channel
    pub fn new(num_samples: usize, layout: ChannelLayout) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; layout.num_channels()],
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Set the sample rate (builder style)
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// # Errors
    /// `InvalidAudio` if the data length is not a multiple of the channel count.
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(FxError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.channels() * self.len());

        for sample_idx in 0..self.len() {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Immutable view of one channel
    ///
    /// # Panics
    /// If `channel` is out of range.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.samples[channel]
    }

    /// Mutable view of one channel
    ///
    /// # Panics
    /// If `channel` is out of range.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.samples[channel]
    }

    /// Mutable views of the left and right channels of a stereo buffer
    ///
    /// Returns `None` unless the buffer has exactly two channels.
    pub fn stereo_mut(&mut self) -> Option<(&mut [f32], &mut [f32])> {
        match self.samples.as_mut_slice() {
            [left, right] => Some((left.as_mut_slice(), right.as_mut_slice())),
            _ => None,
        }
    }

    /// Check that every sample is finite
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sub_block_lengths() {
        let lens: Vec<usize> = SubBlocks::new(200, 64).map(|b| b.len).collect();
        assert_eq!(lens, vec![64, 64, 64, 8]);
    }

    #[test]
    fn test_sub_blocks_cover_buffer_contiguously() {
        let blocks: Vec<SubBlock> = SubBlocks::new(130, 64).collect();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].range(), 0..64);
        assert_eq!(blocks[1].range(), 64..128);
        assert_eq!(blocks[2].range(), 128..130);
        assert_eq!(blocks[2].index, 2);
    }

    #[test]
    fn test_short_buffer_is_single_sub_block() {
        let blocks: Vec<SubBlock> = SubBlocks::new(17, 64).collect();
        assert_eq!(blocks, vec![SubBlock { index: 0, start: 0, len: 17 }]);
        assert_eq!(SubBlocks::new(0, 64).count(), 0);
        assert_eq!(SubBlocks::new(4096, 64).len(), 64);
    }

    #[test]
    fn test_rms_of_sine() {
        let sine: Vec<f32> = (0..48000)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 48000.0).sin())
            .collect();
        assert_relative_eq!(rms_level(&sine), std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-3);
        assert_eq!(rms_level(&[]), 0.0);
    }

    #[test]
    fn test_interleave_roundtrip() {
        let interleaved = vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer =
            AudioBuffer::from_interleaved(&interleaved, ChannelLayout::Stereo, 44100).unwrap();
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.channel(1), &[-0.1, -0.2, -0.3]);
        assert_eq!(buffer.to_interleaved(), interleaved);

        assert!(AudioBuffer::from_interleaved(&[0.0; 3], ChannelLayout::Stereo, 44100).is_err());
    }

    #[test]
    fn test_stereo_mut_requires_two_channels() {
        let mut mono = AudioBuffer::new(8, ChannelLayout::Mono);
        assert!(mono.stereo_mut().is_none());

        let mut stereo = AudioBuffer::new(8, ChannelLayout::Stereo);
        let (left, right) = stereo.stereo_mut().unwrap();
        left[0] = 1.0;
        right[0] = -1.0;
        assert_eq!(stereo.channel(0)[0], 1.0);
        assert_eq!(stereo.channel(1)[0], -1.0);
    }

    #[test]
    fn test_db_conversions() {
        assert_relative_eq!(linear_to_db(0.5), -6.0206, epsilon = 1e-3);
        assert_eq!(linear_to_db(0.0), f32::NEG_INFINITY);
    }
}
