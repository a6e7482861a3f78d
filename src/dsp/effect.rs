//! Effect trait definition
//!
//! The capability every module in the chain shares: prepare, reset, process.
//! Processing is in place on one mono block, and the context carries the
//! bypass flag the module must honour.

/// Threshold for flushing denormal numbers to zero
pub const DENORMAL_THRESHOLD: f32 = 1e-15;

/// Zero out values too small to matter before they decay into subnormals
#[inline]
pub fn flush_denormal(value: f32) -> f32 {
    if value.abs() < DENORMAL_THRESHOLD {
        0.0
    } else {
        value
    }
}

/// Processing configuration handed to every module before audio starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Largest block the module will ever be asked to process
    pub maximum_block_size: usize,
    /// Channels per module instance (always 1: one instance per channel)
    pub num_channels: usize,
}

impl ProcessSpec {
    /// Mono spec at the given rate and block size
    pub fn mono(sample_rate: f64, maximum_block_size: usize) -> Self {
        Self {
            sample_rate,
            maximum_block_size,
            num_channels: 1,
        }
    }
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self::mono(48000.0, 512)
    }
}

/// In-place processing context for one mono block
#[derive(Debug)]
pub struct ProcessContext<'a> {
    block: &'a mut [f32],
    /// When set, the module leaves the block untouched
    pub is_bypassed: bool,
}

impl<'a> ProcessContext<'a> {
    pub fn new(block: &'a mut [f32]) -> Self {
        Self {
            block,
            is_bypassed: false,
        }
    }

    /// Context whose bypass flag is fixed for its whole lifetime
    pub fn scoped(block: &'a mut [f32], is_bypassed: bool) -> Self {
        Self { block, is_bypassed }
    }

    #[inline]
    pub fn block(&mut self) -> &mut [f32] {
        &mut *self.block
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.block.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }
}

/// Base trait for all DSP modules in the chain
///
/// Implementations must not allocate, lock or block inside `process`.
pub trait Effect: Send {
    /// Prepare the module for processing
    ///
    /// Called when sample rate or block size changes. This is the only place
    /// a module may allocate.
    fn prepare(&mut self, spec: &ProcessSpec);

    /// Reset module state
    ///
    /// Clears filter history, delay lines and LFO phase.
    fn reset(&mut self);

    /// Process the context's block in place
    ///
    /// Must be a no-op when `context.is_bypassed` is set.
    fn process(&mut self, context: &mut ProcessContext<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-20), 0.0);
        assert_eq!(flush_denormal(-1e-30), 0.0);
        assert_eq!(flush_denormal(f32::MIN_POSITIVE / 2.0), 0.0);
        assert_eq!(flush_denormal(1e-6), 1e-6);
        assert_eq!(flush_denormal(-0.5), -0.5);
    }

    #[test]
    fn test_scoped_context_carries_flag() {
        let mut samples = [0.0_f32; 4];
        let ctx = ProcessContext::scoped(&mut samples, true);
        assert!(ctx.is_bypassed);
        assert_eq!(ctx.len(), 4);
        assert!(!ProcessContext::new(&mut samples).is_bypassed);
    }
}
