//! Pre/post chain level metering
//!
//! The audio thread stores RMS levels as `f32` bits; any thread may read them.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::Serialize;

use crate::engine::linear_to_db;

/// A snapshot of the four meters (linear RMS)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Levels {
    pub pre_left: f32,
    pub pre_right: f32,
    pub post_left: f32,
    pub post_right: f32,
}

impl Levels {
    /// Same snapshot in dBFS
    pub fn to_db(&self) -> Levels {
        Levels {
            pre_left: linear_to_db(self.pre_left),
            pre_right: linear_to_db(self.pre_right),
            post_left: linear_to_db(self.post_left),
            post_right: linear_to_db(self.post_right),
        }
    }
}

/// Lock-free storage for one level
#[derive(Debug, Default)]
struct AtomicLevel(AtomicU32);

impl AtomicLevel {
    #[inline]
    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// The four meters shared between the audio and control sides
#[derive(Debug, Default)]
pub struct LevelMeter {
    pre_left: AtomicLevel,
    pre_right: AtomicLevel,
    post_left: AtomicLevel,
    post_right: AtomicLevel,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn store_pre(&self, left: f32, right: f32) {
        self.pre_left.store(left);
        self.pre_right.store(right);
    }

    #[inline]
    pub fn store_post(&self, left: f32, right: f32) {
        self.post_left.store(left);
        self.post_right.store(right);
    }

    pub fn levels(&self) -> Levels {
        Levels {
            pre_left: self.pre_left.load(),
            pre_right: self.pre_right.load(),
            post_left: self.post_left.load(),
            post_right: self.post_right.load(),
        }
    }
}
