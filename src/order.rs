//! Processing order
//!
//! `DspOption` names the five modules of the chain; `DspOrder` is the slot
//! sequence they run in. Orders travel between threads packed into a single
//! `u64` word and are persisted as five little-endian `i32` codes.

use std::fmt;
use std::str::FromStr;

use crate::error::{FxError, Result};

/// One module kind in the chain, plus the terminal sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DspOption {
    Phase,
    Chorus,
    OverDrive,
    LadderFilter,
    GeneralFilter,
    /// Marks the enum length; also fills every slot of the "no override" order
    EndOfList,
}

impl DspOption {
    /// Number of real options
    pub const COUNT: usize = 5;

    /// Real options in declaration order
    pub const ALL: [DspOption; DspOption::COUNT] = [
        DspOption::Phase,
        DspOption::Chorus,
        DspOption::OverDrive,
        DspOption::LadderFilter,
        DspOption::GeneralFilter,
    ];

    /// Integer code (declaration order, sentinel = 5)
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Option for an integer code; anything past the real options is `None`
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Decode a code, with the sentinel accepted as itself
    fn from_code(code: u8) -> Option<Self> {
        match code as usize {
            c if c < Self::COUNT => Self::from_index(c),
            c if c == DspOption::EndOfList.index() => Some(DspOption::EndOfList),
            _ => None,
        }
    }

    pub fn is_sentinel(self) -> bool {
        self == DspOption::EndOfList
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            DspOption::Phase => "Phase",
            DspOption::Chorus => "Chorus",
            DspOption::OverDrive => "OverDrive",
            DspOption::LadderFilter => "LadderFilter",
            DspOption::GeneralFilter => "GeneralFilter",
            DspOption::EndOfList => "EndOfList",
        }
    }
}

impl fmt::Display for DspOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DspOption {
    type Err = FxError;

    /// Case-insensitive; also takes the short forms `phaser`, `overdrive`,
    /// `ladder` and `filter`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "phase" | "phaser" => Ok(DspOption::Phase),
            "chorus" => Ok(DspOption::Chorus),
            "overdrive" | "drive" => Ok(DspOption::OverDrive),
            "ladderfilter" | "ladder" => Ok(DspOption::LadderFilter),
            "generalfilter" | "general" | "filter" => Ok(DspOption::GeneralFilter),
            other => Err(FxError::InvalidOrder {
                reason: format!("unknown option '{}'", other),
            }),
        }
    }
}

/// Slot sequence of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DspOrder(pub [DspOption; DspOption::COUNT]);

/// Size of the persisted order blob in bytes
pub const ORDER_BLOB_LEN: usize = DspOption::COUNT * 4;

impl Default for DspOrder {
    /// Identity order: phase, chorus, overdrive, ladder, general filter
    fn default() -> Self {
        DspOrder(DspOption::ALL)
    }
}

impl DspOrder {
    pub fn new(slots: [DspOption; DspOption::COUNT]) -> Self {
        DspOrder(slots)
    }

    /// The "never applied / no override" marker
    pub const fn sentinel() -> Self {
        DspOrder([DspOption::EndOfList; DspOption::COUNT])
    }

    pub fn is_sentinel(&self) -> bool {
        self.0.iter().all(|o| o.is_sentinel())
    }

    pub fn slots(&self) -> &[DspOption; DspOption::COUNT] {
        &self.0
    }

    /// Every real option exactly once
    pub fn is_permutation(&self) -> bool {
        let mut seen = [false; DspOption::COUNT];
        for option in self.0 {
            if option.is_sentinel() || seen[option.index()] {
                return false;
            }
            seen[option.index()] = true;
        }
        true
    }

    /// Check the order is a full permutation
    pub fn validate(&self) -> Result<()> {
        let mut seen = [false; DspOption::COUNT];
        for (slot, option) in self.0.iter().enumerate() {
            if option.is_sentinel() {
                return Err(FxError::InvalidOrder {
                    reason: format!("slot {} holds the EndOfList sentinel", slot),
                });
            }
            if seen[option.index()] {
                return Err(FxError::InvalidOrder {
                    reason: format!("{} appears more than once", option),
                });
            }
            seen[option.index()] = true;
        }
        Ok(())
    }

    /// Pack into one word, a byte per slot
    pub fn to_bits(&self) -> u64 {
        self.0
            .iter()
            .enumerate()
            .fold(0u64, |acc, (slot, option)| {
                acc | ((option.index() as u64) << (slot * 8))
            })
    }

    /// Unpack a word written by `to_bits`; unknown codes become the sentinel
    pub fn from_bits(bits: u64) -> Self {
        let mut slots = [DspOption::EndOfList; DspOption::COUNT];
        for (slot, option) in slots.iter_mut().enumerate() {
            let code = ((bits >> (slot * 8)) & 0xff) as u8;
            *option = DspOption::from_code(code).unwrap_or(DspOption::EndOfList);
        }
        DspOrder(slots)
    }

    /// Persisted form: five little-endian `i32` codes in slot order
    pub fn to_blob(&self) -> Vec<u8> {
        self.0
            .iter()
            .flat_map(|option| (option.index() as i32).to_le_bytes())
            .collect()
    }

    /// Decode a persisted blob
    ///
    /// A blob of the wrong length, or one holding a code outside the real
    /// options, decodes to the sentinel order.
    pub fn from_blob(blob: &[u8]) -> Self {
        if blob.len() != ORDER_BLOB_LEN {
            return Self::sentinel();
        }

        let mut slots = [DspOption::EndOfList; DspOption::COUNT];
        for (option, chunk) in slots.iter_mut().zip(blob.chunks_exact(4)) {
            let code = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            match usize::try_from(code).ok().and_then(DspOption::from_index) {
                Some(decoded) => *option = decoded,
                None => return Self::sentinel(),
            }
        }
        DspOrder(slots)
    }
}

impl fmt::Display for DspOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (slot, option) in self.0.iter().enumerate() {
            if slot > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", option)?;
        }
        Ok(())
    }
}

impl FromStr for DspOrder {
    type Err = FxError;

    /// Comma-separated option names, validated as a permutation
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').filter(|p| !p.trim().is_empty()).collect();
        if parts.len() != DspOption::COUNT {
            return Err(FxError::InvalidOrder {
                reason: format!(
                    "expected {} options, got {}",
                    DspOption::COUNT,
                    parts.len()
                ),
            });
        }

        let mut slots = [DspOption::EndOfList; DspOption::COUNT];
        for (slot, part) in slots.iter_mut().zip(parts) {
            *slot = part.parse()?;
        }

        let order = DspOrder(slots);
        order.validate()?;
        Ok(order)
    }
}
