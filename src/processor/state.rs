//! Persisted processor state
//!
//! A JSON tree of every parameter by stable name plus the processing order as
//! an opaque blob:
//!
//! ```json
//! { "version": 1, "params": { "Phaser RateHz": 0.2, ... }, "dspOrder": [0,0,0,0, ...] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FxError, Result};
use crate::order::DspOrder;
use crate::params::ParameterSet;

/// Current state tree version
pub const STATE_VERSION: u32 = 1;

fn default_version() -> u32 {
    STATE_VERSION
}

/// The serialised state tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Parameter values by stable name
    #[serde(default)]
    pub params: BTreeMap<String, f64>,

    /// Five little-endian i32 option codes; absent in trees that never stored
    /// an order
    #[serde(rename = "dspOrder", default, skip_serializing_if = "Option::is_none")]
    pub dsp_order: Option<Vec<u8>>,
}

impl PersistedState {
    /// Snapshot every parameter plus `order`
    pub fn capture(params: &ParameterSet, order: &DspOrder) -> Self {
        let params = params
            .all()
            .into_iter()
            .map(|p| (p.name().to_string(), p.value()))
            .collect();

        Self {
            version: STATE_VERSION,
            params,
            dsp_order: Some(order.to_blob()),
        }
    }

    /// The stored order, or the sentinel when absent or malformed
    pub fn order(&self) -> DspOrder {
        match &self.dsp_order {
            Some(blob) => DspOrder::from_blob(blob),
            None => DspOrder::sentinel(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let state: PersistedState =
            serde_json::from_slice(bytes).map_err(|e| FxError::State {
                reason: e.to_string(),
            })?;

        if state.version > STATE_VERSION {
            return Err(FxError::State {
                reason: format!(
                    "state version {} is newer than supported version {}",
                    state.version, STATE_VERSION
                ),
            });
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::DspOption;
    use crate::params::FloatParamId;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_capture_and_parse() {
        use DspOption::*;
        let params = ParameterSet::new();
        params.set(FloatParamId::ChorusDepth, 40.0);
        let order = DspOrder::new([GeneralFilter, Phase, Chorus, OverDrive, LadderFilter]);

        let bytes = PersistedState::capture(&params, &order).to_bytes().unwrap();
        let state = PersistedState::from_bytes(&bytes).unwrap();

        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.params["Chorus Depth %"], 40.0);
        assert_eq!(state.params["Selected Tab"], 1.0);
        assert_eq!(state.order(), order);
    }

    #[test]
    fn test_missing_order_is_sentinel() {
        let state = PersistedState::from_bytes(br#"{ "params": {} }"#).unwrap();
        assert!(state.order().is_sentinel());
    }

    #[test]
    fn test_short_blob_is_sentinel() {
        let state =
            PersistedState::from_bytes(br#"{ "version": 1, "dspOrder": [1, 0, 0, 0] }"#).unwrap();
        assert!(state.order().is_sentinel());
    }

    #[test]
    fn test_garbage_is_state_error() {
        let err = PersistedState::from_bytes(b"not json").unwrap_err();
        assert_eq!(err.error_code(), "STATE_ERROR");

        let err = PersistedState::from_bytes(br#"{ "version": 99 }"#).unwrap_err();
        assert_eq!(err.error_code(), "STATE_ERROR");
    }
}
