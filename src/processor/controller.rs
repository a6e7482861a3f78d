//! Control-side handle
//!
//! The `Controller` lives on the UI / message thread. It writes parameters,
//! queues reorder requests, polls the order the audio side reports back, and
//! loads and saves state. It never touches audio-side data directly.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::order::DspOrder;
use crate::params::ParameterSet;

use super::meter::Levels;
use super::state::PersistedState;
use super::Shared;

/// Control-thread end of a processor
///
/// Not `Clone`: there is exactly one producer for the forward order queue and
/// one consumer for the reverse one.
#[derive(Debug)]
pub struct Controller {
    shared: Arc<Shared>,
    /// Latest order this side knows to be in effect
    ui_order: DspOrder,
}

impl Controller {
    pub(super) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            ui_order: DspOrder::default(),
        }
    }

    /// Parameters, for reading and writing raw values
    pub fn params(&self) -> &ParameterSet {
        &self.shared.params
    }

    /// Queue a new processing order for the audio thread
    ///
    /// Rejects anything that is not a permutation of the five options; nothing
    /// is queued in that case. Never blocks.
    pub fn push_reorder_request(&mut self, order: DspOrder) -> Result<()> {
        if let Err(e) = order.validate() {
            warn!(order = %order, error = %e, "Rejected reorder request");
            return Err(e);
        }

        debug!(order = %order, "Queued reorder request");
        self.shared.to_audio.push(order);
        self.ui_order = order;
        Ok(())
    }

    /// Newest order the audio thread has reported, if any since the last poll
    pub fn poll_latest_order(&mut self) -> Option<DspOrder> {
        let latest = self.shared.to_ui.drain_latest()?;
        if latest.is_sentinel() {
            return None;
        }
        self.ui_order = latest;
        Some(latest)
    }

    /// Ask the audio thread to report its current order on its next block
    pub fn request_ui_resync(&self) {
        self.shared.resync_requested.store(true, Ordering::Release);
    }

    /// Pre/post chain levels from the last processed block
    pub fn current_levels(&self) -> Levels {
        self.shared.meter.levels()
    }

    /// The order this side last queued or was told about
    pub fn known_order(&self) -> DspOrder {
        self.ui_order
    }

    /// Serialise every parameter plus the known order
    pub fn get_state(&self) -> Result<Vec<u8>> {
        let state = PersistedState::capture(&self.shared.params, &self.ui_order);
        let bytes = state.to_bytes()?;
        info!(
            params = state.params.len(),
            order = %self.ui_order,
            "Saved processor state"
        );
        Ok(bytes)
    }

    /// Restore parameters and order from `get_state` output
    ///
    /// Unknown parameter names are skipped. A missing or malformed order keeps
    /// the current one; a valid order is queued and a UI resync requested.
    pub fn set_state(&mut self, bytes: &[u8]) -> Result<()> {
        let state = PersistedState::from_bytes(bytes)?;

        let mut applied = 0;
        for (name, value) in &state.params {
            match self.shared.params.set_by_name(name, *value) {
                Ok(()) => applied += 1,
                Err(e) => warn!(param = %name, error = %e, "Skipped parameter in state"),
            }
        }

        let order = state.order();
        if order.is_sentinel() {
            if state.dsp_order.is_some() {
                warn!("Malformed order blob in state, keeping current order");
            } else {
                debug!("No order in state, keeping current order");
            }
        } else {
            match self.push_reorder_request(order) {
                Ok(()) => self.request_ui_resync(),
                Err(_) => warn!(order = %order, "Order in state is not a permutation, keeping current order"),
            }
        }

        info!(params = applied, "Loaded processor state");
        Ok(())
    }
}
