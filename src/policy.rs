//! Graduated-intimacy boundary.
//!
//! The follow-up decision itself comes from an external policy component;
//! this module owns its precondition and the read-side input it needs.

use serde::Serialize;

use crate::error::RapportError;
use crate::record::{FollowupSignal, Layer, Record};

/// Minimum leaves + branches answers before a roots-targeting follow-up is
/// accepted.
pub const ROOTS_MIN_SHALLOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayerCounts {
    pub leaves: usize,
    pub branches: usize,
    pub trunk: usize,
    pub roots: usize,
}

pub fn layer_counts(record: &Record) -> LayerCounts {
    let tree = &record.profile_tree;
    LayerCounts {
        leaves: tree.leaves.len(),
        branches: tree.branches.len(),
        trunk: tree.trunk.len(),
        roots: tree.roots.len(),
    }
}

/// Check an incoming follow-up signal against the record it would be stored
/// on. A decision targeting roots before enough shallow material exists is
/// rejected rather than persisted — the collaborator producing these signals
/// is unreliable by construction, so the gate lives here.
pub fn validate_followup(record: &Record, signal: &FollowupSignal) -> Result<(), RapportError> {
    if signal.target_layer == Some(Layer::Roots) {
        let counts = layer_counts(record);
        let shallow = counts.leaves + counts.branches;
        if shallow < ROOTS_MIN_SHALLOW {
            return Err(RapportError::Validation(format!(
                "follow-up targets roots but only {shallow} leaves+branches answers exist (need {ROOTS_MIN_SHALLOW})"
            )));
        }
    }
    Ok(())
}
