//! Layering (z-index) commands and extrema maintenance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use liveproof_core::edit::ExtremeZIndex;
use liveproof_core::ids::PageId;

use crate::state::EditStore;

/// Relative layering moves issued from the host chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerCommand {
    SendToBack,
    SendBackward,
    BringForward,
    BringToFront,
}

impl LayerCommand {
    /// The z-index this command assigns, given the element's current value
    /// and the page extrema. Send-to-back/bring-to-front step *past* the
    /// extremum so the element does not tie with the current occupant.
    pub fn target_z(&self, current: i32, extrema: ExtremeZIndex) -> i32 {
        match self {
            LayerCommand::SendToBack => extrema.min_z_index - 1,
            LayerCommand::SendBackward => current - 1,
            LayerCommand::BringForward => current + 1,
            LayerCommand::BringToFront => extrema.max_z_index + 1,
        }
    }
}

impl EditStore {
    /// Apply a layering command to the selected element.
    ///
    /// Records the new z-index as a CSS override and, when the edit is on
    /// the active page, widens the tracked extrema to keep the invariant
    /// `min <= z <= max` without a page scan. Returns the assigned z-index.
    pub fn change_z_index(&mut self, command: LayerCommand, current_z: i32) -> Option<i32> {
        let (Some(element), Some(page)) = (
            self.editing_info().id.clone(),
            self.editing_info().page.clone(),
        ) else {
            return None;
        };

        let target = command.target_z(current_z, self.extreme_z_index());
        debug!(element = %element, ?command, z = target, "Changing layer");

        let mut properties = BTreeMap::new();
        properties.insert("z-index".to_string(), target.to_string());
        self.apply_css(&element, &page, properties);

        if page == self.active_page_id() {
            self.extreme_z_index_mut().widen(target);
        }
        Some(target)
    }

    /// Recompute the extrema from scratch for a page's known z-index
    /// values. Called on page change only; edits in between merely widen.
    pub fn recompute_extrema(&mut self, page: &PageId, z_values: impl IntoIterator<Item = i32>) {
        let default = self.default_z_extremum();
        let mut extrema = ExtremeZIndex {
            min_z_index: default,
            max_z_index: default,
        };
        for z in z_values {
            extrema.widen(z);
        }
        debug!(page = %page, ?extrema, "Recomputed layering extrema");
        self.set_extreme_z_index(extrema);
    }
}
