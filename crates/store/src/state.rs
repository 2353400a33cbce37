//! The edit store proper.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use liveproof_core::css::CssPartial;
use liveproof_core::edit::{
    EditKind, EditMode, EditType, EditingInfo, ExtremeZIndex, Field, PendingSave, StencilEdit,
    StyleSnapshot,
};
use liveproof_core::ids::{EditId, ElementId, PageId};

/// What kind of artifact is being edited. Postcards address their two
/// frames as `front`/`back`; documents address frames by page index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    Postcard,
    Document,
}

impl EditorKind {
    /// The page id of the frame at `position`.
    pub fn page_id(&self, position: usize) -> PageId {
        match self {
            EditorKind::Postcard => {
                if position == 0 {
                    PageId::new("front")
                } else {
                    PageId::new("back")
                }
            }
            EditorKind::Document => PageId::from_index(position),
        }
    }
}

/// Host-side authoritative model of all CSS overrides, selection state,
/// layering extrema, and pending-save/reload bookkeeping.
#[derive(Debug, Clone)]
pub struct EditStore {
    kind: EditorKind,
    stencil_edits: Vec<StencilEdit>,
    fields: Vec<Field>,
    editing_info: EditingInfo,
    styles: StyleSnapshot,
    extreme_z_index: ExtremeZIndex,
    default_z_extremum: i32,
    pending_save: PendingSave,
    active_page: usize,
    page_intersections: Vec<f64>,
    zoom_value: f64,
}

impl EditStore {
    pub fn new(kind: EditorKind, default_z_extremum: i32) -> Self {
        Self {
            kind,
            stencil_edits: Vec::new(),
            fields: Vec::new(),
            editing_info: EditingInfo::default(),
            styles: StyleSnapshot::new(),
            extreme_z_index: ExtremeZIndex {
                min_z_index: default_z_extremum,
                max_z_index: default_z_extremum,
            },
            default_z_extremum,
            pending_save: PendingSave::None,
            active_page: 0,
            page_intersections: Vec::new(),
            zoom_value: 1.0,
        }
    }

    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    // --- Stencil edits -------------------------------------------------

    pub fn stencil_edits(&self) -> &[StencilEdit] {
        &self.stencil_edits
    }

    /// Replace the whole edit list (initial load from persistence).
    pub fn set_stencil_edits(&mut self, edits: Vec<StencilEdit>) {
        self.stencil_edits = edits;
    }

    /// Append edits wholesale (element copy/paste, clip data import).
    pub fn add_stencil_edits(&mut self, edits: Vec<StencilEdit>) {
        self.stencil_edits.extend(edits);
    }

    pub fn find_edit(&self, id: &EditId) -> Option<&StencilEdit> {
        self.stencil_edits.iter().find(|edit| &edit.id == id)
    }

    /// Merge `properties` into the cumulative override for `element` on
    /// `page`, creating the edit if none exists.
    ///
    /// Successive calls merge property-by-property into one rule — never a
    /// second rule — and reapplying the same property/value pair is a
    /// no-op. At most one edit per `{element}-{page}` id ever exists.
    pub fn apply_css(
        &mut self,
        element: &ElementId,
        page: &PageId,
        properties: BTreeMap<String, String>,
    ) {
        let id = EditId::css(element, page);
        if let Some(edit) = self.stencil_edits.iter_mut().find(|edit| edit.id == id) {
            edit.css_partial.merge(properties);
        } else {
            debug!(element = %element, page = %page, "First override for element");
            self.stencil_edits
                .push(StencilEdit::css_override(element, page, properties));
        }
    }

    /// Remove the override (and any clip data) for `element` on `page`.
    /// Mask peers are *not* implicit here — callers reset both halves of
    /// a mask pair explicitly, since they are visually coupled.
    pub fn delete_element_edits(&mut self, element: &ElementId, page: &PageId) {
        let css_id = EditId::css(element, page);
        let clip_id = EditId::clip_path(element);
        self.stencil_edits
            .retain(|edit| edit.id != css_id && edit.id != clip_id);
    }

    /// Remove edits for the currently selected element.
    pub fn delete_selected_edits(&mut self) {
        let (Some(element), Some(page)) = (
            self.editing_info.id.clone(),
            self.editing_info.page.clone(),
        ) else {
            return;
        };
        self.delete_element_edits(&element, &page);
    }

    /// The full accumulated override stylesheet for one page: every
    /// `cssPartial` of that page concatenated. Replayed wholesale into the
    /// frame, so rebuilding it from scratch is always safe.
    pub fn full_css_for_page(&self, page: &PageId) -> String {
        self.stencil_edits
            .iter()
            .filter(|edit| &edit.page == page && edit.kind == EditKind::CssOverride)
            .map(|edit| edit.css_partial.to_string())
            .collect()
    }

    // --- Fields --------------------------------------------------------

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn set_fields(&mut self, fields: Vec<Field>) {
        self.fields = fields;
    }

    /// Merge incoming field values over the stored ones, matching by name.
    pub fn merge_fields(&mut self, updates: Vec<Field>) {
        for update in updates {
            match self.fields.iter_mut().find(|f| f.name == update.name) {
                Some(existing) => existing.value = update.value,
                None => self.fields.push(update),
            }
        }
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    // --- Selection -----------------------------------------------------

    pub fn editing_info(&self) -> &EditingInfo {
        &self.editing_info
    }

    pub fn styles(&self) -> &StyleSnapshot {
        &self.styles
    }

    /// Record a selection reported by a frame, mirroring its style
    /// snapshot verbatim.
    pub fn set_editing(
        &mut self,
        element: ElementId,
        page: PageId,
        edit_type: Option<EditType>,
        mode: Option<EditMode>,
        can_resize: bool,
        is_masked_image: bool,
        snapshot: StyleSnapshot,
    ) {
        let is_cropping = self.editing_info.is_cropping;
        self.editing_info = EditingInfo {
            id: Some(element),
            edit_type,
            mode,
            page: Some(page),
            can_resize,
            is_masked_image,
            is_cropping,
        };
        self.styles = snapshot;
    }

    /// Merge style values the host chrome changed (sliders, inputs) into
    /// the mirrored snapshot.
    pub fn update_styles(&mut self, updates: StyleSnapshot) {
        for (key, value) in updates {
            self.styles.insert(key, value);
        }
    }

    /// Clear the selection and its mirrored styles.
    pub fn reset_selection(&mut self) {
        self.editing_info = EditingInfo::default();
        self.styles = StyleSnapshot::new();
    }

    /// Flip which half of the mask duality is the interaction target.
    pub fn toggle_crop_mode(&mut self) -> bool {
        self.editing_info.is_cropping = !self.editing_info.is_cropping;
        self.editing_info.is_cropping
    }

    // --- Layering ------------------------------------------------------

    pub fn extreme_z_index(&self) -> ExtremeZIndex {
        self.extreme_z_index
    }

    pub(crate) fn extreme_z_index_mut(&mut self) -> &mut ExtremeZIndex {
        &mut self.extreme_z_index
    }

    pub(crate) fn set_extreme_z_index(&mut self, extrema: ExtremeZIndex) {
        self.extreme_z_index = extrema;
    }

    pub fn default_z_extremum(&self) -> i32 {
        self.default_z_extremum
    }

    // --- Pending save / reload ----------------------------------------

    pub fn pending_save(&self) -> &PendingSave {
        &self.pending_save
    }

    pub fn set_pending_save(&mut self, pending: PendingSave) {
        self.pending_save = pending;
    }

    /// Consume the pending marker once the persistence collaborator has
    /// picked it up.
    pub fn take_pending_save(&mut self) -> PendingSave {
        std::mem::take(&mut self.pending_save)
    }

    // --- Active page ---------------------------------------------------

    pub fn active_page(&self) -> usize {
        self.active_page
    }

    /// The page id of the frame the user is working in.
    pub fn active_page_id(&self) -> PageId {
        self.kind.page_id(self.active_page)
    }

    pub fn set_active_page(&mut self, position: usize) {
        self.active_page = position;
    }

    /// Track how much of each page is visible and derive the active page.
    /// If two pages are fully visible the active page does not change on
    /// scroll; otherwise the most-visible page wins.
    pub fn update_page_intersection(&mut self, position: usize, ratio: f64) {
        if self.page_intersections.len() <= position {
            self.page_intersections.resize(position + 1, 0.0);
        }
        self.page_intersections[position] = ratio;

        let fully_visible = self
            .page_intersections
            .iter()
            .filter(|r| **r >= 1.0)
            .count();
        if fully_visible > 1 {
            return;
        }

        let mut best = 0usize;
        let mut best_ratio = f64::MIN;
        for (index, r) in self.page_intersections.iter().enumerate() {
            if *r > best_ratio {
                best_ratio = *r;
                best = index;
            }
        }
        self.active_page = best;
    }

    pub(crate) fn remove_page_intersection(&mut self, position: usize) {
        if position < self.page_intersections.len() {
            self.page_intersections.remove(position);
        }
    }

    // --- Zoom ----------------------------------------------------------

    pub fn zoom_value(&self) -> f64 {
        self.zoom_value
    }

    pub fn set_zoom_value(&mut self, zoom: f64) {
        self.zoom_value = zoom;
    }

    // --- Internals for paging ------------------------------------------

    pub(crate) fn stencil_edits_mut(&mut self) -> &mut Vec<StencilEdit> {
        &mut self.stencil_edits
    }
}
