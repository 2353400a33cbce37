//! Edit-state value objects.
//!
//! These are the durable artifacts of an editing session: `StencilEdit`
//! (style overrides) and `Field` (content) are what the host hands to the
//! persistence collaborator. `EditingInfo` and `ExtremeZIndex` are
//! session-state the host mirrors for its chrome.

use serde::{Deserialize, Serialize};

use crate::css::CssPartial;
use crate::ids::{EditId, ElementId, PageId};

/// What kind of override a stencil edit carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditKind {
    /// A cumulative CSS rule override for one element on one page.
    CssOverride,
    /// Crop region data for a masked element.
    ClipPath,
}

/// A persisted CSS override patch keyed by element id and page.
///
/// Invariant: at most one `StencilEdit` with a given `id` exists at any
/// time, and `css_partial` is always a single `#id{...}` rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StencilEdit {
    /// Derived as `{element}-{page}` (or `{element}-clip-path`)
    pub id: EditId,

    /// The page whose frame renders the element this edit overrides
    pub page: PageId,

    /// Override kind discriminator
    #[serde(rename = "type")]
    pub kind: EditKind,

    /// The cumulative override rule
    #[serde(rename = "cssPartial")]
    pub css_partial: CssPartial,
}

impl StencilEdit {
    /// Create a fresh CSS override edit for `element` on `page`.
    pub fn css_override(
        element: &ElementId,
        page: &PageId,
        properties: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            id: EditId::css(element, page),
            page: page.clone(),
            kind: EditKind::CssOverride,
            css_partial: CssPartial::new(element.clone(), properties),
        }
    }
}

/// Current merge-variable content of an editable element.
///
/// Distinct from [`StencilEdit`]: a field is *content* (text, image source),
/// a stencil edit is *style*.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub page: PageId,
    pub value: String,
}

/// A named merge variable inside a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeVariable {
    pub name: String,
    pub value: String,
}

/// One page of the document: its merge-variable content plus page-level
/// metadata the renderer needs. Pages are addressed by position; the
/// position is unstable under insert/move/delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default, rename = "mergeVariables")]
    pub merge_variables: Vec<MergeVariable>,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// The category of a selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditType {
    Text,
    Image,
    Shape,
}

/// Which interaction mode a selection is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Draggable / resizable / rotatable
    Move,
    /// Content-editable text focus
    Text,
}

/// The editable-style snapshot a frame reports on selection.
///
/// The host never guesses the schema of editable properties: it mirrors
/// whatever the frame reports, verbatim.
pub type StyleSnapshot = serde_json::Map<String, serde_json::Value>;

/// The currently selected element, host-global. Exactly one or zero
/// elements are selected at any instant because only one frame can hold
/// interaction focus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditingInfo {
    pub id: Option<ElementId>,

    #[serde(rename = "type")]
    pub edit_type: Option<EditType>,

    pub mode: Option<EditMode>,

    pub page: Option<PageId>,

    #[serde(rename = "canResize")]
    pub can_resize: bool,

    #[serde(rename = "isMaskedImage")]
    pub is_masked_image: bool,

    /// Whether the crop half of the mask duality is the interaction target
    #[serde(rename = "isCropping")]
    pub is_cropping: bool,
}

impl Default for EditingInfo {
    fn default() -> Self {
        Self {
            id: None,
            edit_type: None,
            mode: None,
            page: None,
            can_resize: false,
            is_masked_image: false,
            // the first crop toggle on a masked image moves to the container
            is_cropping: true,
        }
    }
}

impl EditingInfo {
    pub fn is_selected(&self) -> bool {
        self.id.is_some()
    }
}

/// Layering extrema for the active page.
///
/// Invariant: after any z-index change on the active page,
/// `min_z_index <= z <= max_z_index` for every element. Extrema only widen
/// during edits; they are recomputed (and may shrink) only on explicit
/// page change. Deleting the element holding an extremum does NOT shrink
/// them — a known staleness gap carried over from the reference behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtremeZIndex {
    #[serde(rename = "minZIndex")]
    pub min_z_index: i32,

    #[serde(rename = "maxZIndex")]
    pub max_z_index: i32,
}

impl Default for ExtremeZIndex {
    fn default() -> Self {
        Self {
            min_z_index: 10,
            max_z_index: 10,
        }
    }
}

impl ExtremeZIndex {
    /// Widen to include `z`; never shrinks.
    pub fn widen(&mut self, z: i32) {
        if z < self.min_z_index {
            self.min_z_index = z;
        }
        if z > self.max_z_index {
            self.max_z_index = z;
        }
    }
}

/// Which pages must be persisted and/or have their frames refreshed after
/// a structural edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingSave {
    /// Nothing outstanding
    None,
    /// Persist and reload the frames at these positions
    Reload { pages: Vec<usize> },
    /// Persist, but there is no frame left to refresh (last page deleted)
    PersistOnly,
}

impl Default for PendingSave {
    fn default() -> Self {
        Self::None
    }
}
