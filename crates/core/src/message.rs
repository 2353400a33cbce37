//! The Host ⇄ Frame message protocol.
//!
//! Messages are JSON-serializable records with a `type` discriminator.
//! Delivery is at-most-once and per-frame ordered; there is no ack layer,
//! so every state-changing message is idempotent under replay. Unrecognized
//! types are logged and dropped by the receiving dispatcher — the closed
//! set below is forward-compatible by tolerance, not by versioning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::edit::{EditMode, EditType, Field, StyleSnapshot};
use crate::error::ProtocolError;
use crate::ids::{ElementId, PageId};

/// Description of a node the host injects into a frame via `addElement`.
///
/// The reference renderer shipped raw HTML here; the typed protocol ships
/// the structural facts the frame needs to build the node itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub kind: NodeKindSpec,

    /// Capability tokens: `move`, `resize`, `text`, `shape`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customizable: Vec<String>,

    /// Template (pre-override) styles for the new node
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, String>,

    /// Initial text content, if any
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKindSpec {
    Text,
    Image,
    Shape,
}

/// A single-dimension resize ordered from host chrome (size inputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Width,
    Height,
}

/// Keyboard modifier state forwarded with unhandled keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(rename = "ctrlKey", default)]
    pub ctrl: bool,
    #[serde(rename = "metaKey", default)]
    pub meta: bool,
    #[serde(rename = "shiftKey", default)]
    pub shift: bool,
    #[serde(rename = "altKey", default)]
    pub alt: bool,
}

/// Messages the host sends into a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// Handshake: ask the frame for its editable content. Only sent after
    /// the frame has signalled `frameLoaded` — the frame queues nothing.
    GetAllEditableFieldsAsMergeVariables,

    /// Push previously persisted merge-variable content into the frame.
    #[serde(rename_all = "camelCase")]
    SetMergeVariables { merge_variables: Vec<Field> },

    /// Re-theme the template's brand color variable.
    UpdateBrandColor { value: String },

    /// Arm (or disarm, with `None`) image drop targets with a palette pick.
    #[serde(rename_all = "camelCase")]
    ImageSelected {
        img_src: Option<String>,
        variable_name: Option<String>,
    },

    /// Toggle the safe-zone / fold-line fixtures.
    #[serde(rename_all = "camelCase")]
    ShowSafeZone { show_safe_zone: bool },

    /// Toggle visibility of the call-to-action fixture.
    #[serde(rename = "hideCTA")]
    HideCta {
        #[serde(rename = "hideCTA")]
        hide_cta: bool,
    },

    /// Replace the call-to-action content.
    Cta {
        #[serde(rename = "CTA")]
        cta: String,
    },

    /// Bulk-replace field content without a reload.
    #[serde(rename_all = "camelCase")]
    UpdateAllFields { replace_field_data: Vec<Field> },

    /// Set one element's content (text body or image source).
    SetFieldValue { id: ElementId, value: String },

    /// Flip the crop/move interaction target between a masked image and its
    /// mask container.
    #[serde(rename_all = "camelCase")]
    ToggleCropMode { is_cropping: bool },

    /// Replace the frame's accumulated override stylesheet wholesale.
    #[serde(rename_all = "camelCase")]
    CustomStyles { full_css_string: String },

    /// Strip all inline transform/style from an element (reset). Mask
    /// peers are restored together — they are positionally coupled.
    RemoveTransform { id: ElementId },

    /// Deselect whatever this frame has selected.
    ResetSelected,

    /// Inject a new editable node.
    #[serde(rename_all = "camelCase")]
    AddElement {
        content: NodeTemplate,
        id: ElementId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src: Option<String>,
        #[serde(default)]
        is_masked_image: bool,
    },

    /// Set one dimension of an element from host size inputs.
    ResizeElement {
        id: ElementId,
        dim: Dimension,
        value: String,
    },

    DeleteElement { id: ElementId },

    HideElement { id: ElementId },

    UnhideElement { id: ElementId },

    /// Rescale interaction handle sensitivity.
    #[serde(rename_all = "camelCase")]
    UpdateZoom { zoom_value: f64 },

    /// Re-apply a computed style delta (host-derived patch).
    #[serde(rename = "updateCSS", rename_all = "camelCase")]
    UpdateCss {
        id: ElementId,
        new_data: BTreeMap<String, String>,
    },
}

/// Messages a frame sends up to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FrameMessage {
    /// The frame's document finished loading; the host may now handshake.
    FrameLoaded,

    /// Handshake response: all editable content as merge variables.
    SetFields { fields: Vec<Field> },

    /// Report a new selection plus the editable-style snapshot. An empty
    /// `id` means the frame deselected.
    #[serde(rename_all = "camelCase")]
    SetEditing {
        id: ElementId,
        #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
        current_styles: StyleSnapshot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        edit_type: Option<EditType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        edit_mode: Option<EditMode>,
        #[serde(default)]
        can_resize: bool,
        #[serde(default)]
        is_masked_image: bool,
    },

    /// Report a finished gesture's style delta for persistence.
    #[serde(rename = "updateCSS", rename_all = "camelCase")]
    UpdateCss {
        id: ElementId,
        new_data: BTreeMap<String, String>,
    },

    /// Report a content change (typing, image drop).
    #[serde(rename_all = "camelCase")]
    UpdateField {
        name: String,
        value: String,
        page: PageId,
        #[serde(default)]
        reset_images: bool,
    },

    /// A click landed on an eligible element (host closes popovers etc).
    ElementClicked,

    /// A key the frame did not handle itself, with enough context for the
    /// host to route it (delete element, copy/paste, ...).
    #[serde(rename_all = "camelCase")]
    Keydown {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        text_edit: bool,
        #[serde(default)]
        is_masked_image: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        img_src: Option<String>,
    },
}

fn decode<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, ProtocolError> {
    let message_type = match value.get("type").and_then(|t| t.as_str()) {
        Some(t) => t.to_string(),
        None => return Err(ProtocolError::MissingType),
    };
    serde_json::from_value(value).map_err(|err| {
        let reason = err.to_string();
        if reason.contains("unknown variant") {
            ProtocolError::UnknownType(message_type)
        } else {
            ProtocolError::MalformedPayload {
                message_type,
                reason,
            }
        }
    })
}

impl HostMessage {
    /// Decode an untrusted wire value. Callers log-and-drop failures.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProtocolError> {
        decode(value)
    }
}

impl FrameMessage {
    /// Decode an untrusted wire value. Callers log-and-drop failures.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProtocolError> {
        decode(value)
    }
}
