//! Editable-style snapshots.
//!
//! On selection the frame reports the element's current computed styles as
//! the authoritative "what can be edited now" payload. The host mirrors
//! this map verbatim and never guesses the schema, so the keys here define
//! the whole editing surface for each element category.

use serde_json::{Value, json};

use liveproof_core::edit::StyleSnapshot;
use liveproof_core::ids::ElementId;

use crate::document::{Document, px};

fn int_of(document: &Document, id: &ElementId, property: &str) -> Option<i64> {
    document
        .computed(id, property)
        .as_deref()
        .and_then(px)
        .map(|v| v as i64)
}

fn string_of(document: &Document, id: &ElementId, property: &str) -> Value {
    match document.computed(id, property) {
        Some(value) => json!(value),
        None => Value::Null,
    }
}

fn z_index_of(document: &Document, id: &ElementId) -> i64 {
    int_of(document, id, "z-index").unwrap_or(0)
}

/// Snapshot for an image or shape selection.
pub fn image_snapshot(document: &Document, id: &ElementId) -> StyleSnapshot {
    let mut snapshot = StyleSnapshot::new();
    snapshot.insert("opacity".into(), string_of(document, id, "opacity"));
    snapshot.insert("objectFit".into(), string_of(document, id, "object-fit"));
    snapshot.insert(
        "objectPosition".into(),
        string_of(document, id, "object-position"),
    );
    snapshot.insert("fill".into(), string_of(document, id, "fill"));
    snapshot.insert("stroke".into(), string_of(document, id, "stroke"));
    snapshot.insert(
        "strokeWidth".into(),
        json!(int_of(document, id, "stroke-width").unwrap_or(0)),
    );
    snapshot.insert("width".into(), string_of(document, id, "width"));
    snapshot.insert("height".into(), string_of(document, id, "height"));
    snapshot.insert("zIndex".into(), json!(z_index_of(document, id)));
    snapshot
}

/// Snapshot for a text selection: font metrics plus text styling.
pub fn text_snapshot(document: &Document, id: &ElementId) -> StyleSnapshot {
    let font_size = int_of(document, id, "font-size").unwrap_or(16);
    let line_height = int_of(document, id, "line-height")
        .unwrap_or_else(|| (font_size as f64 * 1.2) as i64);
    let letter_spacing = int_of(document, id, "letter-spacing").unwrap_or(0);

    let font_family = document
        .computed(id, "font-family")
        .map(|f| f.replace('"', ""))
        .map_or(Value::Null, Value::String);

    let mut snapshot = StyleSnapshot::new();
    snapshot.insert("fontFamily".into(), font_family);
    snapshot.insert("fontSize".into(), json!(font_size));
    snapshot.insert("lineHeight".into(), json!(line_height));
    snapshot.insert("letterSpacing".into(), json!(letter_spacing));
    snapshot.insert("zIndex".into(), json!(z_index_of(document, id)));
    snapshot.insert("textAlign".into(), string_of(document, id, "text-align"));
    snapshot.insert("fontWeight".into(), string_of(document, id, "font-weight"));
    snapshot.insert("fontStyle".into(), string_of(document, id, "font-style"));
    snapshot.insert(
        "textDecoration".into(),
        string_of(document, id, "text-decoration"),
    );
    snapshot.insert(
        "textTransform".into(),
        string_of(document, id, "text-transform"),
    );
    snapshot.insert("color".into(), string_of(document, id, "color"));
    snapshot.insert("opacity".into(), string_of(document, id, "opacity"));
    snapshot
}
