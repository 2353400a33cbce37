//! Masked-image pairing.
//!
//! An image and its mask container behave as one editable unit with two
//! addressable interaction targets. The pairing is an explicit table keyed
//! by id, populated at activation time — never derived by walking the live
//! node tree.

use std::collections::HashMap;

use tracing::debug;

use liveproof_core::ids::ElementId;

use crate::document::{Document, NodeKind};

/// Image ↔ mask-container relation for one frame.
#[derive(Debug, Default)]
pub struct MaskPairs {
    container_by_image: HashMap<ElementId, ElementId>,
    image_by_container: HashMap<ElementId, ElementId>,
}

impl MaskPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate crop behavior for an image if it qualifies: non-empty id
    /// and a mask-container parent. A qualifying image is forced to
    /// z-index ≥ 1 so it renders above the container's backdrop. Returns
    /// whether the image is (now) activated.
    pub fn activate(&mut self, document: &mut Document, image: &ElementId) -> bool {
        if image.is_empty() {
            return false;
        }
        let Some(node) = document.get(image) else {
            return false;
        };
        if node.mask_activated {
            return true;
        }
        let Some(parent) = node.parent.clone() else {
            return false;
        };
        if document.get(&parent).map(|p| p.kind) != Some(NodeKind::MaskContainer) {
            // not a mask parent: this image is not croppable (a logo, say)
            return false;
        }

        let z = document
            .computed(image, "z-index")
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(0);
        let node = match document.get_mut(image) {
            Some(node) => node,
            None => return false,
        };
        if z < 1 {
            node.inline.insert("z-index".to_string(), "1".to_string());
        }
        node.mask_activated = true;

        debug!(image = %image, container = %parent, "Activated masked image");
        self.container_by_image.insert(image.clone(), parent.clone());
        self.image_by_container.insert(parent, image.clone());
        true
    }

    pub fn container_of(&self, image: &ElementId) -> Option<&ElementId> {
        self.container_by_image.get(image)
    }

    pub fn image_of(&self, container: &ElementId) -> Option<&ElementId> {
        self.image_by_container.get(container)
    }

    /// The other half of the pair, whichever half `id` is.
    pub fn peer_of(&self, id: &ElementId) -> Option<&ElementId> {
        self.container_of(id).or_else(|| self.image_of(id))
    }

    pub fn is_member(&self, id: &ElementId) -> bool {
        self.container_by_image.contains_key(id) || self.image_by_container.contains_key(id)
    }

    pub fn forget(&mut self, id: &ElementId) {
        if let Some(container) = self.container_by_image.remove(id) {
            self.image_by_container.remove(&container);
        }
        if let Some(image) = self.image_by_container.remove(id) {
            self.container_by_image.remove(&image);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Node;

    fn masked_doc() -> Document {
        let mut doc = Document::new("front".into(), 600.0, 400.0);
        doc.insert(Node::mask_container("photoMask"));
        doc.insert(Node::image("photo", "a.jpg").with_parent("photoMask"));
        doc
    }

    #[test]
    fn activation_requires_mask_parent() {
        let mut doc = masked_doc();
        doc.insert(Node::image("logo", "logo.png"));
        let mut pairs = MaskPairs::new();

        assert!(pairs.activate(&mut doc, &"photo".into()));
        assert!(!pairs.activate(&mut doc, &"logo".into()));
        assert_eq!(pairs.container_of(&"photo".into()), Some(&"photoMask".into()));
        assert_eq!(pairs.image_of(&"photoMask".into()), Some(&"photo".into()));
    }

    #[test]
    fn activation_forces_positive_z_index() {
        let mut doc = masked_doc();
        let mut pairs = MaskPairs::new();
        pairs.activate(&mut doc, &"photo".into());
        assert_eq!(doc.computed(&"photo".into(), "z-index").as_deref(), Some("1"));
    }

    #[test]
    fn activation_keeps_existing_z_index() {
        let mut doc = masked_doc();
        doc.get_mut(&"photo".into())
            .unwrap()
            .base
            .insert("z-index".into(), "4".into());
        let mut pairs = MaskPairs::new();
        pairs.activate(&mut doc, &"photo".into());
        assert_eq!(doc.computed(&"photo".into(), "z-index").as_deref(), Some("4"));
    }

    #[test]
    fn activation_is_idempotent() {
        let mut doc = masked_doc();
        let mut pairs = MaskPairs::new();
        assert!(pairs.activate(&mut doc, &"photo".into()));
        assert!(pairs.activate(&mut doc, &"photo".into()));
    }

    #[test]
    fn peer_resolution_works_both_ways() {
        let mut doc = masked_doc();
        let mut pairs = MaskPairs::new();
        pairs.activate(&mut doc, &"photo".into());
        assert_eq!(pairs.peer_of(&"photo".into()), Some(&"photoMask".into()));
        assert_eq!(pairs.peer_of(&"photoMask".into()), Some(&"photo".into()));
        assert_eq!(pairs.peer_of(&"other".into()), None);

        pairs.forget(&"photo".into());
        assert!(!pairs.is_member(&"photoMask".into()));
    }
}
