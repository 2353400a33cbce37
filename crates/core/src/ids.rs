//! Identifier newtypes.
//!
//! Elements, pages, and stencil edits are all addressed by strings on the
//! wire. The newtypes keep the three spaces from being mixed up and carry
//! the id-derivation conventions the sync protocol depends on:
//!
//! - a stencil edit for element `photo` on page `2` has id `photo-2`
//! - clip data for a masked element uses the suffix `photo-clip-path`
//! - a masked image `photo` is paired with its mask container `photoMask`

use serde::{Deserialize, Serialize};

const CLIP_PATH_SUFFIX: &str = "-clip-path";
const MASK_SUFFIX: &str = "Mask";

/// Unique identifier of an element inside a document frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id for a host-injected element.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{prefix}-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this id names a mask container (by naming convention).
    pub fn is_mask(&self) -> bool {
        self.0.ends_with(MASK_SUFFIX)
    }

    /// The other half of a mask pair: `photo` ↔ `photoMask`.
    pub fn mask_peer(&self) -> ElementId {
        if self.is_mask() {
            ElementId(self.0[..self.0.len() - MASK_SUFFIX.len()].to_string())
        } else {
            ElementId(format!("{}{MASK_SUFFIX}", self.0))
        }
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque page identifier a frame is addressed by.
///
/// Postcards use `front`/`back`; multi-page documents use the decimal page
/// index. Only numeric pages participate in page renumbering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_index(index: usize) -> Self {
        Self(index.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric position this page id encodes, if any.
    pub fn index(&self) -> Option<usize> {
        self.0.parse().ok()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a stencil edit: `{element}-{page}` or `{element}-clip-path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EditId(pub String);

impl EditId {
    /// The edit id for a CSS override of `element` on `page`.
    pub fn css(element: &ElementId, page: &PageId) -> Self {
        Self(format!("{element}-{page}"))
    }

    /// The edit id for clip data of a masked element.
    pub fn clip_path(element: &ElementId) -> Self {
        Self(format!("{element}{CLIP_PATH_SUFFIX}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_clip_path(&self) -> bool {
        self.0.ends_with(CLIP_PATH_SUFFIX)
    }

    /// Rewrite the embedded page suffix when a page is renumbered.
    ///
    /// Clip-path ids carry no page suffix and are returned unchanged — the
    /// owning edit's `page` field is what migrates for those.
    pub fn with_page(&self, page: &PageId) -> Self {
        if self.is_clip_path() {
            return self.clone();
        }
        match self.0.rfind('-') {
            Some(pos) => Self(format!("{}{page}", &self.0[..=pos])),
            None => Self(format!("{}-{page}", self.0)),
        }
    }
}

impl std::fmt::Display for EditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_id_derivation() {
        let id = EditId::css(&"photo".into(), &"2".into());
        assert_eq!(id.as_str(), "photo-2");
        assert_eq!(EditId::clip_path(&"photo".into()).as_str(), "photo-clip-path");
    }

    #[test]
    fn edit_id_page_rewrite() {
        let id = EditId::css(&"photo".into(), &"2".into());
        assert_eq!(id.with_page(&"3".into()).as_str(), "photo-3");

        // element ids containing dashes only lose the trailing page segment
        let id = EditId::css(&"agent-photo".into(), &"0".into());
        assert_eq!(id.with_page(&"5".into()).as_str(), "agent-photo-5");
    }

    #[test]
    fn clip_path_ids_survive_page_rewrite() {
        let id = EditId::clip_path(&"photo".into());
        assert_eq!(id.with_page(&"9".into()), id);
    }

    #[test]
    fn mask_peer_roundtrip() {
        let img = ElementId::new("listingPhoto");
        let mask = img.mask_peer();
        assert_eq!(mask.as_str(), "listingPhotoMask");
        assert!(mask.is_mask());
        assert_eq!(mask.mask_peer(), img);
    }

    #[test]
    fn page_index_parsing() {
        assert_eq!(PageId::new("3").index(), Some(3));
        assert_eq!(PageId::new("front").index(), None);
    }
}
