//! In-memory model of one rendered document frame.
//!
//! A frame is a tree of nodes with template (base) styles, an inline style
//! map per node, and a single override-stylesheet slot the host replaces
//! wholesale via `customStyles`. Computed style resolution follows the
//! cascade the renderer would apply: inline wins over the override
//! stylesheet, which wins over the template.

use std::collections::BTreeMap;

use tracing::warn;

use liveproof_core::css::CssPartial;
use liveproof_core::ids::{ElementId, PageId};
use liveproof_core::message::{NodeKindSpec, NodeTemplate};

/// What a node renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    Image,
    Shape,
    /// Crop region wrapper for a masked image
    MaskContainer,
    /// Template furniture: safe zone, fold line, CTA slot
    Fixture,
}

impl From<NodeKindSpec> for NodeKind {
    fn from(spec: NodeKindSpec) -> Self {
        match spec {
            NodeKindSpec::Text => NodeKind::Text,
            NodeKindSpec::Image => NodeKind::Image,
            NodeKindSpec::Shape => NodeKind::Shape,
        }
    }
}

/// One element in the frame.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: ElementId,
    pub kind: NodeKind,

    /// Capability tokens: `move`, `resize`, `text`, `shape`
    pub customizable: Vec<String>,

    /// Text body or image source
    pub content: String,

    /// Template styles (what computed style falls back to)
    pub base: BTreeMap<String, String>,

    /// Inline style attribute, mutated by gestures and host patches
    pub inline: BTreeMap<String, String>,

    pub parent: Option<ElementId>,
    pub content_editable: bool,
    pub visible: bool,

    /// Set once the node has been activated as a masked image
    pub mask_activated: bool,
}

impl Node {
    fn new(id: impl Into<ElementId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            customizable: Vec::new(),
            content: String::new(),
            base: BTreeMap::new(),
            inline: BTreeMap::new(),
            parent: None,
            content_editable: false,
            visible: true,
            mask_activated: false,
        }
    }

    pub fn text(id: impl Into<ElementId>, content: impl Into<String>) -> Self {
        let mut node = Self::new(id, NodeKind::Text);
        node.customizable = vec!["move".into(), "text".into()];
        node.content_editable = true;
        node.content = content.into();
        node
    }

    pub fn image(id: impl Into<ElementId>, src: impl Into<String>) -> Self {
        let mut node = Self::new(id, NodeKind::Image);
        node.customizable = vec!["move".into(), "resize".into()];
        node.content = src.into();
        node
    }

    pub fn shape(id: impl Into<ElementId>) -> Self {
        let mut node = Self::new(id, NodeKind::Shape);
        node.customizable = vec!["move".into(), "resize".into(), "shape".into()];
        node
    }

    pub fn mask_container(id: impl Into<ElementId>) -> Self {
        Self::new(id, NodeKind::MaskContainer)
    }

    pub fn fixture(id: impl Into<ElementId>) -> Self {
        Self::new(id, NodeKind::Fixture)
    }

    pub fn with_base(mut self, styles: impl IntoIterator<Item = (String, String)>) -> Self {
        self.base.extend(styles);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<ElementId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Build a node from the template the host ships with `addElement`.
    pub fn from_template(id: ElementId, template: &NodeTemplate, src: Option<&str>) -> Self {
        let mut node = Self::new(id, NodeKind::from(template.kind));
        node.customizable = template.customizable.clone();
        node.base = template.styles.clone();
        node.content = match src {
            Some(src) => src.to_string(),
            None => template.content.clone(),
        };
        node.content_editable = template.customizable.iter().any(|c| c == "text");
        node
    }

    pub fn has_capability(&self, token: &str) -> bool {
        self.customizable.iter().any(|c| c == token)
    }

    pub fn is_moveable(&self) -> bool {
        self.has_capability("move") || self.mask_activated || self.kind == NodeKind::MaskContainer
    }

    pub fn is_resizable(&self) -> bool {
        self.has_capability("resize") || self.mask_activated || self.kind == NodeKind::MaskContainer
    }
}

/// The frame's document: node table, override stylesheet, viewport.
#[derive(Debug)]
pub struct Document {
    page: PageId,
    width: f64,
    height: f64,
    nodes: BTreeMap<ElementId, Node>,
    overrides: Vec<CssPartial>,
    brand_color: Option<String>,
    /// Bumped on every override-stylesheet replacement; the agent's
    /// pending-add wait observes this instead of a DOM mutation event.
    styles_generation: u64,
}

impl Document {
    pub fn new(page: PageId, width: f64, height: f64) -> Self {
        Self {
            page,
            width,
            height,
            nodes: BTreeMap::new(),
            overrides: Vec::new(),
            brand_color: None,
            styles_generation: 0,
        }
    }

    pub fn page(&self) -> &PageId {
        &self.page
    }

    pub fn viewport(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn get(&self, id: &ElementId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Remove a node and everything parented under it.
    pub fn remove(&mut self, id: &ElementId) {
        self.nodes.remove(id);
        let orphans: Vec<ElementId> = self
            .nodes
            .values()
            .filter(|node| node.parent.as_ref() == Some(id))
            .map(|node| node.id.clone())
            .collect();
        for orphan in orphans {
            self.remove(&orphan);
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All nodes whose content the handshake reports as merge variables.
    pub fn editable_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(|node| node.content_editable || node.kind == NodeKind::Image)
    }

    pub fn set_brand_color(&mut self, color: impl Into<String>) {
        self.brand_color = Some(color.into());
    }

    pub fn brand_color(&self) -> Option<&str> {
        self.brand_color.as_deref()
    }

    /// Replace the override stylesheet wholesale. Malformed rules are
    /// skipped so a partially bad stylesheet never poisons the frame.
    pub fn set_custom_styles(&mut self, full_css: &str) {
        self.overrides.clear();
        for chunk in full_css.split_inclusive('}') {
            let rule = chunk.trim();
            if rule.is_empty() {
                continue;
            }
            match rule.parse::<CssPartial>() {
                Ok(parsed) => self.overrides.push(parsed),
                Err(err) => warn!(page = %self.page, error = %err, "Skipping malformed override rule"),
            }
        }
        self.styles_generation += 1;
    }

    pub fn styles_generation(&self) -> u64 {
        self.styles_generation
    }

    /// Resolve one computed style property: inline, then the override
    /// stylesheet, then the template.
    pub fn computed(&self, id: &ElementId, property: &str) -> Option<String> {
        let node = self.nodes.get(id)?;
        if let Some(value) = node.inline.get(property) {
            return Some(value.clone());
        }
        for rule in self.overrides.iter().rev() {
            if rule.selector() == id {
                if let Some(value) = rule.get(property) {
                    return Some(value.to_string());
                }
            }
        }
        node.base.get(property).cloned()
    }

    /// Strip every inline style from a node (reset to template + overrides).
    pub fn clear_inline(&mut self, id: &ElementId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.inline.clear();
        }
    }
}

/// Parse a `<length>px` (or bare number) into pixels.
pub fn px(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").trim().parse().ok()
}

/// The `translate(x, y)` component of a transform, defaulting to origin.
pub fn translate_of(transform: &str) -> (f64, f64) {
    let Some(start) = transform.find("translate(") else {
        return (0.0, 0.0);
    };
    let rest = &transform[start + "translate(".len()..];
    let Some(end) = rest.find(')') else {
        return (0.0, 0.0);
    };
    let mut parts = rest[..end].split(',');
    let x = parts.next().and_then(px).unwrap_or(0.0);
    let y = parts.next().and_then(px).unwrap_or(0.0);
    (x, y)
}

/// Rewrite the `translate(...)` component of a transform, preserving any
/// other transform functions (rotate, scale) in place.
pub fn with_translate(transform: &str, x: f64, y: f64) -> String {
    let replacement = format!("translate({x}px, {y}px)");
    if let Some(start) = transform.find("translate(") {
        if let Some(end) = transform[start..].find(')') {
            let mut out = String::with_capacity(transform.len() + 8);
            out.push_str(&transform[..start]);
            out.push_str(&replacement);
            out.push_str(&transform[start + end + 1..]);
            return out;
        }
    }
    if transform.trim().is_empty() {
        replacement
    } else {
        format!("{replacement} {}", transform.trim())
    }
}
