//! The frame agent: interaction state machine and message dispatch.
//!
//! One agent runs per rendered frame. It owns no durable state — it is
//! rebuilt from a fresh document load and resynchronized through the
//! handshake — and treats every inbound host message as the source of
//! truth, overwriting local state unconditionally. Messages referencing
//! ids that no longer exist are logged and dropped, never fatal.

use std::collections::BTreeMap;
use std::collections::HashMap;

use tracing::{debug, warn};

use liveproof_channels::{FrameEndpoint, FrameSender};
use liveproof_config::EditorConfig;
use liveproof_core::edit::{EditMode, EditType, Field, StyleSnapshot};
use liveproof_core::ids::ElementId;
use liveproof_core::message::{FrameMessage, HostMessage, NodeKindSpec, NodeTemplate};

use crate::document::{Document, Node, NodeKind, translate_of, with_translate};
use crate::gesture::{GestureDelta, GestureEvent, GesturePhase, PointerEvent, PointerKind, Point, was_dragged};
use crate::keyboard::{ArrowKey, KeyEvent, Nudge, nudge_for};
use crate::mask::MaskPairs;
use crate::snapshot::{image_snapshot, text_snapshot};

/// The frame-local interaction state. Exactly one interaction target (or
/// none) exists at any instant; selecting a new element unconditionally
/// cancels whatever gesture the previous one had in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    /// Element selected with drag/resize/rotate handles
    SelectedMove(ElementId),
    /// Content-editable text focused
    SelectedText(ElementId),
    /// Masked image is the crop/move target
    CropImage(ElementId),
    /// Mask container is the crop/move target
    CropContainer(ElementId),
}

impl InteractionState {
    pub fn target(&self) -> Option<&ElementId> {
        match self {
            InteractionState::Idle => None,
            InteractionState::SelectedMove(id)
            | InteractionState::SelectedText(id)
            | InteractionState::CropImage(id)
            | InteractionState::CropContainer(id) => Some(id),
        }
    }

    pub fn is_text_edit(&self) -> bool {
        matches!(self, InteractionState::SelectedText(_))
    }
}

/// An element injected by `addElement` whose stylesheet has not been
/// observed to position it yet. Resolved (or cancelled) on the next
/// override-stylesheet mutation.
#[derive(Debug, Clone)]
struct PendingAdd {
    root: ElementId,
    image: Option<ElementId>,
    src: Option<String>,
}

#[derive(Debug, Clone)]
struct ArmedImage {
    src: String,
}

pub struct FrameAgent {
    document: Document,
    config: EditorConfig,
    sender: FrameSender,
    masks: MaskPairs,
    state: InteractionState,
    /// Last observed event timestamp; host-triggered actions (crop toggle)
    /// are gated against this
    clock: u64,
    /// Position and time of the last pointer press, for drag classification
    press: Option<(Point, u64)>,
    /// When this page first received a click; mask containers only accept
    /// crop toggles after the warmup window has elapsed, so the first click
    /// on a freshly activated masked image selects the image itself
    first_interaction_at: Option<u64>,
    pending_add: Option<PendingAdd>,
    armed_image: Option<ArmedImage>,
    /// Template image sources, for restoring after an aborted drop
    initial_sources: HashMap<ElementId, String>,
    zoom: f64,
}

impl FrameAgent {
    pub fn new(mut document: Document, config: EditorConfig, sender: FrameSender) -> Self {
        let mut masks = MaskPairs::new();
        let images: Vec<ElementId> = document
            .nodes()
            .filter(|node| node.kind == NodeKind::Image)
            .map(|node| node.id.clone())
            .collect();
        let mut initial_sources = HashMap::new();
        for image in images {
            if let Some(node) = document.get(&image) {
                initial_sources.insert(image.clone(), node.content.clone());
            }
            masks.activate(&mut document, &image);
        }

        Self {
            document,
            config,
            sender,
            masks,
            state: InteractionState::Idle,
            clock: 0,
            press: None,
            first_interaction_at: None,
            pending_add: None,
            armed_image: None,
            initial_sources,
            zoom: 1.0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Signal the host that the document finished loading. The host never
    /// sends anything before this.
    pub fn announce_loaded(&self) {
        self.sender.send(FrameMessage::FrameLoaded);
    }

    /// Drain and dispatch every host message currently queued.
    pub fn pump(&mut self, endpoint: &mut FrameEndpoint) {
        while let Some(message) = endpoint.try_recv() {
            self.handle_message(message);
        }
    }

    // --- Host message dispatch -----------------------------------------

    pub fn handle_message(&mut self, message: HostMessage) {
        match message {
            HostMessage::GetAllEditableFieldsAsMergeVariables => {
                self.sender.send(FrameMessage::SetFields {
                    fields: self.collect_fields(),
                });
            }
            HostMessage::SetMergeVariables { merge_variables } => {
                self.replace_fields(merge_variables);
            }
            HostMessage::UpdateBrandColor { value } => {
                self.document.set_brand_color(value);
            }
            HostMessage::ImageSelected { img_src, .. } => {
                self.armed_image = img_src.map(|src| ArmedImage { src });
            }
            HostMessage::ShowSafeZone { show_safe_zone } => {
                // the flag carries hide semantics on the wire
                self.set_fixture_visibility(
                    &["safe-zone", "cut-text", "fold-line", "fold-line-text"],
                    !show_safe_zone,
                );
            }
            HostMessage::HideCta { hide_cta } => {
                let id = if self.document.contains(&"_cta".into()) {
                    "_cta"
                } else {
                    "cta"
                };
                self.set_fixture_visibility(&[id], !hide_cta);
            }
            HostMessage::Cta { cta } => {
                if let Some(node) = self.document.get_mut(&"_cta".into()) {
                    node.content = cta;
                }
            }
            HostMessage::UpdateAllFields { replace_field_data } => {
                self.replace_fields(replace_field_data);
            }
            HostMessage::SetFieldValue { id, value } => {
                match self.document.get_mut(&id) {
                    Some(node) if node.kind == NodeKind::Image || node.content_editable => {
                        node.content = value;
                    }
                    Some(_) => {}
                    None => warn!(id = %id, "setFieldValue for unknown element"),
                }
            }
            HostMessage::ToggleCropMode { .. } => {
                // the toggle is stateless on this side: flip whatever half
                // is currently targeted
                self.toggle_crop_mode(self.clock);
            }
            HostMessage::CustomStyles { full_css_string } => {
                self.document.set_custom_styles(&full_css_string);
                self.resolve_pending_add();
            }
            HostMessage::RemoveTransform { id } => self.remove_transform(&id),
            HostMessage::ResetSelected => {
                // ordered by the host because another frame took the
                // selection: drop ours without echoing a deselect back
                self.first_interaction_at = None;
                self.press = None;
                self.state = InteractionState::Idle;
            }
            HostMessage::AddElement {
                content,
                id,
                src,
                is_masked_image,
            } => self.add_element(&content, id, src, is_masked_image),
            HostMessage::ResizeElement { id, dim, value } => {
                let property = match dim {
                    liveproof_core::message::Dimension::Width => "width",
                    liveproof_core::message::Dimension::Height => "height",
                };
                match self.document.get_mut(&id) {
                    Some(node) => {
                        node.inline.insert(property.to_string(), value);
                    }
                    None => warn!(id = %id, "resizeElement for unknown element"),
                }
            }
            HostMessage::DeleteElement { id } => self.delete_element(&id),
            HostMessage::HideElement { id } => self.set_element_hidden(&id, true),
            HostMessage::UnhideElement { id } => self.set_element_hidden(&id, false),
            HostMessage::UpdateZoom { zoom_value } => {
                self.zoom = if zoom_value != 0.0 { 1.0 / zoom_value } else { 1.0 };
            }
            HostMessage::UpdateCss { id, new_data } => {
                match self.document.get_mut(&id) {
                    Some(node) => node.inline.extend(new_data),
                    None => warn!(id = %id, "updateCSS for unknown element"),
                }
            }
        }
    }

    fn collect_fields(&self) -> Vec<Field> {
        self.document
            .editable_nodes()
            .map(|node| Field {
                name: node.id.as_str().to_string(),
                page: self.document.page().clone(),
                value: node.content.clone(),
            })
            .collect()
    }

    fn replace_fields(&mut self, fields: Vec<Field>) {
        for field in fields {
            let id = ElementId::new(field.name);
            match self.document.get_mut(&id) {
                Some(node) => node.content = field.value,
                None => debug!(id = %id, "Field for element not in this frame"),
            }
        }
    }

    fn set_fixture_visibility(&mut self, ids: &[&str], visible: bool) {
        for id in ids {
            if let Some(node) = self.document.get_mut(&ElementId::new(*id)) {
                node.inline.insert(
                    "display".to_string(),
                    if visible { "initial" } else { "none" }.to_string(),
                );
            }
        }
    }

    fn remove_transform(&mut self, id: &ElementId) {
        let Some(node) = self.document.get(id) else {
            warn!(id = %id, "removeTransform for unknown element");
            return;
        };
        let kind = node.kind;
        self.document.clear_inline(id);

        // mask pairs are positionally coupled: resetting either half must
        // restore both
        if kind == NodeKind::MaskContainer {
            if let Some(image) = self.masks.image_of(id).cloned() {
                self.document.clear_inline(&image);
            }
        } else if let Some(container) = self.masks.container_of(id).cloned() {
            self.document.clear_inline(&container);
        }

        // a reset also undoes a dropped-in image source
        if kind == NodeKind::Image {
            if let Some(initial) = self.initial_sources.get(id).cloned() {
                let page = self.document.page().clone();
                if let Some(node) = self.document.get_mut(id) {
                    if node.content != initial {
                        node.content = initial.clone();
                        self.sender.send(FrameMessage::UpdateField {
                            name: id.as_str().to_string(),
                            value: initial,
                            page,
                            reset_images: true,
                        });
                    }
                }
            }
        }

        if self.state.target().is_none() {
            self.select(&id.clone(), EditMode::Move);
        }
    }

    fn add_element(
        &mut self,
        template: &NodeTemplate,
        id: ElementId,
        src: Option<String>,
        is_masked_image: bool,
    ) {
        if is_masked_image && template.kind != NodeKindSpec::Image {
            warn!(id = %id, "addElement flagged as masked image without image content");
            return;
        }

        let root = if is_masked_image {
            let container_id = id.mask_peer();
            let container =
                Node::mask_container(container_id.clone()).with_base(template.styles.clone());
            self.document.insert(container);

            let mut image = Node::from_template(id.clone(), template, src.as_deref());
            image.parent = Some(container_id.clone());
            self.document.insert(image);
            container_id
        } else {
            let node = Node::from_template(id.clone(), template, src.as_deref());
            self.document.insert(node);
            id.clone()
        };

        let pending = PendingAdd {
            root,
            image: is_masked_image.then_some(id),
            src,
        };
        if self.document.computed(&pending.root, "position").as_deref() == Some("absolute") {
            self.finish_add(pending);
        } else {
            // geometry is unsafe to touch until the stylesheet positions
            // the node; resolved on the next customStyles mutation
            self.pending_add = Some(pending);
        }
    }

    fn resolve_pending_add(&mut self) {
        let Some(pending) = self.pending_add.take() else {
            return;
        };
        if !self.document.contains(&pending.root) {
            debug!(root = %pending.root, "Pending add cancelled: element removed");
            return;
        }
        if self.document.computed(&pending.root, "position").as_deref() == Some("absolute") {
            self.finish_add(pending);
        } else {
            self.pending_add = Some(pending);
        }
    }

    fn finish_add(&mut self, pending: PendingAdd) {
        if let Some(image) = &pending.image {
            if let Some(src) = &pending.src {
                self.initial_sources.insert(image.clone(), src.clone());
            }
            self.masks.activate(&mut self.document, image);
        } else if let Some(src) = &pending.src {
            self.initial_sources.insert(pending.root.clone(), src.clone());
        }
        self.select(&pending.root, EditMode::Move);
    }

    fn delete_element(&mut self, id: &ElementId) {
        if let Some(node) = self.document.get(id) {
            let parent = node.parent.clone();
            let parent_is_mask = parent
                .as_ref()
                .and_then(|p| self.document.get(p))
                .map(|p| p.kind == NodeKind::MaskContainer)
                .unwrap_or(false);
            if parent_is_mask {
                if let Some(parent) = parent {
                    self.document.remove(&parent);
                }
            } else {
                self.document.remove(id);
            }
        }
        // the paired container goes with the image either way
        let peer = id.mask_peer();
        if self.document.contains(&peer) {
            self.document.remove(&peer);
        }
        self.masks.forget(id);
        self.initial_sources.remove(id);

        if let Some(pending) = &self.pending_add {
            if &pending.root == id || pending.image.as_ref() == Some(id) {
                self.pending_add = None;
            }
        }
        if self.state.target().is_some_and(|t| t == id || t == &peer) {
            self.state = InteractionState::Idle;
        }
    }

    fn set_element_hidden(&mut self, id: &ElementId, hidden: bool) {
        let Some(node) = self.document.get(id) else {
            warn!(id = %id, hidden, "visibility change for unknown element");
            return;
        };
        // a masked image hides via its container so the crop region
        // disappears with it
        let target = match &node.parent {
            Some(parent)
                if self.document.get(parent).map(|p| p.kind) == Some(NodeKind::MaskContainer) =>
            {
                parent.clone()
            }
            _ => id.clone(),
        };
        if let Some(node) = self.document.get_mut(&target) {
            node.visible = !hidden;
            node.inline.insert(
                "visibility".to_string(),
                if hidden { "hidden" } else { "visible" }.to_string(),
            );
        }
        if hidden && self.state.target() == Some(id) {
            self.state = InteractionState::Idle;
        }
    }

    // --- Pointer input -------------------------------------------------

    pub fn on_pointer(&mut self, event: PointerEvent) {
        self.clock = self.clock.max(event.at_ms);
        match event.kind {
            PointerKind::Down => {
                self.press = Some((event.position, event.at_ms));
            }
            PointerKind::Click => self.on_click(event),
            PointerKind::DoubleClick => self.on_double_click(event),
        }
    }

    /// A click that landed outside every eligible element.
    pub fn on_click_outside(&mut self) {
        self.reset_editing();
    }

    fn on_click(&mut self, event: PointerEvent) {
        if self.first_interaction_at.is_none() {
            self.first_interaction_at = Some(event.at_ms);
        }

        let Some(node) = self.document.get(&event.target) else {
            return;
        };
        let mask_activated = node.mask_activated;
        let is_container = node.kind == NodeKind::MaskContainer;
        let parent = node.parent.clone();

        // crop support: clicking the image inside the selected mask (or the
        // mask around the selected image) must not re-target the selection
        if let Some(current) = self.state.target().cloned() {
            if mask_activated
                && (current == event.target || parent.as_ref() == Some(&current))
            {
                return;
            }
            if is_container
                && (current == event.target
                    || self.masks.image_of(&event.target) == Some(&current))
            {
                return;
            }
        }

        let (press_pos, press_ms) = self
            .press
            .take()
            .unwrap_or((event.position, event.at_ms));
        let dragged = was_dragged(
            press_pos,
            event.position,
            press_ms,
            event.at_ms,
            &self.config.gesture,
        );

        let already_editing = self.state.is_text_edit()
            && self.state.target() == Some(&event.target);
        let mode = if (dragged || self.state.target() != Some(&event.target)) && !already_editing
        {
            EditMode::Move
        } else {
            EditMode::Text
        };

        self.select(&event.target, mode);
        self.sender.send(FrameMessage::ElementClicked);
    }

    fn on_double_click(&mut self, event: PointerEvent) {
        let is_pair_member = self
            .document
            .get(&event.target)
            .map(|node| node.mask_activated || node.kind == NodeKind::MaskContainer)
            .unwrap_or(false);
        if is_pair_member {
            self.toggle_crop_mode(event.at_ms);
        } else {
            self.on_click(event);
        }
    }

    /// Flip the crop/move target between a masked image and its container.
    /// Suppressed during the warmup window after the page's first click so
    /// the initial selection stays on the image.
    pub fn toggle_crop_mode(&mut self, now: u64) {
        let warmed_up = self
            .first_interaction_at
            .is_some_and(|t| now >= t + self.config.mask.warmup_ms);
        if !warmed_up {
            debug!("Crop toggle suppressed during warmup");
            return;
        }

        match self.state.clone() {
            InteractionState::CropImage(image) => {
                if let Some(container) = self.masks.container_of(&image).cloned() {
                    self.select(&container, EditMode::Move);
                }
            }
            InteractionState::CropContainer(container) => {
                if let Some(image) = self.masks.image_of(&container).cloned() {
                    self.select(&image, EditMode::Move);
                }
            }
            _ => {}
        }
    }

    // --- Selection -----------------------------------------------------

    fn select(&mut self, target: &ElementId, mode: EditMode) {
        let Some(node) = self.document.get(target) else {
            warn!(id = %target, "Selecting unknown element");
            return;
        };
        let kind = node.kind;
        let mask_activated = node.mask_activated;
        let eligible = !node.customizable.is_empty() || kind == NodeKind::MaskContainer;
        let moveable = node.is_moveable();
        let resizable = node.is_resizable();
        let content_editable = node.content_editable;
        let has_text = node.has_capability("text");
        let has_shape = node.has_capability("shape");

        if !eligible {
            self.deselect();
            return;
        }

        let is_image = (kind == NodeKind::Image || kind == NodeKind::MaskContainer) && moveable;
        if is_image || has_shape {
            let is_masked = mask_activated || kind == NodeKind::MaskContainer;
            self.state = if mask_activated {
                InteractionState::CropImage(target.clone())
            } else if kind == NodeKind::MaskContainer {
                InteractionState::CropContainer(target.clone())
            } else {
                InteractionState::SelectedMove(target.clone())
            };
            self.sender.send(FrameMessage::SetEditing {
                id: target.clone(),
                current_styles: image_snapshot(&self.document, target),
                edit_type: Some(if is_image { EditType::Image } else { EditType::Shape }),
                edit_mode: Some(EditMode::Move),
                can_resize: resizable,
                is_masked_image: is_masked,
            });
            return;
        }

        if has_text {
            let effective = if mode == EditMode::Text && content_editable {
                EditMode::Text
            } else {
                EditMode::Move
            };
            self.state = match effective {
                EditMode::Text => InteractionState::SelectedText(target.clone()),
                EditMode::Move => InteractionState::SelectedMove(target.clone()),
            };
            self.sender.send(FrameMessage::SetEditing {
                id: target.clone(),
                current_styles: text_snapshot(&self.document, target),
                edit_type: Some(EditType::Text),
                edit_mode: Some(effective),
                can_resize: resizable,
                is_masked_image: false,
            });
            return;
        }

        self.deselect();
    }

    fn deselect(&mut self) {
        self.state = InteractionState::Idle;
        self.sender.send(FrameMessage::SetEditing {
            id: ElementId::new(""),
            current_styles: StyleSnapshot::new(),
            edit_type: None,
            edit_mode: None,
            can_resize: false,
            is_masked_image: false,
        });
    }

    /// Deselect and restart the warmup window (page blur / explicit reset).
    pub fn reset_editing(&mut self) {
        self.first_interaction_at = None;
        self.press = None;
        self.deselect();
    }

    // --- Gestures ------------------------------------------------------

    pub fn on_gesture(&mut self, event: GestureEvent) {
        if !self.document.contains(&event.target) {
            return;
        }
        match event.phase {
            GesturePhase::Move => self.apply_gesture_delta(&event.target, &event.delta),
            GesturePhase::End => {
                self.apply_gesture_delta(&event.target, &event.delta);
                let new_data = self.gesture_report(&event.delta);
                self.sender.send(FrameMessage::UpdateCss {
                    id: event.target.clone(),
                    new_data,
                });
                if matches!(event.delta, GestureDelta::Resize { .. }) {
                    // re-report the snapshot so host size inputs track the
                    // final dimensions
                    self.select(&event.target, EditMode::Move);
                }
            }
        }
    }

    fn apply_gesture_delta(&mut self, target: &ElementId, delta: &GestureDelta) {
        let min = self.config.gesture.min_element_size_px;
        let Some(node) = self.document.get_mut(target) else {
            return;
        };
        match delta {
            GestureDelta::Drag { transform } | GestureDelta::Rotate { transform } => {
                node.inline.insert("transform".to_string(), transform.clone());
            }
            GestureDelta::Resize {
                width,
                height,
                transform,
            } => {
                node.inline
                    .insert("width".to_string(), format!("{}px", width.max(min)));
                node.inline
                    .insert("height".to_string(), format!("{}px", height.max(min)));
                node.inline.insert("transform".to_string(), transform.clone());
            }
        }
    }

    fn gesture_report(&self, delta: &GestureDelta) -> BTreeMap<String, String> {
        let min = self.config.gesture.min_element_size_px;
        match delta {
            GestureDelta::Drag { transform } | GestureDelta::Rotate { transform } => {
                BTreeMap::from([("transform".to_string(), transform.clone())])
            }
            GestureDelta::Resize {
                width,
                height,
                transform,
            } => BTreeMap::from([
                ("transform".to_string(), transform.clone()),
                ("width".to_string(), format!("{}px", width.max(min))),
                ("height".to_string(), format!("{}px", height.max(min))),
            ]),
        }
    }

    // --- Keyboard ------------------------------------------------------

    pub fn on_key(&mut self, event: KeyEvent) {
        self.clock = self.clock.max(event.at_ms);

        let arrow = ArrowKey::from_key(&event.key);
        let target = self.state.target().cloned();
        if let (Some(arrow), Some(target)) = (arrow, target.filter(|_| !self.state.is_text_edit()))
        {
            self.nudge(&target, arrow, event.modifiers);
            return;
        }

        let is_masked_image = self
            .state
            .target()
            .is_some_and(|t| self.masks.is_member(t));
        self.sender.send(FrameMessage::Keydown {
            key: event.key,
            modifiers: event.modifiers,
            text_edit: self.state.is_text_edit(),
            is_masked_image,
            img_src: None,
        });
    }

    fn nudge(
        &mut self,
        target: &ElementId,
        arrow: ArrowKey,
        modifiers: liveproof_core::message::Modifiers,
    ) {
        let size = (
            self.document
                .computed(target, "width")
                .as_deref()
                .and_then(crate::document::px)
                .unwrap_or(0.0),
            self.document
                .computed(target, "height")
                .as_deref()
                .and_then(crate::document::px)
                .unwrap_or(0.0),
        );
        let nudge = nudge_for(
            arrow,
            modifiers,
            &self.config.nudge,
            self.document.viewport(),
            size,
        );

        let current = self
            .document
            .computed(target, "transform")
            .unwrap_or_default();
        let (x, y) = translate_of(&current);
        let (new_x, new_y) = match nudge {
            Nudge::Relative { dx, dy } => (x + dx, y + dy),
            Nudge::AbsoluteX(abs_x) => (abs_x, y),
            Nudge::AbsoluteY(abs_y) => (x, abs_y),
        };
        let transform = with_translate(&current, new_x, new_y);

        if let Some(node) = self.document.get_mut(target) {
            node.inline.insert("transform".to_string(), transform.clone());
        }
        self.sender.send(FrameMessage::UpdateCss {
            id: target.clone(),
            new_data: BTreeMap::from([("transform".to_string(), transform)]),
        });
    }

    // --- Content edits -------------------------------------------------

    /// Report a text content change (typing, cut, paste). No-op if the
    /// content did not actually change.
    pub fn edit_text(&mut self, id: &ElementId, new_value: &str) {
        let page = self.document.page().clone();
        let Some(node) = self.document.get_mut(id) else {
            return;
        };
        if !node.content_editable || node.content == new_value {
            return;
        }
        node.content = new_value.to_string();
        self.sender.send(FrameMessage::UpdateField {
            name: id.as_str().to_string(),
            value: new_value.to_string(),
            page,
            reset_images: false,
        });
    }

    /// Paste into a text node: markup is stripped to plain text first.
    pub fn paste_text(&mut self, id: &ElementId, clipboard: &str) {
        self.edit_text(id, &strip_markup(clipboard));
    }

    /// Drop the armed palette image onto an image node. Replaces the
    /// source, reports the content change, and deselects.
    pub fn drop_image(&mut self, target: &ElementId) {
        let Some(armed) = self.armed_image.clone() else {
            return;
        };
        let page = self.document.page().clone();
        let Some(node) = self.document.get_mut(target) else {
            return;
        };
        if node.kind != NodeKind::Image {
            return;
        }
        node.content = armed.src.clone();
        self.initial_sources.insert(target.clone(), armed.src.clone());
        self.sender.send(FrameMessage::UpdateField {
            name: target.as_str().to_string(),
            value: armed.src,
            page,
            reset_images: true,
        });
        self.reset_editing();
    }
}

/// Reduce pasted markup to its text content.
fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveproof_channels::{FrameChannel, memory_channel};
    use liveproof_core::ids::PageId;
    use liveproof_core::message::Modifiers;
    use tokio::sync::mpsc;

    async fn harness() -> (FrameAgent, mpsc::Receiver<FrameMessage>) {
        let (channel, endpoint) = memory_channel(PageId::from("front"), 64);
        let inbound = channel.start().await.unwrap();
        let mut document = Document::new("front".into(), 600.0, 400.0);
        document.insert(Node::text("headline", "Hello").with_base(base(&[
            ("font-size", "20px"),
            ("width", "200px"),
            ("height", "40px"),
        ])));
        document.insert(Node::shape("box").with_base(base(&[
            ("width", "80px"),
            ("height", "50px"),
        ])));
        document.insert(Node::mask_container("photoMask"));
        document.insert(Node::image("photo", "a.jpg").with_parent("photoMask"));
        let agent = FrameAgent::new(document, EditorConfig::default(), endpoint.sender());
        (agent, inbound)
    }

    fn base(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(p, v)| (p.to_string(), v.to_string()))
            .collect()
    }

    fn click(target: &str, at_ms: u64) -> PointerEvent {
        PointerEvent::new(target, PointerKind::Click, Point::new(100.0, 100.0), at_ms)
    }

    fn down(target: &str, at_ms: u64) -> PointerEvent {
        PointerEvent::new(target, PointerKind::Down, Point::new(100.0, 100.0), at_ms)
    }

    async fn next_editing(
        inbound: &mut mpsc::Receiver<FrameMessage>,
    ) -> (ElementId, Option<EditMode>) {
        loop {
            match inbound.recv().await.unwrap() {
                FrameMessage::SetEditing { id, edit_mode, .. } => return (id, edit_mode),
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn first_click_selects_for_move_second_enters_text() {
        let (mut agent, mut inbound) = harness().await;

        agent.on_pointer(down("headline", 1000));
        agent.on_pointer(click("headline", 1100));
        assert_eq!(agent.state(), &InteractionState::SelectedMove("headline".into()));
        let (id, mode) = next_editing(&mut inbound).await;
        assert_eq!(id, ElementId::from("headline"));
        assert_eq!(mode, Some(EditMode::Move));

        agent.on_pointer(down("headline", 2000));
        agent.on_pointer(click("headline", 2100));
        assert_eq!(agent.state(), &InteractionState::SelectedText("headline".into()));
        let (_, mode) = next_editing(&mut inbound).await;
        assert_eq!(mode, Some(EditMode::Text));
    }

    #[tokio::test]
    async fn dragged_click_never_enters_text_mode() {
        let (mut agent, _inbound) = harness().await;

        agent.on_pointer(down("headline", 1000));
        agent.on_pointer(click("headline", 1100));
        // moved 10px before release: stays in move mode
        agent.on_pointer(down("headline", 2000));
        agent.on_pointer(PointerEvent::new(
            "headline",
            PointerKind::Click,
            Point::new(110.0, 100.0),
            2100,
        ));
        assert_eq!(agent.state(), &InteractionState::SelectedMove("headline".into()));
    }

    #[tokio::test]
    async fn slow_click_is_a_drag() {
        let (mut agent, _inbound) = harness().await;
        agent.on_pointer(down("headline", 1000));
        agent.on_pointer(click("headline", 1100));
        agent.on_pointer(down("headline", 2000));
        agent.on_pointer(click("headline", 2600));
        assert_eq!(agent.state(), &InteractionState::SelectedMove("headline".into()));
    }

    #[tokio::test]
    async fn masked_image_click_targets_the_image() {
        let (mut agent, _inbound) = harness().await;
        agent.on_pointer(down("photo", 1000));
        agent.on_pointer(click("photo", 1050));
        assert_eq!(agent.state(), &InteractionState::CropImage("photo".into()));
    }

    #[tokio::test]
    async fn crop_toggle_is_suppressed_during_warmup() {
        let (mut agent, _inbound) = harness().await;
        agent.on_pointer(down("photo", 1000));
        agent.on_pointer(click("photo", 1050));

        // double-click lands inside the warmup window: no toggle
        agent.on_pointer(PointerEvent::new(
            "photo",
            PointerKind::DoubleClick,
            Point::new(100.0, 100.0),
            1400,
        ));
        assert_eq!(agent.state(), &InteractionState::CropImage("photo".into()));

        // after warmup the same double-click re-targets the container
        agent.on_pointer(PointerEvent::new(
            "photo",
            PointerKind::DoubleClick,
            Point::new(100.0, 100.0),
            2100,
        ));
        assert_eq!(agent.state(), &InteractionState::CropContainer("photoMask".into()));

        // and toggling again goes back to the image
        agent.on_pointer(PointerEvent::new(
            "photoMask",
            PointerKind::DoubleClick,
            Point::new(100.0, 100.0),
            2200,
        ));
        assert_eq!(agent.state(), &InteractionState::CropImage("photo".into()));
    }

    #[tokio::test]
    async fn clicks_inside_the_selected_pair_do_not_retarget() {
        let (mut agent, _inbound) = harness().await;
        agent.on_pointer(down("photo", 1000));
        agent.on_pointer(click("photo", 1050));
        assert_eq!(agent.state(), &InteractionState::CropImage("photo".into()));

        // clicking the image again (or its container) keeps the selection
        agent.on_pointer(click("photo", 1200));
        assert_eq!(agent.state(), &InteractionState::CropImage("photo".into()));
        agent.on_pointer(click("photoMask", 1300));
        assert_eq!(agent.state(), &InteractionState::CropImage("photo".into()));
    }

    #[tokio::test]
    async fn remove_transform_resets_both_halves_of_a_mask_pair() {
        let (mut agent, _inbound) = harness().await;
        agent.handle_message(HostMessage::UpdateCss {
            id: "photo".into(),
            new_data: BTreeMap::from([("transform".to_string(), "translate(20px, 0px)".to_string())]),
        });
        agent.handle_message(HostMessage::UpdateCss {
            id: "photoMask".into(),
            new_data: BTreeMap::from([("transform".to_string(), "translate(5px, 5px)".to_string())]),
        });

        agent.handle_message(HostMessage::RemoveTransform { id: "photo".into() });
        assert_eq!(agent.document().computed(&"photo".into(), "transform"), None);
        assert_eq!(agent.document().computed(&"photoMask".into(), "transform"), None);
    }

    #[tokio::test]
    async fn delete_element_takes_the_mask_container_along() {
        let (mut agent, _inbound) = harness().await;
        agent.handle_message(HostMessage::DeleteElement { id: "photo".into() });
        assert!(!agent.document().contains(&"photo".into()));
        assert!(!agent.document().contains(&"photoMask".into()));
    }

    #[tokio::test]
    async fn unknown_element_messages_are_no_ops() {
        let (mut agent, _inbound) = harness().await;
        agent.handle_message(HostMessage::RemoveTransform { id: "ghost".into() });
        agent.handle_message(HostMessage::SetFieldValue {
            id: "ghost".into(),
            value: "x".into(),
        });
        agent.handle_message(HostMessage::DeleteElement { id: "ghost".into() });
        assert!(agent.document().contains(&"headline".into()));
    }

    #[tokio::test]
    async fn handshake_reports_editable_content() {
        let (mut agent, mut inbound) = harness().await;
        agent.handle_message(HostMessage::GetAllEditableFieldsAsMergeVariables);
        let FrameMessage::SetFields { fields } = inbound.recv().await.unwrap() else {
            panic!("expected setFields");
        };
        let headline = fields.iter().find(|f| f.name == "headline").unwrap();
        assert_eq!(headline.value, "Hello");
        assert_eq!(headline.page, PageId::from("front"));
        assert!(fields.iter().any(|f| f.name == "photo" && f.value == "a.jpg"));
    }

    #[tokio::test]
    async fn nudge_moves_translate_and_reports_css() {
        let (mut agent, mut inbound) = harness().await;
        agent.on_pointer(down("box", 1000));
        agent.on_pointer(click("box", 1100));
        let _ = next_editing(&mut inbound).await;
        loop {
            // drain the elementClicked
            if let FrameMessage::ElementClicked = inbound.recv().await.unwrap() {
                break;
            }
        }

        agent.on_key(KeyEvent::new("ArrowRight", Modifiers::default(), 1200));
        let FrameMessage::UpdateCss { id, new_data } = inbound.recv().await.unwrap() else {
            panic!("expected updateCSS");
        };
        assert_eq!(id, ElementId::from("box"));
        assert_eq!(new_data["transform"], "translate(1px, 0px)");

        let shift = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        agent.on_key(KeyEvent::new("ArrowDown", shift, 1300));
        let FrameMessage::UpdateCss { new_data, .. } = inbound.recv().await.unwrap() else {
            panic!("expected updateCSS");
        };
        assert_eq!(new_data["transform"], "translate(1px, 5px)");
    }

    #[tokio::test]
    async fn absolute_nudge_snaps_to_edge_minus_size() {
        let (mut agent, mut inbound) = harness().await;
        agent.on_pointer(down("box", 1000));
        agent.on_pointer(click("box", 1100));
        while !matches!(inbound.recv().await.unwrap(), FrameMessage::ElementClicked) {}

        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        agent.on_key(KeyEvent::new("ArrowRight", ctrl, 1200));
        let FrameMessage::UpdateCss { new_data, .. } = inbound.recv().await.unwrap() else {
            panic!("expected updateCSS");
        };
        // viewport 600 wide, box 80 wide
        assert_eq!(new_data["transform"], "translate(520px, 0px)");
    }

    #[tokio::test]
    async fn unhandled_keys_are_forwarded_with_context() {
        let (mut agent, mut inbound) = harness().await;
        agent.on_pointer(down("photo", 1000));
        agent.on_pointer(click("photo", 1050));
        while !matches!(inbound.recv().await.unwrap(), FrameMessage::ElementClicked) {}

        agent.on_key(KeyEvent::new("Delete", Modifiers::default(), 1200));
        let FrameMessage::Keydown {
            key,
            text_edit,
            is_masked_image,
            ..
        } = inbound.recv().await.unwrap()
        else {
            panic!("expected keydown");
        };
        assert_eq!(key, "Delete");
        assert!(!text_edit);
        assert!(is_masked_image);
    }

    #[tokio::test]
    async fn gesture_end_reports_cumulative_transform() {
        let (mut agent, mut inbound) = harness().await;
        agent.on_gesture(GestureEvent {
            target: "box".into(),
            phase: GesturePhase::Move,
            delta: GestureDelta::Drag {
                transform: "translate(10px, 0px)".into(),
            },
        });
        assert!(inbound.try_recv().is_err());

        agent.on_gesture(GestureEvent {
            target: "box".into(),
            phase: GesturePhase::End,
            delta: GestureDelta::Drag {
                transform: "translate(20px, 0px)".into(),
            },
        });
        let FrameMessage::UpdateCss { new_data, .. } = inbound.recv().await.unwrap() else {
            panic!("expected updateCSS");
        };
        assert_eq!(new_data["transform"], "translate(20px, 0px)");
        assert_eq!(
            agent.document().computed(&"box".into(), "transform").as_deref(),
            Some("translate(20px, 0px)")
        );
    }

    #[tokio::test]
    async fn resize_clamps_to_minimum_size() {
        let (mut agent, mut inbound) = harness().await;
        agent.on_gesture(GestureEvent {
            target: "box".into(),
            phase: GesturePhase::End,
            delta: GestureDelta::Resize {
                width: 2.0,
                height: 100.0,
                transform: "translate(0px, 0px)".into(),
            },
        });
        let FrameMessage::UpdateCss { new_data, .. } = inbound.recv().await.unwrap() else {
            panic!("expected updateCSS");
        };
        assert_eq!(new_data["width"], "6px");
        assert_eq!(new_data["height"], "100px");
    }

    #[tokio::test]
    async fn add_element_waits_for_stylesheet_position() {
        let (mut agent, mut inbound) = harness().await;
        let template = NodeTemplate {
            kind: NodeKindSpec::Shape,
            customizable: vec!["move".into(), "resize".into(), "shape".into()],
            styles: BTreeMap::new(),
            content: String::new(),
        };
        agent.handle_message(HostMessage::AddElement {
            content: template,
            id: "newShape".into(),
            src: None,
            is_masked_image: false,
        });
        // not positioned yet: no selection reported
        assert!(inbound.try_recv().is_err());

        agent.handle_message(HostMessage::CustomStyles {
            full_css_string: "#newShape{position:absolute;width:40px}".into(),
        });
        let (id, _) = next_editing(&mut inbound).await;
        assert_eq!(id, ElementId::from("newShape"));
        assert_eq!(
            agent.state(),
            &InteractionState::SelectedMove("newShape".into())
        );
    }

    #[tokio::test]
    async fn pending_add_is_cancelled_when_the_element_is_removed() {
        let (mut agent, mut inbound) = harness().await;
        let template = NodeTemplate {
            kind: NodeKindSpec::Shape,
            customizable: vec!["move".into(), "shape".into()],
            styles: BTreeMap::new(),
            content: String::new(),
        };
        agent.handle_message(HostMessage::AddElement {
            content: template,
            id: "doomed".into(),
            src: None,
            is_masked_image: false,
        });
        agent.handle_message(HostMessage::DeleteElement { id: "doomed".into() });
        agent.handle_message(HostMessage::CustomStyles {
            full_css_string: "#doomed{position:absolute}".into(),
        });
        assert!(inbound.try_recv().is_err());
        assert_eq!(agent.state(), &InteractionState::Idle);
    }

    #[tokio::test]
    async fn added_masked_image_is_activated_and_paired() {
        let (mut agent, mut inbound) = harness().await;
        let template = NodeTemplate {
            kind: NodeKindSpec::Image,
            customizable: vec![],
            styles: BTreeMap::from([("position".to_string(), "absolute".to_string())]),
            content: String::new(),
        };
        agent.handle_message(HostMessage::AddElement {
            content: template,
            id: "listing".into(),
            src: Some("house.jpg".into()),
            is_masked_image: true,
        });
        let (id, _) = next_editing(&mut inbound).await;
        assert_eq!(id, ElementId::from("listingMask"));
        assert_eq!(
            agent.state(),
            &InteractionState::CropContainer("listingMask".into())
        );
        assert_eq!(
            agent.document().computed(&"listing".into(), "z-index").as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn text_edit_reports_update_field_once_per_change() {
        let (mut agent, mut inbound) = harness().await;
        agent.edit_text(&"headline".into(), "Hi there");
        let FrameMessage::UpdateField { name, value, page, reset_images } =
            inbound.recv().await.unwrap()
        else {
            panic!("expected updateField");
        };
        assert_eq!(name, "headline");
        assert_eq!(value, "Hi there");
        assert_eq!(page, PageId::from("front"));
        assert!(!reset_images);

        // same content again: nothing reported
        agent.edit_text(&"headline".into(), "Hi there");
        assert!(inbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn paste_strips_markup() {
        let (mut agent, mut inbound) = harness().await;
        agent.paste_text(&"headline".into(), "<b>Bold</b> move");
        let FrameMessage::UpdateField { value, .. } = inbound.recv().await.unwrap() else {
            panic!("expected updateField");
        };
        assert_eq!(value, "Bold move");
    }

    #[tokio::test]
    async fn armed_image_drop_replaces_source_and_resets() {
        let (mut agent, mut inbound) = harness().await;
        agent.handle_message(HostMessage::ImageSelected {
            img_src: Some("new.jpg".into()),
            variable_name: None,
        });
        agent.drop_image(&"photo".into());

        let FrameMessage::UpdateField { name, value, reset_images, .. } =
            inbound.recv().await.unwrap()
        else {
            panic!("expected updateField");
        };
        assert_eq!(name, "photo");
        assert_eq!(value, "new.jpg");
        assert!(reset_images);
        assert_eq!(agent.state(), &InteractionState::Idle);
    }

    #[tokio::test]
    async fn unarmed_drop_changes_nothing() {
        let (mut agent, mut inbound) = harness().await;
        agent.drop_image(&"photo".into());
        assert!(inbound.try_recv().is_err());
        assert_eq!(
            agent.document().get(&"photo".into()).unwrap().content,
            "a.jpg"
        );
    }

    #[tokio::test]
    async fn zoom_is_inverted_for_handle_sensitivity() {
        let (mut agent, _inbound) = harness().await;
        agent.handle_message(HostMessage::UpdateZoom { zoom_value: 0.5 });
        assert_eq!(agent.zoom(), 2.0);
        agent.handle_message(HostMessage::UpdateZoom { zoom_value: 0.0 });
        assert_eq!(agent.zoom(), 1.0);
    }
}
