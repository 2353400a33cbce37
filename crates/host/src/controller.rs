//! The host controller.
//!
//! Reacts to frame messages, keeps the edit store authoritative, and fans
//! derived messages back out to the right frame(s). The controller never
//! trusts transient frame state: after any stored CSS change it rebuilds
//! the owning page's full override stylesheet and pushes it wholesale, so
//! a dropped message self-heals on the next push or frame reload.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use liveproof_channels::{FrameChannel, FrameRegistry};
use liveproof_config::EditorConfig;
use liveproof_core::edit::{Field, Page, StyleSnapshot};
use liveproof_core::error::{Result, StoreError};
use liveproof_core::ids::{ElementId, PageId};
use liveproof_core::message::{Dimension, FrameMessage, HostMessage, Modifiers, NodeTemplate};
use liveproof_store::{EditStore, EditorKind, LayerCommand};

pub struct HostController {
    config: EditorConfig,
    registry: FrameRegistry,
    store: EditStore,
    pages: Vec<Page>,
    /// Pages that signalled loaded but have not answered the content
    /// fetch yet. The fetch is retried from here, not re-derived.
    pending_handshakes: HashSet<PageId>,
}

impl HostController {
    pub fn new(kind: EditorKind, config: EditorConfig) -> Self {
        let store = EditStore::new(kind, config.layers.default_z_extremum);
        Self {
            config,
            registry: FrameRegistry::new(),
            store,
            pages: Vec::new(),
            pending_handshakes: HashSet::new(),
        }
    }

    pub fn store(&self) -> &EditStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EditStore {
        &mut self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn set_pages(&mut self, pages: Vec<Page>) {
        self.pages = pages;
    }

    pub(crate) fn pages_mut(&mut self) -> &mut Vec<Page> {
        &mut self.pages
    }

    pub fn registry(&self) -> &FrameRegistry {
        &self.registry
    }

    pub fn attach_frame(&mut self, channel: Arc<dyn FrameChannel>) {
        self.registry.register(channel);
    }

    /// Start every attached frame and yield the merged inbound stream.
    pub async fn start(
        &self,
    ) -> Result<tokio::sync::mpsc::Receiver<(PageId, FrameMessage)>> {
        let inbound = self.registry.start_all(self.config.channel.capacity).await?;
        Ok(inbound)
    }

    // --- Inbound dispatch ----------------------------------------------

    pub async fn handle_frame_message(
        &mut self,
        page: PageId,
        message: FrameMessage,
    ) -> Result<()> {
        match message {
            FrameMessage::FrameLoaded => {
                // the frame queues nothing, so the content fetch only goes
                // out once the frame says it is ready
                debug!(page = %page, "Frame loaded, starting handshake");
                self.pending_handshakes.insert(page.clone());
                self.registry
                    .send_to(&page, HostMessage::GetAllEditableFieldsAsMergeVariables)
                    .await?;
            }
            FrameMessage::SetFields { fields } => {
                debug!(page = %page, count = fields.len(), "Handshake fields received");
                self.pending_handshakes.remove(&page);
                self.merge_page_fields(&fields);
                self.store.merge_fields(fields);
                // a reloaded frame comes back blank: replay styles and any
                // persisted content on top of the handshake
                self.push_styles(&page).await?;
                self.push_merge_variables(&page).await?;
            }
            FrameMessage::SetEditing {
                id,
                current_styles,
                edit_type,
                edit_mode,
                can_resize,
                is_masked_image,
            } => {
                if id.is_empty() {
                    self.store.reset_selection();
                } else {
                    self.store.set_editing(
                        id,
                        page.clone(),
                        edit_type,
                        edit_mode,
                        can_resize,
                        is_masked_image,
                        current_styles,
                    );
                    // selection is host-global: only one frame may hold it
                    self.deselect_other_frames(&page).await;
                }
            }
            FrameMessage::UpdateCss { id, new_data } => {
                self.store.apply_css(&id, &page, new_data);
                self.push_styles(&page).await?;
            }
            FrameMessage::UpdateField {
                name,
                value,
                page: field_page,
                reset_images: _,
            } => {
                let field = Field {
                    name,
                    page: field_page,
                    value,
                };
                self.merge_page_fields(std::slice::from_ref(&field));
                self.store.merge_fields(vec![field]);
            }
            FrameMessage::ElementClicked => {
                debug!(page = %page, "Element clicked");
            }
            FrameMessage::Keydown {
                key,
                modifiers,
                text_edit,
                ..
            } => {
                self.route_keydown(&key, modifiers, text_edit).await?;
            }
        }
        Ok(())
    }

    async fn route_keydown(
        &mut self,
        key: &str,
        _modifiers: Modifiers,
        text_edit: bool,
    ) -> Result<()> {
        if (key == "Delete" || key == "Backspace")
            && !text_edit
            && self.store.editing_info().is_selected()
        {
            self.delete_selected_element().await?;
        }
        Ok(())
    }

    async fn deselect_other_frames(&self, selected: &PageId) {
        for page in self.registry.pages() {
            if &page == selected {
                continue;
            }
            if let Err(err) = self
                .registry
                .send_to(&page, HostMessage::ResetSelected)
                .await
            {
                warn!(page = %page, error = %err, "Failed to deselect frame");
            }
        }
    }

    fn merge_page_fields(&mut self, fields: &[Field]) {
        for field in fields {
            let Some(index) = field.page.index().or_else(|| {
                // postcard pages address as front/back
                self.pages_index_of(&field.page)
            }) else {
                continue;
            };
            let Some(page) = self.pages.get_mut(index) else {
                continue;
            };
            match page
                .merge_variables
                .iter_mut()
                .find(|mv| mv.name == field.name)
            {
                Some(existing) => existing.value = field.value.clone(),
                None => page.merge_variables.push(liveproof_core::edit::MergeVariable {
                    name: field.name.clone(),
                    value: field.value.clone(),
                }),
            }
        }
    }

    fn pages_index_of(&self, page: &PageId) -> Option<usize> {
        (0..self.pages.len()).find(|&i| &self.store.kind().page_id(i) == page)
    }

    // --- Derived pushes ------------------------------------------------

    /// Re-send the content fetch to every frame that never answered it.
    pub async fn retry_pending_handshakes(&self) -> Result<()> {
        for page in &self.pending_handshakes {
            debug!(page = %page, "Retrying handshake");
            self.registry
                .send_to(page, HostMessage::GetAllEditableFieldsAsMergeVariables)
                .await?;
        }
        Ok(())
    }

    pub fn has_pending_handshake(&self, page: &PageId) -> bool {
        self.pending_handshakes.contains(page)
    }

    /// Push this page's persisted field content into its frame.
    pub async fn push_merge_variables(&self, page: &PageId) -> Result<()> {
        let merge_variables: Vec<Field> = self
            .store
            .fields()
            .iter()
            .filter(|f| &f.page == page)
            .cloned()
            .collect();
        if merge_variables.is_empty() {
            return Ok(());
        }
        self.registry
            .send_to(page, HostMessage::SetMergeVariables { merge_variables })
            .await?;
        Ok(())
    }

    /// Rebuild and push the full override stylesheet for one page.
    /// Replay-safe: the stylesheet replaces wholesale on the frame side.
    pub async fn push_styles(&self, page: &PageId) -> Result<()> {
        let full_css_string = self.store.full_css_for_page(page);
        self.registry
            .send_to(page, HostMessage::CustomStyles { full_css_string })
            .await?;
        Ok(())
    }

    fn selected(&self) -> Result<(ElementId, PageId)> {
        let info = self.store.editing_info();
        match (info.id.clone(), info.page.clone()) {
            (Some(id), Some(page)) => Ok((id, page)),
            _ => Err(StoreError::NoSelection.into()),
        }
    }

    // --- Host-initiated operations -------------------------------------

    /// Apply a style patch from host chrome to the selected element:
    /// persist it, mirror it, push the rebuilt stylesheet.
    pub async fn apply_style_patch(
        &mut self,
        properties: BTreeMap<String, String>,
        mirror: StyleSnapshot,
    ) -> Result<()> {
        let (id, page) = self.selected()?;
        self.store.apply_css(&id, &page, properties);
        self.store.update_styles(mirror);
        self.push_styles(&page).await
    }

    /// Reset the selected element to its template default. Mask pairs are
    /// positionally coupled, so both halves' edits go together; the frame
    /// strips inline styles from both on `removeTransform`.
    pub async fn reset_selected_element(&mut self) -> Result<()> {
        let (id, page) = self.selected()?;
        self.store.delete_element_edits(&id, &page);
        self.store.delete_element_edits(&id.mask_peer(), &page);
        self.push_styles(&page).await?;
        self.registry
            .send_to(&page, HostMessage::RemoveTransform { id })
            .await?;
        Ok(())
    }

    /// Delete the selected element everywhere: stored edits (both mask
    /// halves), the frame's node, and the selection itself.
    pub async fn delete_selected_element(&mut self) -> Result<()> {
        let (id, page) = self.selected()?;
        self.store.delete_element_edits(&id, &page);
        self.store.delete_element_edits(&id.mask_peer(), &page);
        self.store.reset_selection();
        self.push_styles(&page).await?;
        self.registry
            .send_to(&page, HostMessage::DeleteElement { id })
            .await?;
        Ok(())
    }

    /// Flip crop mode for the selected masked image.
    pub async fn toggle_crop_mode(&mut self) -> Result<()> {
        let (_, page) = self.selected()?;
        let is_cropping = self.store.toggle_crop_mode();
        self.registry
            .send_to(&page, HostMessage::ToggleCropMode { is_cropping })
            .await?;
        Ok(())
    }

    /// Apply a layering command to the selected element. The current
    /// z-index comes from the mirrored style snapshot.
    pub async fn change_layer(&mut self, command: LayerCommand) -> Result<()> {
        let (_, page) = self.selected()?;
        let current = self
            .store
            .styles()
            .get("zIndex")
            .and_then(|v| v.as_i64())
            .unwrap_or(0) as i32;
        if let Some(z) = self.store.change_z_index(command, current) {
            let mut mirror = StyleSnapshot::new();
            mirror.insert("zIndex".to_string(), serde_json::json!(z));
            self.store.update_styles(mirror);
            self.push_styles(&page).await?;
        }
        Ok(())
    }

    /// Resize the selected element from host size inputs: persist the
    /// dimension as an override and order the frame to apply it now.
    pub async fn resize_selected(&mut self, dim: Dimension, value: String) -> Result<()> {
        let (id, page) = self.selected()?;
        let property = match dim {
            Dimension::Width => "width",
            Dimension::Height => "height",
        };
        self.store.apply_css(
            &id,
            &page,
            BTreeMap::from([(property.to_string(), value.clone())]),
        );
        self.push_styles(&page).await?;
        self.registry
            .send_to(&page, HostMessage::ResizeElement { id, dim, value })
            .await?;
        Ok(())
    }

    /// Inject a new element into the active page's frame. Returns the
    /// generated element id.
    pub async fn add_element(
        &mut self,
        template: NodeTemplate,
        src: Option<String>,
        is_masked_image: bool,
    ) -> Result<ElementId> {
        let id = ElementId::generate("el");
        let page = self.store.active_page_id();
        self.registry
            .send_to(
                &page,
                HostMessage::AddElement {
                    content: template,
                    id: id.clone(),
                    src,
                    is_masked_image,
                },
            )
            .await?;
        Ok(id)
    }

    pub async fn hide_element(&self, page: &PageId, id: ElementId) -> Result<()> {
        self.registry
            .send_to(page, HostMessage::HideElement { id })
            .await?;
        Ok(())
    }

    pub async fn unhide_element(&self, page: &PageId, id: ElementId) -> Result<()> {
        self.registry
            .send_to(page, HostMessage::UnhideElement { id })
            .await?;
        Ok(())
    }

    /// Set one element's content in a frame and record it as a field.
    pub async fn set_field_value(
        &mut self,
        page: &PageId,
        id: ElementId,
        value: String,
    ) -> Result<()> {
        let field = Field {
            name: id.as_str().to_string(),
            page: page.clone(),
            value: value.clone(),
        };
        self.merge_page_fields(std::slice::from_ref(&field));
        self.store.merge_fields(vec![field]);
        self.registry
            .send_to(page, HostMessage::SetFieldValue { id, value })
            .await?;
        Ok(())
    }

    // --- Broadcasts (two independent idempotent messages per frame; no
    // cross-frame atomicity) --------------------------------------------

    /// Clamped zoom, broadcast to every frame.
    pub async fn set_zoom(&mut self, zoom: f64) {
        let clamped = zoom.clamp(self.config.zoom.min, self.config.zoom.max);
        self.store.set_zoom_value(clamped);
        self.registry
            .broadcast(HostMessage::UpdateZoom { zoom_value: clamped })
            .await;
    }

    /// Toggle the safe-zone fixtures everywhere. Persisted as overrides on
    /// the fixture elements so a reloaded frame keeps the setting; the
    /// broadcast makes live frames react without waiting for a style push.
    /// The wire flag carries hide semantics: `true` hides the fixtures.
    pub async fn set_safe_zone_hidden(&mut self, hidden: bool) -> Result<()> {
        let display = if hidden { "none" } else { "initial" };
        for page in self.registry.pages() {
            for fixture in ["safe-zone", "cut-text", "fold-line", "fold-line-text"] {
                self.store.apply_css(
                    &ElementId::new(fixture),
                    &page,
                    BTreeMap::from([("display".to_string(), display.to_string())]),
                );
            }
            self.push_styles(&page).await?;
        }
        self.registry
            .broadcast(HostMessage::ShowSafeZone {
                show_safe_zone: hidden,
            })
            .await;
        Ok(())
    }

    pub async fn set_cta_hidden(&mut self, hidden: bool) -> Result<()> {
        let display = if hidden { "none" } else { "initial" };
        for page in self.registry.pages() {
            self.store.apply_css(
                &ElementId::new("_cta"),
                &page,
                BTreeMap::from([("display".to_string(), display.to_string())]),
            );
            self.push_styles(&page).await?;
        }
        self.registry
            .broadcast(HostMessage::HideCta { hide_cta: hidden })
            .await;
        Ok(())
    }

    pub async fn set_cta_content(&self, content: String) {
        self.registry.broadcast(HostMessage::Cta { cta: content }).await;
    }

    pub async fn set_brand_color(&self, color: String) {
        self.registry
            .broadcast(HostMessage::UpdateBrandColor { value: color })
            .await;
    }

    /// Replace every field (template switch, undo-all) without reloading
    /// the frames: each frame gets the full list and applies what it owns.
    pub async fn replace_all_fields(&mut self, fields: Vec<Field>) {
        self.merge_page_fields(&fields);
        self.store.set_fields(fields.clone());
        self.registry
            .broadcast(HostMessage::UpdateAllFields {
                replace_field_data: fields,
            })
            .await;
    }

    /// Arm (or disarm) every frame's image drop targets.
    pub async fn arm_image_drop(&self, img_src: Option<String>, variable_name: Option<String>) {
        self.registry
            .broadcast(HostMessage::ImageSelected {
                img_src,
                variable_name,
            })
            .await;
    }

    /// Report which portion of each page is visible; derives the active
    /// page and recomputes the layering extrema when it changes.
    pub fn observe_page_intersection(&mut self, position: usize, ratio: f64) {
        let before = self.store.active_page();
        self.store.update_page_intersection(position, ratio);
        let after = self.store.active_page();
        if before != after {
            let page = self.store.active_page_id();
            let z_values: Vec<i32> = self
                .store
                .stencil_edits()
                .iter()
                .filter(|edit| edit.page == page)
                .filter_map(|edit| edit.css_partial.get("z-index"))
                .filter_map(|z| z.parse().ok())
                .collect();
            self.store.recompute_extrema(&page, z_values);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveproof_channels::{FrameEndpoint, memory_channel};
    use liveproof_core::edit::{EditMode, EditType};
    use liveproof_core::ids::EditId;
    use serde_json::json;

    fn harness() -> (HostController, FrameEndpoint, FrameEndpoint) {
        let (front, front_endpoint) = memory_channel(PageId::new("front"), 16);
        let (back, back_endpoint) = memory_channel(PageId::new("back"), 16);
        let mut controller =
            HostController::new(EditorKind::Postcard, EditorConfig::default());
        controller.attach_frame(Arc::new(front));
        controller.attach_frame(Arc::new(back));
        (controller, front_endpoint, back_endpoint)
    }

    async fn select(controller: &mut HostController, id: &str, z_index: i64) {
        controller
            .handle_frame_message(
                PageId::new("front"),
                FrameMessage::SetEditing {
                    id: id.into(),
                    current_styles: serde_json::Map::from_iter([(
                        "zIndex".to_string(),
                        json!(z_index),
                    )]),
                    edit_type: Some(EditType::Image),
                    edit_mode: Some(EditMode::Move),
                    can_resize: true,
                    is_masked_image: true,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn frame_loaded_starts_the_handshake_and_it_can_be_retried() {
        let (mut controller, mut front, _back) = harness();
        controller
            .handle_frame_message(PageId::new("front"), FrameMessage::FrameLoaded)
            .await
            .unwrap();
        assert_eq!(
            front.recv().await,
            Some(HostMessage::GetAllEditableFieldsAsMergeVariables)
        );
        assert!(controller.has_pending_handshake(&PageId::new("front")));

        controller.retry_pending_handshakes().await.unwrap();
        assert_eq!(
            front.recv().await,
            Some(HostMessage::GetAllEditableFieldsAsMergeVariables)
        );
    }

    #[tokio::test]
    async fn set_fields_completes_the_handshake_and_replays_styles() {
        let (mut controller, mut front, _back) = harness();
        controller.store_mut().apply_css(
            &"photo".into(),
            &"front".into(),
            BTreeMap::from([("opacity".to_string(), "0.5".to_string())]),
        );
        controller
            .handle_frame_message(PageId::new("front"), FrameMessage::FrameLoaded)
            .await
            .unwrap();
        front.recv().await; // content fetch

        controller
            .handle_frame_message(
                PageId::new("front"),
                FrameMessage::SetFields {
                    fields: vec![Field {
                        name: "headline".into(),
                        page: "front".into(),
                        value: "Hello".into(),
                    }],
                },
            )
            .await
            .unwrap();
        assert!(!controller.has_pending_handshake(&PageId::new("front")));
        assert_eq!(controller.store().field_value("headline"), Some("Hello"));

        assert_eq!(
            front.recv().await,
            Some(HostMessage::CustomStyles {
                full_css_string: "#photo{opacity:0.5}".into()
            })
        );
        assert_eq!(
            front.recv().await,
            Some(HostMessage::SetMergeVariables {
                merge_variables: vec![Field {
                    name: "headline".into(),
                    page: "front".into(),
                    value: "Hello".into(),
                }]
            })
        );
    }

    #[tokio::test]
    async fn selection_deselects_every_other_frame() {
        let (mut controller, _front, mut back) = harness();
        select(&mut controller, "photo", 10).await;

        assert!(controller.store().editing_info().is_selected());
        assert_eq!(back.recv().await, Some(HostMessage::ResetSelected));
    }

    #[tokio::test]
    async fn empty_selection_id_means_deselect() {
        let (mut controller, _front, _back) = harness();
        select(&mut controller, "photo", 10).await;
        controller
            .handle_frame_message(
                PageId::new("front"),
                FrameMessage::SetEditing {
                    id: "".into(),
                    current_styles: StyleSnapshot::new(),
                    edit_type: None,
                    edit_mode: None,
                    can_resize: false,
                    is_masked_image: false,
                },
            )
            .await
            .unwrap();
        assert!(!controller.store().editing_info().is_selected());
    }

    #[tokio::test]
    async fn gesture_result_is_stored_and_pushed_back_as_full_stylesheet() {
        let (mut controller, mut front, _back) = harness();
        controller
            .handle_frame_message(
                PageId::new("front"),
                FrameMessage::UpdateCss {
                    id: "photo".into(),
                    new_data: BTreeMap::from([(
                        "transform".to_string(),
                        "translate(20px, 0px)".to_string(),
                    )]),
                },
            )
            .await
            .unwrap();

        assert!(controller
            .store()
            .find_edit(&EditId::css(&"photo".into(), &"front".into()))
            .is_some());
        assert_eq!(
            front.recv().await,
            Some(HostMessage::CustomStyles {
                full_css_string: "#photo{transform:translate(20px, 0px)}".into()
            })
        );
    }

    #[tokio::test]
    async fn delete_key_outside_text_edit_deletes_the_selection() {
        let (mut controller, mut front, _back) = harness();
        select(&mut controller, "photo", 10).await;
        controller
            .handle_frame_message(
                PageId::new("front"),
                FrameMessage::Keydown {
                    key: "Delete".into(),
                    modifiers: Modifiers::default(),
                    text_edit: false,
                    is_masked_image: true,
                    img_src: None,
                },
            )
            .await
            .unwrap();

        assert!(!controller.store().editing_info().is_selected());
        assert_eq!(
            front.recv().await,
            Some(HostMessage::CustomStyles {
                full_css_string: String::new()
            })
        );
        assert_eq!(
            front.recv().await,
            Some(HostMessage::DeleteElement { id: "photo".into() })
        );
    }

    #[tokio::test]
    async fn delete_key_inside_text_edit_is_left_to_the_frame() {
        let (mut controller, _front, _back) = harness();
        select(&mut controller, "headline", 10).await;
        controller
            .handle_frame_message(
                PageId::new("front"),
                FrameMessage::Keydown {
                    key: "Backspace".into(),
                    modifiers: Modifiers::default(),
                    text_edit: true,
                    is_masked_image: false,
                    img_src: None,
                },
            )
            .await
            .unwrap();
        assert!(controller.store().editing_info().is_selected());
    }

    #[tokio::test]
    async fn reset_drops_both_mask_halves_and_orders_the_restore() {
        let (mut controller, mut front, _back) = harness();
        controller.store_mut().apply_css(
            &"photo".into(),
            &"front".into(),
            BTreeMap::from([("transform".to_string(), "translate(9px, 9px)".to_string())]),
        );
        controller.store_mut().apply_css(
            &"photoMask".into(),
            &"front".into(),
            BTreeMap::from([("transform".to_string(), "translate(2px, 2px)".to_string())]),
        );
        select(&mut controller, "photo", 10).await;

        controller.reset_selected_element().await.unwrap();
        assert!(controller.store().stencil_edits().is_empty());
        assert_eq!(
            front.recv().await,
            Some(HostMessage::CustomStyles {
                full_css_string: String::new()
            })
        );
        assert_eq!(
            front.recv().await,
            Some(HostMessage::RemoveTransform { id: "photo".into() })
        );
    }

    #[tokio::test]
    async fn host_operations_without_a_selection_fail() {
        let (mut controller, _front, _back) = harness();
        assert!(controller.reset_selected_element().await.is_err());
        assert!(controller.delete_selected_element().await.is_err());
        assert!(controller.toggle_crop_mode().await.is_err());
    }

    #[tokio::test]
    async fn crop_toggle_flips_store_state_and_tells_the_frame() {
        let (mut controller, mut front, _back) = harness();
        select(&mut controller, "photo", 10).await;

        controller.toggle_crop_mode().await.unwrap();
        assert!(!controller.store().editing_info().is_cropping);
        assert_eq!(
            front.recv().await,
            Some(HostMessage::ToggleCropMode { is_cropping: false })
        );
    }

    #[tokio::test]
    async fn layer_command_uses_the_mirrored_z_index() {
        let (mut controller, mut front, _back) = harness();
        select(&mut controller, "photo", 10).await;

        controller
            .change_layer(LayerCommand::BringToFront)
            .await
            .unwrap();
        assert_eq!(
            controller.store().styles().get("zIndex"),
            Some(&json!(11))
        );
        assert_eq!(
            front.recv().await,
            Some(HostMessage::CustomStyles {
                full_css_string: "#photo{z-index:11}".into()
            })
        );
    }

    #[tokio::test]
    async fn resize_persists_the_dimension_and_orders_the_frame() {
        let (mut controller, mut front, _back) = harness();
        select(&mut controller, "photo", 10).await;

        controller
            .resize_selected(Dimension::Width, "240px".into())
            .await
            .unwrap();
        assert_eq!(
            front.recv().await,
            Some(HostMessage::CustomStyles {
                full_css_string: "#photo{width:240px}".into()
            })
        );
        assert_eq!(
            front.recv().await,
            Some(HostMessage::ResizeElement {
                id: "photo".into(),
                dim: Dimension::Width,
                value: "240px".into()
            })
        );
    }

    #[tokio::test]
    async fn safe_zone_toggle_persists_overrides_and_broadcasts() {
        let (mut controller, mut front, _back) = harness();
        controller.set_safe_zone_hidden(true).await.unwrap();

        let css = controller.store().full_css_for_page(&PageId::new("front"));
        assert!(css.contains("#safe-zone{display:none}"));
        assert!(css.contains("#fold-line{display:none}"));

        // the stylesheet push lands before the live toggle
        assert!(matches!(
            front.recv().await,
            Some(HostMessage::CustomStyles { .. })
        ));
        assert_eq!(
            front.recv().await,
            Some(HostMessage::ShowSafeZone {
                show_safe_zone: true
            })
        );
    }

    #[tokio::test]
    async fn zoom_is_clamped_and_broadcast() {
        let (mut controller, mut front, mut back) = harness();
        controller.set_zoom(9.0).await;
        assert_eq!(controller.store().zoom_value(), 1.5);
        let expected = HostMessage::UpdateZoom { zoom_value: 1.5 };
        assert_eq!(front.recv().await, Some(expected.clone()));
        assert_eq!(back.recv().await, Some(expected));
    }

    #[tokio::test]
    async fn field_updates_land_in_store_and_page_merge_variables() {
        let (mut controller, _front, _back) = harness();
        controller.set_pages(vec![Page::default(), Page::default()]);
        controller
            .handle_frame_message(
                PageId::new("front"),
                FrameMessage::UpdateField {
                    name: "headline".into(),
                    value: "New".into(),
                    page: "front".into(),
                    reset_images: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(controller.store().field_value("headline"), Some("New"));
        let mv = &controller.pages()[0].merge_variables[0];
        assert_eq!(mv.name, "headline");
        assert_eq!(mv.value, "New");
    }

    #[tokio::test]
    async fn page_change_recomputes_extrema_from_that_pages_edits() {
        let (mut controller, _front, _back) = harness();
        controller.store_mut().apply_css(
            &"box".into(),
            &"back".into(),
            BTreeMap::from([("z-index".to_string(), "14".to_string())]),
        );

        controller.observe_page_intersection(0, 0.2);
        controller.observe_page_intersection(1, 0.9);
        assert_eq!(controller.store().active_page(), 1);
        assert_eq!(controller.store().extreme_z_index().max_z_index, 14);
    }
}
