//! Page structure operations.
//!
//! The host owns the ordered page list; the store migrates the stencil
//! edits whose ids embed page positions. Each operation mutates both in
//! lockstep and leaves a `PendingSave` marker describing which frames the
//! persistence collaborator must refresh.

use tracing::info;

use liveproof_core::edit::Page;
use liveproof_core::error::{Result, StoreError};

use crate::controller::HostController;

impl HostController {
    /// Insert a page at `position` (the new page's slot). With `duplicate`
    /// the page before it is cloned, content and CSS overrides included —
    /// except clip data, whose ids carry no page suffix and would collide.
    pub fn insert_page(&mut self, position: usize, duplicate: bool) -> Result<()> {
        if position > self.pages().len() {
            return Err(StoreError::PageOutOfBounds(position).into());
        }
        let page = if duplicate && position > 0 {
            self.pages()[position - 1].clone()
        } else {
            Page::default()
        };
        info!(position, duplicate, "Inserting page");
        self.pages_mut().insert(position, page);
        let count = self.pages().len();
        self.store_mut().insert_page_edits(position, duplicate, count);
        Ok(())
    }

    /// Delete the page at `position`, dropping its edits and renumbering
    /// the rest. Deleting the only page leaves nothing to reload, so the
    /// pending marker degrades to persist-only.
    pub fn delete_page(&mut self, position: usize) -> Result<()> {
        if position >= self.pages().len() {
            return Err(StoreError::PageOutOfBounds(position).into());
        }
        info!(position, "Deleting page");
        self.pages_mut().remove(position);
        let count = self.pages().len();
        self.store_mut().delete_page_edits(position, count);
        Ok(())
    }

    /// Swap two pages (page move, one slot at a time in the chrome).
    pub fn move_page(&mut self, from: usize, to: usize) -> Result<()> {
        let count = self.pages().len();
        if from >= count {
            return Err(StoreError::PageOutOfBounds(from).into());
        }
        if to >= count {
            return Err(StoreError::PageOutOfBounds(to).into());
        }
        if from == to {
            return Ok(());
        }
        info!(from, to, "Moving page");
        self.pages_mut().swap(from, to);
        self.store_mut().swap_page_edits(from, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveproof_config::EditorConfig;
    use liveproof_core::edit::{MergeVariable, PendingSave};
    use liveproof_core::ids::{EditId, PageId};
    use liveproof_store::EditorKind;
    use std::collections::BTreeMap;

    fn controller_with_pages(count: usize) -> HostController {
        let mut controller =
            HostController::new(EditorKind::Document, EditorConfig::default());
        let pages = (0..count)
            .map(|i| Page {
                merge_variables: vec![MergeVariable {
                    name: "headline".into(),
                    value: format!("Page {i}"),
                }],
                metadata: serde_json::Map::new(),
            })
            .collect();
        controller.set_pages(pages);
        controller
    }

    fn override_on(controller: &mut HostController, page: usize) {
        controller.store_mut().apply_css(
            &"box".into(),
            &PageId::from_index(page),
            BTreeMap::from([("opacity".to_string(), format!("0.{page}"))]),
        );
    }

    #[test]
    fn insert_grows_the_list_and_migrates_edits() {
        let mut controller = controller_with_pages(3);
        override_on(&mut controller, 2);

        controller.insert_page(1, false).unwrap();
        assert_eq!(controller.pages().len(), 4);
        assert!(controller.pages()[1].merge_variables.is_empty());
        // the old page 2's edit moved to page 3
        assert!(controller
            .store()
            .find_edit(&EditId::css(&"box".into(), &"3".into()))
            .is_some());
    }

    #[test]
    fn duplicate_clones_content_and_edits() {
        let mut controller = controller_with_pages(2);
        override_on(&mut controller, 1);

        controller.insert_page(2, true).unwrap();
        assert_eq!(controller.pages()[2], controller.pages()[1]);
        assert!(controller
            .store()
            .find_edit(&EditId::css(&"box".into(), &"2".into()))
            .is_some());
        assert_eq!(
            controller.store().pending_save(),
            &PendingSave::Reload { pages: vec![2] }
        );
    }

    #[test]
    fn delete_renumbers_and_marks_reload() {
        let mut controller = controller_with_pages(3);
        override_on(&mut controller, 2);

        controller.delete_page(0).unwrap();
        assert_eq!(controller.pages().len(), 2);
        assert_eq!(controller.pages()[1].merge_variables[0].value, "Page 2");
        assert!(controller
            .store()
            .find_edit(&EditId::css(&"box".into(), &"1".into()))
            .is_some());
        assert_eq!(
            controller.store().pending_save(),
            &PendingSave::Reload { pages: vec![0, 1] }
        );
    }

    #[test]
    fn deleting_the_only_page_marks_persist_only() {
        let mut controller = controller_with_pages(1);
        controller.delete_page(0).unwrap();
        assert!(controller.pages().is_empty());
        assert_eq!(controller.store().pending_save(), &PendingSave::PersistOnly);
    }

    #[test]
    fn move_swaps_pages_and_edits() {
        let mut controller = controller_with_pages(3);
        override_on(&mut controller, 1);

        controller.move_page(1, 2).unwrap();
        assert_eq!(controller.pages()[2].merge_variables[0].value, "Page 1");
        assert!(controller
            .store()
            .find_edit(&EditId::css(&"box".into(), &"2".into()))
            .is_some());
    }

    #[test]
    fn out_of_bounds_positions_are_rejected() {
        let mut controller = controller_with_pages(2);
        assert!(controller.insert_page(3, false).is_err());
        assert!(controller.delete_page(2).is_err());
        assert!(controller.move_page(0, 5).is_err());
    }
}
