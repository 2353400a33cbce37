//! Edit migration under page renumbering.
//!
//! Stencil-edit ids embed the page index, so inserting, deleting, or moving
//! a page has to rewrite `id` and `page` in lockstep for every edit the
//! renumbering touches. Non-numeric pages (`front`/`back`) never renumber.
//!
//! The store only migrates edits; the page list itself lives with the host,
//! which calls these primitives as part of its page operations.

use tracing::debug;

use liveproof_core::edit::{EditKind, PendingSave, StencilEdit};
use liveproof_core::ids::PageId;

use crate::state::EditStore;

impl EditStore {
    /// Migrate edits for a page inserted at `position`.
    ///
    /// Every edit on a numeric page `>= position` moves up one slot. With
    /// `duplicate`, the edits of the page at `position - 1` are cloned onto
    /// the new page (clip data excluded: its id carries no page suffix, so
    /// a clone would collide). `page_count` is the count *after* insertion;
    /// every page from the insertion point on is marked for save + reload.
    pub fn insert_page_edits(&mut self, position: usize, duplicate: bool, page_count: usize) {
        renumber(self.stencil_edits_mut(), position, 1);

        if duplicate && position > 0 {
            let source = PageId::from_index(position - 1);
            let target = PageId::from_index(position);
            let clones: Vec<StencilEdit> = self
                .stencil_edits()
                .iter()
                .filter(|edit| edit.page == source && edit.kind == EditKind::CssOverride)
                .map(|edit| StencilEdit {
                    id: edit.id.with_page(&target),
                    page: target.clone(),
                    kind: edit.kind,
                    css_partial: edit.css_partial.clone(),
                })
                .collect();
            debug!(position, clones = clones.len(), "Duplicated page edits");
            self.add_stencil_edits(clones);
        }

        self.set_pending_save(PendingSave::Reload {
            pages: (position..page_count).collect(),
        });
    }

    /// Migrate edits for the page deleted at `position`.
    ///
    /// Edits on that page are dropped; edits on later numeric pages move
    /// down one slot. `page_count` is the count *after* deletion; when it
    /// is zero there is no frame left to refresh, so only persistence is
    /// marked pending.
    pub fn delete_page_edits(&mut self, position: usize, page_count: usize) {
        let deleted = PageId::from_index(position);
        self.stencil_edits_mut().retain(|edit| edit.page != deleted);
        renumber(self.stencil_edits_mut(), position + 1, -1);
        self.remove_page_intersection(position);

        self.set_pending_save(if page_count == 0 {
            PendingSave::PersistOnly
        } else {
            PendingSave::Reload {
                pages: (position..page_count).collect(),
            }
        });
    }

    /// Swap the edits of two pages (page move, one slot up or down).
    /// Only those two pages are touched or marked pending.
    pub fn swap_page_edits(&mut self, a: usize, b: usize) {
        let page_a = PageId::from_index(a);
        let page_b = PageId::from_index(b);
        for edit in self.stencil_edits_mut() {
            let target = if edit.page == page_a {
                &page_b
            } else if edit.page == page_b {
                &page_a
            } else {
                continue;
            };
            edit.id = edit.id.with_page(target);
            edit.page = target.clone();
        }
        self.set_pending_save(PendingSave::Reload { pages: vec![a, b] });
    }
}

fn renumber(edits: &mut [StencilEdit], from: usize, delta: isize) {
    for edit in edits {
        let Some(index) = edit.page.index() else {
            continue;
        };
        if index < from {
            continue;
        }
        let moved = PageId::from_index((index as isize + delta) as usize);
        edit.id = edit.id.with_page(&moved);
        edit.page = moved;
    }
}
