//! The stencil edit store — the host's authoritative model of edit state.
//!
//! Frames own no durable state: every override, selection, and layering
//! fact lives here, and a frame is rebuilt from this store on reload. The
//! store is the single writer of `StencilEdit` and `ExtremeZIndex` state;
//! the host controller reads it and mutates it, never the frames.
//!
//! - **State** — the store itself: CSS patch accumulation, fields,
//!   selection mirror, pending-save bookkeeping
//! - **Layers** — z-ordering commands and extremum maintenance
//! - **Paging** — edit migration under page insert/duplicate/delete/move

pub mod layers;
pub mod paging;
pub mod state;

pub use layers::LayerCommand;
pub use state::{EditStore, EditorKind};
