//! # LiveProof Core
//!
//! Domain types, protocol messages, and error definitions for the LiveProof
//! editor synchronization engine. This crate has **zero framework
//! dependencies** — it defines the data model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! The host application and the sandboxed document frames never share
//! memory: everything that crosses between them is a value defined here.
//! Keeping the whole vocabulary in one leaf crate means:
//! - The frame agent and the host controller agree on the wire format by
//!   construction
//! - Every other crate depends inward on core
//! - Protocol changes are reviewed in one place

pub mod css;
pub mod edit;
pub mod error;
pub mod ids;
pub mod message;

// Re-export key types at crate root for ergonomics
pub use css::CssPartial;
pub use edit::{
    EditKind, EditMode, EditType, EditingInfo, ExtremeZIndex, Field, MergeVariable, Page,
    PendingSave, StencilEdit, StyleSnapshot,
};
pub use error::{ChannelError, Error, FrameError, ProtocolError, Result, StoreError};
pub use ids::{EditId, ElementId, PageId};
pub use message::{Dimension, FrameMessage, HostMessage, Modifiers, NodeKindSpec, NodeTemplate};
