//! Frame agent for the LiveProof editor.
//!
//! One agent runs inside each rendered document frame. It owns the
//! frame-local interaction state machine (selection, drag-vs-text
//! classification, masked-image crop duality, arrow-key nudging) and the
//! dispatch of every host message into the in-memory document model. The
//! agent holds no durable state: a reloaded frame rebuilds from its
//! template and resynchronizes through the handshake.

pub mod agent;
pub mod document;
pub mod gesture;
pub mod keyboard;
pub mod mask;
pub mod snapshot;

pub use agent::{FrameAgent, InteractionState};
pub use document::{Document, Node, NodeKind};
pub use gesture::{GestureDelta, GestureEvent, GesturePhase, Point, PointerEvent, PointerKind};
pub use keyboard::{ArrowKey, KeyEvent, Nudge};
pub use mask::MaskPairs;
