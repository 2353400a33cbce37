//! Pointer events and gesture classification.
//!
//! The drag/resize/rotate capability itself is an external collaborator
//! that emits deltas; this module models its events plus the click-vs-drag
//! heuristic. Every event carries a millisecond timestamp so classification
//! is deterministic.

use liveproof_config::GestureConfig;
use liveproof_core::ids::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Click,
    DoubleClick,
}

/// A pointer event delivered to the agent by the embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub target: ElementId,
    pub kind: PointerKind,
    /// Top-left of the target's bounding box at event time
    pub position: Point,
    pub at_ms: u64,
}

impl PointerEvent {
    pub fn new(target: impl Into<ElementId>, kind: PointerKind, position: Point, at_ms: u64) -> Self {
        Self {
            target: target.into(),
            kind,
            position,
            at_ms,
        }
    }
}

/// Whether press-to-release movement or duration means the user intended a
/// drag. A drag never enters text-edit mode.
pub fn was_dragged(
    press: Point,
    release: Point,
    press_ms: u64,
    release_ms: u64,
    config: &GestureConfig,
) -> bool {
    (press.x - release.x).abs() > config.drag_threshold_px
        || (press.y - release.y).abs() > config.drag_threshold_px
        || release_ms.saturating_sub(press_ms) > config.text_click_max_ms
}

/// A delta emitted by the gesture capability while a handle is being used.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureDelta {
    Drag { transform: String },
    Rotate { transform: String },
    Resize {
        width: f64,
        height: f64,
        transform: String,
    },
}

/// Progress vs terminal event; only terminal events are reported to the
/// host for persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Move,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    pub target: ElementId,
    pub phase: GesturePhase,
    pub delta: GestureDelta,
}
