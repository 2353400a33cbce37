//! Arrow-key nudging.
//!
//! Arrow keys move the selected element by a unit step, scaled ×5 with
//! shift and ×10 with alt. Ctrl (or meta) switches from a relative delta
//! to an absolute snap: the element lands flush against the viewport edge
//! in the arrow's direction, pulled in by its own width/height so it stays
//! fully on screen.

use liveproof_config::NudgeConfig;
use liveproof_core::message::Modifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Left,
    Right,
    Up,
    Down,
}

impl ArrowKey {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Self::Left),
            "ArrowRight" => Some(Self::Right),
            "ArrowUp" => Some(Self::Up),
            "ArrowDown" => Some(Self::Down),
            _ => None,
        }
    }
}

/// A keyboard event delivered to the agent by the embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
    pub at_ms: u64,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers, at_ms: u64) -> Self {
        Self {
            key: key.into(),
            modifiers,
            at_ms,
        }
    }
}

/// The movement an arrow key produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Nudge {
    /// Shift the current translate by (dx, dy) pixels
    Relative { dx: f64, dy: f64 },
    /// Snap the horizontal position to an absolute x
    AbsoluteX(f64),
    /// Snap the vertical position to an absolute y
    AbsoluteY(f64),
}

/// Compute the nudge for one arrow press.
///
/// `viewport` is the frame's (width, height); `element` the target's
/// rendered (width, height), used to keep absolute snaps fully visible.
pub fn nudge_for(
    arrow: ArrowKey,
    modifiers: Modifiers,
    config: &NudgeConfig,
    viewport: (f64, f64),
    element: (f64, f64),
) -> Nudge {
    if modifiers.ctrl || modifiers.meta {
        let (view_w, view_h) = viewport;
        let (elem_w, elem_h) = element;
        return match arrow {
            ArrowKey::Left => Nudge::AbsoluteX(0.0),
            ArrowKey::Right => Nudge::AbsoluteX(view_w - elem_w),
            ArrowKey::Up => Nudge::AbsoluteY(0.0),
            ArrowKey::Down => Nudge::AbsoluteY(view_h - elem_h),
        };
    }

    let scale = if modifiers.alt {
        config.alt_scale
    } else if modifiers.shift {
        config.shift_scale
    } else {
        1.0
    };
    let step = config.step_px * scale;

    match arrow {
        ArrowKey::Left => Nudge::Relative { dx: -step, dy: 0.0 },
        ArrowKey::Right => Nudge::Relative { dx: step, dy: 0.0 },
        ArrowKey::Up => Nudge::Relative { dx: 0.0, dy: -step },
        ArrowKey::Down => Nudge::Relative { dx: 0.0, dy: step },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mods(shift: bool, alt: bool, ctrl: bool) -> Modifiers {
        Modifiers {
            ctrl,
            meta: false,
            shift,
            alt,
        }
    }

    const VIEWPORT: (f64, f64) = (600.0, 400.0);
    const ELEMENT: (f64, f64) = (80.0, 50.0);

    #[test]
    fn plain_arrows_step_one_pixel() {
        let config = NudgeConfig::default();
        assert_eq!(
            nudge_for(ArrowKey::Right, mods(false, false, false), &config, VIEWPORT, ELEMENT),
            Nudge::Relative { dx: 1.0, dy: 0.0 }
        );
        assert_eq!(
            nudge_for(ArrowKey::Down, mods(false, false, false), &config, VIEWPORT, ELEMENT),
            Nudge::Relative { dx: 0.0, dy: 1.0 }
        );
    }

    #[test]
    fn shift_and_alt_scale_the_step() {
        let config = NudgeConfig::default();
        assert_eq!(
            nudge_for(ArrowKey::Left, mods(true, false, false), &config, VIEWPORT, ELEMENT),
            Nudge::Relative { dx: -5.0, dy: 0.0 }
        );
        assert_eq!(
            nudge_for(ArrowKey::Up, mods(false, true, false), &config, VIEWPORT, ELEMENT),
            Nudge::Relative { dx: 0.0, dy: -10.0 }
        );
        // alt wins when both are held
        assert_eq!(
            nudge_for(ArrowKey::Up, mods(true, true, false), &config, VIEWPORT, ELEMENT),
            Nudge::Relative { dx: 0.0, dy: -10.0 }
        );
    }

    #[test]
    fn ctrl_snaps_to_edge_adjusted_by_element_size() {
        let config = NudgeConfig::default();
        assert_eq!(
            nudge_for(ArrowKey::Left, mods(false, false, true), &config, VIEWPORT, ELEMENT),
            Nudge::AbsoluteX(0.0)
        );
        assert_eq!(
            nudge_for(ArrowKey::Right, mods(false, false, true), &config, VIEWPORT, ELEMENT),
            Nudge::AbsoluteX(520.0)
        );
        assert_eq!(
            nudge_for(ArrowKey::Down, mods(false, false, true), &config, VIEWPORT, ELEMENT),
            Nudge::AbsoluteY(350.0)
        );
    }

    #[test]
    fn meta_behaves_like_ctrl() {
        let config = NudgeConfig::default();
        let meta = Modifiers {
            meta: true,
            ..Modifiers::default()
        };
        assert_eq!(
            nudge_for(ArrowKey::Up, meta, &config, VIEWPORT, ELEMENT),
            Nudge::AbsoluteY(0.0)
        );
    }

    #[test]
    fn arrow_key_names() {
        assert_eq!(ArrowKey::from_key("ArrowLeft"), Some(ArrowKey::Left));
        assert_eq!(ArrowKey::from_key("Escape"), None);
    }
}
