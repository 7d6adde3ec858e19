//! Selection state machine
//!
//! Every pointer and key event of a session goes through [`transition`], a
//! pure function from the current state and one event to the next state plus
//! what the surface should draw and what the session should do. The GTK layer
//! only delivers events and executes the results.

use crate::app::config::OverlayPolicy;
use crate::error::RenderError;

/// A position on the overlay surface
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// The live drag: where it started and where the pointer is now
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Selection {
    pub anchor: Point,
    pub cursor: Point,
}

impl Selection {
    /// Create a zero-area selection at the given point
    pub fn new(anchor: Point) -> Self {
        Self {
            anchor,
            cursor: anchor,
        }
    }

    /// Get the selection as a normalized rectangle
    pub fn rectangle(&self) -> Result<CropRect, RenderError> {
        CropRect::from_corners(self.anchor, self.cursor)
    }
}

/// Axis-aligned rectangle with `left <= right` and `top <= bottom`.
///
/// The right and bottom edges are exclusive, so a rectangle from `(10, 10)`
/// to `(60, 40)` covers 50x30 pixels.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CropRect {
    pub fn from_corners(a: Point, b: Point) -> Result<Self, RenderError> {
        for p in [a, b] {
            if !p.is_finite() {
                return Err(RenderError::NonFinite(p.x, p.y));
            }
        }
        Ok(Self {
            left: a.x.min(b.x).floor() as i32,
            top: a.y.min(b.y).floor() as i32,
            right: a.x.max(b.x).floor() as i32,
            bottom: a.y.max(b.y).floor() as i32,
        })
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Convert surface units to image pixels, one factor per axis.
    ///
    /// An unusable factor leaves that axis unchanged.
    pub fn scaled(&self, scale_x: f64, scale_y: f64) -> Self {
        let usable = |scale: f64| scale.is_finite() && scale > 0.0;
        let s = |v: i32, scale: f64| {
            if usable(scale) {
                (f64::from(v) * scale).round() as i32
            } else {
                v
            }
        };
        Self {
            left: s(self.left, scale_x),
            top: s(self.top, scale_y),
            right: s(self.right, scale_x),
            bottom: s(self.bottom, scale_y),
        }
    }

    /// Restrict the rectangle to pixels inside a `width` x `height` image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let max_x = i32::try_from(width).unwrap_or(i32::MAX);
        let max_y = i32::try_from(height).unwrap_or(i32::MAX);
        Self {
            left: self.left.clamp(0, max_x),
            top: self.top.clamp(0, max_y),
            right: self.right.clamp(0, max_x),
            bottom: self.bottom.clamp(0, max_y),
        }
    }
}

/// The overlay primitives currently on screen.
///
/// The session holds exactly one of these and swaps it whole on every update,
/// so the surface never shows a stale bright region next to a new one.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayFrame {
    pub bright_region: Option<CropRect>,
    pub border: Option<CropRect>,
}

impl OverlayFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_rect(rect: CropRect, policy: &OverlayPolicy) -> Self {
        let visible = f64::from(rect.width()) > policy.visibility_threshold
            && f64::from(rect.height()) > policy.visibility_threshold;
        if visible {
            Self {
                bright_region: Some(rect),
                border: Some(rect),
            }
        } else {
            Self::empty()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionState {
    /// Waiting for the first pointer-down
    Idle,
    Dragging(Selection),
    /// Selection committed; the crop runs once the surface is hidden
    Finalizing(CropRect),
    Cancelled,
    Completed,
}

impl SelectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SelectionState::Cancelled | SelectionState::Completed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    Cancel,
    /// The commit settle delay elapsed
    FinalizeDue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisualEffect {
    /// Leave whatever is on screen
    Keep,
    /// Replace the overlay with this frame
    Show(OverlayFrame),
    HideSurface,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SideEffect {
    None,
    /// Wait for the commit settle delay, then deliver `FinalizeDue`
    ScheduleFinalize,
    Finalize(CropRect),
    Teardown,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub state: SelectionState,
    pub visual: VisualEffect,
    pub side: SideEffect,
}

impl Transition {
    fn stay(state: SelectionState) -> Self {
        Self {
            state,
            visual: VisualEffect::Keep,
            side: SideEffect::None,
        }
    }
}

pub fn transition(
    state: &SelectionState,
    event: SelectionEvent,
    policy: &OverlayPolicy,
) -> Transition {
    use SelectionEvent as E;
    use SelectionState as S;

    match (*state, event) {
        (S::Cancelled, _) | (S::Completed, _) => Transition::stay(*state),

        (_, E::Cancel) => Transition {
            state: S::Cancelled,
            visual: VisualEffect::HideSurface,
            side: SideEffect::Teardown,
        },

        (S::Idle, E::PointerDown(point)) => {
            if !point.is_finite() {
                return Transition::stay(*state);
            }
            Transition {
                state: S::Dragging(Selection::new(point)),
                visual: VisualEffect::Show(OverlayFrame::empty()),
                side: SideEffect::None,
            }
        }

        (S::Dragging(selection), E::PointerMove(point)) => {
            let moved = Selection {
                cursor: point,
                ..selection
            };
            match moved.rectangle() {
                Ok(rect) => Transition {
                    state: S::Dragging(moved),
                    visual: VisualEffect::Show(OverlayFrame::for_rect(rect, policy)),
                    side: SideEffect::None,
                },
                Err(_) => Transition::stay(*state),
            }
        }

        (S::Dragging(selection), E::PointerUp(point)) => {
            let released = if point.is_finite() {
                Selection {
                    cursor: point,
                    ..selection
                }
            } else {
                selection
            };
            match released.rectangle() {
                Ok(rect) if !rect.is_empty() => Transition {
                    state: S::Finalizing(rect),
                    visual: VisualEffect::HideSurface,
                    side: SideEffect::ScheduleFinalize,
                },
                _ => Transition {
                    state: S::Cancelled,
                    visual: VisualEffect::HideSurface,
                    side: SideEffect::Teardown,
                },
            }
        }

        (S::Finalizing(rect), E::FinalizeDue) => Transition {
            state: S::Completed,
            visual: VisualEffect::Keep,
            side: SideEffect::Finalize(rect),
        },

        _ => Transition::stay(*state),
    }
}
