// TailPane - core/scroll.rs
//
// Scroll coordination: translates a raw scroll gesture into a tailing
// transition and a view-movement amount.
//
// Pure logic — the caller (the view wrapper) applies the resolved response
// to its tail controller and presentation surface.  Keeping the decision
// table here makes the gesture semantics testable without threads or files.

use crate::util::constants::{SCROLL_LINES_FACTOR, SCROLL_PAGES_FACTOR};

/// Unit in which a scroll gesture's delta is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollUnit {
    /// Raw delta, no scaling.
    None,
    /// Delta counts lines.
    Lines,
    /// Delta counts pages.
    Pages,
}

/// Resolved outcome of one scroll gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollResponse {
    /// The owning view must stop tailing before any movement is applied.
    pub stop_tailing: bool,

    /// Scaled movement to apply to the presentation surface, or `None`
    /// when the gesture is suppressed entirely.
    pub movement: Option<f64>,
}

/// Scale a raw delta by its unit.
pub fn scale(delta_y: f64, unit: ScrollUnit) -> f64 {
    match unit {
        ScrollUnit::None => delta_y,
        ScrollUnit::Lines => delta_y * SCROLL_LINES_FACTOR,
        ScrollUnit::Pages => delta_y * SCROLL_PAGES_FACTOR,
    }
}

/// Resolve a scroll gesture against the view's current tailing state.
///
/// Positive `delta_y` means scrolling up, towards older content: tailing
/// stops unconditionally and the movement is applied.  Scrolling down while
/// tailing is suppressed — the view is already pinned to the tail, so the
/// gesture is redundant.  Scrolling down while idle moves normally.
pub fn resolve(delta_y: f64, unit: ScrollUnit, tailing: bool) -> ScrollResponse {
    if delta_y > 0.0 {
        return ScrollResponse {
            stop_tailing: true,
            movement: Some(scale(delta_y, unit)),
        };
    }

    if tailing {
        // Already following the tail; a downward scroll changes nothing.
        return ScrollResponse {
            stop_tailing: false,
            movement: None,
        };
    }

    ScrollResponse {
        stop_tailing: false,
        movement: Some(scale(delta_y, unit)),
    }
}

// =============================================================================
// Unit tests
// =============================================================================
