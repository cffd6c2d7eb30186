// TailPane - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants::SIZE_BADGE_BYTES_THRESHOLD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// View identity
// =============================================================================

/// Opaque identifier for a view within the pane layout.
///
/// Assigned monotonically by the container when a source is opened and never
/// reused within a process.  Focus tracking and event routing use this id
/// rather than positional indices, which shift as views are added, removed,
/// or reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

// =============================================================================
// Log source
// =============================================================================

/// Identifies a file-like input shown in one view.
///
/// Immutable after creation.  `len_at_open` is advisory — it feeds the
/// human-readable size badge in the view header and nothing else; the
/// reader tracks the live file size independently.
#[derive(Debug, Clone)]
pub struct LogSource {
    /// Full path to the source.
    pub path: PathBuf,

    /// Name shown in the view header (usually the file name).
    pub display_name: String,

    /// Byte length of the source at the moment it was opened.
    pub len_at_open: u64,

    /// When the source was opened into the layout.
    pub opened_at: DateTime<Utc>,
}

impl LogSource {
    /// Describe a source rooted at `path`, capturing its current length.
    ///
    /// A missing or unreadable file is not an error here — the badge simply
    /// reports 0 bytes and the reader surfaces I/O problems per tick.
    pub fn describe(path: PathBuf) -> Self {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let len_at_open = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Self {
            path,
            display_name,
            len_at_open,
            opened_at: Utc::now(),
        }
    }

    /// Human-readable size badge for the view header.
    pub fn size_badge(&self) -> String {
        format_size_badge(self.len_at_open)
    }
}

/// Render a byte length as the header size badge.
///
/// Below `SIZE_BADGE_BYTES_THRESHOLD` the count is shown in plain bytes;
/// at or above it, in megabytes to two decimals.
pub fn format_size_badge(len: u64) -> String {
    if len < SIZE_BADGE_BYTES_THRESHOLD {
        format!("({len} bytes)")
    } else {
        format!("({:.2} MB)", len as f64 / 1_000_000.0)
    }
}

// =============================================================================
// Tail state
// =============================================================================

/// Whether a view is currently following its source.
///
/// Exactly one value per view at any time; transitions happen only through
/// the view's tail controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailState {
    /// Not following; the view shows whatever the user scrolled to.
    Idle,
    /// Following: appended content is polled and delivered continuously.
    Tailing,
}

// =============================================================================
// Orientation
// =============================================================================

/// Split direction of the pane layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Views side by side, dividers vertical.
    #[default]
    Horizontal,
    /// Views stacked, dividers horizontal.
    Vertical,
}

impl Orientation {
    /// The other orientation.
    pub fn flipped(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

// =============================================================================
// View events (background -> presentation thread)
// =============================================================================

/// Messages sent from background poll threads to the presentation thread.
///
/// All view mutations happen on the presentation thread; poll ticks only
/// ever produce these messages.  Per view, events preserve tick order: each
/// view's ticks execute serially on one thread and mpsc delivery is FIFO
/// per sender.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// Newly appended complete lines read from the view's source.
    NewLines { view: ViewId, lines: Vec<String> },

    /// A single poll tick failed to read the source.  Non-fatal: the
    /// schedule keeps running and the next tick retries.
    ReadError { view: ViewId, message: String },
}

// =============================================================================
// Unit tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Lengths under the threshold render as plain bytes with no decimals.
    #[test]
    fn test_size_badge_below_threshold_renders_bytes() {
        assert_eq!(format_size_badge(0), "(0 bytes)");
        assert_eq!(format_size_badge(512), "(512 bytes)");
        assert_eq!(format_size_badge(9_999), "(9999 bytes)");
    }

    /// Lengths at or above the threshold render as MB to two decimals.
    #[test]
    fn test_size_badge_at_threshold_renders_megabytes() {
        assert_eq!(format_size_badge(10_000), "(0.01 MB)");
        assert_eq!(format_size_badge(2_500_000), "(2.50 MB)");
        assert_eq!(format_size_badge(1_234_567_890), "(1234.57 MB)");
    }

    /// describe() must fall back to the full path when there is no file name.
    #[test]
    fn test_describe_missing_file_is_not_an_error() {
        let source = LogSource::describe(PathBuf::from("/nonexistent/app.log"));
        assert_eq!(source.display_name, "app.log");
        assert_eq!(source.len_at_open, 0);
        assert_eq!(source.size_badge(), "(0 bytes)");
    }

    #[test]
    fn test_orientation_flip_round_trips() {
        assert_eq!(Orientation::Horizontal.flipped(), Orientation::Vertical);
        assert_eq!(
            Orientation::Horizontal.flipped().flipped(),
            Orientation::Horizontal
        );
    }
}
