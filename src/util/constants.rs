// TailPane - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "TailPane";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "TailPane";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Tailing
// =============================================================================

/// How often each tailing view polls its source for appended content (ms).
pub const TAIL_POLL_INTERVAL_MS: u64 = 1_000;

/// How often the cancel flag is checked within each poll sleep interval (ms).
/// A scheduled task's thread wakes every this many ms to check for cancellation.
pub const CANCEL_CHECK_INTERVAL_MS: u64 = 100;

/// Minimum user-configurable tail poll interval (ms).
pub const MIN_TAIL_POLL_INTERVAL_MS: u64 = 100;

/// Maximum user-configurable tail poll interval (ms).
pub const MAX_TAIL_POLL_INTERVAL_MS: u64 = 10_000; // 10 s

/// Maximum bytes read from a single source in one poll tick.
/// Prevents a large burst of new content from stalling the tick.
pub const MAX_READ_BYTES_PER_TICK: usize = 512 * 1_024; // 512 KiB

/// Maximum accumulated size of the partial (in-progress) line buffer for a
/// single tailed source.
///
/// Guards against unbounded growth when a source produces no newlines —
/// binary content, an extremely long single line, or a file opened by
/// mistake.  Set to 4x `MAX_READ_BYTES_PER_TICK` so legitimate lines up to
/// ~2 MiB are tolerated before the fragment is discarded with a warning.
pub const MAX_PARTIAL_LINE_BYTES: usize = MAX_READ_BYTES_PER_TICK * 4; // 2 MiB

// =============================================================================
// Scrolling
// =============================================================================

/// Movement multiplier when the scroll gesture is expressed in lines.
pub const SCROLL_LINES_FACTOR: f64 = 10.0;

/// Movement multiplier when the scroll gesture is expressed in pages.
pub const SCROLL_PAGES_FACTOR: f64 = 50.0;

// =============================================================================
// Layout
// =============================================================================

/// Divider fraction assigned to a divider created by inserting a new view.
pub const DEFAULT_DIVIDER_POSITION: f64 = 0.5;

// =============================================================================
// Per-iteration presentation budgets
// =============================================================================

/// Maximum number of view events drained from the channel per presentation
/// loop iteration.  Any remaining events stay queued for the next iteration,
/// preventing a burst of appended content from stalling the loop.
pub const MAX_EVENTS_PER_DRAIN: usize = 200;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Size badge
// =============================================================================

/// Below this byte length the size badge renders plain bytes; at or above it
/// the badge renders megabytes to two decimals.
pub const SIZE_BADGE_BYTES_THRESHOLD: u64 = 10_000;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Session persistence file name (stored in the platform data directory).
pub const SESSION_FILE_NAME: &str = "session.json";
