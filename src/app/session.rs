// TailPane - app/session.rs
//
// Layout persistence: save and restore the open files, pane orientation,
// divider positions, and which views were tailing between application
// restarts.
//
// Design principles:
// - The session is saved atomically (write→temp, rename→final) so a crash
//   during save never corrupts the previous good session.
// - Load errors are silently discarded (corrupt or incompatible sessions
//   just start the app fresh rather than surfacing errors to the user).
// - The data directory is created on first save; no user action required.
// - View content is NOT persisted — files are re-opened at their current
//   end on restore, so a restored session shows live content only.

use crate::app::pane::PaneContainer;
use crate::core::model::Orientation;
use crate::util::constants::{DEFAULT_DIVIDER_POSITION, SESSION_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version stamp for forward-compatibility checks.
///
/// Increment this constant whenever `LayoutSession` gains or removes fields
/// in a breaking way. Version mismatches silently discard the session.
pub const SESSION_VERSION: u32 = 1;

// =============================================================================
// On-disk data structure
// =============================================================================

/// Complete persistent layout snapshot.
///
/// All fields are optional-friendly; deserialisation failures for individual
/// fields are handled by serde defaults so minor format additions are
/// tolerated without bumping the version.
#[derive(Debug, Serialize, Deserialize)]
pub struct LayoutSession {
    /// Schema version — must equal `SESSION_VERSION` to be accepted.
    pub version: u32,

    /// Split direction of the pane layout.
    #[serde(default)]
    pub orientation: Orientation,

    /// Divider fractions in visual order; count is one less than the number
    /// of open files (empty for 0 or 1 files).
    #[serde(default)]
    pub divider_positions: Vec<f64>,

    /// Files open in the layout, in visual order.
    #[serde(default)]
    pub open_files: Vec<PathBuf>,

    /// Subset of `open_files` that were being tailed, restored to Tailing.
    #[serde(default)]
    pub tailing_files: Vec<PathBuf>,
}

/// Snapshot the current layout for persistence.
pub fn capture(container: &PaneContainer) -> LayoutSession {
    LayoutSession {
        version: SESSION_VERSION,
        orientation: container.orientation(),
        divider_positions: container.divider_positions(),
        open_files: container.open_paths(),
        tailing_files: container.tailing_paths(),
    }
}

// =============================================================================
// I/O helpers
// =============================================================================

/// Resolve the session file path from the platform data directory.
pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE_NAME)
}

/// Save `session` to `path` atomically (write temp → rename).
///
/// Creates all parent directories as needed.  Returns a descriptive error
/// string suitable for a tracing warn! call; the caller decides whether to
/// surface it to the user (typically it is logged and ignored).
pub fn save(session: &LayoutSession, path: &Path) -> Result<(), String> {
    // Ensure the parent directory exists before writing.
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            format!(
                "cannot create session directory '{}': {e}",
                parent.display()
            )
        })?;
    }

    let json = serde_json::to_string_pretty(session)
        .map_err(|e| format!("failed to serialise session: {e}"))?;

    // Atomic write: write to a sibling temp file then rename.
    // A crash between write and rename loses the new session but never
    // corrupts the previous one (rename is atomic on all supported platforms).
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes())
        .map_err(|e| format!("failed to write session temp file '{}': {e}", tmp.display()))?;

    std::fs::rename(&tmp, path).map_err(|e| {
        // Clean up the temp file on failure; ignore any secondary error.
        let _ = std::fs::remove_file(&tmp);
        format!("failed to finalise session file '{}': {e}", path.display())
    })?;

    tracing::debug!(path = %path.display(), "Session saved");
    Ok(())
}

/// Load and validate a `LayoutSession` from `path`.
///
/// Returns `None` on any error (file not found, JSON parse failure,
/// version mismatch).  The caller should treat `None` as "start fresh".
/// Divider fractions are sanitised into [0,1] so a hand-edited file cannot
/// smuggle invalid geometry into the layout.
pub fn load(path: &Path) -> Option<LayoutSession> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| {
            // Distinguish "file not found" (normal first run) from other errors.
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Cannot read session file");
            }
        })
        .ok()?;

    let mut session: LayoutSession = serde_json::from_str(&content)
        .map_err(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Session file is malformed — starting fresh"
            );
        })
        .ok()?;

    if session.version != SESSION_VERSION {
        tracing::warn!(
            found = session.version,
            expected = SESSION_VERSION,
            "Session file version mismatch — starting fresh"
        );
        return None;
    }

    for fraction in &mut session.divider_positions {
        *fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            DEFAULT_DIVIDER_POSITION
        };
    }

    tracing::info!(path = %path.display(), "Session file loaded");
    Some(session)
}

// =============================================================================
// Unit tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_session() -> LayoutSession {
        LayoutSession {
            version: SESSION_VERSION,
            orientation: Orientation::Vertical,
            divider_positions: vec![0.3, 0.7],
            open_files: vec![
                PathBuf::from("/var/log/app.log"),
                PathBuf::from("/var/log/db.log"),
                PathBuf::from("/var/log/web.log"),
            ],
            tailing_files: vec![PathBuf::from("/var/log/app.log")],
        }
    }

    /// Save and load must round-trip all fields accurately.
    #[test]
    fn test_session_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let original = sample_session();

        save(&original, &path).expect("save should succeed");
        let loaded = load(&path).expect("load should return Some after valid save");

        assert_eq!(loaded.version, SESSION_VERSION);
        assert_eq!(loaded.orientation, Orientation::Vertical);
        assert_eq!(loaded.divider_positions, vec![0.3, 0.7]);
        assert_eq!(loaded.open_files, original.open_files);
        assert_eq!(loaded.tailing_files, original.tailing_files);
    }

    /// Load must return None when the file does not exist (first run).
    #[test]
    fn test_session_load_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nonexistent.json");
        assert!(load(&path).is_none());
    }

    /// Load must return None when the JSON is malformed rather than panicking.
    #[test]
    fn test_session_load_malformed_json_returns_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not valid json {{{{").unwrap();
        assert!(load(&path).is_none());
    }

    /// Load must return None when the version field is wrong.
    #[test]
    fn test_session_load_wrong_version_returns_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let mut session = sample_session();
        session.version = 99;
        save(&session, &path).unwrap();
        assert!(load(&path).is_none());
    }

    /// Out-of-range divider fractions in a hand-edited file are sanitised.
    #[test]
    fn test_session_load_sanitises_divider_fractions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let mut session = sample_session();
        session.divider_positions = vec![-0.2, 1.8];
        save(&session, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.divider_positions, vec![0.0, 1.0]);
    }

    /// A crash during save (temp file exists) must not corrupt the original.
    #[test]
    fn test_session_save_atomic_does_not_corrupt_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        // Write an initial good session.
        save(&sample_session(), &path).unwrap();

        // Simulate a leftover temp file (e.g. from a previous crash).
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, b"garbage").unwrap();

        // Save a new session — should overwrite the temp file and rename correctly.
        let mut updated = sample_session();
        updated.divider_positions = vec![0.5, 0.5];
        save(&updated, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.divider_positions, vec![0.5, 0.5]);
    }
}
