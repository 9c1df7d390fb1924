//! Which paths and which notify events count as a source change.

use std::path::{Component, Path};

use notify::EventKind;
use notify::event::ModifyKind;

/// Extension of tracked source files (fixed).
pub const TRACKED_EXTENSION: &str = "go";

/// Is `path` a tracked source file under `root`?
///
/// Tracked: extension is [`TRACKED_EXTENSION`] and no path component below
/// `root` starts with `.` (hidden files and anything under hidden dirs).
pub fn is_tracked(path: &Path, root: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some(TRACKED_EXTENSION) {
        return false;
    }

    match path.strip_prefix(root) {
        Ok(relative) => !is_hidden(relative),
        // Outside the root: judge by file name only
        Err(_) => path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| !n.starts_with('.')),
    }
}

/// Any component starting with `.` (except `.` itself).
pub fn is_hidden(relative: &Path) -> bool {
    relative.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| n.starts_with('.')),
        _ => false,
    })
}

/// Create / write / remove / rename. Metadata-only changes (mtime, chmod)
/// and access events are noise.
pub fn is_change_kind(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Did this event detach the watch on the path (file removed or renamed
/// away)? Such paths are re-attached on the next rescan.
pub fn detaches_watch(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}
