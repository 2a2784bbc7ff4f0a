//! Change event types.

use std::path::{Path, PathBuf};

use notify::event::ModifyKind;

/// Kind of change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// File or directory was created.
    Created,
    /// File content or metadata was modified.
    Modified,
    /// File or directory was removed.
    Removed,
    /// File or directory was renamed or moved.
    Renamed,
    /// Content changed outside the watched directories (e.g., host hot-swap).
    External,
}

/// A change notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Absolute path of the changed entry. `None` for external signals.
    pub path: Option<PathBuf>,
    /// Kind of change.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Create an event for a filesystem entry.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: Some(path.into()),
            kind,
        }
    }

    /// Create an external "content changed" event.
    #[must_use]
    pub fn external() -> Self {
        Self {
            path: None,
            kind: ChangeKind::External,
        }
    }

    /// Path of the changed entry, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Convert a `notify::EventKind` to a [`ChangeKind`].
///
/// Returns `None` for event kinds that are not relevant (e.g., Access).
pub(crate) fn change_kind(kind: notify::EventKind) -> Option<ChangeKind> {
    match kind {
        notify::EventKind::Create(_) => Some(ChangeKind::Created),
        notify::EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Renamed),
        notify::EventKind::Modify(_) => Some(ChangeKind::Modified),
        notify::EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}
