//! Directory watching on top of `notify`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::bus::{EventBus, Subscriber, Subscription};
use crate::event::{ChangeEvent, change_kind};

/// Error returned when a watch cannot be established.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Watched root does not exist.
    #[error("Watch root not found: {}", .0.display())]
    RootNotFound(PathBuf),
    /// Underlying watcher failure.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Handle keeping a directory watch alive.
///
/// Uses RAII pattern - dropping the handle stops watching automatically.
pub struct WatchHandle {
    root: PathBuf,
    _watcher: RecommendedWatcher,
}

impl WatchHandle {
    /// Watched root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching immediately (consumes the handle).
    pub fn stop(self) {
        tracing::debug!(root = %self.root.display(), "Stopped watching");
    }
}

/// Fans out filesystem changes and external signals to subscribers.
///
/// Owns an [`EventBus`]; every watched root publishes into it. Events are
/// published synchronously on the `notify` worker thread that observed them.
pub struct ChangeNotifier {
    bus: Arc<EventBus>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    /// Create a notifier with its own event bus.
    #[must_use]
    pub fn new() -> Self {
        Self::with_bus(Arc::new(EventBus::new()))
    }

    /// Create a notifier publishing into an existing event bus.
    #[must_use]
    pub fn with_bus(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    /// The event bus this notifier publishes into.
    #[must_use]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Watch a directory recursively.
    ///
    /// Create, modify, remove and rename events for anything below `root`
    /// are published until the returned handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::RootNotFound`] if `root` is not a directory, or
    /// [`WatchError::Notify`] if the platform watcher cannot be created.
    pub fn watch(&self, root: &Path) -> Result<WatchHandle, WatchError> {
        if !root.is_dir() {
            return Err(WatchError::RootNotFound(root.to_path_buf()));
        }

        let bus = Arc::downgrade(&self.bus);
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(error = %e, "File watcher error");
                        return;
                    }
                };
                let Some(kind) = change_kind(event.kind) else {
                    return;
                };
                let Some(bus) = bus.upgrade() else {
                    return;
                };
                for path in event.paths {
                    bus.publish(&ChangeEvent::file(path, kind));
                }
            })?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), "Watching for changes");

        Ok(WatchHandle {
            root: root.to_path_buf(),
            _watcher: watcher,
        })
    }

    /// Signal that content changed outside the watched directories.
    pub fn notify_content_changed(&self) {
        self.bus.notify_content_changed();
    }

    /// Subscribe a flag flip on `target` to every change.
    ///
    /// The callback holds a weak reference: once `target` is dropped the
    /// subscription becomes a no-op. `flip` must not block; typically it is
    /// `InvalidatingCache::invalidate`.
    pub fn invalidate_on_change<T, F>(&self, target: &Arc<T>, flip: F) -> Subscription
    where
        T: Send + Sync + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let target: Weak<T> = Arc::downgrade(target);
        let subscriber: Subscriber = Arc::new(move |_event: &ChangeEvent| {
            if let Some(target) = target.upgrade() {
                flip(&target);
            }
        });
        self.bus.subscribe_scoped(subscriber)
    }
}
