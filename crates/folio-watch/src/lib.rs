//! Change notification for Folio.
//!
//! Content caches must be invalidated whenever their source files change or
//! the host signals that content was swapped. This crate provides:
//!
//! - [`EventBus`]: explicit, owner-scoped subscriber list with synchronous
//!   fan-out of [`ChangeEvent`]s
//! - [`ChangeNotifier`]: recursive directory watching on top of `notify`,
//!   publishing into an [`EventBus`]
//! - [`Subscription`] and [`WatchHandle`]: RAII guards releasing subscriptions
//!   and watchers deterministically on drop
//!
//! Subscribers run on whichever thread raised the event (a `notify` worker
//! thread or the caller of [`EventBus::notify_content_changed`]). They must be
//! non-blocking flag flips such as `cache.invalidate()` and must never trigger
//! a cache population themselves.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), folio_watch::WatchError> {
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use folio_watch::ChangeNotifier;
//!
//! let notifier = ChangeNotifier::new();
//! let dirty = Arc::new(AtomicBool::new(false));
//! let _subscription = notifier.invalidate_on_change(&dirty, |flag| {
//!     flag.store(true, Ordering::Release);
//! });
//! let _handle = notifier.watch(Path::new("content"))?;
//! # Ok(())
//! # }
//! ```

mod bus;
mod event;
mod notifier;

pub use bus::{EventBus, Subscriber, Subscription};
pub use event::{ChangeEvent, ChangeKind};
pub use notifier::{ChangeNotifier, WatchError, WatchHandle};
