//! Cached, change-aware content set.

use std::sync::Arc;

use folio_cache::InvalidatingCache;
use folio_markdown::FrontMatter;
use folio_watch::{ChangeNotifier, Subscription, WatchError, WatchHandle};

use crate::error::IngestError;
use crate::ingest::ingest_with;
use crate::options::ContentOptions;
use crate::page::{ContentPage, Tag, collect_tags};

type PageCache<FM> = InvalidatingCache<String, Arc<ContentPage<FM>>, IngestError>;
type PagesAndTags<FM> = (Vec<Arc<ContentPage<FM>>>, Vec<Arc<Tag>>);

/// A content set backed by an invalidating cache.
///
/// The first read ingests the content root; later reads reuse the result
/// until [`invalidate`](Self::invalidate) is called or an attached
/// [`ChangeNotifier`] reports a change.
pub struct ContentSource<FM: FrontMatter> {
    options: Arc<ContentOptions>,
    cache: Arc<PageCache<FM>>,
}

impl<FM: FrontMatter> ContentSource<FM> {
    /// Create a content source. Nothing is read until the first access.
    #[must_use]
    pub fn new(options: ContentOptions) -> Self {
        let options = Arc::new(options);
        let parser = options.parser::<FM>();
        let populate_options = Arc::clone(&options);
        let cache = InvalidatingCache::new(options.page_url.clone(), move || {
            ingest_with(&populate_options, &parser).map(|result| result.pages)
        });

        Self {
            options,
            cache: Arc::new(cache),
        }
    }

    /// Content set settings.
    #[must_use]
    pub fn options(&self) -> &ContentOptions {
        &self.options
    }

    /// All pages, ordered by URL.
    pub fn pages(&self) -> Result<Vec<Arc<ContentPage<FM>>>, IngestError> {
        self.cache.get_all()
    }

    /// Look up a page by its slug URL.
    pub fn page(&self, url: &str) -> Result<Option<Arc<ContentPage<FM>>>, IngestError> {
        Ok(self.cache.snapshot()?.get(url).cloned())
    }

    /// Unique tags, sorted by encoded name.
    ///
    /// Every tag has at least one page in the current snapshot. Use
    /// [`pages_and_tags`](Self::pages_and_tags) when both lists must agree.
    pub fn tags(&self) -> Result<Vec<Arc<Tag>>, IngestError> {
        Ok(collect_tags(self.cache.snapshot()?.values()))
    }

    /// Pages and their unique tags, read from one snapshot.
    pub fn pages_and_tags(&self) -> Result<PagesAndTags<FM>, IngestError> {
        let snapshot = self.cache.snapshot()?;
        let tags = collect_tags(snapshot.values());
        Ok((snapshot.values().cloned().collect(), tags))
    }

    /// Check whether the cached pages are current.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.cache.is_valid()
    }

    /// Discard cached pages; the next read re-ingests.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// Watch the content root and invalidate on every change published to
    /// `notifier`.
    ///
    /// The returned guard keeps both the watch and the subscription alive.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] if the content root cannot be watched.
    pub fn attach(&self, notifier: &ChangeNotifier) -> Result<ContentWatch, WatchError> {
        let handle = notifier.watch(&self.options.content_dir)?;
        let subscription = notifier.invalidate_on_change(&self.cache, |cache| cache.invalidate());
        tracing::debug!(
            root = %self.options.content_dir.display(),
            page_url = %self.options.page_url,
            "Content source attached"
        );
        Ok(ContentWatch {
            _handle: handle,
            _subscription: subscription,
        })
    }
}

/// Keeps a content source subscribed to changes. Dropping it detaches.
pub struct ContentWatch {
    _handle: WatchHandle,
    _subscription: Subscription,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, Instant};

    use folio_markdown::PageFrontMatter;
    use pretty_assertions::assert_eq;
    use static_assertions::assert_impl_all;
    use tempfile::TempDir;

    assert_impl_all!(ContentSource<PageFrontMatter>: Send, Sync);

    fn source(root: &std::path::Path) -> ContentSource<PageFrontMatter> {
        ContentSource::new(ContentOptions::new(root, "blog").with_tags_url("topics"))
    }

    #[test]
    fn test_lazy_ingestion() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("one.md"), "# One\n").unwrap();

        let source = source(temp_dir.path());
        assert!(!source.is_valid());

        let pages = source.pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert!(source.is_valid());
    }

    #[test]
    fn test_reads_are_cached_until_invalidated() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("one.md"), "# One\n").unwrap();
        let source = source(temp_dir.path());
        let first = source.pages().unwrap();

        fs::write(temp_dir.path().join("two.md"), "# Two\n").unwrap();
        let cached = source.pages().unwrap();
        assert_eq!(cached.len(), 1);
        assert!(Arc::ptr_eq(&first[0], &cached[0]));

        source.invalidate();
        let refreshed = source.pages().unwrap();
        assert_eq!(refreshed.len(), 2);
    }

    #[test]
    fn test_page_lookup_and_tags() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("post.md"),
            "---\ntags: [Rust, Async]\n---\n# Post\n",
        )
        .unwrap();
        let source = source(temp_dir.path());

        let page = source.page("post").unwrap().unwrap();
        assert_eq!(page.navigate_url, "blog/post");
        assert!(source.page("missing").unwrap().is_none());

        let tags: Vec<(String, String)> = source
            .tags()
            .unwrap()
            .iter()
            .map(|t| (t.encoded_name.clone(), t.navigate_url.clone()))
            .collect();
        assert_eq!(
            tags,
            vec![
                ("async".to_owned(), "topics/async".to_owned()),
                ("rust".to_owned(), "topics/rust".to_owned()),
            ]
        );
    }

    #[test]
    fn test_pages_and_tags_share_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.md"), "---\ntags: [Rust]\n---\n").unwrap();
        let source = source(temp_dir.path());
        source.pages().unwrap();

        fs::write(temp_dir.path().join("b.md"), "---\ntags: [Web]\n---\n").unwrap();
        source.invalidate();
        let (pages, tags) = source.pages_and_tags().unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(tags.len(), 2);
        for tag in &tags {
            assert!(
                pages
                    .iter()
                    .any(|page| page.tags.iter().any(|t| Arc::ptr_eq(t, tag)))
            );
        }
        assert!(source.is_valid());
    }

    #[test]
    fn test_root_error_is_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("content");
        fs::write(&root, "not a directory").unwrap();
        let source = source(&root);

        assert!(matches!(source.pages(), Err(IngestError::NotADirectory(_))));
        assert!(!source.is_valid());

        fs::remove_file(&root).unwrap();
        fs::create_dir(&root).unwrap();
        fs::write(root.join("post.md"), "# Post\n").unwrap();
        assert_eq!(source.pages().unwrap().len(), 1);
    }

    #[test]
    fn test_external_change_invalidates() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("one.md"), "# One\n").unwrap();
        let source = source(temp_dir.path());
        let notifier = ChangeNotifier::new();
        let _watch = source.attach(&notifier).unwrap();

        source.pages().unwrap();
        assert!(source.is_valid());

        notifier.notify_content_changed();
        assert!(!source.is_valid());
    }

    #[test]
    fn test_file_change_invalidates() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::write(root.join("one.md"), "# One\n").unwrap();
        let source = source(&root);
        let notifier = ChangeNotifier::new();
        let _watch = source.attach(&notifier).unwrap();

        source.pages().unwrap();
        std::thread::sleep(Duration::from_millis(100));
        fs::write(root.join("two.md"), "# Two\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while source.is_valid() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(!source.is_valid());
        assert_eq!(source.pages().unwrap().len(), 2);
    }

    #[test]
    fn test_detach_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let source = source(temp_dir.path());
        let notifier = ChangeNotifier::new();

        let watch = source.attach(&notifier).unwrap();
        assert_eq!(notifier.bus().subscriber_count(), 1);
        drop(watch);
        assert_eq!(notifier.bus().subscriber_count(), 0);

        source.pages().unwrap();
        notifier.notify_content_changed();
        assert!(source.is_valid());
    }

    #[test]
    fn test_attach_missing_root() {
        let source = source(std::path::Path::new("/nonexistent/folio/content"));
        let notifier = ChangeNotifier::new();
        assert!(matches!(
            source.attach(&notifier),
            Err(WatchError::RootNotFound(_))
        ));
    }
}
