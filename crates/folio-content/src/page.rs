//! Ingested content types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use folio_markdown::TocEntry;

/// A tag shared by every page that carries it.
///
/// One instance exists per encoded name per ingestion cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Display name, as first seen in path order.
    pub name: String,
    /// URL-safe name.
    pub encoded_name: String,
    /// Site-relative URL of the tag page.
    pub navigate_url: String,
}

/// A published content page.
#[derive(Debug)]
pub struct ContentPage<FM> {
    /// Slug path, unique within the content set (e.g., `2024/04/hello-world`).
    pub url: String,
    /// Site-relative URL (`page_url/url`).
    pub navigate_url: String,
    /// Rendered HTML body.
    pub body: String,
    /// Typed front matter.
    pub front_matter: FM,
    /// Tags in front-matter order, deduplicated.
    pub tags: Vec<Arc<Tag>>,
    /// Table of contents.
    pub toc: Vec<TocEntry>,
    /// Source file, relative to the content root.
    pub source_path: PathBuf,
    /// Text of the first level-1 heading.
    pub heading: Option<String>,
}

/// Unique tags across `pages`, sorted by encoded name.
pub fn collect_tags<'a, FM: 'a>(
    pages: impl IntoIterator<Item = &'a Arc<ContentPage<FM>>>,
) -> Vec<Arc<Tag>> {
    let mut tags: BTreeMap<&str, &Arc<Tag>> = BTreeMap::new();
    for page in pages {
        for tag in &page.tags {
            tags.entry(tag.encoded_name.as_str()).or_insert(tag);
        }
    }
    tags.into_values().map(Arc::clone).collect()
}
