//! Assembling the render and copy lists.

use std::sync::Arc;

use folio_content::{ContentSource, IngestError};
use folio_markdown::FrontMatter;

use crate::routes::{RouteProvider, is_generatable_endpoint, is_parameterless, output_file_for_route};
use crate::types::{ContentToCopy, PageToGenerate};

/// Render list entries of one content set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPages {
    /// One page per content entry.
    pub pages: Vec<PageToGenerate>,
    /// One listing page per unique tag.
    pub tags: Vec<PageToGenerate>,
}

/// A content set contributing pages and media to the site.
pub trait ContentProvider: Send + Sync {
    /// Content and tag pages, taken from a single view of the set.
    fn pages_to_generate(&self) -> Result<ContentPages, IngestError>;

    /// Static content owned by the set.
    fn content_to_copy(&self) -> Vec<ContentToCopy>;
}

impl<FM: FrontMatter> ContentProvider for ContentSource<FM> {
    fn pages_to_generate(&self) -> Result<ContentPages, IngestError> {
        let (pages, tags) = self.pages_and_tags()?;

        let pages = pages
            .iter()
            .map(|page| {
                let tags: Vec<&str> = page.tags.iter().map(|t| t.encoded_name.as_str()).collect();
                PageToGenerate::new(
                    page.navigate_url.clone(),
                    format!("{}.html", page.navigate_url),
                )
                .with_metadata(serde_json::json!({
                    "source": page.source_path.to_string_lossy(),
                    "tags": tags,
                }))
            })
            .collect();
        let tags = tags
            .iter()
            .map(|tag| {
                PageToGenerate::new(tag.navigate_url.clone(), format!("{}.html", tag.navigate_url))
                    .with_metadata(serde_json::json!({ "tag": tag.name }))
            })
            .collect();

        Ok(ContentPages { pages, tags })
    }

    fn content_to_copy(&self) -> Vec<ContentToCopy> {
        let options = self.options();
        match (options.media_source(), options.media_target()) {
            (Some(source), Some(target)) => vec![ContentToCopy::new(source, target)],
            _ => Vec::new(),
        }
    }
}

/// Collects every page the site publishes.
///
/// Pages are listed in a fixed order: content pages, tag pages, declared
/// routes, registered endpoints, then configured pages. Nothing is
/// deduplicated; when two entries share an output file the later one wins.
pub struct PageAggregator {
    content: Vec<Arc<dyn ContentProvider>>,
    routes: Vec<Arc<dyn RouteProvider>>,
    pages: Vec<PageToGenerate>,
    copies: Vec<ContentToCopy>,
    index_page: String,
}

impl Default for PageAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl PageAggregator {
    /// Create an empty aggregator writing directory routes to `index.html`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            content: Vec::new(),
            routes: Vec::new(),
            pages: Vec::new(),
            copies: Vec::new(),
            index_page: "index.html".to_owned(),
        }
    }

    /// File name used for directory-style routes.
    #[must_use]
    pub fn with_index_page(mut self, index_page: impl Into<String>) -> Self {
        self.index_page = index_page.into();
        self
    }

    /// Add a content set.
    #[must_use]
    pub fn with_content(mut self, content: Arc<dyn ContentProvider>) -> Self {
        self.content.push(content);
        self
    }

    /// Add a route source.
    #[must_use]
    pub fn with_routes(mut self, routes: Arc<dyn RouteProvider>) -> Self {
        self.routes.push(routes);
        self
    }

    /// Add explicitly configured pages.
    #[must_use]
    pub fn with_pages(mut self, pages: impl IntoIterator<Item = PageToGenerate>) -> Self {
        self.pages.extend(pages);
        self
    }

    /// Add explicitly configured copy items.
    #[must_use]
    pub fn with_copies(mut self, copies: impl IntoIterator<Item = ContentToCopy>) -> Self {
        self.copies.extend(copies);
        self
    }

    /// The full render list.
    ///
    /// # Errors
    ///
    /// Returns the first content set that fails to ingest.
    pub fn pages_to_generate(&self) -> Result<Vec<PageToGenerate>, IngestError> {
        let (content_pages, tag_pages): (Vec<_>, Vec<_>) = self
            .content
            .iter()
            .map(|content| content.pages_to_generate())
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|listing| (listing.pages, listing.tags))
            .unzip();

        let mut pages: Vec<PageToGenerate> = content_pages.into_iter().flatten().collect();
        pages.extend(tag_pages.into_iter().flatten());

        for provider in &self.routes {
            for route in provider.declared_routes() {
                if is_parameterless(&route) {
                    pages.push(self.route_page(&route));
                } else {
                    tracing::debug!(route = %route, "Skipping parameterized route");
                }
            }
        }
        for provider in &self.routes {
            for endpoint in provider.endpoints() {
                if is_generatable_endpoint(&endpoint) {
                    pages.push(self.route_page(&endpoint.path));
                }
            }
        }

        pages.extend(self.pages.iter().cloned());

        tracing::debug!(pages = pages.len(), "Pages aggregated");
        Ok(pages)
    }

    /// The full copy list: content media first, then configured items.
    #[must_use]
    pub fn content_to_copy(&self) -> Vec<ContentToCopy> {
        self.content
            .iter()
            .flat_map(|content| content.content_to_copy())
            .chain(self.copies.iter().cloned())
            .collect()
    }

    fn route_page(&self, route: &str) -> PageToGenerate {
        PageToGenerate::new(route, output_file_for_route(route, &self.index_page))
    }
}
