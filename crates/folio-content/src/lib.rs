//! Content ingestion for Folio.
//!
//! Turns a directory of markdown files into a set of [`ContentPage`]s:
//!
//! 1. **Discover**: walk the content root for files matching a glob pattern
//! 2. **Process**: parse every file in parallel, dropping drafts
//! 3. **Join**: build one shared [`Tag`] per encoded tag name and index pages
//!    by URL
//!
//! [`ContentSource`] keeps the result in an
//! [`InvalidatingCache`](folio_cache::InvalidatingCache) and re-ingests after
//! every change notification.
//!
//! # Example
//!
//! ```no_run
//! use folio_content::{ContentOptions, ContentSource};
//! use folio_markdown::PageFrontMatter;
//!
//! let options = ContentOptions::new("content/blog", "blog").with_tags_url("tags");
//! let source: ContentSource<PageFrontMatter> = ContentSource::new(options);
//!
//! for page in source.pages()? {
//!     println!("{} ({} tags)", page.navigate_url, page.tags.len());
//! }
//! # Ok::<(), folio_content::IngestError>(())
//! ```

mod error;
mod ingest;
mod options;
mod page;
mod source;

pub use error::IngestError;
pub use ingest::{IngestResult, ingest, page_url};
pub use options::{ContentOptions, TagEncoder};
pub use page::{ContentPage, Tag, collect_tags};
pub use source::{ContentSource, ContentWatch};
