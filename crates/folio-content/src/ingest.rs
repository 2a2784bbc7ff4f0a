//! Discover, process and join content files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use folio_markdown::{FrontMatter, MarkdownParser, PathResolver, TocEntry, slugify};
use rayon::prelude::*;

use crate::error::IngestError;
use crate::options::{ContentOptions, join_url, path_to_url};
use crate::page::{ContentPage, Tag};

/// Pages of one ingestion cycle, keyed by URL.
#[derive(Debug)]
pub struct IngestResult<FM> {
    /// Pages by slug URL.
    pub pages: BTreeMap<String, Arc<ContentPage<FM>>>,
}

impl<FM> Default for IngestResult<FM> {
    fn default() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }
}

/// A file that survived processing, before tags are attached.
struct Processed<FM> {
    url: String,
    source_path: PathBuf,
    front_matter: FM,
    body: String,
    toc: Vec<TocEntry>,
    heading: Option<String>,
}

/// Ingest a content set.
///
/// A missing or unreadable content root is logged and yields no pages.
/// Unreadable files are logged and skipped.
///
/// # Errors
///
/// Returns [`IngestError::NotADirectory`] if the content root is a file.
pub fn ingest<FM: FrontMatter>(options: &ContentOptions) -> Result<IngestResult<FM>, IngestError> {
    ingest_with(options, &options.parser())
}

pub(crate) fn ingest_with<FM: FrontMatter>(
    options: &ContentOptions,
    parser: &MarkdownParser<FM>,
) -> Result<IngestResult<FM>, IngestError> {
    let start = Instant::now();
    let root = options.content_dir.as_path();

    let files = match discover(root, options) {
        Ok(files) => files,
        Err(e @ IngestError::FileAccess { .. }) => {
            tracing::warn!(error = %e, "Content root unavailable, no pages ingested");
            return Ok(IngestResult::default());
        }
        Err(e) => return Err(e),
    };

    let mut processed: Vec<Processed<FM>> = files
        .par_iter()
        .filter_map(|path| match process_file(options, parser, root, path) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping content file");
                None
            }
        })
        .collect();
    processed.sort_by(|a, b| a.source_path.cmp(&b.source_path));

    let result = join(options, processed);
    tracing::info!(
        root = %root.display(),
        files = files.len(),
        pages = result.pages.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Content ingested"
    );
    Ok(result)
}

/// Find content files below `root`, sorted by path.
fn discover(root: &Path, options: &ContentOptions) -> Result<Vec<PathBuf>, IngestError> {
    let metadata = fs::metadata(root).map_err(|source| IngestError::FileAccess {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(IngestError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    walk(root, options, &mut files);
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, options: &ContentOptions, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %dir.display(), error = %e, "Skipping inaccessible directory");
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(path = %dir.display(), error = %e, "Skipping inaccessible entry");
                continue;
            }
        };

        let name = entry.file_name();
        let name = name.to_string_lossy();
        // Skip hidden files/dirs
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => walk(&path, options, files),
            Ok(_) if options.matches(&name) => files.push(path),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping inaccessible entry");
            }
        }
    }
}

fn process_file<FM: FrontMatter>(
    options: &ContentOptions,
    parser: &MarkdownParser<FM>,
    root: &Path,
    path: &Path,
) -> Result<Option<Processed<FM>>, IngestError> {
    let text = fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let relative = path.strip_prefix(root).unwrap_or(path);
    let relative_dir = relative.parent().map(path_to_url).unwrap_or_default();
    let resolver = PathResolver::new(options.url_root(), &relative_dir);
    let doc = parser.parse(&text, &resolver, relative);

    if doc.front_matter.is_draft() {
        tracing::debug!(path = %relative.display(), "Skipping draft");
        return Ok(None);
    }

    Ok(Some(Processed {
        url: page_url(relative),
        source_path: relative.to_path_buf(),
        front_matter: doc.front_matter,
        body: doc.html,
        toc: doc.toc,
        heading: doc.title,
    }))
}

/// Derive a page URL from a path relative to the content root.
///
/// Strips the extension and slugifies every segment.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use folio_content::page_url;
///
/// assert_eq!(page_url(Path::new("2024/04/Hello World.md")), "2024/04/hello-world");
/// ```
#[must_use]
pub fn page_url(relative: &Path) -> String {
    relative
        .with_extension("")
        .iter()
        .map(|segment| slugify(&segment.to_string_lossy()))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Attach shared tags and index pages by URL.
///
/// Runs single-threaded over pages in path order, so the tag display name
/// and URL collision winner are deterministic.
fn join<FM>(options: &ContentOptions, processed: Vec<Processed<FM>>) -> IngestResult<FM>
where
    FM: FrontMatter,
{
    let mut registry: BTreeMap<String, Arc<Tag>> = BTreeMap::new();
    let mut pages: BTreeMap<String, Arc<ContentPage<FM>>> = BTreeMap::new();

    for file in processed {
        let mut tags: Vec<Arc<Tag>> = Vec::new();
        for name in file.front_matter.tags() {
            let name = name.trim();
            let encoded = options.encode_tag(name);
            if encoded.is_empty() {
                continue;
            }
            let tag = registry.entry(encoded).or_insert_with_key(|encoded| {
                Arc::new(Tag {
                    name: name.to_owned(),
                    encoded_name: encoded.clone(),
                    navigate_url: join_url(&options.tags_url, encoded),
                })
            });
            if !tags.iter().any(|t| Arc::ptr_eq(t, tag)) {
                tags.push(Arc::clone(tag));
            }
        }

        let page = ContentPage {
            navigate_url: join_url(&options.page_url, &file.url),
            url: file.url,
            body: file.body,
            front_matter: file.front_matter,
            tags,
            toc: file.toc,
            source_path: file.source_path,
            heading: file.heading,
        };

        insert_page(&mut pages, page);
    }

    IngestResult { pages }
}

/// Insert `page`, replacing and returning any page with the same URL.
fn insert_page<FM>(
    pages: &mut BTreeMap<String, Arc<ContentPage<FM>>>,
    page: ContentPage<FM>,
) -> Option<Arc<ContentPage<FM>>> {
    let kept = page.source_path.clone();
    let previous = pages.insert(page.url.clone(), Arc::new(page))?;
    tracing::warn!(
        url = %previous.url,
        replaced = %previous.source_path.display(),
        kept = %kept.display(),
        "Duplicate page URL, keeping the later file"
    );
    Some(previous)
}
