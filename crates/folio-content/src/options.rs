//! Per content-set settings.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_markdown::{
    FrontMatter, FrontMatterFormat, MarkdownParser, Preprocess, YamlFormat, slugify,
};

use crate::error::IngestError;

/// Maps a display tag name to its URL-safe encoded name.
pub type TagEncoder = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Settings for one content set.
#[derive(Clone)]
pub struct ContentOptions {
    /// Root directory scanned for content files.
    pub content_dir: PathBuf,
    /// File name pattern; `None` matches `*.md`.
    pub pattern: Option<glob::Pattern>,
    /// URL prefix for pages.
    pub page_url: String,
    /// URL prefix for tag pages.
    pub tags_url: String,
    /// Media directory, relative to `content_dir`.
    pub media_dir: Option<PathBuf>,
    /// URL under which the media directory is published.
    pub media_url: Option<String>,
    /// Explicit URL root for link rewriting.
    pub url_root: Option<String>,
    /// Generate anchor ids for headings without one.
    pub auto_heading_ids: bool,
    /// Tag name encoder (default [`slugify`]).
    pub tag_encoder: TagEncoder,
    /// Raw text transform applied before parsing.
    pub preprocess: Option<Preprocess>,
    /// Front-matter syntax (default YAML).
    pub front_matter: Arc<dyn FrontMatterFormat>,
}

impl fmt::Debug for ContentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentOptions")
            .field("content_dir", &self.content_dir)
            .field("pattern", &self.pattern.as_ref().map(glob::Pattern::as_str))
            .field("page_url", &self.page_url)
            .field("tags_url", &self.tags_url)
            .field("media_dir", &self.media_dir)
            .field("media_url", &self.media_url)
            .field("url_root", &self.url_root)
            .field("auto_heading_ids", &self.auto_heading_ids)
            .field("front_matter", &self.front_matter.fence())
            .finish_non_exhaustive()
    }
}

impl ContentOptions {
    /// Create options for `content_dir` published under `page_url`.
    ///
    /// Tag pages default to `tags`.
    #[must_use]
    pub fn new(content_dir: impl Into<PathBuf>, page_url: impl Into<String>) -> Self {
        Self {
            content_dir: content_dir.into(),
            pattern: None,
            page_url: trim_slashes(&page_url.into()),
            tags_url: "tags".to_owned(),
            media_dir: None,
            media_url: None,
            url_root: None,
            auto_heading_ids: true,
            tag_encoder: Arc::new(slugify),
            preprocess: None,
            front_matter: Arc::new(YamlFormat),
        }
    }

    /// Match file names against `pattern` instead of `*.md`.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, IngestError> {
        self.pattern = Some(glob::Pattern::new(pattern)?);
        Ok(self)
    }

    /// Check a file name against the content pattern.
    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.matches(file_name),
            None => Path::new(file_name).extension().is_some_and(|e| e == "md"),
        }
    }

    /// Publish tag pages under `tags_url`.
    #[must_use]
    pub fn with_tags_url(mut self, tags_url: impl Into<String>) -> Self {
        self.tags_url = trim_slashes(&tags_url.into());
        self
    }

    /// Publish `media_dir` (relative to the content root) under `media_url`.
    #[must_use]
    pub fn with_media(mut self, media_dir: impl Into<PathBuf>, media_url: impl Into<String>) -> Self {
        self.media_dir = Some(media_dir.into());
        self.media_url = Some(trim_slashes(&media_url.into()));
        self
    }

    /// Rewrite relative links against `url_root`.
    #[must_use]
    pub fn with_url_root(mut self, url_root: impl Into<String>) -> Self {
        self.url_root = Some(url_root.into());
        self
    }

    /// Enable or disable automatic heading ids.
    #[must_use]
    pub fn with_auto_heading_ids(mut self, enabled: bool) -> Self {
        self.auto_heading_ids = enabled;
        self
    }

    /// Encode tag names with `encoder`.
    #[must_use]
    pub fn with_tag_encoder(mut self, encoder: TagEncoder) -> Self {
        self.tag_encoder = encoder;
        self
    }

    /// Transform raw file text before parsing.
    #[must_use]
    pub fn with_preprocess(mut self, preprocess: Preprocess) -> Self {
        self.preprocess = Some(preprocess);
        self
    }

    /// Use a different front-matter syntax.
    #[must_use]
    pub fn with_front_matter(mut self, format: Arc<dyn FrontMatterFormat>) -> Self {
        self.front_matter = format;
        self
    }

    /// URL root used for link rewriting.
    ///
    /// Falls back to `media_url`, then `page_url`.
    #[must_use]
    pub fn url_root(&self) -> &str {
        self.url_root
            .as_deref()
            .or(self.media_url.as_deref())
            .unwrap_or(&self.page_url)
    }

    /// Absolute media directory, if configured.
    #[must_use]
    pub fn media_source(&self) -> Option<PathBuf> {
        self.media_dir.as_ref().map(|dir| self.content_dir.join(dir))
    }

    /// Output path the media directory is copied to.
    ///
    /// Mirrors the media directory's position under the content root, so
    /// targets rewritten against [`url_root`](Self::url_root) resolve.
    #[must_use]
    pub fn media_target(&self) -> Option<String> {
        let dir = self.media_dir.as_deref()?;
        let url = self.media_url.as_deref()?;
        Some(join_url(url, &path_to_url(dir)))
    }

    /// Encode a tag name.
    #[must_use]
    pub fn encode_tag(&self, name: &str) -> String {
        (self.tag_encoder)(name)
    }

    /// Build the markdown parser for these options.
    #[must_use]
    pub fn parser<FM: FrontMatter>(&self) -> MarkdownParser<FM> {
        let parser = MarkdownParser::new()
            .with_format(Arc::clone(&self.front_matter))
            .with_auto_heading_ids(self.auto_heading_ids);
        match &self.preprocess {
            Some(preprocess) => parser.with_preprocess(Arc::clone(preprocess)),
            None => parser,
        }
    }
}

fn trim_slashes(url: &str) -> String {
    url.trim_matches('/').to_owned()
}

/// Join two URL fragments with a single `/`, ignoring empty parts.
pub(crate) fn join_url(prefix: &str, rest: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let rest = rest.trim_matches('/');
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_owned(),
        (false, true) => prefix.to_owned(),
        (false, false) => format!("{prefix}/{rest}"),
    }
}

/// Convert a relative filesystem path to `/`-separated form.
pub(crate) fn path_to_url(path: &Path) -> String {
    path.iter()
        .map(|segment| segment.to_string_lossy())
        .filter(|segment| !segment.is_empty() && segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}
