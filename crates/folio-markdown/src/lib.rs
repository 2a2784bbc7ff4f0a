//! Markdown parsing for Folio content files.
//!
//! This crate turns a markdown file with a front-matter block into a
//! [`ParsedDocument`]:
//!
//! - [`split_front_matter`] and [`FrontMatterFormat`]: locate and deserialize
//!   the metadata block (YAML and TOML formats are provided)
//! - [`MarkdownParser`]: renders the body to HTML with `pulldown-cmark`,
//!   assigning heading anchor ids and rewriting relative links
//! - [`build_toc`]: nests headings into a [`TocEntry`] forest
//! - [`PathResolver`]: maps file-relative link and media targets to
//!   site-absolute paths
//! - [`slugify`]: URL-safe identifiers for file names, tags and anchors
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use folio_markdown::{MarkdownParser, PageFrontMatter, PathResolver};
//!
//! let markdown = "---\ntitle: Hello\n---\n# Intro\n\n![chart](../media/chart.png)\n";
//! let resolver = PathResolver::new("blog", "2024");
//! let doc = MarkdownParser::<PageFrontMatter>::new().parse(markdown, &resolver, Path::new("2024/hello.md"));
//!
//! assert_eq!(doc.front_matter.title.as_deref(), Some("Hello"));
//! assert_eq!(doc.toc[0].id, "intro");
//! assert!(doc.html.contains(r#"src="blog/media/chart.png""#));
//! ```

mod front_matter;
mod parser;
mod resolve;
mod slug;
mod toc;

pub use front_matter::{
    FrontMatter, FrontMatterError, FrontMatterFormat, PageFrontMatter, TomlFormat, YamlFormat,
    split_front_matter,
};
pub use parser::{MarkdownParser, ParsedDocument, Preprocess};
pub use resolve::{PathResolver, is_rewritable};
pub use slug::{MAX_SLUG_LEN, slugify};
pub use toc::{Heading, TocEntry, build_toc};
