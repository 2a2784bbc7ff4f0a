//! Markdown to HTML with front matter, heading anchors and link rewriting.

use std::borrow::Cow;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use pulldown_cmark::{CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd};

use crate::front_matter::{self, FrontMatter, FrontMatterFormat, YamlFormat, split_front_matter};
use crate::resolve::PathResolver;
use crate::slug::HeadingIds;
use crate::toc::{Heading, TocEntry, build_toc};

/// Text transform applied to the raw file before parsing.
pub type Preprocess = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Result of parsing one markdown file.
#[derive(Clone, Debug)]
pub struct ParsedDocument<FM> {
    /// Deserialized front matter, or defaults if absent or invalid.
    pub front_matter: FM,
    /// Rendered HTML body.
    pub html: String,
    /// Nested headings.
    pub toc: Vec<TocEntry>,
    /// Text of the first level-1 heading.
    pub title: Option<String>,
}

/// Markdown parser for one front-matter type.
///
/// Configured once and shared across threads; [`parse`](Self::parse) takes
/// `&self`.
pub struct MarkdownParser<FM> {
    format: Arc<dyn FrontMatterFormat>,
    preprocess: Option<Preprocess>,
    auto_heading_ids: bool,
    gfm: bool,
    _front_matter: PhantomData<fn() -> FM>,
}

impl<FM> Clone for MarkdownParser<FM> {
    fn clone(&self) -> Self {
        Self {
            format: Arc::clone(&self.format),
            preprocess: self.preprocess.clone(),
            auto_heading_ids: self.auto_heading_ids,
            gfm: self.gfm,
            _front_matter: PhantomData,
        }
    }
}

impl<FM: FrontMatter> Default for MarkdownParser<FM> {
    fn default() -> Self {
        Self::new()
    }
}

impl<FM: FrontMatter> MarkdownParser<FM> {
    /// Create a parser with YAML front matter, GFM extensions and automatic
    /// heading ids.
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: Arc::new(YamlFormat),
            preprocess: None,
            auto_heading_ids: true,
            gfm: true,
            _front_matter: PhantomData,
        }
    }

    /// Use a different front-matter syntax.
    #[must_use]
    pub fn with_format(mut self, format: Arc<dyn FrontMatterFormat>) -> Self {
        self.format = format;
        self
    }

    /// Transform the raw text before front matter is split off.
    #[must_use]
    pub fn with_preprocess(mut self, preprocess: Preprocess) -> Self {
        self.preprocess = Some(preprocess);
        self
    }

    /// Generate anchor ids for headings that lack an explicit `{#id}`.
    ///
    /// When disabled, such headings are left out of the table of contents.
    #[must_use]
    pub fn with_auto_heading_ids(mut self, enabled: bool) -> Self {
        self.auto_heading_ids = enabled;
        self
    }

    /// Enable GitHub Flavored Markdown extensions (tables, strikethrough,
    /// task lists).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    fn options(&self) -> Options {
        let mut options = Options::ENABLE_HEADING_ATTRIBUTES;
        if self.gfm {
            options |= Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM;
        }
        options
    }

    /// Parse a markdown file.
    ///
    /// Never fails: invalid front matter is logged and replaced with
    /// `FM::default()`. `source` is only used for log messages.
    pub fn parse(&self, text: &str, resolver: &PathResolver, source: &Path) -> ParsedDocument<FM> {
        let text = match &self.preprocess {
            Some(preprocess) => Cow::Owned(preprocess(text)),
            None => Cow::Borrowed(text),
        };

        let (block, body) = split_front_matter(&text, self.format.fence());
        let front_matter = match block {
            Some(block) => front_matter::deserialize::<FM>(self.format.as_ref(), block)
                .unwrap_or_else(|e| {
                    tracing::warn!(
                        path = %source.display(),
                        error = %e,
                        "Invalid front matter, using defaults"
                    );
                    FM::default()
                }),
            None => FM::default(),
        };

        let (html, headings) = self.render(body, resolver);
        let title = headings
            .iter()
            .find(|h| h.level == 1)
            .map(|h| h.title.clone());

        ParsedDocument {
            front_matter,
            html,
            toc: build_toc(&headings),
            title,
        }
    }

    fn render(&self, body: &str, resolver: &PathResolver) -> (String, Vec<Heading>) {
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut headings: Vec<Heading> = Vec::new();
        let mut ids = HeadingIds::default();
        let mut pending: Option<PendingHeading> = None;

        // Explicit ids anywhere in the document take precedence over generated ones.
        let parsed: Vec<Event<'_>> = Parser::new_ext(body, self.options()).collect();
        for event in &parsed {
            if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
                ids.reserve(id);
            }
        }

        for event in parsed {
            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    pending = Some(PendingHeading {
                        start: events.len(),
                        level,
                        id: id.as_deref().map(str::to_owned),
                        text: String::new(),
                    });
                    events.push(Event::Start(Tag::Heading {
                        level,
                        id,
                        classes,
                        attrs,
                    }));
                }
                Event::End(TagEnd::Heading(level)) => {
                    if let Some(heading) = pending.take() {
                        let title = heading.text.trim().to_owned();
                        let id = heading.id.or_else(|| {
                            self.auto_heading_ids.then(|| ids.generate(&title))
                        });
                        if let Some(Event::Start(Tag::Heading { id: slot, .. })) =
                            events.get_mut(heading.start)
                        {
                            *slot = id.clone().map(CowStr::from);
                        }
                        headings.push(Heading {
                            level: heading_level_to_num(heading.level),
                            id,
                            title,
                        });
                    }
                    events.push(Event::End(TagEnd::Heading(level)));
                }
                event @ (Event::Text(_) | Event::Code(_)) if pending.is_some() => {
                    if let (Some(heading), Event::Text(text) | Event::Code(text)) =
                        (pending.as_mut(), &event)
                    {
                        heading.text.push_str(text);
                    }
                    events.push(event);
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => events.push(Event::Start(Tag::Link {
                    dest_url: match link_type {
                        LinkType::Email | LinkType::Autolink => dest_url,
                        _ => rewrite(resolver, dest_url),
                    },
                    link_type,
                    title,
                    id,
                })),
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => events.push(Event::Start(Tag::Image {
                    link_type,
                    dest_url: rewrite(resolver, dest_url),
                    title,
                    id,
                })),
                other => events.push(other),
            }
        }

        let mut html = String::with_capacity(body.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut html, events.into_iter());
        (html, headings)
    }
}

struct PendingHeading {
    start: usize,
    level: HeadingLevel,
    id: Option<String>,
    text: String,
}

fn rewrite<'a>(resolver: &PathResolver, dest_url: CowStr<'a>) -> CowStr<'a> {
    let resolved = match resolver.resolve(&dest_url) {
        Cow::Borrowed(_) => None,
        Cow::Owned(resolved) => Some(resolved),
    };
    resolved.map_or(dest_url, CowStr::from)
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
