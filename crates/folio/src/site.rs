//! Wiring configuration into the generation pipeline.

use std::sync::Arc;

use folio_config::{Config, ContentConfig, FrontMatterKind};
use folio_content::{ContentOptions, ContentSource, IngestError};
use folio_generate::{
    ContentProvider, ContentToCopy, GenerateOptions, GenerationReport, HttpRenderer,
    OutputGenerator, PageAggregator, PageToGenerate, Renderer, RouteProvider,
    StaticRouteProvider,
};
use folio_markdown::{FrontMatterFormat, PageFrontMatter, TomlFormat, YamlFormat};

use crate::error::CliError;

type Source = ContentSource<PageFrontMatter>;

/// Everything needed to generate the site described by a [`Config`].
pub(crate) struct Site {
    sources: Vec<Arc<Source>>,
    aggregator: PageAggregator,
    generator: OutputGenerator,
    renderer: Box<dyn Renderer>,
}

impl Site {
    /// Build a site that fetches pages from `site.base_url`.
    pub(crate) fn from_config(config: &Config) -> Result<Self, CliError> {
        let renderer = HttpRenderer::new(config.site.base_url.clone(), config.timeout());
        Self::with_renderer(config, Box::new(renderer))
    }

    pub(crate) fn with_renderer(
        config: &Config,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, CliError> {
        let sources = config
            .content
            .iter()
            .map(|content| content_options(content).map(|options| Arc::new(Source::new(options))))
            .collect::<Result<Vec<_>, _>>()?;

        let routes: Arc<dyn RouteProvider> =
            Arc::new(StaticRouteProvider::new(config.generate.routes.clone()));
        let mut aggregator = PageAggregator::new()
            .with_index_page(config.site.index_page.clone())
            .with_routes(routes)
            .with_pages(
                config
                    .generate
                    .pages
                    .iter()
                    .map(|page| PageToGenerate::new(page.url.clone(), page.output_file.clone())),
            )
            .with_copies(
                config
                    .generate
                    .copy
                    .iter()
                    .map(|copy| ContentToCopy::new(copy.source.clone(), copy.target.clone())),
            );
        for source in &sources {
            let provider: Arc<dyn ContentProvider> = Arc::<ContentSource<PageFrontMatter>>::clone(source);
            aggregator = aggregator.with_content(provider);
        }

        let generator = OutputGenerator::new(
            GenerateOptions::new(config.site.output_dir.clone())
                .with_exclude(config.generate.exclude.clone())
                .with_concurrency(config.generate.concurrency),
        );

        Ok(Self {
            sources,
            aggregator,
            generator,
            renderer,
        })
    }

    /// Content sets, in configuration order.
    pub(crate) fn sources(&self) -> &[Arc<Source>] {
        &self.sources
    }

    /// Aggregate pages and regenerate the output directory.
    pub(crate) fn build(&self) -> Result<GenerationReport, CliError> {
        let pages = self.aggregator.pages_to_generate()?;
        let copies = self.aggregator.content_to_copy();
        Ok(self
            .generator
            .generate(&pages, &copies, self.renderer.as_ref())?)
    }
}

/// Translate a `[[content]]` entry into ingestion options.
fn content_options(config: &ContentConfig) -> Result<ContentOptions, IngestError> {
    let mut options = ContentOptions::new(config.source_dir.clone(), config.page_url.clone());

    if let Some(pattern) = &config.pattern {
        options = options.with_pattern(pattern)?;
    }
    if let Some(tags_url) = &config.tags_url {
        options = options.with_tags_url(tags_url.clone());
    }
    if let (Some(media_dir), Some(media_url)) = (&config.media_dir, &config.media_url) {
        options = options.with_media(media_dir.clone(), media_url.clone());
    }

    let format: Arc<dyn FrontMatterFormat> = match config.front_matter {
        FrontMatterKind::Yaml => Arc::new(YamlFormat),
        FrontMatterKind::Toml => Arc::new(TomlFormat),
    };
    Ok(options.with_front_matter(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    use folio_generate::RenderFetchError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Renders every route as a small HTML page and records requests.
    #[derive(Default)]
    struct EchoRenderer {
        requested: Mutex<Vec<String>>,
    }

    impl Renderer for EchoRenderer {
        fn render(&self, url: &str) -> Result<String, RenderFetchError> {
            self.requested
                .lock()
                .unwrap()
                .push(url.to_owned());
            if url == "/broken" {
                return Err(RenderFetchError::new(url, "boom").with_status(500));
            }
            Ok(format!("<p>{url}</p>"))
        }
    }

    fn write_project(root: &Path) -> Config {
        let blog = root.join("content/blog");
        fs::create_dir_all(blog.join("media")).unwrap();
        fs::create_dir_all(root.join("wwwroot/css")).unwrap();
        fs::write(blog.join("hello.md"), "+++\ntags = [\"Rust\"]\n+++\n# Hello\n").unwrap();
        fs::write(blog.join("media/chart.png"), "png").unwrap();
        fs::write(root.join("wwwroot/css/site.css"), "body{}").unwrap();
        fs::write(
            root.join("folio.toml"),
            r#"
[site]
output_dir = "dist"

[generate]
concurrency = 2
routes = ["/", "/broken", "/blog/{slug}"]
pages = [{ url = "/feed", output_file = "feed.xml" }]
copy = [{ source = "wwwroot", target = "" }]

[[content]]
source_dir = "content/blog"
page_url = "blog"
media_dir = "media"
media_url = "assets"
front_matter = "toml"
"#,
        )
        .unwrap();

        Config::load(Some(&root.join("folio.toml")), None).unwrap()
    }

    #[test]
    fn test_content_options_from_config() {
        let config = ContentConfig {
            source_dir: "/srv/blog".into(),
            pattern: Some("*.markdown".to_owned()),
            page_url: "/blog/".to_owned(),
            tags_url: None,
            media_dir: Some("media".into()),
            media_url: Some("assets".to_owned()),
            front_matter: FrontMatterKind::Toml,
        };

        let options = content_options(&config).unwrap();

        assert_eq!(options.page_url, "blog");
        assert_eq!(options.tags_url, "tags");
        assert!(options.matches("post.markdown"));
        assert!(!options.matches("post.md"));
        assert_eq!(options.media_target().as_deref(), Some("assets/media"));
        assert_eq!(options.front_matter.fence(), "+++");
    }

    #[test]
    fn test_content_options_invalid_pattern() {
        let config = ContentConfig {
            source_dir: "/srv/blog".into(),
            pattern: Some("[".to_owned()),
            page_url: "blog".to_owned(),
            tags_url: None,
            media_dir: None,
            media_url: None,
            front_matter: FrontMatterKind::Yaml,
        };

        assert!(matches!(
            content_options(&config),
            Err(IngestError::Pattern(_))
        ));
    }

    #[test]
    fn test_build_site() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_project(temp_dir.path());
        let renderer = Arc::new(EchoRenderer::default());
        let site = Site::with_renderer(&config, Box::new(SharedRenderer(Arc::clone(&renderer))))
            .unwrap();

        let report = site.build().unwrap();

        let dist = temp_dir.path().join("dist");
        assert_eq!(report.pages_written, 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].url, "/broken");
        assert_eq!(
            fs::read_to_string(dist.join("blog/hello.html")).unwrap(),
            "<p>blog/hello</p>"
        );
        assert_eq!(
            fs::read_to_string(dist.join("tags/rust.html")).unwrap(),
            "<p>tags/rust</p>"
        );
        assert_eq!(fs::read_to_string(dist.join("index.html")).unwrap(), "<p>/</p>");
        assert_eq!(fs::read_to_string(dist.join("feed.xml")).unwrap(), "<p>/feed</p>");
        assert!(dist.join("assets/media/chart.png").is_file());
        assert!(dist.join("css/site.css").is_file());
        assert!(!dist.join("broken/index.html").exists());

        let mut requested = renderer.requested.lock().unwrap().clone();
        requested.sort();
        assert_eq!(
            requested,
            vec!["/", "/broken", "/feed", "blog/hello", "tags/rust"]
        );
    }

    #[test]
    fn test_rebuild_after_invalidate() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_project(temp_dir.path());
        let site = Site::with_renderer(&config, Box::new(EchoRenderer::default())).unwrap();
        site.build().unwrap();

        fs::write(
            temp_dir.path().join("content/blog/second.md"),
            "# Second\n",
        )
        .unwrap();
        for source in site.sources() {
            source.invalidate();
        }
        site.build().unwrap();

        assert!(temp_dir.path().join("dist/blog/second.html").is_file());
    }

    struct SharedRenderer(Arc<EchoRenderer>);

    impl Renderer for SharedRenderer {
        fn render(&self, url: &str) -> Result<String, RenderFetchError> {
            self.0.render(url)
        }
    }
}
