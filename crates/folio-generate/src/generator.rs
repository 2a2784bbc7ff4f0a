//! Whole-tree static output generation.
//!
//! Each run:
//! 1. Deletes and recreates the output root
//! 2. Creates every directory the run will write into
//! 3. Copies static content in parallel
//! 4. Fetches and writes pages on a bounded worker pool
//!
//! Steps 3 and 4 never abort: failures are logged and recorded in the
//! [`GenerationReport`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::render::Renderer;
use crate::types::{ContentToCopy, PageToGenerate};

/// Fatal generation error.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Output root would delete something that is not a site directory.
    #[error("Refusing to use {} as output directory", .0.display())]
    UnsafeOutputRoot(PathBuf),
    /// Output root could not be removed.
    #[error("Failed to clear output directory {}: {source}", path.display())]
    Clear {
        /// Output root.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Output root could not be created.
    #[error("Failed to create output directory {}: {source}", path.display())]
    Create {
        /// Output root.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Worker pool could not be started.
    #[error("Failed to start render workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Output generation settings.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Directory the site is written to. Deleted at the start of every run.
    pub output_root: PathBuf,
    /// Output-relative paths never written (exact match).
    pub exclude: Vec<String>,
    /// Maximum concurrent page fetches.
    pub concurrency: usize,
}

impl GenerateOptions {
    /// Create options with no exclusions and one worker per CPU.
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            exclude: Vec::new(),
            concurrency: std::thread::available_parallelism().map_or(4, usize::from),
        }
    }

    /// Never write these output-relative paths.
    #[must_use]
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Limit concurrent page fetches.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// A page that was not written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPage {
    /// Requested route.
    pub url: String,
    /// Why the page was skipped.
    pub reason: String,
}

/// Outcome of a generation run.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Pages fetched and written.
    pub pages_written: usize,
    /// Pages not written, with reasons.
    pub skipped: Vec<SkippedPage>,
    /// Files copied.
    pub files_copied: usize,
    /// Files that failed to copy.
    pub copy_failures: usize,
    /// Pages and files left out by the exclusion list.
    pub excluded: usize,
    /// Wall-clock duration.
    pub elapsed: Duration,
}

impl GenerationReport {
    /// Whether every page and file made it to disk.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.copy_failures == 0
    }
}

/// One file copy, resolved from a [`ContentToCopy`].
#[derive(Debug)]
struct CopyJob {
    source: PathBuf,
    target: String,
}

/// Writes a static site into an output directory.
pub struct OutputGenerator {
    options: GenerateOptions,
    exclude: HashSet<String>,
}

impl OutputGenerator {
    /// Create a generator.
    #[must_use]
    pub fn new(options: GenerateOptions) -> Self {
        let exclude = options.exclude.iter().map(|p| normalize(p)).collect();
        Self { options, exclude }
    }

    /// Output root directory.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.options.output_root
    }

    /// Rebuild the output directory.
    ///
    /// When several pages or copies target the same output path, the later
    /// one in list order wins.
    ///
    /// # Errors
    ///
    /// Fails only if the output root cannot be cleared or recreated, or the
    /// worker pool cannot start. Everything else is recorded in the report.
    pub fn generate(
        &self,
        pages: &[PageToGenerate],
        copies: &[ContentToCopy],
        renderer: &dyn Renderer,
    ) -> Result<GenerationReport, GenerateError> {
        let start = Instant::now();
        let root = self.options.output_root.as_path();
        self.reset_output_root()?;

        let mut report = GenerationReport::default();

        let jobs = plan_copies(copies);
        let pages = plan_pages(pages, &mut report);
        let created = self.create_directories(&jobs, &pages);

        self.copy_files(&jobs, &created, &mut report);
        self.write_pages(&pages, &created, renderer, &mut report)?;

        report.elapsed = start.elapsed();
        tracing::info!(
            output = %root.display(),
            pages = report.pages_written,
            skipped = report.skipped.len(),
            files = report.files_copied,
            copy_failures = report.copy_failures,
            elapsed_ms = report.elapsed.as_millis(),
            "Site generated"
        );
        Ok(report)
    }

    fn reset_output_root(&self) -> Result<(), GenerateError> {
        let root = self.options.output_root.as_path();
        if root.as_os_str().is_empty() || root.parent().is_none() {
            return Err(GenerateError::UnsafeOutputRoot(root.to_path_buf()));
        }

        if root.exists() {
            fs::remove_dir_all(root).map_err(|source| GenerateError::Clear {
                path: root.to_path_buf(),
                source,
            })?;
        }
        fs::create_dir_all(root).map_err(|source| GenerateError::Create {
            path: root.to_path_buf(),
            source,
        })
    }

    fn is_excluded(&self, target: &str) -> bool {
        self.exclude.contains(target)
    }

    /// Create every directory the run writes into. Returns those that exist.
    fn create_directories(&self, jobs: &[CopyJob], pages: &[PageToGenerate]) -> HashSet<String> {
        let mut needed: BTreeSet<String> = BTreeSet::new();
        let parents = jobs
            .iter()
            .map(|job| job.target.as_str())
            .chain(pages.iter().map(|page| page.output_file.as_str()))
            .filter_map(parent_dir);
        for parent in parents {
            needed.insert(parent.to_owned());
        }

        let root = self.options.output_root.as_path();
        let mut created = HashSet::with_capacity(needed.len() + 1);
        created.insert(String::new());
        for dir in needed {
            match fs::create_dir_all(root.join(&dir)) {
                Ok(()) => {
                    created.insert(dir);
                }
                Err(e) => {
                    tracing::warn!(path = %dir, error = %e, "Failed to create output directory");
                }
            }
        }
        created
    }

    fn copy_files(&self, jobs: &[CopyJob], created: &HashSet<String>, report: &mut GenerationReport) {
        let root = self.options.output_root.as_path();
        let copied = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let excluded = AtomicUsize::new(0);

        jobs.par_iter().for_each(|job| {
            if self.is_excluded(&job.target) {
                tracing::debug!(path = %job.target, "Excluded from copy");
                excluded.fetch_add(1, Ordering::Relaxed);
                return;
            }
            if !created.contains(parent_dir(&job.target).unwrap_or("")) {
                tracing::warn!(path = %job.target, "Skipping copy, target directory missing");
                failed.fetch_add(1, Ordering::Relaxed);
                return;
            }
            match fs::copy(&job.source, root.join(&job.target)) {
                Ok(_) => {
                    copied.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::warn!(
                        source = %job.source.display(),
                        target = %job.target,
                        error = %e,
                        "Failed to copy file"
                    );
                    failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

        report.files_copied += copied.into_inner();
        report.copy_failures += failed.into_inner();
        report.excluded += excluded.into_inner();
    }

    fn write_pages(
        &self,
        pages: &[PageToGenerate],
        created: &HashSet<String>,
        renderer: &dyn Renderer,
        report: &mut GenerationReport,
    ) -> Result<(), GenerateError> {
        let root = self.options.output_root.as_path();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.concurrency.max(1))
            .thread_name(|i| format!("folio-render-{i}"))
            .build()?;

        let written = AtomicUsize::new(0);
        let excluded = AtomicUsize::new(0);
        let skipped: Mutex<Vec<SkippedPage>> = Mutex::new(Vec::new());
        let skip = |url: &str, reason: String| {
            skipped
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(SkippedPage {
                    url: url.to_owned(),
                    reason,
                });
        };

        pool.install(|| {
            pages.par_iter().for_each(|page| {
                if self.is_excluded(&page.output_file) {
                    tracing::debug!(path = %page.output_file, "Excluded from output");
                    excluded.fetch_add(1, Ordering::Relaxed);
                    return;
                }

                let html = match renderer.render(&page.url) {
                    Ok(html) => html,
                    Err(e) => {
                        tracing::warn!(
                            url = %page.url,
                            status = ?e.status,
                            timed_out = e.timed_out,
                            error = %e.message,
                            "Skipping page"
                        );
                        skip(&page.url, e.to_string());
                        return;
                    }
                };

                if !created.contains(parent_dir(&page.output_file).unwrap_or("")) {
                    tracing::warn!(url = %page.url, path = %page.output_file, "Skipping page, target directory missing");
                    skip(&page.url, format!("directory for {} missing", page.output_file));
                    return;
                }

                match fs::write(root.join(&page.output_file), html) {
                    Ok(()) => {
                        tracing::debug!(url = %page.url, path = %page.output_file, "Page written");
                        written.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        tracing::warn!(url = %page.url, path = %page.output_file, error = %e, "Failed to write page");
                        skip(&page.url, format!("write failed: {e}"));
                    }
                }
            });
        });

        let mut skipped = skipped.into_inner().unwrap_or_else(PoisonError::into_inner);
        skipped.sort_by(|a, b| a.url.cmp(&b.url));
        report.pages_written += written.into_inner();
        report.excluded += excluded.into_inner();
        report.skipped.extend(skipped);
        Ok(())
    }
}

/// Expand copy items into individual files, later items winning.
fn plan_copies(copies: &[ContentToCopy]) -> Vec<CopyJob> {
    let mut jobs: Vec<CopyJob> = Vec::new();
    for copy in copies {
        let target = normalize(&copy.target_path);
        if copy.source_path.is_dir() {
            for relative in list_files(&copy.source_path) {
                jobs.push(CopyJob {
                    source: copy.source_path.join(&relative),
                    target: join_relative(&target, &relative),
                });
            }
        } else if copy.source_path.is_file() {
            jobs.push(CopyJob {
                source: copy.source_path.clone(),
                target,
            });
        } else {
            tracing::warn!(path = %copy.source_path.display(), "Copy source not found");
        }
    }
    last_wins(jobs, |job| job.target.clone())
}

/// Normalize page output paths, dropping unsafe and duplicate targets.
fn plan_pages(
    pages: &[PageToGenerate],
    report: &mut GenerationReport,
) -> Vec<PageToGenerate> {
    let mut planned = Vec::with_capacity(pages.len());
    for page in pages {
        let output_file = normalize(&page.output_file);
        if !is_safe_relative(&output_file) {
            tracing::warn!(url = %page.url, output_file = %page.output_file, "Output file outside output directory");
            report.skipped.push(SkippedPage {
                url: page.url.clone(),
                reason: format!("invalid output file {}", page.output_file),
            });
            continue;
        }
        planned.push(PageToGenerate {
            output_file,
            ..page.clone()
        });
    }
    last_wins(planned, |page| page.output_file.clone())
}

/// Output-relative path with `/` separators and no leading separator.
fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_owned()
}

fn join_relative(prefix: &str, relative: &Path) -> String {
    let relative = relative
        .iter()
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        relative
    } else {
        format!("{prefix}/{relative}")
    }
}

fn parent_dir(target: &str) -> Option<&str> {
    target.rsplit_once('/').map(|(parent, _)| parent)
}

/// Relative, non-empty, and never climbing out of the output root.
fn is_safe_relative(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Keep only the last item per key, preserving the order of survivors.
fn last_wins<T>(items: Vec<T>, key: impl Fn(&T) -> String) -> Vec<T> {
    let mut last: HashMap<String, usize> = HashMap::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        last.insert(key(item), index);
    }
    items
        .into_iter()
        .enumerate()
        .filter(|(index, item)| last.get(&key(item)) == Some(index))
        .map(|(_, item)| item)
        .collect()
}

/// Files below `dir`, relative to it, sorted.
fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_files(dir, Path::new(""), &mut files);
    files.sort();
    files
}

fn collect_files(dir: &Path, relative: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
            return;
        }
    };

    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let child = relative.join(entry.file_name());
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            collect_files(&path, &child, files);
        } else {
            files.push(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::render::RenderFetchError;

    /// Renders `<p>{url}</p>`, failing for URLs in `failing`.
    struct MockRenderer {
        failing: Vec<&'static str>,
    }

    impl MockRenderer {
        fn ok() -> Self {
            Self { failing: Vec::new() }
        }
    }

    impl Renderer for MockRenderer {
        fn render(&self, url: &str) -> Result<String, RenderFetchError> {
            if self.failing.contains(&url) {
                return Err(RenderFetchError::new(url, "connection reset").with_status(502));
            }
            Ok(format!("<p>{url}</p>"))
        }
    }

    fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
        list_files(root)
            .into_iter()
            .map(|relative| {
                let content = fs::read(root.join(&relative)).unwrap();
                (relative.to_string_lossy().replace('\\', "/"), content)
            })
            .collect()
    }

    fn pages(urls: &[&str]) -> Vec<PageToGenerate> {
        urls.iter()
            .map(|url| {
                PageToGenerate::new(*url, crate::routes::output_file_for_route(url, "index.html"))
            })
            .collect()
    }

    fn static_dir(temp_dir: &TempDir) -> PathBuf {
        let dir = temp_dir.path().join("static");
        fs::create_dir_all(dir.join("css")).unwrap();
        fs::write(dir.join("css/site.css"), "body {}").unwrap();
        fs::write(dir.join("robots.txt"), "User-agent: *").unwrap();
        fs::write(dir.join("favicon.ico"), [0u8, 1, 2]).unwrap();
        dir
    }

    #[test]
    fn test_generate_pages_and_copies() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out");
        let copies = vec![ContentToCopy::new(static_dir(&temp_dir), "")];
        let generator = OutputGenerator::new(GenerateOptions::new(&output));

        let report = generator
            .generate(&pages(&["/", "/about", "/feed.xml"]), &copies, &MockRenderer::ok())
            .unwrap();

        assert_eq!(report.pages_written, 3);
        assert_eq!(report.files_copied, 3);
        assert!(report.is_complete());
        let tree = read_tree(&output);
        let files: Vec<&str> = tree.keys().map(String::as_str).collect();
        assert_eq!(
            files,
            vec![
                "about/index.html",
                "css/site.css",
                "favicon.ico",
                "feed.xml",
                "index.html",
                "robots.txt",
            ]
        );
        assert_eq!(tree["about/index.html"], b"<p>/about</p>");
    }

    #[test]
    fn test_generation_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out");
        let copies = vec![ContentToCopy::new(static_dir(&temp_dir), "assets")];
        let page_list = pages(&["/", "/blog/post", "/tags/rust"]);
        let generator = OutputGenerator::new(GenerateOptions::new(&output).with_concurrency(3));

        generator.generate(&page_list, &copies, &MockRenderer::ok()).unwrap();
        let first = read_tree(&output);
        fs::write(output.join("stale.html"), "left over").unwrap();
        generator.generate(&page_list, &copies, &MockRenderer::ok()).unwrap();
        let second = read_tree(&output);

        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_fetch_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out");
        let generator = OutputGenerator::new(GenerateOptions::new(&output).with_concurrency(2));
        let renderer = MockRenderer {
            failing: vec!["/c"],
        };

        let report = generator
            .generate(&pages(&["/a", "/b", "/c", "/d", "/e"]), &[], &renderer)
            .unwrap();

        assert_eq!(report.pages_written, 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].url, "/c");
        assert!(report.skipped[0].reason.contains("HTTP 502"));
        assert!(!output.join("c/index.html").exists());
        assert!(output.join("d/index.html").exists());
    }

    #[test]
    fn test_exclusions() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out");
        let copies = vec![ContentToCopy::new(static_dir(&temp_dir), "/")];
        let options = GenerateOptions::new(&output)
            .with_exclude(vec!["robots.txt".to_owned(), "\\css\\site.css".to_owned(), "about/index.html".to_owned()]);
        let generator = OutputGenerator::new(options);

        let report = generator
            .generate(&pages(&["/", "/about"]), &copies, &MockRenderer::ok())
            .unwrap();

        let tree = read_tree(&output);
        let files: Vec<&str> = tree.keys().map(String::as_str).collect();
        assert_eq!(files, vec!["favicon.ico", "index.html"]);
        assert_eq!(report.excluded, 3);
        assert_eq!(report.files_copied, 1);
    }

    #[test]
    fn test_single_file_copy() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out");
        let source = temp_dir.path().join("CNAME");
        fs::write(&source, "example.com").unwrap();
        let generator = OutputGenerator::new(GenerateOptions::new(&output));

        let report = generator
            .generate(&[], &[ContentToCopy::new(&source, "meta/CNAME")], &MockRenderer::ok())
            .unwrap();

        assert_eq!(report.files_copied, 1);
        assert_eq!(fs::read_to_string(output.join("meta/CNAME")).unwrap(), "example.com");
    }

    #[test]
    fn test_missing_copy_source_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out");
        let generator = OutputGenerator::new(GenerateOptions::new(&output));

        let report = generator
            .generate(
                &pages(&["/"]),
                &[ContentToCopy::new(temp_dir.path().join("missing"), "assets")],
                &MockRenderer::ok(),
            )
            .unwrap();

        assert_eq!(report.pages_written, 1);
        assert_eq!(report.files_copied, 0);
    }

    #[test]
    fn test_later_page_wins() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out");
        let generator = OutputGenerator::new(GenerateOptions::new(&output));
        let page_list = vec![
            PageToGenerate::new("/first", "index.html"),
            PageToGenerate::new("/second", "/index.html"),
        ];

        let report = generator
            .generate(&page_list, &[], &MockRenderer::ok())
            .unwrap();

        assert_eq!(report.pages_written, 1);
        assert_eq!(
            fs::read_to_string(output.join("index.html")).unwrap(),
            "<p>/second</p>"
        );
    }

    #[test]
    fn test_page_overrides_copied_file() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out");
        let copies = vec![ContentToCopy::new(static_dir(&temp_dir), "")];
        let generator = OutputGenerator::new(GenerateOptions::new(&output));

        generator
            .generate(&pages(&["/robots.txt"]), &copies, &MockRenderer::ok())
            .unwrap();

        assert_eq!(
            fs::read_to_string(output.join("robots.txt")).unwrap(),
            "<p>/robots.txt</p>"
        );
    }

    #[test]
    fn test_output_file_escaping_root_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out");
        let generator = OutputGenerator::new(GenerateOptions::new(&output));

        let report = generator
            .generate(
                &[PageToGenerate::new("/evil", "../evil.html")],
                &[],
                &MockRenderer::ok(),
            )
            .unwrap();

        assert_eq!(report.pages_written, 0);
        assert_eq!(report.skipped.len(), 1);
        assert!(!temp_dir.path().join("evil.html").exists());
    }

    #[test]
    fn test_unsafe_output_root() {
        let generator = OutputGenerator::new(GenerateOptions::new("/"));
        let result = generator.generate(&[], &[], &MockRenderer::ok());
        assert!(matches!(result, Err(GenerateError::UnsafeOutputRoot(_))));
    }

    #[test]
    fn test_uncreatable_output_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let generator = OutputGenerator::new(GenerateOptions::new(blocker.join("out")));

        let result = generator.generate(&[], &[], &MockRenderer::ok());

        assert!(matches!(result, Err(GenerateError::Create { .. })));
    }

    #[test]
    fn test_last_wins() {
        let items = vec![("a", 1), ("b", 2), ("a", 3)];
        let kept = last_wins(items, |(key, _)| (*key).to_owned());
        assert_eq!(kept, vec![("b", 2), ("a", 3)]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/css/site.css"), "css/site.css");
        assert_eq!(normalize("\\css\\site.css"), "css/site.css");
        assert_eq!(normalize("index.html"), "index.html");
    }
}
