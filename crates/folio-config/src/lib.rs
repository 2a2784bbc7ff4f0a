//! Configuration management for Folio.
//!
//! Parses `folio.toml` with serde and discovers it in the current directory
//! or any parent. Relative paths are resolved against the directory holding
//! the config file. CLI settings can be applied during load via
//! [`CliSettings`].
//!
//! `site.base_url` supports environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override the application base URL.
    pub base_url: Option<String>,
    /// Override the number of concurrent page fetches.
    pub concurrency: Option<usize>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "folio.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,
    /// Generation settings.
    pub generate: GenerateConfig,
    /// Content sets, one per `[[content]]` table.
    pub content: Vec<ContentConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// `[site]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// URL of the running application pages are fetched from.
    pub base_url: String,
    /// Directory the site is written to.
    pub output_dir: PathBuf,
    /// File name for directory-style routes.
    pub index_page: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_owned(),
            output_dir: PathBuf::from("output"),
            index_page: "index.html".to_owned(),
        }
    }
}

/// `[generate]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Maximum concurrent page fetches.
    pub concurrency: usize,
    /// Per-page fetch timeout in seconds.
    pub timeout_secs: u64,
    /// Output-relative paths never written.
    pub exclude: Vec<String>,
    /// Routes rendered in addition to content pages.
    pub routes: Vec<String>,
    /// Explicit pages with a fixed output file.
    pub pages: Vec<PageConfig>,
    /// Static content copied into the output.
    pub copy: Vec<CopyConfig>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout_secs: 30,
            exclude: Vec::new(),
            routes: Vec::new(),
            pages: Vec::new(),
            copy: Vec::new(),
        }
    }
}

/// Explicit page entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageConfig {
    /// Route requested from the application.
    pub url: String,
    /// Output path relative to the output directory.
    pub output_file: String,
}

/// Static content entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CopyConfig {
    /// File or directory to copy (resolved against the config directory).
    pub source: PathBuf,
    /// Target path relative to the output directory.
    #[serde(default)]
    pub target: String,
}

/// Front-matter syntax of a content set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontMatterKind {
    /// `---` fenced YAML.
    #[default]
    Yaml,
    /// `+++` fenced TOML.
    Toml,
}

/// `[[content]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Directory scanned for content files (resolved against the config
    /// directory).
    pub source_dir: PathBuf,
    /// File name glob (default `*.md`).
    #[serde(default)]
    pub pattern: Option<String>,
    /// URL prefix for pages.
    pub page_url: String,
    /// URL prefix for tag pages (default `tags`).
    #[serde(default)]
    pub tags_url: Option<String>,
    /// Media directory relative to `source_dir`.
    #[serde(default)]
    pub media_dir: Option<PathBuf>,
    /// URL the media directory is published under.
    #[serde(default)]
    pub media_url: Option<String>,
    /// Front-matter syntax.
    #[serde(default)]
    pub front_matter: FrontMatterKind,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.base_url`").
        field: String,
        /// Error message (e.g., "${`FOLIO_HOST`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn require_positive(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `folio.toml` in the current directory and its parents, falling
    /// back to defaults rooted at the current directory.
    ///
    /// CLI settings are applied after path resolution and validated along
    /// with the rest of the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            tracing::debug!(path = %discovered.display(), "Discovered config file");
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Per-page fetch timeout.
    #[must_use]
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.generate.timeout_secs)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.site.base_url, "site.base_url")?;
        require_http_url(&self.site.base_url, "site.base_url")?;
        require_non_empty(&self.site.index_page, "site.index_page")?;
        require_positive(
            u64::try_from(self.generate.concurrency).unwrap_or(u64::MAX),
            "generate.concurrency",
        )?;
        require_positive(self.generate.timeout_secs, "generate.timeout_secs")?;

        for (i, content) in self.content.iter().enumerate() {
            require_non_empty(&content.page_url, &format!("content[{i}].page_url"))?;
            if content.media_dir.is_some() != content.media_url.is_some() {
                return Err(ConfigError::Validation(format!(
                    "content[{i}].media_dir and content[{i}].media_url must be set together"
                )));
            }
            if content.source_dir.exists() && !content.source_dir.is_dir() {
                return Err(ConfigError::Validation(format!(
                    "content[{i}].source_dir is not a directory: {}",
                    content.source_dir.display()
                )));
            }
        }

        for (i, page) in self.generate.pages.iter().enumerate() {
            require_non_empty(&page.url, &format!("generate.pages[{i}].url"))?;
            require_non_empty(&page.output_file, &format!("generate.pages[{i}].output_file"))?;
        }

        Ok(())
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(output_dir) = &settings.output_dir {
            self.site.output_dir.clone_from(output_dir);
        }
        if let Some(base_url) = &settings.base_url {
            self.site.base_url.clone_from(base_url);
        }
        if let Some(concurrency) = settings.concurrency {
            self.generate.concurrency = concurrency;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfig {
                output_dir: base.join("output"),
                ..SiteConfig::default()
            },
            generate: GenerateConfig::default(),
            content: Vec::new(),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.base_url = expand::expand_env(&self.site.base_url, "site.base_url")?;
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    ///
    /// Rejects empty `source_dir` values, which would otherwise resolve to
    /// the config directory itself.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        self.site.output_dir = config_dir.join(&self.site.output_dir);

        for (i, content) in self.content.iter_mut().enumerate() {
            if content.source_dir.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "content[{i}].source_dir cannot be empty"
                )));
            }
            content.source_dir = config_dir.join(&content.source_dir);
        }

        for copy in &mut self.generate.copy {
            copy.source = config_dir.join(&copy.source);
        }

        Ok(())
    }
}
