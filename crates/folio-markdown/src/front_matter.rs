//! Front matter detection and deserialization.
//!
//! A front-matter block is delimited by a fence line (`---` for YAML, `+++`
//! for TOML) at the very start of the file and a matching closing fence.
//! Formats decode the block into a `serde_json::Value` first, which is then
//! shaped into the caller's front-matter type.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error decoding a front-matter block.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    /// YAML syntax error.
    #[error("Invalid YAML front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// TOML syntax error.
    #[error("Invalid TOML front matter: {0}")]
    Toml(#[from] toml::de::Error),
    /// Block parsed but does not fit the front-matter type.
    #[error("Front matter does not match expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Metadata carried by every content page.
///
/// Implementors must provide a draft flag; tags are optional.
pub trait FrontMatter: DeserializeOwned + Default + Send + Sync + 'static {
    /// Whether the page is a draft and must be excluded from the site.
    fn is_draft(&self) -> bool;

    /// Raw tag names as written by the author.
    fn tags(&self) -> &[String] {
        &[]
    }
}

/// Front-matter syntax.
pub trait FrontMatterFormat: Send + Sync {
    /// Delimiter line opening and closing the block.
    fn fence(&self) -> &'static str;

    /// Decode the text between the fences.
    fn parse(&self, block: &str) -> Result<serde_json::Value, FrontMatterError>;
}

/// YAML front matter fenced by `---`.
#[derive(Clone, Copy, Debug, Default)]
pub struct YamlFormat;

impl FrontMatterFormat for YamlFormat {
    fn fence(&self) -> &'static str {
        "---"
    }

    fn parse(&self, block: &str) -> Result<serde_json::Value, FrontMatterError> {
        Ok(serde_yaml::from_str(block)?)
    }
}

/// TOML front matter fenced by `+++`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TomlFormat;

impl FrontMatterFormat for TomlFormat {
    fn fence(&self) -> &'static str {
        "+++"
    }

    fn parse(&self, block: &str) -> Result<serde_json::Value, FrontMatterError> {
        let table: toml::Table = toml::from_str(block)?;
        Ok(toml_to_json(toml::Value::Table(table)))
    }
}

/// Datetimes become their RFC 3339 string so they fit `String` fields.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::Value::from(i),
        toml::Value::Float(f) => serde_json::Value::from(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Split a file into its front-matter block and body.
///
/// The first line (after an optional BOM) must be exactly `fence`, and a later
/// line must close it. Without both, the whole text is body.
#[must_use]
pub fn split_front_matter<'a>(text: &'a str, fence: &str) -> (Option<&'a str>, &'a str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return (None, text);
    };
    if first.trim_end() != fence {
        return (None, text);
    }

    let block_start = first.len();
    let mut offset = block_start;
    for line in lines {
        if line.trim_end() == fence {
            return (Some(&text[block_start..offset]), &text[offset + line.len()..]);
        }
        offset += line.len();
    }

    (None, text)
}

/// Stock front matter for blog-style pages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageFrontMatter {
    /// Page title.
    pub title: Option<String>,
    /// Short summary.
    pub description: Option<String>,
    /// Publication date as written.
    #[serde(alias = "date")]
    pub published: Option<String>,
    /// Tag names.
    pub tags: Vec<String>,
    /// Excluded from the site when set.
    #[serde(alias = "isDraft")]
    pub draft: bool,
    /// Author names.
    pub authors: Vec<String>,
    /// Any other keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FrontMatter for PageFrontMatter {
    fn is_draft(&self) -> bool {
        self.draft
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Decode a block into `T`, treating a blank block as empty.
pub(crate) fn deserialize<T: DeserializeOwned + Default>(
    format: &dyn FrontMatterFormat,
    block: &str,
) -> Result<T, FrontMatterError> {
    if block.trim().is_empty() {
        return Ok(T::default());
    }
    let value = format.parse(block)?;
    Ok(serde_json::from_value(value)?)
}
