use std::path::PathBuf;

/// A page to fetch from the renderer and write to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PageToGenerate {
    /// Route requested from the renderer.
    pub url: String,
    /// Output path relative to the output root.
    pub output_file: String,
    /// Extra data carried alongside the page.
    pub metadata: Option<serde_json::Value>,
}

impl PageToGenerate {
    /// Create a page without metadata.
    #[must_use]
    pub fn new(url: impl Into<String>, output_file: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output_file: output_file.into(),
            metadata: None,
        }
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Static content copied verbatim into the output.
///
/// `source_path` is either a file or a directory; a directory is mirrored
/// recursively under `target_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentToCopy {
    /// File or directory on disk.
    pub source_path: PathBuf,
    /// Target path relative to the output root.
    pub target_path: String,
}

impl ContentToCopy {
    /// Create a copy item.
    #[must_use]
    pub fn new(source_path: impl Into<PathBuf>, target_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
        }
    }
}
