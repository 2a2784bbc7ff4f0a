use std::io;
use std::path::PathBuf;

/// Content ingestion error.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Content root is missing or cannot be listed.
    #[error("Cannot access content root {}: {source}", path.display())]
    FileAccess {
        /// Content root.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Content root exists but is not a directory.
    #[error("Content root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// A content file could not be read.
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Invalid file name pattern.
    #[error("Invalid content pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}
