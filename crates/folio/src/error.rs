//! CLI error types.

use folio_config::ConfigError;
use folio_content::IngestError;
use folio_generate::GenerateError;
use folio_watch::WatchError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Ingest(#[from] IngestError),

    #[error("{0}")]
    Generate(#[from] GenerateError),

    #[error("{0}")]
    Watch(#[from] WatchError),
}
