//! `folio build` command implementation.

use std::path::PathBuf;

use clap::Args;
use folio_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;
use crate::site::Site;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// URL of the running application (overrides config).
    #[arg(long, env = "FOLIO_BASE_URL")]
    base_url: Option<String>,

    /// Maximum concurrent page fetches (overrides config).
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Load configuration with CLI overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            output_dir: self.output_dir.clone(),
            base_url: self.base_url.clone(),
            concurrency: self.concurrency,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }

    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, content cannot be ingested,
    /// or the output directory cannot be recreated.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.load_config()?;
        let site = Site::from_config(&config)?;

        print_startup(&output, &config);
        let report = site.build()?;
        output.report(&report);

        Ok(())
    }
}

/// Print where the site comes from and where it goes.
pub(crate) fn print_startup(output: &Output, config: &Config) {
    output.highlight(&format!("Generating site from {}", config.site.base_url));
    output.info(&format!(
        "Output directory: {}",
        config.site.output_dir.display()
    ));
    for content in &config.content {
        output.info(&format!(
            "Content: {} -> /{}",
            content.source_dir.display(),
            content.page_url.trim_matches('/')
        ));
    }
}
