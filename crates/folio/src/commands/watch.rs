//! `folio watch` command implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Args;
use folio_watch::ChangeNotifier;

use super::build::{BuildArgs, print_startup};
use crate::error::CliError;
use crate::output::Output;
use crate::site::Site;

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Milliseconds between change checks.
    #[arg(long, default_value_t = 250)]
    poll_ms: u64,
}

impl WatchArgs {
    /// Execute the watch command. Runs until interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or a content directory cannot
    /// be watched.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.build.load_config()?;
        let site = Site::from_config(&config)?;
        let poll = Duration::from_millis(self.poll_ms.max(10));

        let notifier = ChangeNotifier::new();
        let mut watches = Vec::new();
        for source in site.sources() {
            let root = &source.options().content_dir;
            if root.is_dir() {
                watches.push(source.attach(&notifier)?);
            } else {
                output.warning(&format!("Not watching missing directory {}", root.display()));
            }
        }

        // Set from the watcher thread; never block there.
        let dirty = Arc::new(AtomicBool::new(false));
        let _subscription =
            notifier.invalidate_on_change(&dirty, |flag| flag.store(true, Ordering::Release));

        print_startup(&output, &config);
        rebuild(&site, &output);
        output.highlight("Watching for changes (Ctrl+C to stop)");

        loop {
            thread::sleep(poll);
            if !dirty.swap(false, Ordering::AcqRel) {
                continue;
            }
            // Let a burst of editor writes settle into one rebuild.
            thread::sleep(poll);
            dirty.store(false, Ordering::Release);

            output.info("Change detected, rebuilding");
            rebuild(&site, &output);
        }
    }
}

fn rebuild(site: &Site, output: &Output) {
    match site.build() {
        Ok(report) => output.report(&report),
        Err(e) => output.error(&format!("Build failed: {e}")),
    }
}
