//! Colored terminal output utilities.

use console::{Style, Term};
use folio_generate::GenerationReport;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a highlighted message (cyan bold).
    pub(crate) fn highlight(&self, msg: &str) {
        let _ = self
            .term
            .write_line(&self.cyan_bold.apply_to(msg).to_string());
    }

    /// Print the outcome of a generation run.
    pub(crate) fn report(&self, report: &GenerationReport) {
        for skipped in &report.skipped {
            self.warning(&format!("  skipped {}: {}", skipped.url, skipped.reason));
        }
        if report.copy_failures > 0 {
            self.warning(&format!(
                "  {} file(s) failed to copy",
                report.copy_failures
            ));
        }

        let summary = format!(
            "Wrote {} page(s) and {} file(s) in {:.2}s ({} skipped, {} excluded)",
            report.pages_written,
            report.files_copied,
            report.elapsed.as_secs_f64(),
            report.skipped.len(),
            report.excluded,
        );
        if report.is_complete() {
            self.success(&summary);
        } else {
            self.warning(&summary);
        }
    }
}
