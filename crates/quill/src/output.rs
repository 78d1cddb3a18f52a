//! Console reporting for `build` and `render`.
//!
//! Everything goes to stderr so `quill render` can keep stdout for the
//! rendered document.

use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use console::{Style, Term};

/// Reports build progress, document warnings and failures.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    dim: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            dim: Style::new().dim(),
        }
    }

    /// Announce where a build reads posts from and writes pages to.
    pub(crate) fn build_paths(&self, source_dir: &Path, output_dir: &Path) {
        for (label, path) in [("Source", source_dir), ("Output", output_dir)] {
            self.line(&format!("{} {}", self.dim.apply_to(format!("{label}:")), path.display()));
        }
    }

    pub(crate) fn no_documents(&self, source_dir: &Path) {
        self.line(
            &self
                .yellow
                .apply_to(format!("No markdown files found in {}", source_dir.display()))
                .to_string(),
        );
    }

    /// A non-fatal problem in one document.
    pub(crate) fn document_warning(&self, id: &str, warning: &str) {
        self.line(&format!(
            "{} {}: {warning}",
            self.yellow.apply_to("warning"),
            self.dim.apply_to(id)
        ));
    }

    /// Green when every document was written, yellow otherwise.
    pub(crate) fn build_summary(&self, written: usize, total: usize, elapsed: Duration) {
        let style = if written == total {
            &self.green
        } else {
            &self.yellow
        };
        self.line(&style.apply_to(summary_line(written, total, elapsed)).to_string());
    }

    pub(crate) fn failed_documents(&self, failures: &[String]) {
        self.line(&self.red.apply_to("Failed documents:").to_string());
        for failure in failures {
            self.line(&format!("  {}", self.dim.apply_to(failure)));
        }
    }

    /// The error that ended the command.
    pub(crate) fn fatal(&self, err: &impl Display) {
        self.line(&self.red.apply_to(format!("Error: {err}")).to_string());
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }
}

fn summary_line(written: usize, total: usize, elapsed: Duration) -> String {
    let noun = if total == 1 { "document" } else { "documents" };
    format!(
        "Rendered {written} of {total} {noun} in {:.2}s",
        elapsed.as_secs_f64()
    )
}
