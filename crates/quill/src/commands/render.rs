//! `quill render` command implementation.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use quill_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render.
    file: PathBuf,

    /// Path to configuration file (default: auto-discover quill.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the full rendered document as JSON instead of the HTML fragment.
    #[arg(long)]
    json: bool,

    /// Render GitHub cards as plain links without network access.
    #[arg(long)]
    offline: bool,
}

impl RenderArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            offline: self.offline.then_some(true),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let bytes = fs::read(&self.file)?;
        let id = self
            .file
            .file_stem()
            .map_or_else(|| "document".to_owned(), |s| s.to_string_lossy().into_owned());

        let doc = super::pipeline_from_config(&config).render_bytes(&id, &bytes)?;
        for warning in &doc.warnings {
            output.document_warning(&id, warning);
        }

        let body = if self.json {
            serde_json::to_string_pretty(&doc)?
        } else {
            doc.html
        };
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(body.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
