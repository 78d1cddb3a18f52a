//! `quill build` command implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use quill_config::{CliSettings, Config};
use quill_renderer::RenderedDocument;

use crate::error::CliError;
use crate::output::Output;
use crate::scanner::{self, SlugConflict, SourceFile};

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover quill.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Render GitHub cards as plain links without network access.
    #[arg(long)]
    offline: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            offline: self.offline.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let source_dir = &config.build_resolved.source_dir;
        let output_dir = &config.build_resolved.output_dir;

        output.build_paths(source_dir, output_dir);

        let started = Instant::now();
        let (files, conflicts) = scanner::take_conflicts(scanner::scan(source_dir));
        if files.is_empty() && conflicts.is_empty() {
            output.no_documents(source_dir);
            return Ok(());
        }

        let mut failures = Vec::new();
        for SlugConflict { slug, paths } in &conflicts {
            for path in paths {
                failures.push(format!(
                    "{slug}: {} shares its output path with another source",
                    path.display()
                ));
            }
        }

        let mut inputs = Vec::with_capacity(files.len());
        for SourceFile { slug, path } in files {
            match fs::read(&path) {
                Ok(bytes) => inputs.push((slug, bytes)),
                Err(e) => failures.push(format!("{slug}: {e}")),
            }
        }

        let pipeline = super::pipeline_from_config(&config);
        let results = pipeline.render_all(&inputs);

        let mut written = 0;
        for result in results {
            let doc = match result {
                Ok(doc) => doc,
                Err(e) => {
                    failures.push(e.to_string());
                    continue;
                }
            };
            for warning in &doc.warnings {
                output.document_warning(&doc.id, warning);
            }
            match write_document(output_dir, &doc) {
                Ok(()) => written += 1,
                Err(e) => failures.push(format!("{}: {e}", doc.id)),
            }
        }

        let total = written + failures.len();
        output.build_summary(written, total, started.elapsed());

        if failures.is_empty() {
            return Ok(());
        }
        output.failed_documents(&failures);
        Err(CliError::Failed {
            failed: failures.len(),
            total,
        })
    }
}

/// Write `<slug>.html` and `<slug>.json` under `output_dir`.
fn write_document(output_dir: &Path, doc: &RenderedDocument) -> Result<(), CliError> {
    let html_path = output_dir.join(format!("{}.html", doc.id));
    let json_path = output_dir.join(format!("{}.json", doc.id));

    if let Some(parent) = html_path.parent() {
        fs::create_dir_all(parent).map_err(|source| CliError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&html_path, &doc.html).map_err(|source| CliError::Write {
        path: html_path.clone(),
        source,
    })?;

    let json = serde_json::to_string_pretty(doc)?;
    fs::write(&json_path, json).map_err(|source| CliError::Write {
        path: json_path.clone(),
        source,
    })?;

    tracing::info!(document = %doc.id, path = %html_path.display(), "Wrote document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn project() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("posts/guides")).unwrap();
        fs::write(
            root.join("quill.toml"),
            "[build]\nsource_dir = \"posts\"\noutput_dir = \"out\"\n",
        )
        .unwrap();
        let config = root.join("quill.toml");
        (dir, config)
    }

    fn args(config: PathBuf) -> BuildArgs {
        BuildArgs {
            config: Some(config),
            source_dir: None,
            output_dir: None,
            offline: true,
        }
    }

    #[test]
    fn test_build_writes_html_and_json() {
        let (dir, config) = project();
        let root = dir.path();
        fs::write(
            root.join("posts/hello.md"),
            "---\ntitle: Hello\n---\n# Hello\n\n> [!NOTE]\n> Read this.\n",
        )
        .unwrap();
        fs::write(root.join("posts/guides/index.md"), "# Guides").unwrap();

        args(config).execute().unwrap();

        let html = fs::read_to_string(root.join("out/hello.html")).unwrap();
        assert!(html.contains(r#"<blockquote class="admonition bdm-note">"#));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(root.join("out/hello.json")).unwrap())
                .unwrap();
        assert_eq!(json["id"], "hello");
        assert_eq!(json["frontMatter"]["title"], "Hello");
        assert!(json["metadata"]["wordCount"].as_u64().unwrap() > 0);

        assert!(root.join("out/guides.html").exists());
    }

    #[test]
    fn test_build_reports_failures_and_keeps_others() {
        let (dir, config) = project();
        let root = dir.path();
        fs::write(root.join("posts/good.md"), "Fine.").unwrap();
        fs::write(root.join("posts/bad.md"), b"abc\0def").unwrap();

        let err = args(config).execute().unwrap_err();

        assert!(matches!(err, CliError::Failed { failed: 1, total: 2 }));
        assert!(root.join("out/good.html").exists());
        assert!(!root.join("out/bad.html").exists());
    }

    #[test]
    fn test_build_reports_slug_conflicts() {
        let (dir, config) = project();
        let root = dir.path();
        fs::write(root.join("posts/guides.md"), "# File").unwrap();
        fs::write(root.join("posts/guides/index.md"), "# Index").unwrap();
        fs::write(root.join("posts/other.md"), "Fine.").unwrap();

        let err = args(config).execute().unwrap_err();

        assert!(matches!(err, CliError::Failed { failed: 2, total: 3 }));
        assert!(root.join("out/other.html").exists());
        assert!(!root.join("out/guides.html").exists());
    }

    #[test]
    fn test_build_write_failure_keeps_others() {
        let (dir, config) = project();
        let root = dir.path();
        fs::write(root.join("posts/alpha.md"), "Alpha.").unwrap();
        fs::write(root.join("posts/guides/intro.md"), "Intro.").unwrap();
        fs::write(root.join("posts/zeta.md"), "Zeta.").unwrap();
        // A file where the `guides` output directory should go
        fs::create_dir_all(root.join("out")).unwrap();
        fs::write(root.join("out/guides"), "").unwrap();

        let err = args(config).execute().unwrap_err();

        assert!(matches!(err, CliError::Failed { failed: 1, total: 3 }));
        assert!(root.join("out/alpha.html").exists());
        assert!(root.join("out/zeta.html").exists());
    }

    #[test]
    fn test_build_empty_source_dir() {
        let (dir, config) = project();

        args(config).execute().unwrap();

        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_build_missing_config() {
        let err = args(PathBuf::from("/nonexistent/quill.toml"))
            .execute()
            .unwrap_err();

        assert!(matches!(err, CliError::Config(_)));
    }
}
