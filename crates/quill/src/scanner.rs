//! Markdown post discovery.

use std::fs;
use std::path::{Path, PathBuf};

/// Slug used for a top-level `index.md`.
const ROOT_INDEX_SLUG: &str = "index";

/// A markdown file and the slug its output is written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceFile {
    /// Output path without extension (e.g., "hello-world", "guides/setup").
    pub slug: String,
    pub path: PathBuf,
}

/// Sources that would all be written under the same slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlugConflict {
    pub slug: String,
    pub paths: Vec<PathBuf>,
}

/// Find every `.md` file under `source_dir`, sorted by slug.
///
/// Hidden files and directories are skipped. A directory's `index.md` takes
/// the directory's name. Returns an empty list if the directory doesn't
/// exist.
pub(crate) fn scan(source_dir: &Path) -> Vec<SourceFile> {
    let mut files = Vec::new();
    if source_dir.is_dir() {
        scan_directory(source_dir, "", &mut files);
    }
    files.sort_by(|a, b| a.slug.cmp(&b.slug).then_with(|| a.path.cmp(&b.path)));
    files
}

/// Split off every slug claimed by more than one file (`foo.md` and
/// `foo/index.md`). None of a conflict's files is kept.
///
/// `files` must be sorted by slug, as [`scan`] returns them.
pub(crate) fn take_conflicts(files: Vec<SourceFile>) -> (Vec<SourceFile>, Vec<SlugConflict>) {
    let mut unique = Vec::with_capacity(files.len());
    let mut conflicts = Vec::new();

    for group in files.chunk_by(|a, b| a.slug == b.slug) {
        if let [file] = group {
            unique.push(file.clone());
            continue;
        }
        let slug = group[0].slug.clone();
        tracing::warn!(%slug, sources = group.len(), "Several sources map to one slug");
        conflicts.push(SlugConflict {
            slug,
            paths: group.iter().map(|file| file.path.clone()).collect(),
        });
    }

    (unique, conflicts)
}

fn scan_directory(dir: &Path, prefix: &str, files: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "Cannot read directory");
        return;
    };

    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            scan_directory(&path, &join(prefix, &name), files);
            continue;
        }

        let Some(stem) = name.strip_suffix(".md") else {
            continue;
        };
        let slug = if stem.eq_ignore_ascii_case("index") {
            if prefix.is_empty() {
                ROOT_INDEX_SLUG.to_owned()
            } else {
                prefix.to_owned()
            }
        } else {
            join(prefix, stem)
        };
        files.push(SourceFile { slug, path });
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}/{name}")
    }
}
