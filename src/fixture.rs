//! Fixture materialization.
//!
//! An annotated template tree is copied into an isolated temporary workspace
//! before anything reads it, so a run can never dirty the checked-in
//! fixtures. Template files may carry a `.in` suffix (useful when the raw
//! file would confuse tooling in the source tree); the suffix is stripped on
//! export. The workspace is removed when the [`FixtureTree`] is dropped,
//! whatever the test outcome.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::CONFIG_FILE;
use crate::error::HarnessError;

#[derive(Debug)]
pub struct FixtureTree {
    dir: TempDir,
    files: Vec<PathBuf>,
}

impl FixtureTree {
    /// Copies `template_dir` into a fresh temp workspace.
    pub fn export(template_dir: &Path) -> Result<Self, HarnessError> {
        let export_err = |path: &Path, source: std::io::Error| HarnessError::Export {
            path: path.to_path_buf(),
            source,
        };

        let dir = tempfile::Builder::new()
            .prefix("lsp-conformance-")
            .tempdir()
            .map_err(|e| export_err(template_dir, e))?;

        let mut files = Vec::new();
        let walk = ignore::WalkBuilder::new(template_dir)
            .standard_filters(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();
        for entry in walk {
            let entry = entry.map_err(|e| HarnessError::Export {
                path: template_dir.to_path_buf(),
                source: std::io::Error::other(e),
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let rel = path
                .strip_prefix(template_dir)
                .expect("walker yields paths under its root");
            if rel == Path::new(CONFIG_FILE) {
                // The harness's own config is not a fixture.
                continue;
            }
            let dest = dir.path().join(strip_in_suffix(rel));
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| export_err(parent, e))?;
            }
            fs::copy(path, &dest).map_err(|e| export_err(path, e))?;
            files.push(dest);
        }
        files.sort();

        tracing::debug!(
            "exported {} fixture files from {} to {}",
            files.len(),
            template_dir.display(),
            dir.path().display()
        );
        Ok(Self { dir, files })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Exported file paths, in sorted order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    pub fn read(&self, path: &Path) -> Result<String, HarnessError> {
        fs::read_to_string(path).map_err(|e| HarnessError::Export {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn strip_in_suffix(rel: &Path) -> PathBuf {
    match rel.file_name().and_then(|n| n.to_str()) {
        Some(name) if name.ends_with(".in") => {
            rel.with_file_name(name.trim_end_matches(".in").to_string())
        }
        _ => rel.to_path_buf(),
    }
}
