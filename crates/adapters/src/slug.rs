// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration packaging
//!
//! A configuration directory is archived as a gzip'd tar ("slug"). Paths
//! matched by `.relayignore` or the default exclusions are left out.

use flate2::write::GzEncoder;
use flate2::Compression;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const IGNORE_FILE: &str = ".relayignore";

const DEFAULT_EXCLUDES: &[&str] = &[".git/", ".relay/"];

#[derive(Debug, Error)]
pub enum PackError {
    #[error("configuration directory {0} does not exist")]
    MissingDirectory(PathBuf),
    #[error("failed to read {path}: {message}")]
    Walk { path: PathBuf, message: String },
    #[error("invalid ignore rules: {0}")]
    Ignore(String),
    #[error("failed to write archive: {0}")]
    Archive(#[from] std::io::Error),
}

/// Ignore rules for one configuration directory, with gitignore semantics
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    matcher: Gitignore,
}

impl IgnoreRules {
    /// Defaults followed by `content`. Lines that are not valid globs are skipped.
    pub fn parse(content: &str) -> Result<Self, PackError> {
        let mut builder = GitignoreBuilder::new("");
        for line in DEFAULT_EXCLUDES.iter().copied().chain(content.lines()) {
            if let Err(e) = builder.add_line(None, line) {
                tracing::warn!(line, error = %e, "skipping invalid ignore pattern");
            }
        }
        let matcher = builder
            .build()
            .map_err(|e| PackError::Ignore(e.to_string()))?;
        Ok(Self { matcher })
    }

    /// Defaults plus the directory's ignore file, if present
    pub fn load(dir: &Path) -> Result<Self, PackError> {
        let content = std::fs::read_to_string(dir.join(IGNORE_FILE)).unwrap_or_default();
        Self::parse(&content)
    }

    /// Whether a `/`-separated relative path is excluded. The last matching
    /// rule wins.
    pub fn is_excluded(&self, rel: &str, is_dir: bool) -> bool {
        self.matcher.matched(Path::new(rel), is_dir).is_ignore()
    }
}

fn relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Archive `dir` into a gzip'd tar, honoring ignore rules
pub fn pack(dir: &Path) -> Result<Vec<u8>, PackError> {
    if !dir.is_dir() {
        return Err(PackError::MissingDirectory(dir.to_path_buf()));
    }
    let rules = IgnoreRules::load(dir)?;
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut archive = tar::Builder::new(encoder);
    archive.follow_symlinks(false);

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match relative(dir, entry.path()) {
            Some(rel) => !rules.is_excluded(&rel, entry.file_type().is_dir()),
            None => true,
        });

    let mut files = 0usize;
    for entry in walker {
        let entry = entry.map_err(|e| PackError::Walk {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
            message: e.to_string(),
        })?;
        let Some(rel) = relative(dir, entry.path()) else {
            continue;
        };
        if entry.file_type().is_dir() {
            archive.append_dir(&rel, entry.path())?;
        } else {
            archive.append_path_with_name(entry.path(), &rel)?;
            files += 1;
        }
    }

    let bytes = archive.into_inner()?.finish()?;
    tracing::debug!(dir = %dir.display(), files, bytes = bytes.len(), "packed configuration");
    Ok(bytes)
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
