use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct WalkConfig {
    /// Descend into symlinked directories.
    pub follow_links: bool,
    /// Apply .gitignore/.ignore rules and skip hidden files.
    pub respect_ignore_files: bool,
    /// Canonical paths never returned (the baseline record itself).
    pub exclude: Vec<PathBuf>,
}

/// Resolve a target to its canonical path, or None if it does not exist.
pub fn resolve_target(target: &Path) -> Option<PathBuf> {
    target.canonicalize().ok()
}

/// Expand a target into the absolute paths of the regular files it covers.
///
/// A file yields itself, a directory yields every regular file below it in
/// file-name order. A target that is missing or is neither yields nothing;
/// deciding whether that matters is left to the caller.
pub fn collect_files(target: &Path, config: &WalkConfig) -> Result<Vec<PathBuf>> {
    let meta = match std::fs::metadata(target) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(path = %target.display(), error = %e, "target not accessible, nothing to scan");
            return Ok(Vec::new());
        }
    };

    let mut files = Vec::new();
    if meta.is_file() {
        push_canonical(&mut files, target, config)?;
    } else if meta.is_dir() {
        walk_dir(target, config, &mut files)?;
    } else {
        tracing::warn!(path = %target.display(), "target is neither a file nor a directory");
    }
    Ok(files)
}

fn walk_dir(root: &Path, config: &WalkConfig, files: &mut Vec<PathBuf>) -> Result<()> {
    let walker = WalkBuilder::new(root)
        .standard_filters(config.respect_ignore_files)
        .follow_links(config.follow_links)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        let Some(ft) = entry.file_type() else {
            continue;
        };
        // Unfollowed symlinks still count when they point at a regular file.
        let is_file = ft.is_file() || (ft.is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        push_canonical(files, entry.path(), config)?;
    }
    Ok(())
}

fn push_canonical(files: &mut Vec<PathBuf>, path: &Path, config: &WalkConfig) -> Result<()> {
    let abs = path
        .canonicalize()
        .with_context(|| format!("resolving path {}", path.display()))?;
    if config.exclude.contains(&abs) {
        tracing::debug!(path = %abs.display(), "skipping excluded file");
        return Ok(());
    }
    files.push(abs);
    Ok(())
}
