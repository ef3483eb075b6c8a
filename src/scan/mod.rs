pub mod hasher;
pub mod walker;

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::store::{BaselineRecord, BaselineStore};
use hasher::Fingerprint;
use walker::{WalkConfig, collect_files, resolve_target};

#[derive(Debug, Serialize)]
pub struct InitResult {
    pub files_recorded: usize,
    pub baseline: PathBuf,
}

/// Outcome of comparing live files against the stored baseline.
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    pub files_checked: usize,
    /// Stored fingerprint differs from the live one.
    pub modified: Vec<String>,
    /// No baseline entry for the file.
    pub new_files: Vec<String>,
    /// Baseline entries under the target whose file is gone.
    pub missing: Vec<String>,
}

impl CheckReport {
    /// Only modified files count as tampering.
    pub fn is_intact(&self) -> bool {
        self.modified.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Added { path: String, fingerprint: Fingerprint },
    Replaced { path: String, fingerprint: Fingerprint, previous: Fingerprint },
    NotAFile { path: String },
}

/// Build a fresh baseline for every file under `target`, replacing whatever
/// the store held before.
pub fn init_baseline(target: &Path, store: &BaselineStore, config: &Config) -> Result<InitResult> {
    let files = collect_files(target, &walk_config(store, config))?;
    let hasher = config.hasher();

    let mut record = BaselineRecord::new();
    for path in &files {
        let fingerprint = hasher.hash_file(path)?;
        tracing::debug!(path = %path.display(), %fingerprint, "recorded");
        record.insert(record_key(path), fingerprint);
    }

    store.save(&record)?;
    tracing::info!(
        root = %target.display(),
        files = record.len(),
        algorithm = %hasher.algorithm(),
        "baseline created"
    );

    Ok(InitResult {
        files_recorded: record.len(),
        baseline: store.path().to_path_buf(),
    })
}

/// Compare every file under `target` with its baseline entry. Never writes.
pub fn check_integrity(target: &Path, store: &BaselineStore, config: &Config) -> Result<CheckReport> {
    let record = store.load()?;
    let files = collect_files(target, &walk_config(store, config))?;
    let hasher = config.hasher();

    let mut report = CheckReport {
        files_checked: files.len(),
        ..Default::default()
    };
    let mut seen = HashSet::with_capacity(files.len());

    for path in &files {
        let key = record_key(path);
        let current = hasher.hash_file(path)?;
        match record.get(&key) {
            None => {
                tracing::debug!(path = %key, "no baseline entry");
                report.new_files.push(key.clone());
            }
            Some(stored) if *stored != current => {
                tracing::debug!(path = %key, %stored, %current, "fingerprint mismatch");
                report.modified.push(key.clone());
            }
            Some(_) => {}
        }
        seen.insert(key);
    }

    if let Some(root) = resolve_target(target) {
        for (key, _) in record.iter() {
            let path = Path::new(key);
            if path.starts_with(&root) && !seen.contains(key) && !path.exists() {
                report.missing.push(key.to_string());
            }
        }
    }

    tracing::info!(
        root = %target.display(),
        checked = report.files_checked,
        modified = report.modified.len(),
        new = report.new_files.len(),
        missing = report.missing.len(),
        "check finished"
    );
    Ok(report)
}

/// Refresh the baseline entry for one file after a legitimate change.
/// A path that is not a regular file leaves the store untouched.
pub fn update_entry(path: &Path, store: &BaselineStore, config: &Config) -> Result<UpdateOutcome> {
    if !path.is_file() {
        tracing::warn!(path = %path.display(), "update target is not a regular file");
        return Ok(UpdateOutcome::NotAFile {
            path: path.display().to_string(),
        });
    }

    let abs = path
        .canonicalize()
        .with_context(|| format!("resolving path {}", path.display()))?;
    let mut record = store.load()?;
    let fingerprint = config.hasher().hash_file(&abs)?;
    let key = record_key(&abs);
    let previous = record.insert(key.clone(), fingerprint.clone());
    store.save(&record)?;

    tracing::info!(path = %key, %fingerprint, "baseline entry updated");
    Ok(match previous {
        Some(previous) => UpdateOutcome::Replaced {
            path: key,
            fingerprint,
            previous,
        },
        None => UpdateOutcome::Added {
            path: key,
            fingerprint,
        },
    })
}

fn walk_config(store: &BaselineStore, config: &Config) -> WalkConfig {
    WalkConfig {
        follow_links: config.walk.follow_links,
        respect_ignore_files: config.walk.respect_ignore_files,
        exclude: store.path().canonicalize().ok().into_iter().collect(),
    }
}

// Non UTF-8 path components are stored lossily, so distinct paths may share a key.
fn record_key(path: &Path) -> String {
    match path.to_str() {
        Some(s) => s.to_string(),
        None => {
            let lossy = path.to_string_lossy().into_owned();
            tracing::warn!(path = %lossy, "path is not valid UTF-8, baseline key may collide");
            lossy
        }
    }
}
