use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::scan::hasher::Fingerprint;

/// Record file name used when nothing else is configured.
pub const DEFAULT_BASELINE_FILE: &str = "file_hashes.json";

/// Absolute file path to fingerprint, as persisted on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineRecord {
    entries: BTreeMap<String, Fingerprint>,
}

impl BaselineRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&Fingerprint> {
        self.entries.get(path)
    }

    /// Insert or replace one entry, returning the previous fingerprint.
    pub fn insert(&mut self, path: String, fingerprint: Fingerprint) -> Option<Fingerprint> {
        self.entries.insert(path, fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fingerprint)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse persisted JSON. Values must be well-formed fingerprints and keys
    /// absolute paths; anything else is a format error, never an empty record.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let record: Self = serde_json::from_str(text)?;
        if let Some(key) = record.entries.keys().find(|k| !Path::new(k).is_absolute()) {
            return Err(serde::de::Error::custom(format!(
                "baseline key {key:?} is not an absolute path"
            )));
        }
        Ok(record)
    }

    /// Pretty JSON with four-space indentation and a trailing newline.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// The single record file a baseline is loaded from and saved to.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the record. Returns an empty record if no file exists yet.
    pub fn load(&self) -> Result<BaselineRecord> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no baseline record, starting empty");
            return Ok(BaselineRecord::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading baseline from {}", self.path.display()))?;
        let record = BaselineRecord::from_json(&contents)
            .with_context(|| format!("parsing baseline from {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), entries = record.len(), "loaded baseline");
        Ok(record)
    }

    /// Replace the record file with `record`.
    ///
    /// Written to a sibling temp file and renamed into place, so an
    /// interrupted save leaves the previous record intact.
    pub fn save(&self, record: &BaselineRecord) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating baseline dir {}", dir.display()))?;

        let contents = record.to_json()?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        tmp.write_all(contents.as_bytes())
            .and_then(|_| tmp.flush())
            .with_context(|| format!("writing baseline to {}", tmp.path().display()))?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("writing baseline to {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), entries = record.len(), "saved baseline");
        Ok(())
    }
}
