use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::report::Format;
use crate::scan::hasher::{Algorithm, DEFAULT_CHUNK_SIZE, FileHasher};
use crate::store::DEFAULT_BASELINE_FILE;

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "hashguard.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub baseline: BaselineConfig,
    pub digest: DigestConfig,
    pub walk: WalkOptions,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Record file holding path -> fingerprint (relative to the working dir)
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub algorithm: Algorithm,
    /// Bytes read per step while hashing
    pub chunk_size: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    pub follow_links: bool,
    /// Honour .gitignore/.ignore and skip hidden files
    pub respect_ignore_files: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Print files that have no baseline entry during `check`
    pub show_new: bool,
    pub format: Format,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive for stderr diagnostics (e.g. "warn", "hashguard=debug")
    pub level: String,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_BASELINE_FILE),
        }
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            show_new: true,
            format: Format::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load config from an explicit path, or `hashguard.toml` in `dir` if present,
    /// falling back to defaults. An explicit path that does not exist is an error.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        let config_path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let p = dir.join(CONFIG_FILE);
                if !p.exists() {
                    return Ok(Self::default());
                }
                p
            }
        };
        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading config from {}", config_path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing config from {}", config_path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.digest.chunk_size == 0 {
            bail!("digest.chunk_size must be greater than zero");
        }
        if self.baseline.path.as_os_str().is_empty() {
            bail!("baseline.path must not be empty");
        }
        Ok(())
    }

    pub fn hasher(&self) -> FileHasher {
        FileHasher::new(self.digest.algorithm, self.digest.chunk_size)
    }
}
