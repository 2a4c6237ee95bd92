//! TOML configuration for `burrowd`.
//!
//! Every key is optional. A missing file section falls back to its defaults,
//! and unknown keys are ignored.

use std::path::{Path, PathBuf};

use burrow_blobstor::{BlobStorConfig, Compressor, DEFAULT_COMPRESSION_LEVEL, LookupMode};
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Blob storage settings.
    pub storage: StorageSection,
    /// Metadata index settings.
    pub meta: MetaSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[storage]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Root directory: the file tree lives in `blobs/`, packs in `packs/`,
    /// the index in `meta/`.
    pub data_dir: PathBuf,
    /// Compress records on write. Reads accept both forms regardless.
    pub compress: bool,
    /// zstd level used when `compress` is set.
    pub compression_level: i32,
    /// Lookup strategy for reads without a storage hint: `"sequential"` or `"race"`.
    pub lookup: LookupMode,
}

impl Default for StorageSection {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".burrow"))
            .unwrap_or_else(|| PathBuf::from(".burrow"));
        Self {
            data_dir,
            compress: true,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            lookup: LookupMode::Sequential,
        }
    }
}

/// `[meta]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MetaSection {
    /// Index backend: `"file"` (default) or `"memory"`.
    pub backend: String,
}

impl Default for MetaSection {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Directory of the large-object file tree.
    pub fn blobs_dir(&self) -> PathBuf {
        self.storage.data_dir.join("blobs")
    }

    /// Directory of the small-object pack files.
    pub fn packs_dir(&self) -> PathBuf {
        self.storage.data_dir.join("packs")
    }

    /// Directory of the Fjall index.
    pub fn meta_dir(&self) -> PathBuf {
        self.storage.data_dir.join("meta")
    }

    /// Whether the index should be kept in memory only.
    pub fn meta_in_memory(&self) -> bool {
        self.meta.backend == "memory"
    }

    /// Record codec derived from the `[storage]` section.
    pub fn compressor(&self) -> Compressor {
        Compressor::new(self.storage.compress, self.storage.compression_level)
    }

    /// Dispatcher configuration derived from the `[storage]` section.
    pub fn blobstor_config(&self) -> BlobStorConfig {
        BlobStorConfig {
            compressor: self.compressor(),
            lookup: self.storage.lookup,
        }
    }
}
