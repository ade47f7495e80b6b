//! Document fetching and persisted run state.
//!
//! The crawler only needs one capability from the outside world: turn an
//! absolute URI into bytes. [`LocalStore`] implements it over a remapping
//! table (taxonomy archives unpacked locally, canonical URI prefixes mapped
//! to directories) plus plain local-file reads. [`MemorySource`] backs the
//! tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, XbrlError};
use crate::uri::is_http_url;

/// `resolve(uri) -> bytes | NotFound`.
pub trait DocumentSource {
    fn resolve(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Catalog file format: canonical URI prefixes mapped to local paths.
#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(default)]
    remappings: HashMap<String, String>,
}

/// Serves http(s) URIs from locally unpacked taxonomy packages and anything
/// else straight from the filesystem.
#[derive(Debug, Default)]
pub struct LocalStore {
    /// (uri prefix, local prefix), longest URI prefix first.
    remappings: Vec<(String, PathBuf)>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load remappings from a `catalog.json` next to the unpacked archives.
    /// A missing catalog yields an empty store (local files still resolve).
    pub fn with_catalog(dir: &Path) -> Result<Self> {
        let mut store = Self::new();
        let catalog_path = dir.join("catalog.json");
        if !catalog_path.exists() {
            debug!(path = %catalog_path.display(), "no taxonomy catalog");
            return Ok(store);
        }
        let text = fs::read_to_string(&catalog_path)?;
        let catalog: Catalog = serde_json::from_str(&text)?;
        for (uri_prefix, local) in catalog.remappings {
            store.add_remapping(&uri_prefix, dir.join(local));
        }
        Ok(store)
    }

    pub fn add_remapping(&mut self, uri_prefix: &str, local: PathBuf) {
        self.remappings.push((uri_prefix.to_string(), local));
        self.remappings.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }
}

impl DocumentSource for LocalStore {
    fn resolve(&self, uri: &str) -> Result<Vec<u8>> {
        if is_http_url(uri) {
            for (prefix, local) in &self.remappings {
                if let Some(rest) = uri.strip_prefix(prefix.as_str()) {
                    let path = local.join(rest.trim_start_matches('/'));
                    return fs::read(&path)
                        .map_err(|_| XbrlError::NotFound(uri.to_string()));
                }
            }
            return Err(XbrlError::NotFound(uri.to_string()));
        }
        let path = uri.strip_prefix("file:/").unwrap_or(uri);
        fs::read(path).map_err(|_| XbrlError::NotFound(uri.to_string()))
    }
}

/// In-memory source for tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    docs: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: &str, content: &str) {
        self.docs.insert(uri.to_string(), content.as_bytes().to_vec());
    }
}

impl DocumentSource for MemorySource {
    fn resolve(&self, uri: &str) -> Result<Vec<u8>> {
        self.docs
            .get(uri)
            .cloned()
            .ok_or_else(|| XbrlError::NotFound(uri.to_string()))
    }
}

/// The persisted list of output basenames already produced by earlier runs.
/// Read at start, appended to per produced output, rewritten at the end.
#[derive(Debug)]
pub struct CompletedOutputs {
    path: PathBuf,
    entries: Vec<String>,
}

impl CompletedOutputs {
    pub const FILENAME: &'static str = "preloads.json";

    pub fn load(output_dir: &Path) -> Result<Self> {
        let path = output_dir.join(Self::FILENAME);
        let entries = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            Vec::new()
        };
        Ok(Self { path, entries })
    }

    pub fn contains(&self, basename: &str) -> bool {
        self.entries.iter().any(|e| e == basename)
    }

    pub fn insert(&mut self, basename: String) {
        if !self.contains(&basename) {
            self.entries.push(basename);
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}
