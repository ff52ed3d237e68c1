//! Precomputed category centroids stored as a JSON file.
//!
//! The cache is advisory. Reads never fail: anything unexpected about the file
//! is reported as a miss and the classifier recomputes the centroid from the
//! seed phrases.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DATA_DIR_ENV: &str = "ADSLOT_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = ".data";
pub const CENTROIDS_FILE_NAME: &str = "ads-centroids.json";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// On-disk layout of the centroid cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CentroidsFile {
    /// Embedding model the centroids were produced with
    pub model: String,
    pub dimension: usize,
    pub centroids: BTreeMap<String, Vec<f32>>,
    pub generated_at: DateTime<Utc>,
}

/// Outcome of looking up one category in the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// A usable centroid
    Hit(Array1<f32>),
    /// No file, or no entry for the key
    Absent,
    /// The file or the entry cannot be trusted
    Invalid(String),
}

/// Reader and writer for the centroid file of one embedding model.
#[derive(Debug, Clone)]
pub struct CentroidCache {
    path: PathBuf,
    model: String,
}

impl CentroidCache {
    pub fn new<P: AsRef<Path>>(path: P, model: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            model: model.into(),
        }
    }

    /// Cache at the default location for the given model
    pub fn new_default(model: impl Into<String>) -> Self {
        Self::new(Self::default_path(), model)
    }

    /// Returns the default centroid file path
    pub fn default_path() -> PathBuf {
        Self::default_data_dir().join(CENTROIDS_FILE_NAME)
    }

    /// Returns the default data directory
    pub fn default_data_dir() -> PathBuf {
        match env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => PathBuf::from(DEFAULT_DATA_DIR),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Looks up the centroid for `key`, reading the file afresh.
    pub async fn lookup(&self, key: &str) -> CacheLookup {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => self.parse_entry(&contents, key),
            Err(e) if e.kind() == io::ErrorKind::NotFound => CacheLookup::Absent,
            Err(e) => CacheLookup::Invalid(format!("unreadable: {}", e)),
        }
    }

    fn parse_entry(&self, contents: &str, key: &str) -> CacheLookup {
        let file: Value = match serde_json::from_str(contents) {
            Ok(value) => value,
            Err(e) => return CacheLookup::Invalid(format!("not valid JSON: {}", e)),
        };

        match file.get("model").and_then(Value::as_str) {
            Some(model) if model == self.model => {}
            other => {
                return CacheLookup::Invalid(format!(
                    "model mismatch: expected {}, found {}",
                    self.model,
                    other.unwrap_or("<none>")
                ))
            }
        }

        let entry = match file.get("centroids").and_then(|c| c.get(key)) {
            Some(entry) => entry,
            None => return CacheLookup::Absent,
        };
        let values = match entry.as_array() {
            Some(values) => values,
            None => return CacheLookup::Invalid(format!("entry for '{}' is not an array", key)),
        };
        if values.is_empty() {
            return CacheLookup::Invalid(format!("entry for '{}' is empty", key));
        }

        let mut centroid = Vec::with_capacity(values.len());
        for value in values {
            match value.as_f64() {
                Some(x) => centroid.push(x as f32),
                None => {
                    return CacheLookup::Invalid(format!("entry for '{}' contains a non-number", key))
                }
            }
        }
        CacheLookup::Hit(Array1::from_vec(centroid))
    }

    /// Best-effort centroid read; every kind of miss collapses to `None`.
    pub async fn try_load_centroid(&self, key: &str) -> Option<Array1<f32>> {
        match self.lookup(key).await {
            CacheLookup::Hit(centroid) => Some(centroid),
            CacheLookup::Absent => {
                debug!("No cached centroid for '{}' in {:?}", key, self.path);
                None
            }
            CacheLookup::Invalid(reason) => {
                warn!("Ignoring cached centroid for '{}' in {:?}: {}", key, self.path, reason);
                None
            }
        }
    }

    /// Reads and parses the whole file without checking the model.
    pub fn load(&self) -> Result<CentroidsFile, CacheError> {
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Replaces the file with `file`, creating the parent directory if needed.
    pub fn write(&self, file: &CentroidsFile) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(file)?;
        fs::write(&self.path, json)?;
        info!(
            "Wrote {} centroids ({} dims, model {}) to {:?}",
            file.centroids.len(),
            file.dimension,
            file.model,
            self.path
        );
        Ok(())
    }
}
