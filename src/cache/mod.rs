//! Stores of previously generated time-domain templates.
//!
//! Entries are keyed by the decimal string of the template index. A store may
//! record the sample rate of each entry; banks reject entries whose rate
//! differs from their configuration instead of resampling.

use crate::util::{GwBankError, GwBankResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Raw time-domain samples of one cached template.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedSamples {
    pub samples: Vec<f64>,
    /// Sample rate in Hz, if the store records one.
    pub sample_rate: Option<f64>,
}

impl CachedSamples {
    /// Creates an entry without a recorded sample rate.
    pub fn new(samples: Vec<f64>) -> Self {
        Self {
            samples,
            sample_rate: None,
        }
    }

    /// Creates an entry produced at `sample_rate`.
    pub fn with_rate(samples: Vec<f64>, sample_rate: f64) -> Self {
        Self {
            samples,
            sample_rate: Some(sample_rate),
        }
    }
}

/// Key-value access to cached templates.
pub trait FilterCache {
    /// Returns the entry stored under `key`.
    fn fetch(&self, key: &str) -> GwBankResult<CachedSamples>;
}

impl<C: FilterCache + ?Sized> FilterCache for &C {
    fn fetch(&self, key: &str) -> GwBankResult<CachedSamples> {
        (**self).fetch(key)
    }
}

fn missing(key: &str) -> GwBankError {
    GwBankError::MissingCacheEntry {
        key: key.to_string(),
    }
}

/// In-memory cache.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, CachedSamples>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the entry for template `index`.
    pub fn insert(&mut self, index: usize, entry: CachedSamples) {
        self.entries.insert(index.to_string(), entry);
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FilterCache for MemoryCache {
    fn fetch(&self, key: &str) -> GwBankResult<CachedSamples> {
        self.entries.get(key).cloned().ok_or_else(|| missing(key))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonEntry {
    Plain(Vec<f64>),
    Tagged { sample_rate: f64, samples: Vec<f64> },
}

impl From<JsonEntry> for CachedSamples {
    fn from(value: JsonEntry) -> Self {
        match value {
            JsonEntry::Plain(samples) => CachedSamples::new(samples),
            JsonEntry::Tagged {
                sample_rate,
                samples,
            } => CachedSamples::with_rate(samples, sample_rate),
        }
    }
}

/// Cache read from a JSON object of `"index": samples` pairs.
///
/// A value is either a bare sample array or
/// `{"sample_rate": <Hz>, "samples": [...]}`.
#[derive(Clone, Debug)]
pub struct JsonCache {
    path: PathBuf,
    entries: HashMap<String, CachedSamples>,
}

impl JsonCache {
    /// Opens and parses the cache file; failures are reported immediately.
    pub fn open<P: AsRef<Path>>(path: P) -> GwBankResult<Self> {
        let path = path.as_ref().to_path_buf();
        let open_err = |reason: String| GwBankError::CacheOpen {
            path: path.display().to_string(),
            reason,
        };
        let text = fs::read_to_string(&path).map_err(|err| open_err(err.to_string()))?;
        let raw: HashMap<String, JsonEntry> =
            serde_json::from_str(&text).map_err(|err| open_err(err.to_string()))?;
        let entries = raw.into_iter().map(|(k, v)| (k, v.into())).collect();
        Ok(Self { path, entries })
    }

    /// Returns the file this cache was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FilterCache for JsonCache {
    fn fetch(&self, key: &str) -> GwBankResult<CachedSamples> {
        self.entries.get(key).cloned().ok_or_else(|| missing(key))
    }
}
