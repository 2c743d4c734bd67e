//! On-disk cache of pipeline reports.
//!
//! Reports are stored as JSON under `<output>/cache/<kind>-<key>.json`, where
//! the key digests the pipeline settings together with the dataset contents.
//! A corrupt or unreadable entry is treated as a miss.

use crate::dataset::{hex, Dataset};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub struct ScoreCache {
    dir: PathBuf,
}

impl ScoreCache {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            dir: output_dir.join("cache"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Digest of `kind`, the serialised settings and the dataset fingerprint.
    pub fn key<S: Serialize>(kind: &str, settings: &S, dataset: &Dataset) -> Result<String> {
        let settings = serde_json::to_vec(settings).map_err(|e| Error::Cache {
            path: PathBuf::from(kind),
            reason: e.to_string(),
        })?;
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        hasher.update(&settings);
        hasher.update(dataset.fingerprint().as_bytes());
        Ok(hex(&hasher.finalize()))
    }

    fn path(&self, kind: &str, key: &str) -> PathBuf {
        self.dir.join(format!("{}-{}.json", kind, &key[..key.len().min(16)]))
    }

    pub fn load<T: DeserializeOwned>(&self, kind: &str, key: &str) -> Option<T> {
        let path = self.path(kind, key);
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(value) => {
                tracing::info!(path = %path.display(), "using cached scores");
                Some(value)
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring corrupt cache entry");
                None
            }
        }
    }

    pub fn store<T: Serialize>(&self, kind: &str, key: &str, value: &T) -> Result<PathBuf> {
        let path = self.path(kind, key);
        let failed = |reason: String| Error::Cache {
            path: path.clone(),
            reason,
        };
        fs::create_dir_all(&self.dir).map_err(|e| failed(e.to_string()))?;
        let json = serde_json::to_string(value).map_err(|e| failed(e.to_string()))?;
        fs::write(&path, json).map_err(|e| failed(e.to_string()))?;
        tracing::debug!(path = %path.display(), "scores cached");
        Ok(path)
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_compute<T, F>(&self, kind: &str, key: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.load(kind, key) {
            return Ok(value);
        }
        let value = compute()?;
        if let Err(err) = self.store(kind, key, &value) {
            tracing::warn!(error = %err, "could not write score cache");
        }
        Ok(value)
    }
}

/// Serde adapter for float arrays that may hold NaN.
///
/// JSON has no NaN, so values are written as `{"shape": [..], "data": [..]}`
/// with `null` standing for NaN.
pub mod nan_safe {
    use ndarray::{Array, Dimension, IxDyn};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Encoded {
        shape: Vec<usize>,
        data: Vec<Option<f64>>,
    }

    pub fn serialize<E, S>(value: &Array<f64, E>, serializer: S) -> Result<S::Ok, S::Error>
    where
        E: Dimension,
        S: Serializer,
    {
        Encoded {
            shape: value.shape().to_vec(),
            data: value.iter().map(|v| (!v.is_nan()).then_some(*v)).collect(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, E, D>(deserializer: D) -> Result<Array<f64, E>, D::Error>
    where
        E: Dimension,
        D: Deserializer<'de>,
    {
        let encoded = Encoded::deserialize(deserializer)?;
        let data = encoded.data.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        Array::from_shape_vec(IxDyn(&encoded.shape), data)
            .map_err(D::Error::custom)?
            .into_dimensionality::<E>()
            .map_err(D::Error::custom)
    }
}
