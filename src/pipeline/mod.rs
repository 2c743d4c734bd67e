//! Decoding and encoding pipelines.
//!
//! Both run the same shape of computation: one independent model per unit
//! (pixel or voxel), k-fold cross-validation over the training trials, and
//! held-out predictions concatenated into a prediction matrix. Units are
//! processed sequentially so results depend only on data and seeds.

pub mod cache;
pub mod decode;
pub mod encode;

use crate::config::{ValidationConfig, VisreconConfig};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::model::{Fold, KFold};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

pub use cache::ScoreCache;
pub use decode::DecodeReport;
pub use encode::EncodeReport;

/// Refit-on-all-training evaluation of the held-back test trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEvaluation<T> {
    /// Dataset ids of the test trials, row order of `predictions`.
    pub trials: Vec<usize>,
    /// Test trials × units.
    pub predictions: Array2<T>,
    /// One score per unit.
    #[serde(with = "cache::nan_safe")]
    pub scores: Array1<f64>,
}

/// Mean fold score per unit. A NaN fold makes the unit NaN.
pub fn unit_scores(fold_scores: &Array2<f64>) -> Array1<f64> {
    fold_scores
        .mean_axis(Axis(1))
        .unwrap_or_else(|| Array1::from_elem(fold_scores.nrows(), f64::NAN))
}

/// Run the decoding pipeline, going through the score cache when enabled.
pub fn decode(dataset: &Dataset, config: &VisreconConfig) -> Result<DecodeReport> {
    if !config.output.cache_scores {
        return decode::run(dataset, config);
    }
    let cache = ScoreCache::new(&config.output.directory);
    let key = ScoreCache::key("decode", &(&config.decoding, &config.validation), dataset)?;
    cache.get_or_compute("decode", &key, || decode::run(dataset, config))
}

/// Run the encoding pipeline, going through the score cache when enabled.
pub fn encode(dataset: &Dataset, config: &VisreconConfig) -> Result<EncodeReport> {
    if !config.output.cache_scores {
        return encode::run(dataset, config);
    }
    let cache = ScoreCache::new(&config.output.directory);
    let key = ScoreCache::key("encode", &(&config.encoding, &config.validation), dataset)?;
    cache.get_or_compute("encode", &key, || encode::run(dataset, config))
}

pub(crate) fn folds(config: &ValidationConfig, samples: usize) -> Result<Vec<Fold>> {
    let folds = KFold::new(config.folds, config.shuffle, config.seed).split(samples)?;
    tracing::debug!(folds = folds.len(), samples, "cross-validation folds built");
    Ok(folds)
}

/// Map fold-local positions onto dataset trial ids.
pub(crate) fn trial_ids(pool: &[usize], positions: &[usize]) -> Vec<usize> {
    positions.iter().map(|&i| pool[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn unit_scores_average_folds_and_keep_nan() {
        let scores = array![[1.0, 0.5], [f64::NAN, 1.0]];
        let units = unit_scores(&scores);
        assert_eq!(units[0], 0.75);
        assert!(units[1].is_nan());
    }

    #[test]
    fn positions_map_to_trials() {
        assert_eq!(trial_ids(&[4, 8, 15, 16], &[0, 3]), vec![4, 16]);
    }
}
