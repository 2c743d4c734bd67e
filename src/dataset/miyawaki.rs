//! Miyawaki et al. (2008) visual image reconstruction dataset.
//!
//! 12 figure runs (letters and shapes, the test split) and 20 random-image
//! runs (the training split), each a 4D NIfTI series with a label file,
//! plus a whole-brain mask.

use super::fetch;
use super::labels::{read_labels, Label};
use super::preprocess;
use super::{Dataset, Mask, Split, PIXELS};
use crate::config::DatasetConfig;
use crate::error::DatasetError;
use ndarray::{Array2, ArrayD, Axis};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::{Path, PathBuf};

pub const DATASET_NAME: &str = "miyawaki";
pub const FIGURE_RUNS: usize = 12;
pub const RANDOM_RUNS: usize = 20;

/// One acquisition run and its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub split: Split,
    pub number: usize,
}

impl Run {
    fn kind(&self) -> &'static str {
        match self.split {
            Split::Train => "random",
            Split::Test => "figure",
        }
    }

    pub fn func_path(&self) -> PathBuf {
        Path::new("func").join(format!("data_{}_run{:02}.nii.gz", self.kind(), self.number))
    }

    pub fn label_path(&self) -> PathBuf {
        Path::new("label").join(format!(
            "data_{}_run{:02}_label.csv",
            self.kind(),
            self.number
        ))
    }
}

/// Figure runs first, then random runs, as the archive orders them.
pub fn runs() -> Vec<Run> {
    let figure = (1..=FIGURE_RUNS).map(|number| Run {
        split: Split::Test,
        number,
    });
    let random = (1..=RANDOM_RUNS).map(|number| Run {
        split: Split::Train,
        number,
    });
    figure.chain(random).collect()
}

pub fn mask_path() -> PathBuf {
    Path::new("mask").join("mask.nii.gz")
}

/// Every file the loader reads, relative to the dataset directory.
pub fn expected_files() -> Vec<PathBuf> {
    let runs = runs();
    runs.iter()
        .map(Run::func_path)
        .chain(runs.iter().map(Run::label_path))
        .chain(std::iter::once(mask_path()))
        .collect()
}

/// Download the archive if needed and return the dataset directory.
pub fn fetch(config: &DatasetConfig) -> Result<PathBuf, DatasetError> {
    fetch::ensure_files(
        &config.data_dir,
        DATASET_NAME,
        &config.url,
        &expected_files(),
    )
}

pub fn load(config: &DatasetConfig) -> Result<Dataset, DatasetError> {
    let root = fetch(config)?;
    load_from_dir(&root, config.lag, config.detrend)
}

/// Load, mask, clean and align every run found under `root`.
pub fn load_from_dir(root: &Path, lag: usize, detrend: bool) -> Result<Dataset, DatasetError> {
    let mask = Mask::from_volume(&read_volume(&root.join(mask_path()))?)?;
    tracing::info!(voxels = mask.len(), shape = ?mask.shape(), "mask loaded");

    let mut activity_rows: Vec<Array2<f64>> = Vec::new();
    let mut images: Vec<[u8; PIXELS]> = Vec::new();
    let mut splits = Vec::new();
    let mut run_ids = Vec::new();

    for (run_id, run) in runs().iter().enumerate() {
        let mut signals = mask.apply(&read_volume(&root.join(run.func_path()))?)?;
        preprocess::clean(&mut signals, detrend);
        let labels = read_labels(&root.join(run.label_path()))?;

        let (signals, labels) = align_run(signals, labels, lag)?;
        let keep: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| matches!(l, Label::Image(_)))
            .map(|(i, _)| i)
            .collect();
        tracing::debug!(
            run = %run.func_path().display(),
            volumes = signals.nrows(),
            kept = keep.len(),
            "run aligned"
        );

        activity_rows.push(signals.select(Axis(0), &keep));
        for label in labels {
            if let Label::Image(image) = label {
                images.push(image);
                splits.push(run.split);
                run_ids.push(run_id);
            }
        }
    }

    let views: Vec<_> = activity_rows.iter().map(|a| a.view()).collect();
    let activity = ndarray::concatenate(Axis(0), &views).map_err(|err| DatasetError::Volume {
        path: root.to_path_buf(),
        reason: err.to_string(),
    })?;

    Dataset::new(activity, image_matrix(&images), splits, run_ids, Some(mask))
}

/// Trials × pixels matrix of the kept images.
fn image_matrix(images: &[[u8; PIXELS]]) -> Array2<u8> {
    Array2::from_shape_fn((images.len(), PIXELS), |(t, p)| images[t][p])
}

/// Shift labels by `lag` volumes against the activity of one run.
pub fn align_run(
    signals: Array2<f64>,
    mut labels: Vec<Label>,
    lag: usize,
) -> Result<(Array2<f64>, Vec<Label>), DatasetError> {
    let volumes = signals.nrows();
    if volumes < lag || volumes != labels.len() {
        return Err(DatasetError::TrialMismatch {
            activity: volumes.saturating_sub(lag),
            images: labels.len().saturating_sub(lag),
        });
    }
    labels.truncate(labels.len() - lag);
    let signals = signals.slice(ndarray::s![lag.., ..]).to_owned();
    Ok((signals, labels))
}

pub fn read_volume(path: &Path) -> Result<ArrayD<f32>, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::MissingFile(path.to_path_buf()));
    }
    let volume_error = |reason: String| DatasetError::Volume {
        path: path.to_path_buf(),
        reason,
    };
    let object = ReaderOptions::new()
        .read_file(path)
        .map_err(|err| volume_error(err.to_string()))?;
    object
        .into_volume()
        .into_ndarray::<f32>()
        .map_err(|err| volume_error(err.to_string()))
}
