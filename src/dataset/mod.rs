//! Trials pairing fMRI activity with the 10x10 stimulus shown.
//!
//! A [`Dataset`] is validated once at construction; every pipeline can then
//! rely on activity rows, image rows and split labels describing the same
//! trials.

pub mod fetch;
pub mod labels;
pub mod mask;
pub mod miyawaki;
pub mod preprocess;
pub mod sample;

use crate::config::{DatasetSource, VisreconConfig};
use crate::error::{DatasetError, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use mask::Mask;

/// Rows of the stimulus grid.
pub const IMAGE_ROWS: usize = 10;
/// Columns of the stimulus grid.
pub const IMAGE_COLS: usize = 10;
/// Pixels per stimulus.
pub const PIXELS: usize = IMAGE_ROWS * IMAGE_COLS;

/// Experimental role of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Split {
    /// Random images, used for fitting and cross-validation.
    Train,
    /// Structured figures, held back for reconstruction.
    Test,
}

/// One stimulus presentation, borrowed from its [`Dataset`].
#[derive(Debug, Clone, Copy)]
pub struct Trial<'a> {
    pub id: usize,
    pub run: usize,
    pub split: Split,
    pub activity: ArrayView1<'a, f64>,
    pub image: ArrayView1<'a, u8>,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    activity: Array2<f64>,
    images: Array2<u8>,
    splits: Vec<Split>,
    runs: Vec<usize>,
    mask: Option<Mask>,
}

impl Dataset {
    /// Build a dataset, rejecting anything that does not align trial by trial.
    pub fn new(
        activity: Array2<f64>,
        images: Array2<u8>,
        splits: Vec<Split>,
        runs: Vec<usize>,
        mask: Option<Mask>,
    ) -> Result<Self, DatasetError> {
        let trials = activity.nrows();
        if images.nrows() != trials {
            return Err(DatasetError::TrialMismatch {
                activity: trials,
                images: images.nrows(),
            });
        }
        if images.ncols() != PIXELS {
            return Err(DatasetError::PixelCount {
                expected: PIXELS,
                got: images.ncols(),
            });
        }
        if splits.len() != trials {
            return Err(DatasetError::LabelCount {
                what: "split labels",
                got: splits.len(),
                trials,
            });
        }
        if runs.len() != trials {
            return Err(DatasetError::LabelCount {
                what: "run labels",
                got: runs.len(),
                trials,
            });
        }
        if let Some((trial, value)) = images
            .outer_iter()
            .enumerate()
            .find_map(|(t, row)| row.iter().find(|&&v| v > 1).map(|&v| (t, v)))
        {
            return Err(DatasetError::NonBinaryPixel { trial, value });
        }
        if let Some(mask) = &mask {
            if mask.len() != activity.ncols() {
                return Err(DatasetError::VoxelCount {
                    mask: mask.len(),
                    activity: activity.ncols(),
                });
            }
        }
        if !splits.contains(&Split::Train) {
            return Err(DatasetError::NoTrainingTrials);
        }

        Ok(Self {
            activity,
            images,
            splits,
            runs,
            mask,
        })
    }

    pub fn len(&self) -> usize {
        self.activity.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn voxels(&self) -> usize {
        self.activity.ncols()
    }

    pub fn activity(&self) -> ArrayView2<'_, f64> {
        self.activity.view()
    }

    pub fn images(&self) -> ArrayView2<'_, u8> {
        self.images.view()
    }

    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    pub fn trial(&self, id: usize) -> Trial<'_> {
        Trial {
            id,
            run: self.runs[id],
            split: self.splits[id],
            activity: self.activity.row(id),
            image: self.images.row(id),
        }
    }

    pub fn trials(&self) -> impl Iterator<Item = Trial<'_>> {
        (0..self.len()).map(move |id| self.trial(id))
    }

    /// Trial ids with the given split, in dataset order.
    pub fn indices(&self, split: Split) -> Vec<usize> {
        self.splits
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == split)
            .map(|(i, _)| i)
            .collect()
    }

    /// Activity rows for the given trials.
    pub fn activity_rows(&self, trials: &[usize]) -> Array2<f64> {
        self.activity.select(Axis(0), trials)
    }

    /// Image rows for the given trials, as floats.
    pub fn image_rows(&self, trials: &[usize]) -> Array2<f64> {
        self.images.select(Axis(0), trials).mapv(f64::from)
    }

    /// SHA-256 over activity, images and splits. Keys the score cache.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.len() as u64).to_le_bytes());
        hasher.update((self.voxels() as u64).to_le_bytes());
        for value in self.activity.iter() {
            hasher.update(value.to_le_bytes());
        }
        for pixel in self.images.iter() {
            hasher.update([*pixel]);
        }
        for split in &self.splits {
            hasher.update([matches!(split, Split::Test) as u8]);
        }
        hex(&hasher.finalize())
    }
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Load the dataset selected by the configuration.
pub fn load(config: &VisreconConfig) -> Result<Dataset> {
    let dataset = match config.dataset.source {
        DatasetSource::Miyawaki => miyawaki::load(&config.dataset)?,
        DatasetSource::Sample => sample::generate(&config.sample)?,
    };
    tracing::info!(
        trials = dataset.len(),
        voxels = dataset.voxels(),
        train = dataset.indices(Split::Train).len(),
        test = dataset.indices(Split::Test).len(),
        "dataset loaded"
    );
    Ok(dataset)
}
