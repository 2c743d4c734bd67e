//! Error types shared by the loader, the model toolkit and the pipelines.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error returned by the pipelines.
#[derive(Error, Debug)]
pub enum Error {
    /// The dataset could not be fetched, read or aligned. Fatal.
    #[error("dataset unavailable: {0}")]
    DataUnavailable(#[from] DatasetError),

    /// A model failed in a way the pipeline cannot absorb per unit.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Pixel index outside the 10x10 grid
    #[error("pixel {0} is outside the image")]
    InvalidPixel(usize),

    /// The score cache could not be written or read.
    #[error("score cache {path}: {reason}")]
    Cache {
        /// Cache file involved
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// A score file next to the figures could not be written.
    #[error("cannot write {path}: {reason}")]
    Report {
        /// Output file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },
}

/// Reasons a dataset is unavailable.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Download of the archive failed
    #[error("download of {url} failed: {reason}")]
    Download {
        /// Source URL
        url: String,
        /// Transport or HTTP failure
        reason: String,
    },

    /// Filesystem failure while caching or reading
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Expected file missing after fetching
    #[error("missing dataset file {0}")]
    MissingFile(PathBuf),

    /// NIfTI volume could not be decoded
    #[error("cannot read volume {path}: {reason}")]
    Volume {
        /// Volume file
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// Label file line is malformed
    #[error("malformed label file {path}, line {line}: {reason}")]
    Label {
        /// Label file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Mask volume is not three-dimensional
    #[error("mask volume must be 3D, got shape {shape:?}")]
    MaskShape {
        /// Shape of the mask file
        shape: Vec<usize>,
    },

    /// Mask and functional volume disagree on spatial shape
    #[error("mask shape {mask:?} differs from volume shape {volume:?}")]
    MaskMismatch {
        /// Mask shape
        mask: Vec<usize>,
        /// Functional volume spatial shape
        volume: Vec<usize>,
    },

    /// Activity and image arrays do not describe the same trials
    #[error("activity has {activity} trials but images have {images}")]
    TrialMismatch {
        /// Activity rows
        activity: usize,
        /// Image rows
        images: usize,
    },

    /// Image vectors have the wrong number of pixels
    #[error("image vectors must have {expected} pixels, got {got}")]
    PixelCount {
        /// Expected pixel count
        expected: usize,
        /// Pixel count found
        got: usize,
    },

    /// A pixel value outside {0, 1}
    #[error("trial {trial} has non-binary pixel value {value}")]
    NonBinaryPixel {
        /// Trial index
        trial: usize,
        /// Offending value
        value: u8,
    },

    /// Split or run labels do not cover every trial
    #[error("{what} has {got} entries for {trials} trials")]
    LabelCount {
        /// Which per-trial annotation
        what: &'static str,
        /// Entries found
        got: usize,
        /// Trials in the dataset
        trials: usize,
    },

    /// Mask voxel count disagrees with the activity width
    #[error("mask selects {mask} voxels but activity has {activity}")]
    VoxelCount {
        /// Voxels in the mask
        mask: usize,
        /// Activity columns
        activity: usize,
    },

    /// Nothing to train on
    #[error("dataset has no training trials")]
    NoTrainingTrials,
}

/// Model toolkit failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Iterative solver stopped before meeting its tolerance
    #[error("{solver} did not converge within {iterations} iterations")]
    NotConverged {
        /// Solver name
        solver: &'static str,
        /// Iterations performed
        iterations: usize,
    },

    /// Linear system is not positive definite
    #[error("{size}x{size} system matrix is not positive definite")]
    Singular {
        /// Order of the system
        size: usize,
    },

    /// Feature matrix and target disagree
    #[error("{rows} rows of features for {targets} targets")]
    ShapeMismatch {
        /// Feature rows
        rows: usize,
        /// Target entries
        targets: usize,
    },

    /// Cross-validation cannot be built
    #[error("cannot split {samples} samples into {folds} folds")]
    InvalidFolds {
        /// Requested folds
        folds: usize,
        /// Samples available
        samples: usize,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
