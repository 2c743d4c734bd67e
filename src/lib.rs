//! Visrecon - reconstruct visual stimuli from fMRI activity, and back.
//!
//! Decoding fits one classifier per stimulus pixel on voxel activity;
//! encoding fits one ridge regression per voxel on the stimulus pixels.
//! Both are scored with k-fold cross-validation over the training trials.

pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod report;

pub use config::VisreconConfig;
pub use dataset::{Dataset, Split, Trial};
pub use error::{DatasetError, Error, ModelError, Result};
pub use pipeline::{DecodeReport, EncodeReport, TestEvaluation};
pub use report::{Figure, ScoreSummary};
