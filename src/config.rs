//! Configuration loading for visrecon.
//!
//! Configuration is loaded from TOML files with environment variable overrides
//! (`VISRECON__SECTION__KEY`, e.g. `VISRECON__DATASET__DATA_DIR`).

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.default.toml";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct VisreconConfig {
    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub sample: SampleConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub decoding: DecodingConfig,

    #[serde(default)]
    pub encoding: EncodingConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where trials come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSource {
    /// The public Miyawaki 2008 archive, downloaded on first use.
    #[default]
    Miyawaki,
    /// Seeded synthetic trials, see [`SampleConfig`].
    Sample,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    #[serde(default)]
    pub source: DatasetSource,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_url")]
    pub url: String,

    /// Volumes the BOLD response trails its stimulus by.
    #[serde(default = "default_lag")]
    pub lag: usize,

    #[serde(default)]
    pub detrend: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            source: DatasetSource::default(),
            data_dir: default_data_dir(),
            url: default_url(),
            lag: default_lag(),
            detrend: false,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("nilearn_data")
}

fn default_url() -> String {
    "https://www.nitrc.org/frs/download.php/5899/miyawaki2008.tgz?i_agree=1&download_now=1"
        .to_string()
}

fn default_lag() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SampleConfig {
    #[serde(default)]
    pub seed: u64,

    #[serde(default = "default_train_trials")]
    pub train_trials: usize,

    #[serde(default = "default_test_trials")]
    pub test_trials: usize,

    #[serde(default = "default_voxels_per_pixel")]
    pub voxels_per_pixel: usize,

    /// Standard deviation of the Gaussian noise added to every voxel.
    #[serde(default = "default_noise")]
    pub noise: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            train_trials: default_train_trials(),
            test_trials: default_test_trials(),
            voxels_per_pixel: default_voxels_per_pixel(),
            noise: default_noise(),
        }
    }
}

fn default_train_trials() -> usize {
    400
}

fn default_test_trials() -> usize {
    60
}

fn default_voxels_per_pixel() -> usize {
    2
}

fn default_noise() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
    #[serde(default = "default_folds")]
    pub folds: usize,

    #[serde(default = "default_true")]
    pub shuffle: bool,

    #[serde(default)]
    pub seed: u64,

    /// Refit on every training trial and score the held-back test split.
    #[serde(default = "default_true")]
    pub evaluate_test_split: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            folds: default_folds(),
            shuffle: true,
            seed: 0,
            evaluate_test_split: true,
        }
    }
}

fn default_folds() -> usize {
    5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    Svc,
    Logistic,
    LeastSquares,
}

/// Weight penalty of `svc` and `logistic`. L1 leaves most voxel weights at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    #[default]
    L1,
    L2,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecodingConfig {
    #[serde(default)]
    pub classifier: ClassifierKind,

    #[serde(default)]
    pub penalty: Penalty,

    /// Inverse regularisation strength for `svc` and `logistic`. Unset
    /// means the default for the classifier and penalty, see [`Self::c`].
    #[serde(default)]
    pub c: Option<f64>,

    /// Ridge penalty for `least_squares`.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Keep the `select_k` voxels with the highest ANOVA F score per fold.
    /// Zero keeps every voxel.
    #[serde(default = "default_select_k")]
    pub select_k: usize,

    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    #[serde(default = "default_tol")]
    pub tol: f64,

    /// Pixel whose full-data weight map is rendered, row-major index.
    #[serde(default = "default_highlight_pixel")]
    pub highlight_pixel: usize,
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::default(),
            penalty: Penalty::default(),
            c: None,
            alpha: default_alpha(),
            select_k: default_select_k(),
            max_iter: default_max_iter(),
            tol: default_tol(),
            highlight_pixel: default_highlight_pixel(),
        }
    }
}

impl DecodingConfig {
    /// Configured C, or 0.05 for logistic regression, 0.01 for the L1 SVC
    /// and 0.001 for the L2 SVC.
    pub fn c(&self) -> f64 {
        self.c.unwrap_or(match (self.classifier, self.penalty) {
            (ClassifierKind::Logistic, _) => 0.05,
            (_, Penalty::L1) => 0.01,
            (_, Penalty::L2) => 0.001,
        })
    }
}

fn default_alpha() -> f64 {
    1.0
}

fn default_select_k() -> usize {
    500
}

fn default_max_iter() -> usize {
    1000
}

fn default_tol() -> f64 {
    1e-4
}

fn default_highlight_pixel() -> usize {
    42
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMetric {
    #[default]
    Correlation,
    R2,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncodingConfig {
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    #[serde(default)]
    pub metric: EncodingMetric,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            metric: EncodingMetric::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_true")]
    pub save_scores: bool,

    #[serde(default = "default_true")]
    pub cache_scores: bool,

    #[serde(default = "default_max_reconstructions")]
    pub max_reconstructions: usize,

    /// Axial slice used for brain maps; clamped to the volume depth.
    #[serde(default = "default_slice")]
    pub slice: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            save_scores: true,
            cache_scores: true,
            max_reconstructions: default_max_reconstructions(),
            slice: default_slice(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_max_reconstructions() -> usize {
    12
}

fn default_slice() -> usize {
    10
}

impl VisreconConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("VISRECON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let visrecon_config: VisreconConfig = config.try_deserialize()?;
        Ok(visrecon_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> VisreconConfig {
        Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .unwrap()
    }

    #[test]
    fn defaults_when_sections_missing() {
        let config = from_toml("[output]\ndirectory = \"figures\"");
        assert_eq!(config.output.directory, PathBuf::from("figures"));
        assert_eq!(config.validation.folds, 5);
        assert_eq!(config.decoding.classifier, ClassifierKind::Svc);
        assert_eq!(config.decoding.select_k, 500);
        assert_eq!(config.decoding.penalty, Penalty::L1);
        assert_eq!(config.decoding.c(), 0.01);
        assert_eq!(config.dataset.lag, 3);
        assert_eq!(config.dataset.source, DatasetSource::Miyawaki);
    }

    #[test]
    fn c_defaults_follow_classifier_and_penalty() {
        let mut decoding = DecodingConfig::default();
        assert_eq!(decoding.c(), 0.01);
        decoding.penalty = Penalty::L2;
        assert_eq!(decoding.c(), 0.001);
        decoding.classifier = ClassifierKind::Logistic;
        assert_eq!(decoding.c(), 0.05);
        decoding.c = Some(2.0);
        assert_eq!(decoding.c(), 2.0);
    }

    #[test]
    fn parses_custom_values() {
        let config = from_toml(
            "[dataset]\nsource = \"sample\"\n\
             [decoding]\nclassifier = \"least_squares\"\npenalty = \"l2\"\nc = 0.5\n\
             [encoding]\nmetric = \"r2\"\nalpha = 10.0\n\
             [validation]\nfolds = 3\nshuffle = false",
        );
        assert_eq!(config.dataset.source, DatasetSource::Sample);
        assert_eq!(config.decoding.classifier, ClassifierKind::LeastSquares);
        assert_eq!(config.decoding.penalty, Penalty::L2);
        assert_eq!(config.decoding.c(), 0.5);
        assert_eq!(config.encoding.metric, EncodingMetric::R2);
        assert_eq!(config.encoding.alpha, 10.0);
        assert_eq!(config.validation.folds, 3);
        assert!(!config.validation.shuffle);
    }
}
