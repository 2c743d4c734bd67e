//! Visrecon CLI - decode stimuli from fMRI activity or encode activity from stimuli.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use ndarray::Axis;
use std::path::{Path, PathBuf};
use visrecon::config::{ClassifierKind, DatasetSource, EncodingMetric, Penalty, VisreconConfig};
use visrecon::dataset::{self, miyawaki, Dataset};
use visrecon::pipeline::{self, decode::pixel_weights};
use visrecon::report::{
    self, BrainSlice, Figure, GlyphSheet, ReconstructionSheet, ScoreFile, ScoreGrid, ScoreSummary,
};

#[derive(Parser)]
#[command(name = "visrecon")]
#[command(about = "Reconstruct 10x10 visual stimuli from fMRI activity")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "visrecon.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Use the synthetic sample dataset instead of the download
    #[arg(long)]
    sample: bool,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for fold shuffling and sample data
    #[arg(short = 'S', long)]
    seed: Option<u64>,

    /// Recompute scores even when cached
    #[arg(long)]
    no_cache: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut VisreconConfig) {
        if self.sample {
            config.dataset.source = DatasetSource::Sample;
        }
        if let Some(output) = &self.output {
            config.output.directory = output.clone();
        }
        if let Some(seed) = self.seed {
            config.validation.seed = seed;
            config.sample.seed = seed;
        }
        if self.no_cache {
            config.output.cache_scores = false;
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Predict every stimulus pixel from voxel activity
    Decode {
        #[command(flatten)]
        run: RunArgs,

        /// Classifier fitted per pixel
        #[arg(short, long, value_enum)]
        classifier: Option<ClassifierArg>,

        /// Weight penalty for svc and logistic
        #[arg(long, value_enum)]
        penalty: Option<PenaltyArg>,

        /// Inverse regularisation strength for svc and logistic
        #[arg(short = 'C', long = "c")]
        c: Option<f64>,

        /// Pixel whose weight map is reported
        #[arg(long)]
        pixel: Option<usize>,
    },

    /// Predict every voxel's activity from the stimulus pixels
    Encode {
        #[command(flatten)]
        run: RunArgs,

        /// Score used for each voxel
        #[arg(short, long, value_enum)]
        metric: Option<MetricArg>,
    },

    /// Download and unpack the dataset without fitting anything
    Fetch {
        /// Dataset cache directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum, Debug)]
enum ClassifierArg {
    /// Linear SVC, squared hinge loss
    Svc,
    /// Logistic regression
    Logistic,
    /// Thresholded ridge regression
    LeastSquares,
}

impl ClassifierArg {
    fn to_kind(&self) -> ClassifierKind {
        match self {
            ClassifierArg::Svc => ClassifierKind::Svc,
            ClassifierArg::Logistic => ClassifierKind::Logistic,
            ClassifierArg::LeastSquares => ClassifierKind::LeastSquares,
        }
    }
}

#[derive(Clone, ValueEnum, Debug)]
enum PenaltyArg {
    /// Sparse weights
    L1,
    L2,
}

impl PenaltyArg {
    fn to_penalty(&self) -> Penalty {
        match self {
            PenaltyArg::L1 => Penalty::L1,
            PenaltyArg::L2 => Penalty::L2,
        }
    }
}

#[derive(Clone, ValueEnum, Debug)]
enum MetricArg {
    Correlation,
    R2,
}

impl MetricArg {
    fn to_metric(&self) -> EncodingMetric {
        match self {
            MetricArg::Correlation => EncodingMetric::Correlation,
            MetricArg::R2 => EncodingMetric::R2,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("visrecon=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = VisreconConfig::load(Path::new(&cli.config))?;

    match cli.command {
        Commands::Decode {
            run,
            classifier,
            penalty,
            c,
            pixel,
        } => {
            run.apply(&mut config);
            if let Some(classifier) = classifier {
                config.decoding.classifier = classifier.to_kind();
            }
            if let Some(penalty) = penalty {
                config.decoding.penalty = penalty.to_penalty();
            }
            if c.is_some() {
                config.decoding.c = c;
            }
            if let Some(pixel) = pixel {
                config.decoding.highlight_pixel = pixel;
            }
            let dataset = dataset::load(&config)?;
            decode(&dataset, &config)?;
        }

        Commands::Encode { run, metric } => {
            run.apply(&mut config);
            if let Some(metric) = metric {
                config.encoding.metric = metric.to_metric();
            }
            let dataset = dataset::load(&config)?;
            encode(&dataset, &config)?;
        }

        Commands::Fetch { data_dir } => {
            if let Some(data_dir) = data_dir {
                config.dataset.data_dir = data_dir;
            }
            println!(
                "Fetching {} into {}...",
                miyawaki::DATASET_NAME,
                config.dataset.data_dir.display()
            );
            let root = miyawaki::fetch(&config.dataset)?;
            println!("Dataset ready at {}", root.display());
        }
    }

    Ok(())
}

fn saved(figure: &dyn Figure, dir: &Path) -> Result<()> {
    let path = report::save(figure, dir)?;
    println!("  Created {}", path.display());
    Ok(())
}

fn decode(dataset: &Dataset, config: &VisreconConfig) -> Result<()> {
    let out = &config.output.directory;
    let pixel = config.decoding.highlight_pixel;

    println!(
        "Decoding {} trials x {} voxels...",
        dataset.len(),
        dataset.voxels()
    );
    let result = pipeline::decode(dataset, config)?;
    let scores = result.pixel_scores();

    println!("\nCross-validated pixel accuracy ({}):", result.classifier);
    println!("  {}", ScoreSummary::from_scores(scores.view()));
    if let Some(score) = scores.get(pixel) {
        println!("  pixel {}: {:.3}", pixel, score);
    }

    println!("\nFigures:");
    let title = format!("{} accuracy, cross-validated", result.classifier);
    saved(
        &ScoreGrid::accuracy("decoding_scores", &title, scores).with_highlight(pixel),
        out,
    )?;

    if let Some(test) = &result.test {
        println!("\nTest split ({} trials):", test.trials.len());
        println!("  {}", ScoreSummary::from_scores(test.scores.view()));

        let truth = dataset.images().select(Axis(0), &test.trials);
        let title = format!("{} accuracy, test split", result.classifier);
        saved(
            &ScoreGrid::accuracy("decoding_test_scores", &title, test.scores.clone())
                .with_highlight(pixel),
            out,
        )?;
        saved(
            &ReconstructionSheet {
                name: "reconstruction".to_string(),
                title: "Stimulus and reconstruction".to_string(),
                truth: truth.clone(),
                predicted: test.predictions.clone(),
                max_rows: config.output.max_reconstructions,
            },
            out,
        )?;

        let glyphs = GlyphSheet {
            name: "reconstruction".to_string(),
            trials: test.trials.clone(),
            truth,
            predicted: test.predictions.clone(),
            max_rows: config.output.max_reconstructions.min(4),
        };
        println!("\n{}\n", glyphs.render());
        saved(&glyphs, out)?;
    }

    match pixel_weights(dataset, config, pixel) {
        Ok(weights) => {
            let nonzero = weights.iter().filter(|w| **w != 0.0).count();
            println!("\nPixel {} classifier: {} non-zero voxel weights", pixel, nonzero);
            if let Some(mask) = dataset.mask() {
                let name = format!("pixel_{}_weights", pixel);
                let figure = BrainSlice::new(&name, mask.clone(), config.output.slice)
                    .panel(&format!("pixel {} weights", pixel), weights);
                saved(&figure, out)?;
            }
        }
        Err(err) => tracing::warn!(pixel, error = %err, "no weight map for pixel"),
    }

    if config.output.save_scores {
        let path = out.join("decoding_scores.json");
        let file = ScoreFile::new(&result.classifier, &result.fold_scores, result.test.as_ref());
        report::save_json(&file, &path)?;
        println!("Saved scores to {}", path.display());
    }
    Ok(())
}

fn encode(dataset: &Dataset, config: &VisreconConfig) -> Result<()> {
    let out = &config.output.directory;

    println!(
        "Encoding {} voxels from {} trials...",
        dataset.voxels(),
        dataset.len()
    );
    let result = pipeline::encode(dataset, config)?;
    let scores = result.voxel_scores();

    println!("\nCross-validated voxel {:?}:", result.metric);
    println!("  {}", ScoreSummary::from_scores(scores.view()));

    if let Some(test) = &result.test {
        println!("\nTest split ({} trials):", test.trials.len());
        println!("  {}", ScoreSummary::from_scores(test.scores.view()));
    }

    if let Some(mask) = dataset.mask() {
        println!("\nFigures:");
        let (trial, predicted) = match &result.test {
            Some(test) => (test.trials[0], test.predictions.row(0).to_owned()),
            None => (result.train_trials[0], result.predictions.row(0).to_owned()),
        };
        let score_map = BrainSlice::new("encoding_scores", mask.clone(), config.output.slice)
            .panel("cross-validated score", scores);
        saved(&score_map, out)?;

        let activity = BrainSlice::new("encoding_activity", mask.clone(), config.output.slice)
            .panel(
                &format!("trial {} measured", trial),
                dataset.activity().row(trial).to_owned(),
            )
            .panel(&format!("trial {} predicted", trial), predicted);
        saved(&activity, out)?;
    }

    if config.output.save_scores {
        let path = out.join("encoding_scores.json");
        let model = format!("ridge, {:?}", result.metric);
        let file = ScoreFile::new(&model, &result.fold_scores, result.test.as_ref());
        report::save_json(&file, &path)?;
        println!("Saved scores to {}", path.display());
    }
    Ok(())
}
