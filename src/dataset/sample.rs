//! Synthetic trials with a known pixel-to-voxel mapping.
//!
//! Every voxel has a single pixel as receptive field:
//! `voxel = gain * (2 * pixel - 1) + noise * N(0, 1)`. Training trials show
//! random images, test trials show simple figures. The voxels are laid out
//! retinotopically in a `10 x 10 x voxels_per_pixel` volume so brain maps can
//! be rendered like real data.

use super::{Dataset, Mask, Split, IMAGE_COLS, IMAGE_ROWS, PIXELS};
use crate::config::SampleConfig;
use crate::error::DatasetError;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Trials per synthetic run.
const RUN_LENGTH: usize = 20;

pub fn generate(config: &SampleConfig) -> Result<Dataset, DatasetError> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);
    let per_pixel = config.voxels_per_pixel.max(1);
    let voxels = PIXELS * per_pixel;
    let trials = config.train_trials + config.test_trials;

    let gains: Vec<f64> = (0..voxels).map(|_| rng.gen_range(0.5..1.5)).collect();

    let mut images = Array2::<u8>::zeros((trials, PIXELS));
    let mut splits = Vec::with_capacity(trials);
    for t in 0..config.train_trials {
        for p in 0..PIXELS {
            images[[t, p]] = rng.gen_bool(0.5) as u8;
        }
        splits.push(Split::Train);
    }
    for i in 0..config.test_trials {
        let figure = figure(i);
        for p in 0..PIXELS {
            images[[config.train_trials + i, p]] = figure[p];
        }
        splits.push(Split::Test);
    }

    let mut activity = Array2::<f64>::zeros((trials, voxels));
    for t in 0..trials {
        for v in 0..voxels {
            let pixel = images[[t, v / per_pixel]] as f64;
            let noise: f64 = rng.sample(StandardNormal);
            activity[[t, v]] = gains[v] * (2.0 * pixel - 1.0) + config.noise * noise;
        }
    }

    let runs = (0..trials).map(|t| t / RUN_LENGTH).collect();
    Dataset::new(activity, images, splits, runs, Some(retinotopic_mask(per_pixel)))
}

/// Voxel `v` sits at (row, col, v % per_pixel) of pixel `v / per_pixel`.
fn retinotopic_mask(per_pixel: usize) -> Mask {
    let mut coords = Vec::with_capacity(PIXELS * per_pixel);
    for x in 0..IMAGE_ROWS {
        for y in 0..IMAGE_COLS {
            for z in 0..per_pixel {
                coords.push([x, y, z]);
            }
        }
    }
    Mask::from_coords([IMAGE_ROWS, IMAGE_COLS, per_pixel], coords)
}

/// Structured test figures, cycled by index.
pub fn figure(index: usize) -> [u8; PIXELS] {
    let mut image = [0u8; PIXELS];
    let mut set = |r: usize, c: usize| image[r * IMAGE_COLS + c] = 1;
    match index % 5 {
        // Frame
        0 => {
            for i in 1..9 {
                set(1, i);
                set(8, i);
                set(i, 1);
                set(i, 8);
            }
        }
        // Plus
        1 => {
            for i in 1..9 {
                set(4, i);
                set(5, i);
                set(i, 4);
                set(i, 5);
            }
        }
        // X
        2 => {
            for i in 1..9 {
                set(i, i);
                set(i, 9 - i);
            }
        }
        // Small square
        3 => {
            for r in 3..7 {
                for c in 3..7 {
                    set(r, c);
                }
            }
        }
        // Letter T
        _ => {
            for i in 1..9 {
                set(1, i);
                set(2, i);
            }
            for r in 3..9 {
                set(r, 4);
                set(r, 5);
            }
        }
    }
    image
}
