//! Per-run signal cleaning. Matrices are volumes × voxels.

use ndarray::{Array2, Axis};

/// Remove each column's mean and, when `linear`, its linear trend.
pub fn detrend(signals: &mut Array2<f64>, linear: bool) {
    let Some(mean) = signals.mean_axis(Axis(0)) else {
        return;
    };
    *signals -= &mean;

    if !linear {
        return;
    }
    let n = signals.nrows();
    let centre = (n as f64 - 1.0) / 2.0;
    let mut regressor: Vec<f64> = (0..n).map(|t| t as f64 - centre).collect();
    let norm = regressor.iter().map(|r| r * r).sum::<f64>().sqrt();
    if norm < f64::EPSILON {
        return;
    }
    regressor.iter_mut().for_each(|r| *r /= norm);

    for mut column in signals.columns_mut() {
        let projection: f64 = column.iter().zip(&regressor).map(|(s, r)| s * r).sum();
        column
            .iter_mut()
            .zip(&regressor)
            .for_each(|(s, r)| *s -= projection * r);
    }
}

/// Scale every column to unit energy. Near-silent columns are left alone.
pub fn standardize(signals: &mut Array2<f64>) {
    for mut column in signals.columns_mut() {
        let energy = column.iter().map(|s| s * s).sum::<f64>().sqrt();
        if energy >= f64::EPSILON {
            column.mapv_inplace(|s| s / energy);
        }
    }
}

/// Clean one run: optional linear detrend, then unit variance per voxel.
pub fn clean(signals: &mut Array2<f64>, linear_detrend: bool) {
    if linear_detrend {
        detrend(signals, true);
    }
    standardize(signals);
    let scale = (signals.nrows() as f64).sqrt();
    signals.mapv_inplace(|s| s * scale);
}
