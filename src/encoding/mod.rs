// Encoding model evaluation
//
// Fits an ordinary least-squares regression from reduced features to voxel
// responses on the training partition, predicts the held-out partition, and
// scores the fit as the mean voxel-wise Pearson correlation.
//
// Split policy: the last `val_fraction` of videos (rounded, at least one,
// never all) is held out. Deterministic; no shuffling.

use std::fs::File;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};
use nalgebra::DMatrix;
use ndarray::Array2;
use ndarray_npy::ReadNpyExt;

use crate::error::NeurovidError;

/// Response file for one subject and region of interest.
pub fn roi_response_path(fmri_dir: &Path, sub: &str, roi: &str) -> PathBuf {
    fmri_dir.join(sub).join(format!("{}.npy", roi))
}

/// Train/validation row counts for `n` videos.
pub fn split_counts(n: usize, val_fraction: f64) -> Result<(usize, usize)> {
    if n < 2 {
        return Err(NeurovidError::Config(format!(
            "need at least 2 videos to split, got {}",
            n
        ))
        .into());
    }

    let n_val = ((n as f64 * val_fraction).round() as usize).clamp(1, n - 1);
    Ok((n - n_val, n_val))
}

/// Pearson correlation between two equal-length samples. Returns 0.0 when
/// either side has no variance, so degenerate voxels cannot poison the mean.
pub fn pearson(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len() as f64;
    if n < 2.0 {
        return 0.0;
    }

    let mean_a = a.iter().map(|v| *v as f64).sum::<f64>() / n;
    let mean_b = b.iter().map(|v| *v as f64).sum::<f64>() / n;

    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = *x as f64 - mean_a;
        let dy = *y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }

    (cov / denom) as f32
}

/// Append an intercept column and copy an ndarray block into nalgebra.
fn design_matrix(features: &Array2<f32>, rows: std::ops::Range<usize>) -> DMatrix<f32> {
    let k = features.ncols();
    DMatrix::from_fn(rows.len(), k + 1, |r, c| {
        if c == k {
            1.0
        } else {
            features[[rows.start + r, c]]
        }
    })
}

/// Evaluate the encoding model for one subject/ROI pair.
///
/// `features` rows must align with the training-video order used during
/// extraction; the response matrix must have one row per video.
pub fn perform_encoding(
    features: &Array2<f32>,
    fmri_dir: &Path,
    sub: &str,
    roi: &str,
    val_fraction: f64,
) -> Result<f32> {
    let response_path = roi_response_path(fmri_dir, sub, roi);
    if !response_path.exists() {
        return Err(NeurovidError::NotFound(format!(
            "response file {} for {}/{}",
            response_path.display(),
            sub,
            roi
        ))
        .into());
    }

    let responses = Array2::<f32>::read_npy(File::open(&response_path)?)?;

    let n = features.nrows();
    if responses.nrows() != n {
        return Err(NeurovidError::Shape(format!(
            "{}/{}: {} response rows but {} feature rows",
            sub,
            roi,
            responses.nrows(),
            n
        ))
        .into());
    }

    let n_voxels = responses.ncols();
    let (n_train, n_val) = split_counts(n, val_fraction)?;

    let x_train = design_matrix(features, 0..n_train);
    let x_val = design_matrix(features, n_train..n);
    let y_train = DMatrix::from_fn(n_train, n_voxels, |r, c| responses[[r, c]]);

    // Least-squares weights via SVD; rank-deficient designs fall back to the
    // minimum-norm solution.
    let svd = x_train.svd(true, true);
    let weights = svd
        .solve(&y_train, 1e-6)
        .map_err(|e| anyhow!("least-squares fit failed for {}/{}: {}", sub, roi, e))?;

    let predictions = x_val * weights;

    let mut corr_sum = 0.0f64;
    for voxel in 0..n_voxels {
        let predicted: Vec<f32> = predictions.column(voxel).iter().cloned().collect();
        let actual: Vec<f32> = (n_train..n).map(|r| responses[[r, voxel]]).collect();
        corr_sum += pearson(&predicted, &actual) as f64;
    }

    let score = (corr_sum / n_voxels as f64) as f32;
    log::debug!("{}/{}: r = {:.4} over {} voxels ({} held out)", sub, roi, score, n_voxels, n_val);

    Ok(score)
}
