// Dimensionality reduction
//
// Loads the cached per-video activation vectors in sorted file order,
// standardizes columns against this matrix only, and projects onto the top
// principal components. The decomposition runs on the videos-by-videos Gram
// matrix with a deterministic symmetric eigensolver and a fixed sign
// convention, so repeated runs produce identical output.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use anyhow::Result;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis};
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use regex::Regex;

use crate::constants::PCA_FILE_PREFIX;
use crate::error::NeurovidError;

/// Persisted location of the reduced feature matrix for a layer.
pub fn pca_output_path(save_dir: &Path, layer: &str) -> PathBuf {
    save_dir.join(format!("{}_{}.npy", PCA_FILE_PREFIX, layer))
}

/// Standardize columns to zero mean and unit variance (population std),
/// computed from this matrix only. Constant columns are centered and left
/// unscaled.
pub fn standardize(matrix: &Array2<f32>) -> Array2<f32> {
    let n = matrix.nrows() as f32;
    let mut out = matrix.clone();

    for mut col in out.axis_iter_mut(Axis(1)) {
        let mean = col.iter().sum::<f32>() / n;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        let std = var.sqrt();
        if std > 0.0 {
            col.mapv_inplace(|v| (v - mean) / std);
        } else {
            col.mapv_inplace(|v| v - mean);
        }
    }

    out
}

/// Principal-component scores of a standardized matrix via its Gram matrix.
///
/// For Z = U S V^T the training scores Z V equal U S, which falls out of the
/// eigendecomposition of Z Z^T without ever forming the (large) feature-space
/// covariance. Eigenvalues are sorted descending; each component's sign is
/// fixed so its largest-magnitude score is positive.
fn principal_scores(z: &Array2<f32>, n_components: usize) -> Array2<f32> {
    let n = z.nrows();
    let gram = z.dot(&z.t());
    let gram = DMatrix::from_row_iterator(n, n, gram.iter().cloned());
    let eig = gram.symmetric_eigen();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eig.eigenvalues[b]
            .partial_cmp(&eig.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut scores = Array2::<f32>::zeros((n, n_components));
    for (j, &idx) in order.iter().take(n_components).enumerate() {
        let sigma = eig.eigenvalues[idx].max(0.0).sqrt();
        let col = eig.eigenvectors.column(idx);

        let mut flip = 1.0f32;
        let mut max_abs = 0.0f32;
        for i in 0..n {
            if col[i].abs() > max_abs {
                max_abs = col[i].abs();
                flip = if col[i] < 0.0 { -1.0 } else { 1.0 };
            }
        }

        for i in 0..n {
            scores[[i, j]] = flip * col[i] * sigma;
        }
    }

    scores
}

/// Standardize and project an activation matrix onto `n_components`
/// components fitted on that same matrix (in-memory variant).
pub fn fit_transform(activations: &Array2<f32>, n_components: usize) -> Result<Array2<f32>> {
    let (n, dim) = (activations.nrows(), activations.ncols());

    if n == 0 || dim == 0 {
        return Err(NeurovidError::Config(
            "cannot reduce an empty activation matrix".to_string(),
        )
        .into());
    }
    if dim < n_components {
        return Err(NeurovidError::Config(format!(
            "activation dimensionality {} is smaller than {} components",
            dim, n_components
        ))
        .into());
    }
    if n < n_components {
        return Err(NeurovidError::Config(format!(
            "only {} videos for {} components",
            n, n_components
        ))
        .into());
    }

    let standardized = standardize(activations);
    Ok(principal_scores(&standardized, n_components))
}

/// Load all cached activation vectors for a layer into a dense matrix, rows
/// in sorted file order.
pub fn load_activation_matrix(activations_dir: &Path, layer: &str) -> Result<Array2<f32>> {
    let pattern = Regex::new(&format!(r"^.+_{}\.npy$", regex::escape(layer)))?;

    let mut files: Vec<PathBuf> = fs::read_dir(activations_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| pattern.is_match(n))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(NeurovidError::Config(format!(
            "no cached activations for layer {} in {}",
            layer,
            activations_dir.display()
        ))
        .into());
    }

    let first = Array1::<f32>::read_npy(File::open(&files[0])?)?;
    let dim = first.len();

    let mut matrix = Array2::<f32>::zeros((files.len(), dim));
    matrix.row_mut(0).assign(&first);

    for (i, path) in files.iter().enumerate().skip(1) {
        let vector = Array1::<f32>::read_npy(File::open(path)?)?;
        if vector.len() != dim {
            return Err(NeurovidError::Shape(format!(
                "{} has {} activations, expected {}",
                path.display(),
                vector.len(),
                dim
            ))
            .into());
        }
        matrix.row_mut(i).assign(&vector);
    }

    Ok(matrix)
}

/// Cache-backed variant: load, reduce and persist the reduced matrix.
pub fn apply_pca(
    activations_dir: &Path,
    save_dir: &Path,
    layer: &str,
    n_components: usize,
) -> Result<Array2<f32>> {
    let activations = load_activation_matrix(activations_dir, layer)?;
    log::info!(
        "reducing {} activation vectors of dim {} to {} components",
        activations.nrows(),
        activations.ncols(),
        n_components
    );

    let reduced = fit_transform(&activations, n_components)?;

    fs::create_dir_all(save_dir)?;
    let out_path = pca_output_path(save_dir, layer);
    reduced.write_npy(File::create(&out_path)?)?;
    log::debug!("saved reduced features to {}", out_path.display());

    Ok(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_stats(matrix: &Array2<f32>, col: usize) -> (f32, f32) {
        let n = matrix.nrows() as f32;
        let column = matrix.column(col);
        let mean = column.iter().sum::<f32>() / n;
        let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        (mean, var)
    }

    #[test]
    fn test_standardize_zero_mean_unit_variance() {
        let matrix =
            Array2::from_shape_vec((4, 2), vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0])
                .unwrap();
        let z = standardize(&matrix);

        for col in 0..2 {
            let (mean, var) = column_stats(&z, col);
            assert!(mean.abs() < 1e-5);
            assert!((var - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_standardize_constant_column() {
        let matrix = Array2::from_shape_vec((3, 1), vec![5.0, 5.0, 5.0]).unwrap();
        let z = standardize(&matrix);
        assert!(z.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_fit_transform_shape() {
        // 10 videos, 50-dim features [i, i, ..., i], 5 components
        let mut matrix = Array2::<f32>::zeros((10, 50));
        for i in 0..10 {
            matrix.row_mut(i).fill(i as f32);
        }

        let reduced = fit_transform(&matrix, 5).unwrap();
        assert_eq!(reduced.dim(), (10, 5));
    }

    #[test]
    fn test_fit_transform_is_deterministic() {
        let matrix = Array2::from_shape_fn((8, 12), |(i, j)| ((i * 7 + j * 3) % 11) as f32);
        let a = fit_transform(&matrix, 4).unwrap();
        let b = fit_transform(&matrix, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_components_ordered_by_variance() {
        let matrix = Array2::from_shape_fn((20, 6), |(i, j)| {
            if j == 0 {
                (i as f32) * 100.0
            } else {
                ((i * j) % 3) as f32
            }
        });

        let reduced = fit_transform(&matrix, 3).unwrap();
        let (_, var0) = column_stats(&reduced, 0);
        let (_, var1) = column_stats(&reduced, 1);
        assert!(var0 >= var1);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let matrix = Array2::<f32>::zeros((0, 10));
        let err = fit_transform(&matrix, 5).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_too_few_dimensions_is_an_error() {
        let matrix = Array2::<f32>::zeros((10, 3));
        let err = fit_transform(&matrix, 5).unwrap_err();
        assert!(err.to_string().contains("smaller than"));
    }

    #[test]
    fn test_too_few_videos_is_an_error() {
        let matrix = Array2::<f32>::zeros((3, 50));
        let err = fit_transform(&matrix, 5).unwrap_err();
        assert!(err.to_string().contains("3 videos"));
    }

    #[test]
    fn test_apply_pca_roundtrip() {
        let act_dir = tempfile::tempdir().unwrap();
        let save_dir = tempfile::tempdir().unwrap();

        for i in 0..4 {
            let vector = Array1::from_shape_fn(6, |j| (i * 6 + j) as f32);
            let path = act_dir.path().join(format!("vid_{:04}_layer_9.npy", i));
            vector.write_npy(File::create(path).unwrap()).unwrap();
        }
        // A file for a different layer must be ignored
        Array1::<f32>::zeros(99)
            .write_npy(File::create(act_dir.path().join("vid_0000_layer_8.npy")).unwrap())
            .unwrap();

        let reduced = apply_pca(act_dir.path(), save_dir.path(), "layer_9", 2).unwrap();
        assert_eq!(reduced.dim(), (4, 2));

        let saved = Array2::<f32>::read_npy(
            File::open(pca_output_path(save_dir.path(), "layer_9")).unwrap(),
        )
        .unwrap();
        assert_eq!(saved, reduced);
    }

    #[test]
    fn test_missing_cache_dir_contents_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_activation_matrix(dir.path(), "layer_1").unwrap_err();
        assert!(err.to_string().contains("no cached activations"));
    }
}
