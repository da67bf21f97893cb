// Run configuration
//
// All paths, lists, layer identifiers and numeric knobs flow through these
// structs; nothing in the pipelines reads module-level globals.

use std::path::PathBuf;
use serde::Serialize;

use crate::constants::*;

/// Configuration for one encoding-model evaluation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// Pretrained weights bundle (ONNX).
    pub weights_path: PathBuf,
    /// Directory of stimulus videos, consumed in sorted order.
    pub video_dir: PathBuf,
    /// Directory tree of per-subject, per-ROI fMRI response files.
    pub fmri_dir: PathBuf,
    /// Output directory; activation and PCA caches live underneath it.
    pub out_dir: PathBuf,
    /// Graph output name of the evaluated layer; also the cache tag.
    pub layer: String,
    pub subjects: Vec<String>,
    pub rois: Vec<String>,
    pub n_train_videos: usize,
    pub n_components: usize,
    /// Fraction of training videos held out for validation (from the end).
    pub val_fraction: f64,
    pub seed: u64,
}

impl RunConfig {
    pub fn new(
        weights_path: PathBuf,
        video_dir: PathBuf,
        fmri_dir: PathBuf,
        out_dir: PathBuf,
        layer: String,
    ) -> Self {
        Self {
            weights_path,
            video_dir,
            fmri_dir,
            out_dir,
            layer,
            subjects: SUBJECTS.iter().map(|s| s.to_string()).collect(),
            rois: ROIS.iter().map(|s| s.to_string()).collect(),
            n_train_videos: N_TRAIN_VIDEOS,
            n_components: N_COMPONENTS,
            val_fraction: VAL_FRACTION,
            seed: SEED,
        }
    }

    pub fn activations_dir(&self) -> PathBuf {
        self.out_dir.join("activations")
    }

    pub fn pca_dir(&self) -> PathBuf {
        self.out_dir.join("pca_activations")
    }
}

/// Configuration for the qualitative frame-prediction run.
#[derive(Debug, Clone, Serialize)]
pub struct PredictConfig {
    pub weights_path: PathBuf,
    pub video_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Pool size; selection draws from the first n_train_videos sorted paths.
    pub n_train_videos: usize,
    pub n_predictions: usize,
    pub gif_fps: f64,
    pub seed: u64,
}

impl PredictConfig {
    pub fn new(weights_path: PathBuf, video_dir: PathBuf, out_dir: PathBuf) -> Self {
        Self {
            weights_path,
            video_dir,
            out_dir,
            n_train_videos: N_TRAIN_VIDEOS,
            n_predictions: N_PREDICTIONS,
            gif_fps: GIF_FPS,
            seed: SEED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_defaults() {
        let cfg = RunConfig::new(
            PathBuf::from("model.onnx"),
            PathBuf::from("videos"),
            PathBuf::from("fmri"),
            PathBuf::from("out"),
            "layer_16".to_string(),
        );
        assert_eq!(cfg.subjects.len(), 10);
        assert_eq!(cfg.rois.len(), 9);
        assert_eq!(cfg.n_components, 100);
        assert!(cfg.activations_dir().starts_with("out"));
    }
}
