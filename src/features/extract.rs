// Activation extraction
//
// Runs each video through the frozen model and persists one aggregated
// feature vector per video. The cache is the only recovery mechanism in the
// system: a rerun skips any video whose vector is already on disk.

use std::fs::File;
use std::path::{Path, PathBuf};
use anyhow::Result;
use ndarray::Array1;
use ndarray_npy::WriteNpyExt;

use crate::error::NeurovidError;
use crate::model::VideoModel;
use crate::video::video_stem;

/// Cache file for one video's aggregated activation vector.
pub fn activation_cache_path(cache_dir: &Path, video_path: &Path, layer: &str) -> PathBuf {
    cache_dir.join(format!("{}_{}.npy", video_stem(video_path), layer))
}

/// Extract and cache the activations of a model layer for a set of videos.
///
/// Output dimensionality must be constant across the run; a vector of a
/// different length than the first one computed is a shape error and aborts.
/// Returns the number of newly computed vectors (cache hits excluded).
pub fn extract_activations(
    model: &dyn VideoModel,
    video_list: &[PathBuf],
    cache_dir: &Path,
    layer: &str,
) -> Result<usize> {
    std::fs::create_dir_all(cache_dir)?;

    let mut feature_dim: Option<usize> = None;
    let mut computed = 0;

    for (i, video) in video_list.iter().enumerate() {
        let cache_path = activation_cache_path(cache_dir, video, layer);

        if cache_path.exists() {
            log::debug!("cache hit for {}", cache_path.display());
            continue;
        }

        let features = model.features_for_video(video)?;

        match feature_dim {
            None => feature_dim = Some(features.len()),
            Some(dim) => {
                if features.len() != dim {
                    return Err(NeurovidError::Shape(format!(
                        "activation length changed: {} has {}, expected {}",
                        video.display(),
                        features.len(),
                        dim
                    ))
                    .into());
                }
            }
        }

        let vector = Array1::from(features);
        vector.write_npy(File::create(&cache_path)?)?;
        computed += 1;

        if (i + 1) % 50 == 0 {
            log::info!("extracted activations for {}/{} videos", i + 1, video_list.len());
        }
    }

    log::info!(
        "activation extraction done: {} computed, {} cached",
        computed,
        video_list.len() - computed
    );

    Ok(computed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use anyhow::Result;
    use ndarray_npy::ReadNpyExt;

    use crate::video::{Frame, FrameSpec};

    /// Stub model that fabricates features without touching any video file.
    struct StubModel {
        dim: usize,
        calls: Cell<usize>,
    }

    impl VideoModel for StubModel {
        fn name(&self) -> &str {
            "stub"
        }

        fn frame_spec(&self) -> FrameSpec {
            FrameSpec { width: 2, height: 2, count: 1 }
        }

        fn extract_features(&self, _frames: &[Frame]) -> Result<Vec<f32>> {
            unreachable!("stub extracts straight from the path")
        }

        fn features_for_video(&self, video_path: &Path) -> Result<Vec<f32>> {
            self.calls.set(self.calls.get() + 1);
            // Encode the video's sort position into every component
            let idx = video_stem(video_path)
                .rsplit('_')
                .next()
                .and_then(|s| s.parse::<f32>().ok())
                .unwrap_or(0.0);
            Ok(vec![idx; self.dim])
        }
    }

    fn fake_videos(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("vid_{:04}.mp4", i))).collect()
    }

    #[test]
    fn test_extract_writes_one_file_per_video() {
        let dir = tempfile::tempdir().unwrap();
        let model = StubModel { dim: 8, calls: Cell::new(0) };
        let videos = fake_videos(4);

        let computed = extract_activations(&model, &videos, dir.path(), "layer_1").unwrap();
        assert_eq!(computed, 4);

        for video in &videos {
            let path = activation_cache_path(dir.path(), video, "layer_1");
            assert!(path.exists(), "missing {}", path.display());
            let vector = Array1::<f32>::read_npy(File::open(&path).unwrap()).unwrap();
            assert_eq!(vector.len(), 8);
        }
    }

    #[test]
    fn test_extract_is_idempotent_on_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let model = StubModel { dim: 4, calls: Cell::new(0) };
        let videos = fake_videos(3);

        extract_activations(&model, &videos, dir.path(), "layer_2").unwrap();
        assert_eq!(model.calls.get(), 3);

        let before: Vec<Vec<u8>> = videos
            .iter()
            .map(|v| std::fs::read(activation_cache_path(dir.path(), v, "layer_2")).unwrap())
            .collect();

        // Second run must not recompute or rewrite anything
        let computed = extract_activations(&model, &videos, dir.path(), "layer_2").unwrap();
        assert_eq!(computed, 0);
        assert_eq!(model.calls.get(), 3);

        for (video, bytes) in videos.iter().zip(before) {
            let after = std::fs::read(activation_cache_path(dir.path(), video, "layer_2")).unwrap();
            assert_eq!(after, bytes);
        }
    }

    /// Stub whose output length depends on the video, to trip the dim check.
    struct RaggedStub;

    impl VideoModel for RaggedStub {
        fn name(&self) -> &str {
            "ragged"
        }

        fn frame_spec(&self) -> FrameSpec {
            FrameSpec { width: 2, height: 2, count: 1 }
        }

        fn extract_features(&self, _frames: &[Frame]) -> Result<Vec<f32>> {
            unreachable!()
        }

        fn features_for_video(&self, video_path: &Path) -> Result<Vec<f32>> {
            let n = if video_stem(video_path).ends_with('0') { 4 } else { 5 };
            Ok(vec![1.0; n])
        }
    }

    #[test]
    fn test_inconsistent_dimensionality_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let videos = fake_videos(2);
        let err = extract_activations(&RaggedStub, &videos, dir.path(), "layer_3").unwrap_err();
        assert!(err.to_string().contains("activation length changed"));
    }
}
