// Experiment driver
//
// Orchestrates the full encoding evaluation for one model family: discover
// the stimulus videos, extract and reduce features, score every
// subject/region pair, persist the score matrix, and render the summary
// chart. There is no checkpointing; the first failure aborts the run.

use std::fs::File;
use std::path::PathBuf;
use anyhow::Result;
use ndarray::{Array2, Axis};
use ndarray_npy::WriteNpyExt;
use serde::Serialize;

use crate::config::RunConfig;
use crate::constants::{SCORES_FILE_PREFIX, SUMMARY_FILE_PREFIX};
use crate::encoding::perform_encoding;
use crate::error::NeurovidError;
use crate::features::{extract::extract_activations, reduce::apply_pca};
use crate::model::VideoModel;
use crate::plot::render_roi_chart;
use crate::tools::require_tools;
use crate::video::discover_videos;

/// What a completed run produced.
#[derive(Debug)]
pub struct EncodingOutcome {
    /// Subjects x ROIs mean voxel-wise correlations.
    pub scores: Array2<f32>,
    pub scores_path: PathBuf,
    pub chart_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    model: &'a str,
    finished_at: String,
    config: &'a RunConfig,
    per_roi_mean: Vec<f32>,
    per_roi_std: Vec<f32>,
}

/// Run the complete encoding evaluation for one model.
pub fn run_encoding(config: &RunConfig, model: &dyn VideoModel) -> Result<EncodingOutcome> {
    log::info!(
        "encoding run: model={} layer={} videos={}",
        model.name(),
        config.layer,
        config.video_dir.display()
    );

    require_tools(&["ffmpeg", "ffprobe"])?;

    let videos = discover_videos(&config.video_dir)?;
    if videos.len() < config.n_train_videos {
        return Err(NeurovidError::Config(format!(
            "found {} videos, need {} training videos",
            videos.len(),
            config.n_train_videos
        ))
        .into());
    }
    let train_videos = &videos[..config.n_train_videos];

    extract_activations(model, train_videos, &config.activations_dir(), &config.layer)?;

    let features = apply_pca(
        &config.activations_dir(),
        &config.pca_dir(),
        &config.layer,
        config.n_components,
    )?;

    let n_subs = config.subjects.len();
    let n_rois = config.rois.len();
    let mut scores = Array2::<f32>::zeros((n_subs, n_rois));

    for (i, sub) in config.subjects.iter().enumerate() {
        for (j, roi) in config.rois.iter().enumerate() {
            let score = perform_encoding(
                &features,
                &config.fmri_dir,
                sub,
                roi,
                config.val_fraction,
            )?;
            scores[[i, j]] = score;
            log::info!("{} {} r = {:.4}", sub, roi, score);
        }
    }

    std::fs::create_dir_all(&config.out_dir)?;

    let scores_path = config
        .out_dir
        .join(format!("{}_{}.npy", SCORES_FILE_PREFIX, model.name()));
    scores.write_npy(File::create(&scores_path)?)?;
    log::info!("saved score matrix to {}", scores_path.display());

    // Per-region mean and std across subjects
    let (means, stds) = roi_statistics(&scores);
    for ((roi, mean), std) in config.rois.iter().zip(&means).zip(&stds) {
        log::info!("{:>4}: mean r = {:.4} (std {:.4})", roi, mean, std);
    }

    let summary = RunSummary {
        model: model.name(),
        finished_at: chrono::Utc::now().to_rfc3339(),
        config,
        per_roi_mean: means.clone(),
        per_roi_std: stds.clone(),
    };
    let summary_path = summary_path(&config.out_dir, model.name());
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;

    let chart_path = config
        .out_dir
        .join(format!("encoding_{}.png", config.layer));
    render_roi_chart(
        &chart_path,
        &layer_title(&config.layer),
        &config.rois,
        &means,
        &stds,
    )?;

    Ok(EncodingOutcome {
        scores,
        scores_path,
        chart_path,
    })
}

/// Run summary location, keyed by model so evaluating both families into
/// the same out dir keeps both summaries.
pub fn summary_path(out_dir: &std::path::Path, model_name: &str) -> PathBuf {
    out_dir.join(format!("{}_{}.json", SUMMARY_FILE_PREFIX, model_name))
}

/// Column-wise mean and population standard deviation across subjects.
pub fn roi_statistics(scores: &Array2<f32>) -> (Vec<f32>, Vec<f32>) {
    let n = scores.nrows() as f32;
    let mut means = Vec::with_capacity(scores.ncols());
    let mut stds = Vec::with_capacity(scores.ncols());

    for col in scores.axis_iter(Axis(1)) {
        let mean = col.iter().sum::<f32>() / n;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        means.push(mean);
        stds.push(var.sqrt());
    }

    (means, stds)
}

/// "layer_4" -> "Layer 4" for the chart caption.
pub fn layer_title(layer: &str) -> String {
    let spaced = layer.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roi_statistics() {
        let scores =
            Array2::from_shape_vec((2, 2), vec![0.2, 0.4, 0.4, 0.8]).unwrap();
        let (means, stds) = roi_statistics(&scores);
        assert!((means[0] - 0.3).abs() < 1e-6);
        assert!((means[1] - 0.6).abs() < 1e-6);
        assert!((stds[0] - 0.1).abs() < 1e-6);
        assert!((stds[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_summary_path_keyed_by_model() {
        let out = std::path::Path::new("/out");
        let prednet = summary_path(out, "prednet");
        let vgg = summary_path(out, "vgg19");
        assert_eq!(prednet, std::path::Path::new("/out/run_summary_prednet.json"));
        assert_ne!(prednet, vgg);
    }

    #[test]
    fn test_layer_title() {
        assert_eq!(layer_title("layer_4"), "Layer 4");
        assert_eq!(layer_title("layer_16"), "Layer 16");
    }
}
