// Pretrained model adapters
//
// Each frozen network is wrapped in an adapter implementing VideoModel. The
// trait exposes the two capabilities the pipelines need; an adapter that
// lacks one returns a typed Unsupported error instead of panicking.

pub mod prednet;
pub mod vgg19;

use std::path::Path;
use anyhow::Result;
use tract_onnx::prelude::*;

use crate::error::NeurovidError;
use crate::video::{Frame, FrameSpec};

pub(crate) type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// A frozen pretrained network operating on sampled video frames.
pub trait VideoModel {
    /// Short name used in logs and output file names.
    fn name(&self) -> &str;

    /// The sampling policy this model's inputs require.
    fn frame_spec(&self) -> FrameSpec;

    /// One aggregated feature vector for a whole clip.
    fn extract_features(&self, frames: &[Frame]) -> Result<Vec<f32>>;

    /// Sample a video per this model's policy and extract its features.
    fn features_for_video(&self, video_path: &Path) -> Result<Vec<f32>> {
        let (frames, _count) = crate::video::sampler::sample_video_frames(video_path, &self.frame_spec())?;
        self.extract_features(&frames)
    }

    /// Future-frame prediction for a whole clip.
    fn predict_frames(&self, _frames: &[Frame]) -> Result<Vec<Frame>> {
        Err(NeurovidError::Unsupported(format!(
            "{} cannot predict frames",
            self.name()
        ))
        .into())
    }
}

/// Load an ONNX graph with a fixed input fact, optionally re-pointing the
/// graph output at a named internal layer.
pub(crate) fn load_onnx(
    weights_path: &Path,
    input_fact: InferenceFact,
    output_layer: Option<&str>,
) -> Result<OnnxPlan> {
    let mut model = tract_onnx::onnx().model_for_path(weights_path)?;

    if let Some(layer) = output_layer {
        model
            .set_output_names([layer])
            .map_err(|e| NeurovidError::Model(format!("unknown layer '{}': {}", layer, e)))?;
    }

    let plan = model
        .with_input_fact(0, input_fact)?
        .into_optimized()?
        .into_runnable()?;

    Ok(plan)
}
