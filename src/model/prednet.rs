// Recurrent next-frame predictor adapter
//
// Operates on whole clips: frames are stacked into a single [1, T, 3, H, W]
// tensor with intensities scaled to [0, 1] and a single forward pass produces
// either the designated internal representation (feature mode) or the
// predicted frame sequence (prediction mode).

use std::path::Path;
use anyhow::Result;
use tract_onnx::prelude::*;

use crate::constants::{PREDNET_FRAME_HEIGHT, PREDNET_FRAME_WIDTH, SAMPLE_FRAMES};
use crate::error::NeurovidError;
use crate::video::{Frame, FrameSpec};
use super::{load_onnx, OnnxPlan, VideoModel};

/// Which graph output the adapter is wired to.
#[derive(Debug, Clone)]
pub enum PredNetMode {
    /// Tap the named internal representation layer.
    Features { layer: String },
    /// Use the graph's native output, the predicted frame sequence.
    Prediction,
}

pub struct PredNet {
    plan: OnnxPlan,
    mode: PredNetMode,
    spec: FrameSpec,
}

impl PredNet {
    pub fn load(weights_path: &Path, mode: PredNetMode) -> Result<Self> {
        let spec = FrameSpec {
            width: PREDNET_FRAME_WIDTH,
            height: PREDNET_FRAME_HEIGHT,
            count: SAMPLE_FRAMES,
        };

        let input_fact = InferenceFact::dt_shape(
            f32::datum_type(),
            tvec!(
                1,
                spec.count,
                3,
                spec.height as usize,
                spec.width as usize
            ),
        );

        let output_layer = match &mode {
            PredNetMode::Features { layer } => Some(layer.as_str()),
            PredNetMode::Prediction => None,
        };

        let plan = load_onnx(weights_path, input_fact, output_layer)?;
        log::info!("loaded prednet from {} ({:?})", weights_path.display(), mode);

        Ok(Self { plan, mode, spec })
    }

    fn clip_tensor(&self, frames: &[Frame]) -> Result<Tensor> {
        if frames.len() != self.spec.count {
            return Err(NeurovidError::Shape(format!(
                "prednet expects {} frames, got {}",
                self.spec.count,
                frames.len()
            ))
            .into());
        }

        let values = clip_values(frames, &self.spec);
        let tensor = Tensor::from_shape(
            &[
                1,
                self.spec.count,
                3,
                self.spec.height as usize,
                self.spec.width as usize,
            ],
            &values,
        )?;
        Ok(tensor)
    }
}

/// Stack frames into [T, 3, H, W] order with intensities in [0, 1].
pub(crate) fn clip_values(frames: &[Frame], spec: &FrameSpec) -> Vec<f32> {
    let (w, h) = (spec.width as usize, spec.height as usize);
    let mut values = Vec::with_capacity(frames.len() * 3 * h * w);

    for frame in frames {
        for c in 0..3 {
            for y in 0..h {
                for x in 0..w {
                    let px = frame.data[(y * w + x) * 3 + c];
                    values.push(px as f32 / 255.0);
                }
            }
        }
    }

    values
}

impl VideoModel for PredNet {
    fn name(&self) -> &str {
        "prednet"
    }

    fn frame_spec(&self) -> FrameSpec {
        self.spec
    }

    fn extract_features(&self, frames: &[Frame]) -> Result<Vec<f32>> {
        if !matches!(self.mode, PredNetMode::Features { .. }) {
            return Err(NeurovidError::Model(
                "prednet loaded in prediction mode cannot extract features".to_string(),
            )
            .into());
        }

        let input = self.clip_tensor(frames)?;
        let outputs = self.plan.run(tvec!(input.into()))?;
        let view = outputs[0].to_array_view::<f32>()?;

        Ok(view.iter().cloned().collect())
    }

    fn predict_frames(&self, frames: &[Frame]) -> Result<Vec<Frame>> {
        if !matches!(self.mode, PredNetMode::Prediction) {
            return Err(NeurovidError::Model(
                "prednet loaded in feature mode cannot predict frames".to_string(),
            )
            .into());
        }

        let input = self.clip_tensor(frames)?;
        let outputs = self.plan.run(tvec!(input.into()))?;
        let view = outputs[0].to_array_view::<f32>()?;

        if view.ndim() != 5 {
            return Err(NeurovidError::Shape(format!(
                "prediction output has {} dims, expected 5",
                view.ndim()
            ))
            .into());
        }

        let shape = view.shape().to_vec();
        let (t, h, w) = (shape[1], shape[3], shape[4]);

        let mut predicted = Vec::with_capacity(t);
        for frame_idx in 0..t {
            let mut data = vec![0u8; w * h * 3];
            for y in 0..h {
                for x in 0..w {
                    for c in 0..3 {
                        let v = view[[0, frame_idx, c, y, x]];
                        data[(y * w + x) * 3 + c] = (v.clamp(0.0, 1.0) * 255.0) as u8;
                    }
                }
            }
            predicted.push(Frame {
                width: w as u32,
                height: h as u32,
                data,
            });
        }

        Ok(predicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_values_layout_and_scale() {
        let spec = FrameSpec { width: 2, height: 1, count: 1 };
        // One 2x1 frame: pixel0 = (255, 0, 0), pixel1 = (0, 255, 0)
        let frame = Frame {
            width: 2,
            height: 1,
            data: vec![255, 0, 0, 0, 255, 0],
        };

        let values = clip_values(&[frame], &spec);
        // Channel-first: R plane [1.0, 0.0], G plane [0.0, 1.0], B plane [0.0, 0.0]
        assert_eq!(values, vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_clip_values_length() {
        let spec = FrameSpec { width: 4, height: 3, count: 2 };
        let frames: Vec<Frame> = (0..2)
            .map(|_| Frame {
                width: 4,
                height: 3,
                data: vec![0; 36],
            })
            .collect();

        let values = clip_values(&frames, &spec);
        assert_eq!(values.len(), 2 * 3 * 3 * 4);
    }
}
