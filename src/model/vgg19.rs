// Convolutional classifier adapter
//
// Operates frame by frame: each frame is normalized with the fixed ImageNet
// constants, forwarded through the frozen network with the named layer as the
// graph output, and accumulated into a running sum that is divided once by
// the frame count.

use std::path::Path;
use anyhow::Result;
use tract_onnx::prelude::*;

use crate::constants::{IMAGENET_MEAN, IMAGENET_STD, SAMPLE_FRAMES, VGG_FRAME_SIZE};
use crate::error::NeurovidError;
use crate::video::{Frame, FrameSpec};
use super::{load_onnx, OnnxPlan, VideoModel};

pub struct Vgg19 {
    plan: OnnxPlan,
    spec: FrameSpec,
}

impl Vgg19 {
    pub fn load(weights_path: &Path, layer: &str) -> Result<Self> {
        let spec = FrameSpec {
            width: VGG_FRAME_SIZE,
            height: VGG_FRAME_SIZE,
            count: SAMPLE_FRAMES,
        };

        let input_fact = InferenceFact::dt_shape(
            f32::datum_type(),
            tvec!(1, 3, spec.height as usize, spec.width as usize),
        );

        let plan = load_onnx(weights_path, input_fact, Some(layer))?;
        log::info!(
            "loaded vgg19 from {} (layer {})",
            weights_path.display(),
            layer
        );

        Ok(Self { plan, spec })
    }

    fn frame_tensor(&self, frame: &Frame) -> Result<Tensor> {
        let expected = crate::video::Frame::byte_len(self.spec.width, self.spec.height);
        if frame.data.len() != expected {
            return Err(NeurovidError::Shape(format!(
                "vgg19 expects {}x{} frames",
                self.spec.width, self.spec.height
            ))
            .into());
        }

        let values = frame_values(frame);
        let tensor = Tensor::from_shape(
            &[1, 3, self.spec.height as usize, self.spec.width as usize],
            &values,
        )?;
        Ok(tensor)
    }
}

/// Normalize a frame into channel-first [3, H, W] order with the fixed
/// per-channel ImageNet mean/std constants.
pub(crate) fn frame_values(frame: &Frame) -> Vec<f32> {
    let (w, h) = (frame.width as usize, frame.height as usize);
    let mut values = Vec::with_capacity(3 * h * w);

    for c in 0..3 {
        for y in 0..h {
            for x in 0..w {
                let px = frame.data[(y * w + x) * 3 + c] as f32 / 255.0;
                values.push((px - IMAGENET_MEAN[c]) / IMAGENET_STD[c]);
            }
        }
    }

    values
}

impl VideoModel for Vgg19 {
    fn name(&self) -> &str {
        "vgg19"
    }

    fn frame_spec(&self) -> FrameSpec {
        self.spec
    }

    fn extract_features(&self, frames: &[Frame]) -> Result<Vec<f32>> {
        if frames.is_empty() {
            return Err(NeurovidError::Shape("no frames to extract from".to_string()).into());
        }

        // Explicit running-sum accumulator, divided once at the end.
        let mut sum: Vec<f32> = Vec::new();

        for frame in frames {
            let input = self.frame_tensor(frame)?;
            let outputs = self.plan.run(tvec!(input.into()))?;
            let view = outputs[0].to_array_view::<f32>()?;

            if sum.is_empty() {
                sum = view.iter().cloned().collect();
            } else {
                if view.len() != sum.len() {
                    return Err(NeurovidError::Shape(format!(
                        "layer output length changed mid-clip: {} vs {}",
                        view.len(),
                        sum.len()
                    ))
                    .into());
                }
                for (acc, v) in sum.iter_mut().zip(view.iter()) {
                    *acc += *v;
                }
            }
        }

        let n = frames.len() as f32;
        for v in sum.iter_mut() {
            *v /= n;
        }

        Ok(sum)
    }
}
