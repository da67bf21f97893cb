// Neurovid - Library Entry Point
//
// Encoding-model evaluation of frozen pretrained video networks against fMRI
// voxel responses, plus a qualitative frame-prediction pipeline.

pub mod constants;
pub mod error;
pub mod tools;
pub mod config;
pub mod video;
pub mod model;
pub mod features;
pub mod encoding;
pub mod plot;
pub mod driver;
pub mod prediction;

pub use config::{PredictConfig, RunConfig};
pub use error::{NeurovidError, Result};
