// Neurovid Constants
// Defaults for the encoding and prediction pipelines. Every value here can be
// overridden through RunConfig / PredictConfig.

/// Subjects with fMRI recordings, in score-matrix row order.
pub const SUBJECTS: [&str; 10] = [
    "sub01", "sub02", "sub03", "sub04", "sub05",
    "sub06", "sub07", "sub08", "sub09", "sub10",
];

/// Visual regions of interest, in score-matrix column order.
pub const ROIS: [&str; 9] = [
    "V1", "V2", "V3", "V4", "LOC", "EBA", "FFA", "STS", "PPA",
];

// Encoding pipeline
pub const N_TRAIN_VIDEOS: usize = 1000;
pub const N_COMPONENTS: usize = 100;
pub const VAL_FRACTION: f64 = 0.1;     // last 10% of training videos held out
pub const SEED: u64 = 24;

// Frame sampling
pub const SAMPLE_FRAMES: usize = 16;   // fixed-size clip per video

// Recurrent predictor input geometry ([1, T, 3, H, W])
pub const PREDNET_FRAME_WIDTH: u32 = 160;
pub const PREDNET_FRAME_HEIGHT: u32 = 128;
pub const PREDNET_DEFAULT_LAYER: &str = "layer_4";

// Convolutional classifier input geometry and normalization
pub const VGG_FRAME_SIZE: u32 = 224;
pub const VGG_DEFAULT_LAYER: &str = "layer_16";
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

// Frame prediction runner
pub const N_PREDICTIONS: usize = 6;
pub const GIF_FPS: f64 = 5.33;

// Output file names
pub const SCORES_FILE_PREFIX: &str = "voxelwise_corrs";
pub const PCA_FILE_PREFIX: &str = "pca_activations";
pub const SUMMARY_FILE_PREFIX: &str = "run_summary";

// Chart rendering
pub const CHART_WIDTH: u32 = 1000;
pub const CHART_HEIGHT: u32 = 600;

// Video extensions accepted during discovery
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "avi", "mkv", "webm", "m4v"];
