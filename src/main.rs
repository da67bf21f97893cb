// Neurovid CLI binary

use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use neurovid::config::{PredictConfig, RunConfig};
use neurovid::constants::{PREDNET_DEFAULT_LAYER, VGG_DEFAULT_LAYER};
use neurovid::driver::run_encoding;
use neurovid::model::prednet::{PredNet, PredNetMode};
use neurovid::model::vgg19::Vgg19;
use neurovid::model::VideoModel;
use neurovid::prediction::predict_videos;

#[derive(Parser)]
#[command(name = "neurovid")]
#[command(about = "Encoding-model evaluation of pretrained video networks against fMRI responses", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelKind {
    Prednet,
    Vgg19,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an encoding model built from one network layer
    Encode {
        /// Which pretrained network to evaluate
        #[arg(long, value_enum)]
        model: ModelKind,
        /// Pretrained weights bundle (ONNX)
        #[arg(long)]
        weights: PathBuf,
        /// Directory of stimulus videos
        #[arg(long)]
        videos: PathBuf,
        /// Directory tree of per-subject, per-ROI response files
        #[arg(long)]
        fmri: PathBuf,
        /// Output directory (caches, score matrix, chart)
        #[arg(long)]
        out: PathBuf,
        /// Layer to tap (defaults per model)
        #[arg(long)]
        layer: Option<String>,
        /// Number of training videos
        #[arg(long)]
        train_videos: Option<usize>,
        /// Number of principal components
        #[arg(long)]
        components: Option<usize>,
        /// Held-out fraction of training videos
        #[arg(long)]
        val_fraction: Option<f64>,
        /// Seed for stochastic sub-steps
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Predict future frames for randomly selected videos
    Predict {
        /// Pretrained recurrent predictor weights (ONNX)
        #[arg(long)]
        weights: PathBuf,
        /// Directory of candidate videos
        #[arg(long)]
        videos: PathBuf,
        /// Output directory for the animations
        #[arg(long)]
        out: PathBuf,
        /// Number of videos to predict
        #[arg(long)]
        count: Option<usize>,
        /// Selection seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            model,
            weights,
            videos,
            fmri,
            out,
            layer,
            train_videos,
            components,
            val_fraction,
            seed,
        } => cmd_encode(
            model, weights, videos, fmri, out, layer, train_videos, components, val_fraction, seed,
        ),
        Commands::Predict {
            weights,
            videos,
            out,
            count,
            seed,
        } => cmd_predict(weights, videos, out, count, seed),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_encode(
    model_kind: ModelKind,
    weights: PathBuf,
    videos: PathBuf,
    fmri: PathBuf,
    out: PathBuf,
    layer: Option<String>,
    train_videos: Option<usize>,
    components: Option<usize>,
    val_fraction: Option<f64>,
    seed: Option<u64>,
) -> Result<()> {
    let layer = layer.unwrap_or_else(|| {
        match model_kind {
            ModelKind::Prednet => PREDNET_DEFAULT_LAYER,
            ModelKind::Vgg19 => VGG_DEFAULT_LAYER,
        }
        .to_string()
    });

    let mut config = RunConfig::new(weights, videos, fmri, out, layer);
    if let Some(n) = train_videos {
        config.n_train_videos = n;
    }
    if let Some(k) = components {
        config.n_components = k;
    }
    if let Some(f) = val_fraction {
        config.val_fraction = f;
    }
    if let Some(s) = seed {
        config.seed = s;
    }

    let model: Box<dyn VideoModel> = match model_kind {
        ModelKind::Prednet => Box::new(PredNet::load(
            &config.weights_path,
            PredNetMode::Features {
                layer: config.layer.clone(),
            },
        )?),
        ModelKind::Vgg19 => Box::new(Vgg19::load(&config.weights_path, &config.layer)?),
    };

    let outcome = run_encoding(&config, model.as_ref())?;

    println!("Encoding run complete:");
    println!("  Score matrix: {}", outcome.scores_path.display());
    println!("  Chart:        {}", outcome.chart_path.display());
    println!(
        "  Mean r over all cells: {:.4}",
        outcome.scores.mean().unwrap_or(0.0)
    );

    Ok(())
}

fn cmd_predict(
    weights: PathBuf,
    videos: PathBuf,
    out: PathBuf,
    count: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let mut config = PredictConfig::new(weights, videos, out);
    if let Some(n) = count {
        config.n_predictions = n;
    }
    if let Some(s) = seed {
        config.seed = s;
    }

    let model = PredNet::load(&config.weights_path, PredNetMode::Prediction)?;
    predict_videos(&config, &model)?;

    println!(
        "Wrote {} actual/predicted animation pairs to {}",
        config.n_predictions,
        config.out_dir.display()
    );

    Ok(())
}
