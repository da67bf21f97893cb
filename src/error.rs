// Neurovid Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NeurovidError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("npy read error: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    #[error("npy write error: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    #[error("Video decode error: {0}")]
    Decode(String),

    #[error("FFmpeg error: {0}")]
    FFmpeg(String),

    #[error("FFprobe error: {0}")]
    FFprobe(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for NeurovidError {
    fn from(err: anyhow::Error) -> Self {
        NeurovidError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NeurovidError>;
