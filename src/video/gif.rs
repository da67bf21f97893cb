// Animated GIF output for the frame-prediction runner
//
// Frames are piped to ffmpeg as rawvideo on stdin and encoded at a fixed
// playback rate.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use anyhow::{Result, anyhow, bail};

use crate::tools::ffmpeg_path;
use super::Frame;

/// Write an ordered frame sequence as an animated GIF.
pub fn write_gif(frames: &[Frame], fps: f64, output_path: &Path) -> Result<()> {
    if frames.is_empty() {
        bail!("no frames to write for {}", output_path.display());
    }

    let (width, height) = (frames[0].width, frames[0].height);
    let frame_len = Frame::byte_len(width, height);
    for frame in frames {
        if frame.width != width || frame.height != height || frame.data.len() != frame_len {
            bail!("inconsistent frame geometry in {}", output_path.display());
        }
    }

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut child = Command::new(ffmpeg_path())
        .args([
            "-y",
            "-v", "error",
            "-f", "rawvideo",
            "-pix_fmt", "rgb24",
            "-s", &format!("{}x{}", width, height),
            "-r", &format!("{:.3}", fps),
            "-i", "-",
            &output_path.to_string_lossy(),
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("failed to open ffmpeg stdin"))?;
        for frame in frames {
            stdin.write_all(&frame.data)?;
        }
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "ffmpeg gif encode failed for {}: {}",
            output_path.display(),
            stderr.trim()
        );
    }

    Ok(())
}
