// Video frame sampling
//
// Decodes a fixed-size, evenly spaced sequence of RGB frames from a video by
// piping rawvideo output from ffmpeg. Duration comes from ffprobe so the fps
// filter can spread the requested frame count across the whole clip.

use std::path::Path;
use std::process::Command;
use anyhow::Result;
use serde::Deserialize;

use crate::error::NeurovidError;
use crate::tools::{ffmpeg_path, ffprobe_path};
use super::{Frame, FrameSpec};

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    format: Option<FormatData>,
}

#[derive(Debug, Deserialize)]
struct FormatData {
    duration: Option<String>,
}

/// Probe a video's duration in seconds.
pub fn probe_duration(video_path: &Path) -> Result<f64> {
    let output = Command::new(ffprobe_path())
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            &video_path.to_string_lossy(),
        ])
        .output()?;

    if !output.status.success() {
        return Err(NeurovidError::FFprobe(format!(
            "probe failed for {}",
            video_path.display()
        ))
        .into());
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: FFprobeOutput = serde_json::from_str(&json_str)?;

    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    if duration <= 0.0 {
        return Err(NeurovidError::Decode(format!(
            "no usable duration for {}",
            video_path.display()
        ))
        .into());
    }

    Ok(duration)
}

/// Sample a fixed number of frames from a video, scaled to the requested size.
///
/// Returns the ordered frame sequence and the frame count. Fails if the file
/// cannot be decoded or yields fewer frames than the policy requires; there
/// is no retry, the caller aborts.
pub fn sample_video_frames(video_path: &Path, spec: &FrameSpec) -> Result<(Vec<Frame>, usize)> {
    let duration = probe_duration(video_path)?;

    // Spread the requested count evenly across the clip; ffmpeg's fps filter
    // duplicates or drops frames to hit the constant output rate.
    let fps = spec.count as f64 / duration;
    let filter = format!("fps={:.6},scale={}:{}", fps, spec.width, spec.height);

    let output = Command::new(ffmpeg_path())
        .args([
            "-v", "error",
            "-i", &video_path.to_string_lossy(),
            "-vf", &filter,
            "-frames:v", &spec.count.to_string(),
            "-f", "rawvideo",
            "-pix_fmt", "rgb24",
            "-",
        ])
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(NeurovidError::FFmpeg(format!(
            "decode failed for {}: {}",
            video_path.display(),
            stderr.trim()
        ))
        .into());
    }

    let frames = frames_from_raw(&output.stdout, spec).map_err(|e| {
        NeurovidError::Decode(format!("{}: {}", video_path.display(), e))
    })?;

    log::debug!(
        "sampled {} frames at {}x{} from {}",
        frames.len(),
        spec.width,
        spec.height,
        video_path.display()
    );

    let count = frames.len();
    Ok((frames, count))
}

/// Split a rawvideo byte stream into frames, enforcing the fixed-size policy.
pub fn frames_from_raw(bytes: &[u8], spec: &FrameSpec) -> std::result::Result<Vec<Frame>, String> {
    let frame_len = Frame::byte_len(spec.width, spec.height);
    let available = bytes.len() / frame_len;

    if available < spec.count {
        return Err(format!(
            "decoded {} of {} requested frames",
            available, spec.count
        ));
    }

    let frames = bytes
        .chunks_exact(frame_len)
        .take(spec.count)
        .map(|chunk| Frame {
            width: spec.width,
            height: spec.height,
            data: chunk.to_vec(),
        })
        .collect();

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(w: u32, h: u32, count: usize) -> FrameSpec {
        FrameSpec { width: w, height: h, count }
    }

    #[test]
    fn test_frames_from_raw_exact() {
        let s = spec(2, 2, 3);
        let bytes = vec![7u8; Frame::byte_len(2, 2) * 3];
        let frames = frames_from_raw(&bytes, &s).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.data.len() == 12));
    }

    #[test]
    fn test_frames_from_raw_truncates_extra() {
        let s = spec(2, 2, 2);
        let bytes = vec![0u8; Frame::byte_len(2, 2) * 4];
        let frames = frames_from_raw(&bytes, &s).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_frames_from_raw_short_stream_errors() {
        let s = spec(4, 4, 5);
        let bytes = vec![0u8; Frame::byte_len(4, 4) * 4];
        let err = frames_from_raw(&bytes, &s).unwrap_err();
        assert!(err.contains("4 of 5"));
    }

    #[test]
    fn test_frames_preserve_order() {
        let s = spec(1, 1, 2);
        let bytes = vec![1, 2, 3, 4, 5, 6];
        let frames = frames_from_raw(&bytes, &s).unwrap();
        assert_eq!(frames[0].data, vec![1, 2, 3]);
        assert_eq!(frames[1].data, vec![4, 5, 6]);
    }
}
