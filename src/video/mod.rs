// Video input handling
//
// Discovery of stimulus videos plus frame sampling and animation output.
// All decode/encode work goes through the external ffmpeg tools.

pub mod sampler;
pub mod gif;

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::VIDEO_EXTENSIONS;
use crate::error::Result;

/// A single decoded RGB frame (8-bit, interleaved rgb24).
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }
}

/// Fixed sampling policy shared by every consumer of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub count: usize,
}

/// Discover all video files in a directory, sorted lexicographically.
///
/// The sorted order is the canonical video order for the whole run: feature
/// extraction, reduction and the prediction sampler all index into it.
pub fn discover_videos(video_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(video_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && is_video_file(path) {
            files.push(path.to_path_buf());
        }
    }

    // Sort by path for consistent ordering
    files.sort();

    Ok(files)
}

/// Check if a file is a video file based on extension
pub fn is_video_file(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_lowercase(),
        None => return false,
    };

    VIDEO_EXTENSIONS.contains(&ext.as_str())
}

/// File stem used to key per-video cache entries.
pub fn video_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("clip.mp4")));
        assert!(is_video_file(Path::new("clip.MOV")));
        assert!(!is_video_file(Path::new("clip.txt")));
        assert!(!is_video_file(Path::new("noext")));
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_video.mp4", "a_video.mp4", "c_video.mov", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let videos = discover_videos(dir.path()).unwrap();
        let names: Vec<String> = videos.iter().map(|p| video_stem(p)).collect();
        assert_eq!(names, vec!["a_video", "b_video", "c_video"]);

        // Repeated discovery must give the identical order
        let again = discover_videos(dir.path()).unwrap();
        assert_eq!(videos, again);
    }

    #[test]
    fn test_video_stem() {
        assert_eq!(video_stem(Path::new("/data/vid_0001.mp4")), "vid_0001");
    }
}
