//! Motion clips: fixed-length pose sequences

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Pose;
use crate::core::{Error, Result};

/// A fixed-length sequence of poses sampled at the playing character's frame rate
///
/// Frames are read-only once the clip is built. Share clips between
/// characters with `Arc<MotionClip>`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionClip {
    name: String,
    frames: Vec<Pose>,
}

impl MotionClip {
    /// Create a clip from an ordered list of frames
    ///
    /// A clip must have at least one frame since playback always starts at
    /// frame 0.
    pub fn new(name: impl Into<String>, frames: Vec<Pose>) -> Result<Self> {
        let name = name.into();
        if frames.is_empty() {
            return Err(Error::Clip(format!("clip '{}' has no frames", name)));
        }
        Ok(Self { name, frames })
    }

    /// Clip name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of frames in the clip
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Get a frame by index
    pub fn frame(&self, index: usize) -> Option<&Pose> {
        self.frames.get(index)
    }

    /// The first frame (always present)
    pub fn first_frame(&self) -> &Pose {
        &self.frames[0]
    }

    /// All frames in order
    pub fn frames(&self) -> &[Pose] {
        &self.frames
    }

    /// Playback length in seconds at the given frame rate
    pub fn duration(&self, fps: f32) -> f32 {
        self.frames.len() as f32 / fps
    }

    /// Serialize the clip to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a clip from JSON, rejecting empty clips
    pub fn from_json_str(json: &str) -> Result<Self> {
        let clip: MotionClip = serde_json::from_str(json)?;
        Self::new(clip.name, clip.frames)
    }

    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        log::debug!(
            "Saved clip '{}' ({} frames) to {:?}",
            self.name,
            self.frames.len(),
            path
        );
        Ok(())
    }

    /// Load from file (sync)
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let clip = Self::from_json_str(&json)?;
        log::debug!(
            "Loaded clip '{}' ({} frames) from {:?}",
            clip.name,
            clip.frames.len(),
            path
        );
        Ok(clip)
    }
}
