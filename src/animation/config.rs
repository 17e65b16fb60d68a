//! Character playback configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Default sampling rate of motion clips, in frames per second
pub const DEFAULT_FPS: f32 = 60.0;

/// Playback settings fixed when a character is created
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Frames per second used to map playback time to clip frames
    pub fps: f32,
    /// Take world position straight from the pose root (true) or
    /// accumulate per-tick root deltas onto the current position (false)
    pub use_absolute_position: bool,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            use_absolute_position: true,
        }
    }
}

impl CharacterConfig {
    /// Check that the configuration can drive playback
    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(Error::InvalidFps(self.fps));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CharacterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!(
            "Loaded character config from {:?}: fps={}, absolute={}",
            path, config.fps, config.use_absolute_position
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CharacterConfig::default();
        assert_eq!(config.fps, 60.0);
        assert!(config.use_absolute_position);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CharacterConfig::from_json_str(r#"{"use_absolute_position": false}"#).unwrap();
        assert_eq!(config.fps, DEFAULT_FPS);
        assert!(!config.use_absolute_position);
    }

    #[test]
    fn test_invalid_fps_rejected() {
        for json in [r#"{"fps": 0.0}"#, r#"{"fps": -30.0}"#] {
            let result = CharacterConfig::from_json_str(json);
            assert!(matches!(result, Err(Error::InvalidFps(_))));
        }
    }

    #[test]
    fn test_malformed_json() {
        let result = CharacterConfig::from_json_str("{ fps: ");
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("character.json");
        fs::write(&path, r#"{"fps": 120.0, "use_absolute_position": false}"#).unwrap();

        let config = CharacterConfig::load(&path).unwrap();
        assert_eq!(config.fps, 120.0);
        assert!(!config.use_absolute_position);
    }
}
