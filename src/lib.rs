//! Marionette - skeletal motion playback with crossfaded overlay tracks

pub mod core;
pub mod animation;

pub use animation::{AnimatedCharacter, Bone, CharacterConfig, MotionClip, Pose, Skeleton, SkeletonBuilder};
pub use core::{Error, Result};
