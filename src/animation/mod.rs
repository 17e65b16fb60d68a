//! Skeletal animation system

pub mod bone;
pub mod pose;
pub mod clip;
pub mod skeleton;
pub mod config;
pub mod character;

pub use bone::Bone;
pub use pose::Pose;
pub use clip::MotionClip;
pub use skeleton::{Skeleton, SkeletonBuilder, MAX_BONES};
pub use config::{CharacterConfig, DEFAULT_FPS};
pub use character::{crossfade_weight, AnimatedCharacter, FrameSample};
