//! Clip playback with queued, crossfaded overlay tracks

use std::collections::VecDeque;
use std::sync::Arc;

use glam::{Mat4, Vec3};

use super::{CharacterConfig, MotionClip, Pose, Skeleton};
use crate::core::{Error, Result};

/// Blend weight toward the base track for an overlay at `overlay_frame`
///
/// Returns 1.0 for pure base, 0.0 for pure overlay. The overlay fades in
/// over its first `transition_frames` frames and back out over its last
/// ones. The transition length is clamped to `[1, frame_count]`, so zero
/// behaves as an immediate cut.
pub fn crossfade_weight(overlay_frame: usize, frame_count: usize, transition_frames: u32) -> f32 {
    let transition = (transition_frames as usize).clamp(1, frame_count.max(1)) as f32;
    let frame = overlay_frame as f32;
    let count = frame_count as f32;

    if frame < transition {
        1.0 - frame / transition
    } else if frame > count - transition {
        1.0 - (count - frame) / transition
    } else {
        0.0
    }
}

fn frame_index(time: f32, fps: f32) -> usize {
    // Negative or NaN times saturate to frame 0
    (time * fps).floor() as usize
}

/// An overlay waiting in (or at the head of) the queue
#[derive(Clone, Debug)]
struct OverlayTrack {
    clip: Arc<MotionClip>,
    transition_frames: u32,
}

/// State of an active base clip and its overlay queue
#[derive(Clone, Debug)]
struct Playback {
    clip: Arc<MotionClip>,
    current_time: f32,
    /// Root of the last consumed base frame, for relative root motion
    base_root: Vec3,
    overlays: VecDeque<OverlayTrack>,
    overlay_time: f32,
    /// Root of the last consumed overlay frame
    overlay_root: Vec3,
}

/// The pose produced for one tick, before it is handed to the skeleton
struct BlendOutput {
    pose: Pose,
    blend_weight: f32,
    root_delta: Vec3,
}

impl Playback {
    fn new(clip: Arc<MotionClip>) -> Self {
        let base_root = clip.first_frame().root_position();
        Self {
            clip,
            current_time: 0.0,
            base_root,
            overlays: VecDeque::new(),
            overlay_time: 0.0,
            overlay_root: Vec3::ZERO,
        }
    }

    fn enqueue(&mut self, clip: Arc<MotionClip>, transition_frames: u32) {
        if self.overlays.is_empty() {
            self.overlay_time = 0.0;
            self.overlay_root = clip.first_frame().root_position();
        }
        self.overlays.push_back(OverlayTrack {
            clip,
            transition_frames,
        });
    }

    /// Advance the base cursor, wrapping to frame 0 at the end of the clip
    fn advance_base(&mut self, delta_time: f32, fps: f32) -> usize {
        self.current_time += delta_time;
        let frame = frame_index(self.current_time, fps);

        if frame >= self.clip.frame_count() {
            log::trace!("Clip '{}' looped", self.clip.name());
            self.current_time = 0.0;
            // Zero root delta on the wrap tick
            self.base_root = self.clip.first_frame().root_position();
            return 0;
        }

        frame
    }

    /// Advance the overlay cursor; `None` when no overlay is active this tick
    fn advance_overlay(&mut self, delta_time: f32, fps: f32) -> Option<usize> {
        let head = self.overlays.front()?;
        self.overlay_time += delta_time;
        let frame = frame_index(self.overlay_time, fps);

        if frame < head.clip.frame_count() {
            return Some(frame);
        }

        if let Some(finished) = self.overlays.pop_front() {
            log::debug!(
                "Overlay '{}' finished, {} still queued",
                finished.clip.name(),
                self.overlays.len()
            );
        }
        self.overlay_time = 0.0;

        let next = self.overlays.front()?;
        self.overlay_root = next.clip.first_frame().root_position();
        log::debug!("Overlay '{}' started", next.clip.name());
        Some(0)
    }

    /// Blend the frames for this tick and consume their root positions
    fn blend(&mut self, base_frame: usize, overlay_frame: Option<usize>) -> BlendOutput {
        let base_pose = &self.clip.frames()[base_frame];
        let base_delta = base_pose.root_position() - self.base_root;
        self.base_root = base_pose.root_position();

        let active = overlay_frame.zip(self.overlays.front());
        let Some((frame, track)) = active else {
            return BlendOutput {
                pose: base_pose.clone(),
                blend_weight: 1.0,
                root_delta: base_delta,
            };
        };

        let overlay_pose = &track.clip.frames()[frame];
        let blend_weight = crossfade_weight(frame, track.clip.frame_count(), track.transition_frames);

        let overlay_delta = overlay_pose.root_position() - self.overlay_root;
        self.overlay_root = overlay_pose.root_position();

        BlendOutput {
            pose: overlay_pose.lerp(base_pose, blend_weight),
            blend_weight,
            root_delta: overlay_delta.lerp(base_delta, blend_weight),
        }
    }
}

#[derive(Clone, Debug)]
enum PlaybackState {
    Idle,
    Playing(Playback),
}

/// Frame indices and blend weight resolved by the last update
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSample {
    pub base_frame: usize,
    pub overlay_frame: Option<usize>,
    /// Fraction toward the base pose (1.0 when no overlay is active)
    pub blend_weight: f32,
}

/// A skeleton driven by a looping base clip and a queue of overlay clips
#[derive(Clone, Debug)]
pub struct AnimatedCharacter {
    skeleton: Skeleton,
    fps: f32,
    use_absolute_position: bool,
    state: PlaybackState,
    position: Vec3,
    pose: Option<Pose>,
    sample: Option<FrameSample>,
}

impl AnimatedCharacter {
    /// Create an idle character
    pub fn new(skeleton: Skeleton, fps: f32, use_absolute_position: bool) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(Error::InvalidFps(fps));
        }

        Ok(Self {
            skeleton,
            fps,
            use_absolute_position,
            state: PlaybackState::Idle,
            position: Vec3::ZERO,
            pose: None,
            sample: None,
        })
    }

    /// Create an idle character from a validated configuration
    pub fn from_config(skeleton: Skeleton, config: &CharacterConfig) -> Result<Self> {
        config.validate()?;
        Self::new(skeleton, config.fps, config.use_absolute_position)
    }

    /// Start `clip` from frame 0, discarding any overlays
    pub fn play(&mut self, clip: Arc<MotionClip>) {
        log::debug!("Playing clip '{}' ({} frames)", clip.name(), clip.frame_count());
        self.state = PlaybackState::Playing(Playback::new(clip));
        self.sample = None;
    }

    /// Halt playback and drop all overlays
    pub fn stop(&mut self) {
        if let PlaybackState::Playing(playback) = &self.state {
            log::debug!("Stopped clip '{}'", playback.clip.name());
        }
        self.state = PlaybackState::Idle;
        self.sample = None;
    }

    /// Queue `clip` to play over the base track after any pending overlays
    ///
    /// Ignored while idle, since `play` starts with an empty queue.
    pub fn overlay(&mut self, clip: Arc<MotionClip>, transition_frames: u32) {
        match &mut self.state {
            PlaybackState::Idle => {
                log::warn!("Ignoring overlay '{}': no clip is playing", clip.name());
            }
            PlaybackState::Playing(playback) => {
                log::debug!(
                    "Queued overlay '{}' ({} frames, {} transition frames)",
                    clip.name(),
                    clip.frame_count(),
                    transition_frames
                );
                playback.enqueue(clip, transition_frames);
            }
        }
    }

    /// Advance playback by `delta_time` seconds and pose the skeleton
    ///
    /// Does nothing while idle. Negative or non-finite deltas count as zero.
    pub fn update(&mut self, delta_time: f32) {
        let delta_time = if delta_time.is_finite() && delta_time >= 0.0 {
            delta_time
        } else {
            log::warn!("Clamping invalid delta time {} to zero", delta_time);
            0.0
        };

        let PlaybackState::Playing(playback) = &mut self.state else {
            return;
        };

        let base_frame = playback.advance_base(delta_time, self.fps);
        let overlay_frame = playback.advance_overlay(delta_time, self.fps);
        let output = playback.blend(base_frame, overlay_frame);

        if !self.use_absolute_position {
            self.position += output.root_delta;
        }

        log::trace!(
            "base frame {}, overlay frame {:?}, weight {:.3}",
            base_frame, overlay_frame, output.blend_weight
        );

        self.skeleton.update(&output.pose, self.use_absolute_position);
        self.sample = Some(FrameSample {
            base_frame,
            overlay_frame,
            blend_weight: output.blend_weight,
        });
        self.pose = Some(output.pose);
    }

    /// Number of overlays pending, including the active one
    pub fn queue_count(&self) -> usize {
        match &self.state {
            PlaybackState::Idle => 0,
            PlaybackState::Playing(playback) => playback.overlays.len(),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing(_))
    }

    /// The base clip being played
    pub fn current_clip(&self) -> Option<&Arc<MotionClip>> {
        match &self.state {
            PlaybackState::Idle => None,
            PlaybackState::Playing(playback) => Some(&playback.clip),
        }
    }

    /// The overlay at the head of the queue
    pub fn active_overlay(&self) -> Option<&Arc<MotionClip>> {
        match &self.state {
            PlaybackState::Idle => None,
            PlaybackState::Playing(playback) => playback.overlays.front().map(|t| &t.clip),
        }
    }

    /// Seconds into the base clip
    pub fn current_time(&self) -> f32 {
        match &self.state {
            PlaybackState::Idle => 0.0,
            PlaybackState::Playing(playback) => playback.current_time,
        }
    }

    /// Seconds into the active overlay
    pub fn overlay_time(&self) -> f32 {
        match &self.state {
            PlaybackState::Idle => 0.0,
            PlaybackState::Playing(playback) => playback.overlay_time,
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn use_absolute_position(&self) -> bool {
        self.use_absolute_position
    }

    /// Character placement in the world
    ///
    /// Accumulates root motion in relative mode. In absolute mode root motion
    /// lives in the skeleton's root translation instead.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// World position of the skeleton root
    pub fn root_world_position(&self) -> Vec3 {
        self.position + self.skeleton.root_position()
    }

    /// Pose pushed to the skeleton by the last update
    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    /// Frames and weight resolved by the last update since `play`
    pub fn last_sample(&self) -> Option<FrameSample> {
        self.sample
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// World transforms of every bone with the character at its position
    pub fn world_transforms(&self) -> Vec<Mat4> {
        self.skeleton.world_transforms(Mat4::from_translation(self.position))
    }
}
