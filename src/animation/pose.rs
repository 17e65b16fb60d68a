//! Per-frame joint rotations and root translation

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// An immutable snapshot of a skeleton's joint rotations at one instant
///
/// Rotations are keyed by bone name. A bone with no entry is at rest
/// (identity rotation). Blending never mutates a pose; [`Pose::lerp`]
/// produces a new one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    joint_rotations: HashMap<String, Quat>,
    root_position: Vec3,
}

impl Pose {
    /// Create a pose from its parts
    pub fn new(joint_rotations: HashMap<String, Quat>, root_position: Vec3) -> Self {
        Self {
            joint_rotations,
            root_position,
        }
    }

    /// Rest pose: no joint rotations, root at the origin
    pub fn identity() -> Self {
        Self::default()
    }

    /// Builder-style helper returning a copy with one joint rotation set
    pub fn with_joint(mut self, name: impl Into<String>, rotation: Quat) -> Self {
        self.joint_rotations.insert(name.into(), rotation);
        self
    }

    /// Builder-style helper returning a copy with the root translation set
    pub fn with_root_position(mut self, root_position: Vec3) -> Self {
        self.root_position = root_position;
        self
    }

    /// Rotation for the named joint, identity when the pose has no entry
    pub fn joint_rotation(&self, name: &str) -> Quat {
        self.joint_rotations
            .get(name)
            .copied()
            .unwrap_or(Quat::IDENTITY)
    }

    /// Rotation for the named joint as a 4x4 matrix
    pub fn joint_rotation_matrix(&self, name: &str) -> Mat4 {
        Mat4::from_quat(self.joint_rotation(name))
    }

    /// Whether the pose carries an explicit rotation for the joint
    pub fn has_joint(&self, name: &str) -> bool {
        self.joint_rotations.contains_key(name)
    }

    /// Number of joints with an explicit rotation
    pub fn joint_count(&self) -> usize {
        self.joint_rotations.len()
    }

    /// Iterate over explicit joint rotations (unordered)
    pub fn joints(&self) -> impl Iterator<Item = (&str, Quat)> {
        self.joint_rotations.iter().map(|(name, rot)| (name.as_str(), *rot))
    }

    /// Root translation of the pose
    pub fn root_position(&self) -> Vec3 {
        self.root_position
    }

    /// Interpolate toward `other` by `alpha` (0 = self, 1 = other)
    ///
    /// Joint rotations are slerped, the root translation is lerped. Joints
    /// present in only one pose are blended against identity.
    pub fn lerp(&self, other: &Pose, alpha: f32) -> Pose {
        let alpha = alpha.clamp(0.0, 1.0);

        if alpha <= 0.0 || self == other {
            return self.clone();
        }
        if alpha >= 1.0 {
            return other.clone();
        }

        let mut joint_rotations = HashMap::with_capacity(
            self.joint_rotations.len().max(other.joint_rotations.len()),
        );

        for (name, from) in &self.joint_rotations {
            let to = other.joint_rotation(name);
            joint_rotations.insert(name.clone(), from.slerp(to, alpha));
        }
        for (name, to) in &other.joint_rotations {
            if !self.joint_rotations.contains_key(name) {
                joint_rotations.insert(name.clone(), Quat::IDENTITY.slerp(*to, alpha));
            }
        }

        Pose {
            joint_rotations,
            root_position: self.root_position.lerp(other.root_position, alpha),
        }
    }

    /// Compare two poses within a tolerance
    ///
    /// Missing joints compare as identity. Quaternions `q` and `-q` describe
    /// the same rotation and are treated as equal.
    pub fn approx_eq(&self, other: &Pose, epsilon: f32) -> bool {
        if !self.root_position.abs_diff_eq(other.root_position, epsilon) {
            return false;
        }

        let rotation_matches = |name: &str| {
            let a = self.joint_rotation(name);
            let b = other.joint_rotation(name);
            (1.0 - a.dot(b).abs()) <= epsilon
        };

        self.joint_rotations.keys().all(|name| rotation_matches(name.as_str()))
            && other.joint_rotations.keys().all(|name| rotation_matches(name.as_str()))
    }
}
