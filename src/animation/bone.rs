//! Rigid bones and their per-frame local transform

use glam::{EulerRot, Mat4, Vec3};

use super::Pose;

/// A single bone in a skeletal hierarchy
///
/// The conversion matrices translate between the bone's own rest frame and
/// the axis convention the motion data is authored in. They are fixed when
/// the hierarchy is built and are mutually inverse.
#[derive(Clone, Debug)]
pub struct Bone {
    pub name: String,
    /// Rest offset direction in parent space (unit length)
    pub direction: Vec3,
    pub length: f32,
    /// Animatable axes (x, y, z). Informational only.
    pub dofs: [bool; 3],
    pub bone_to_rotation_space: Mat4,
    pub rotation_to_bone_space: Mat4,
    pub(crate) parent_index: Option<usize>,
    pub(crate) children: Vec<usize>,
    transform: Mat4,
}

impl Bone {
    /// Create a bone whose rest frame matches the motion data's axes
    pub fn new(name: impl Into<String>, direction: Vec3, length: f32) -> Self {
        let direction = direction.normalize_or_zero();
        Self {
            name: name.into(),
            direction,
            length,
            dofs: [false; 3],
            bone_to_rotation_space: Mat4::IDENTITY,
            rotation_to_bone_space: Mat4::IDENTITY,
            parent_index: None,
            children: Vec::new(),
            transform: Mat4::from_translation(direction * length),
        }
    }

    /// Create a bone from an ASF-style `axis` entry (XYZ Euler angles, degrees)
    ///
    /// The axis rotation `C` maps rotation space into bone space, so
    /// `rotation_to_bone_space = C` and `bone_to_rotation_space = C⁻¹`.
    pub fn with_axis(name: impl Into<String>, direction: Vec3, length: f32, axis_degrees: Vec3) -> Self {
        let axis = Mat4::from_euler(
            EulerRot::ZYX,
            axis_degrees.z.to_radians(),
            axis_degrees.y.to_radians(),
            axis_degrees.x.to_radians(),
        );
        Self::new(name, direction, length).with_conversion(axis.inverse(), axis)
    }

    /// Set explicit conversion matrices
    pub fn with_conversion(mut self, bone_to_rotation_space: Mat4, rotation_to_bone_space: Mat4) -> Self {
        self.bone_to_rotation_space = bone_to_rotation_space;
        self.rotation_to_bone_space = rotation_to_bone_space;
        self
    }

    /// Mark which axes the motion data animates
    pub fn with_dofs(mut self, dofs: [bool; 3]) -> Self {
        self.dofs = dofs;
        self
    }

    /// Offset from the parent joint at rest
    pub fn rest_offset(&self) -> Vec3 {
        self.direction * self.length
    }

    /// Local transform at rest: translation only
    pub fn rest_transform(&self) -> Mat4 {
        Mat4::from_translation(self.rest_offset())
    }

    /// Local transform this bone takes on for `pose`
    ///
    /// Starting from the rest transform, each step pre-multiplies: into
    /// rotation space, the joint rotation, back into bone space.
    pub fn posed_transform(&self, pose: &Pose) -> Mat4 {
        self.rotation_to_bone_space
            * pose.joint_rotation_matrix(&self.name)
            * self.bone_to_rotation_space
            * self.rest_transform()
    }

    /// Current derived local transform
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Parent bone index, `None` for roots
    pub fn parent_index(&self) -> Option<usize> {
        self.parent_index
    }

    /// Child bone indices in insertion order
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub(crate) fn reset_transform(&mut self) {
        self.transform = self.rest_transform();
    }

    pub(crate) fn apply_pose(&mut self, pose: &Pose) {
        self.transform = self.posed_transform(pose);
    }
}
