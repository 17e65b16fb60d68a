//! Skeletal bone hierarchy and pose propagation

use glam::{Mat4, Vec3};
use std::collections::HashMap;

use super::{Bone, Pose};
use crate::core::{Error, Result};

/// Maximum number of bones per skeleton
pub const MAX_BONES: usize = 128;

/// A hierarchical skeleton composed of bones
///
/// Bones live in an arena and refer to each other by index. Parents are
/// always inserted before their children, so index order is a valid
/// parent-first order as well.
#[derive(Clone, Debug)]
pub struct Skeleton {
    bones: Vec<Bone>,
    bone_names: HashMap<String, usize>,
    roots: Vec<usize>,
    pre_order: Vec<usize>,
    root_position: Vec3,
}

impl Skeleton {
    /// Create an empty skeleton
    pub fn new() -> Self {
        Self {
            bones: Vec::new(),
            bone_names: HashMap::new(),
            roots: Vec::new(),
            pre_order: Vec::new(),
            root_position: Vec3::ZERO,
        }
    }

    /// Add a bone under `parent` (or as a new root)
    /// Returns the bone index
    pub fn add_bone(&mut self, mut bone: Bone, parent: Option<usize>) -> Result<usize> {
        if self.bones.len() >= MAX_BONES {
            return Err(Error::Skeleton(format!(
                "maximum bone count ({}) exceeded",
                MAX_BONES
            )));
        }

        if let Some(parent) = parent {
            if parent >= self.bones.len() {
                return Err(Error::Skeleton(format!("invalid parent bone index {}", parent)));
            }
        }

        if self.bone_names.contains_key(&bone.name) {
            return Err(Error::Skeleton(format!("bone name '{}' already exists", bone.name)));
        }

        let index = self.bones.len();
        bone.parent_index = parent;
        bone.children.clear();
        bone.reset_transform();

        match parent {
            Some(parent) => self.bones[parent].children.push(index),
            None => self.roots.push(index),
        }

        self.bone_names.insert(bone.name.clone(), index);
        self.bones.push(bone);
        self.rebuild_pre_order();

        Ok(index)
    }

    /// Get the number of bones in the skeleton
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Get a bone by index
    pub fn get_bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Find a bone index by name
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bone_names.get(name).copied()
    }

    /// Get the parent index of a bone
    pub fn parent_index(&self, bone_index: usize) -> Option<usize> {
        self.bones.get(bone_index)?.parent_index
    }

    /// Get all children of a bone
    pub fn children(&self, bone_index: usize) -> &[usize] {
        self.bones
            .get(bone_index)
            .map(|bone| bone.children())
            .unwrap_or(&[])
    }

    /// Root bone indices in insertion order
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Bone indices in depth-first pre-order, roots in insertion order
    pub fn pre_order(&self) -> &[usize] {
        &self.pre_order
    }

    /// Translation applied beneath every root bone
    ///
    /// Taken from the pose when updating with absolute positioning, zero otherwise.
    pub fn root_position(&self) -> Vec3 {
        self.root_position
    }

    /// Drive every bone from `pose`, parents before children
    pub fn update(&mut self, pose: &Pose, use_absolute_position: bool) {
        self.root_position = if use_absolute_position {
            pose.root_position()
        } else {
            Vec3::ZERO
        };

        for &index in &self.pre_order {
            self.bones[index].apply_pose(pose);
        }
    }

    /// Put every bone back at its rest offset
    pub fn reset_to_rest(&mut self) {
        self.root_position = Vec3::ZERO;
        for bone in &mut self.bones {
            bone.reset_transform();
        }
    }

    /// Current local transforms indexed by bone
    pub fn local_transforms(&self) -> Vec<Mat4> {
        self.bones.iter().map(Bone::transform).collect()
    }

    /// World transforms for all bones, given the transform of the character root
    pub fn world_transforms(&self, root: Mat4) -> Vec<Mat4> {
        let base = root * Mat4::from_translation(self.root_position);
        let mut world_transforms = vec![Mat4::IDENTITY; self.bones.len()];

        // Process bones in order (parents before children)
        for (index, bone) in self.bones.iter().enumerate() {
            world_transforms[index] = match bone.parent_index {
                Some(parent_idx) => world_transforms[parent_idx] * bone.transform(),
                None => base * bone.transform(),
            };
        }

        world_transforms
    }

    /// World-space (start, end) points of each bone, for stick-figure display
    pub fn bone_segments(&self, root: Mat4) -> Vec<(Vec3, Vec3)> {
        let base = root * Mat4::from_translation(self.root_position);
        let world_transforms = self.world_transforms(root);

        self.bones
            .iter()
            .enumerate()
            .map(|(index, bone)| {
                let start = match bone.parent_index {
                    Some(parent_idx) => world_transforms[parent_idx].w_axis.truncate(),
                    None => base.w_axis.truncate(),
                };
                (start, world_transforms[index].w_axis.truncate())
            })
            .collect()
    }

    fn rebuild_pre_order(&mut self) {
        self.pre_order.clear();
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();

        while let Some(index) = stack.pop() {
            self.pre_order.push(index);
            stack.extend(self.bones[index].children.iter().rev().copied());
        }
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for easier skeleton construction
pub struct SkeletonBuilder {
    skeleton: Skeleton,
    last_error: Option<Error>,
}

impl SkeletonBuilder {
    /// Create a new skeleton builder
    pub fn new() -> Self {
        Self {
            skeleton: Skeleton::new(),
            last_error: None,
        }
    }

    /// Add a root bone (no parent)
    pub fn add_root(mut self, bone: Bone) -> Self {
        if self.last_error.is_some() {
            return self;
        }

        if let Err(e) = self.skeleton.add_bone(bone, None) {
            self.last_error = Some(e);
        }
        self
    }

    /// Add a bone with a parent
    pub fn add_bone(mut self, bone: Bone, parent: &str) -> Self {
        if self.last_error.is_some() {
            return self;
        }

        let parent_index = match self.skeleton.find_bone(parent) {
            Some(idx) => idx,
            None => {
                self.last_error = Some(Error::Skeleton(format!(
                    "parent bone '{}' not found for '{}'",
                    parent, bone.name
                )));
                return self;
            }
        };

        if let Err(e) = self.skeleton.add_bone(bone, Some(parent_index)) {
            self.last_error = Some(e);
        }
        self
    }

    /// Build the final skeleton
    pub fn build(self) -> Result<Skeleton> {
        if let Some(error) = self.last_error {
            Err(error)
        } else if self.skeleton.bones.is_empty() {
            Err(Error::Skeleton("skeleton must have at least one bone".into()))
        } else {
            log::debug!(
                "Built skeleton: {} bones, {} roots",
                self.skeleton.bone_count(),
                self.skeleton.roots.len()
            );
            Ok(self.skeleton)
        }
    }
}

impl Default for SkeletonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    fn bone(name: &str, direction: Vec3) -> Bone {
        Bone::new(name, direction, 1.0)
    }

    //     root
    //    /    \
    //  spine  lhip
    //    |      |
    //  head   lknee
    fn create_test_skeleton() -> Skeleton {
        SkeletonBuilder::new()
            .add_root(bone("root", Vec3::Y))
            .add_bone(bone("spine", Vec3::Y), "root")
            .add_bone(bone("lhip", Vec3::NEG_X), "root")
            .add_bone(bone("head", Vec3::Y), "spine")
            .add_bone(bone("lknee", Vec3::NEG_Y), "lhip")
            .build()
            .unwrap()
    }

    #[test]
    fn test_skeleton_add_bone() {
        let mut skeleton = Skeleton::new();

        let root_idx = skeleton.add_bone(bone("root", Vec3::Y), None).unwrap();
        assert_eq!(root_idx, 0);
        assert_eq!(skeleton.bone_count(), 1);
        assert_eq!(skeleton.roots(), &[0]);
    }

    #[test]
    fn test_skeleton_find_bone() {
        let skeleton = create_test_skeleton();
        assert_eq!(skeleton.find_bone("root"), Some(0));
        assert_eq!(skeleton.find_bone("lknee"), Some(4));
        assert_eq!(skeleton.find_bone("nonexistent"), None);
    }

    #[test]
    fn test_skeleton_hierarchy() {
        let skeleton = create_test_skeleton();
        let root = skeleton.find_bone("root").unwrap();
        let spine = skeleton.find_bone("spine").unwrap();
        let lhip = skeleton.find_bone("lhip").unwrap();

        assert_eq!(skeleton.parent_index(spine), Some(root));
        assert_eq!(skeleton.parent_index(root), None);
        assert_eq!(skeleton.children(root), &[spine, lhip]);
        assert!(skeleton.children(999).is_empty());
    }

    #[test]
    fn test_pre_order_visits_parents_first_exactly_once() {
        let skeleton = create_test_skeleton();
        let names: Vec<&str> = skeleton
            .pre_order()
            .iter()
            .map(|&i| skeleton.get_bone(i).unwrap().name.as_str())
            .collect();

        assert_eq!(names, vec!["root", "spine", "head", "lhip", "lknee"]);

        let mut seen = vec![false; skeleton.bone_count()];
        for &index in skeleton.pre_order() {
            assert!(!seen[index], "bone visited twice");
            if let Some(parent) = skeleton.parent_index(index) {
                assert!(seen[parent], "child visited before parent");
            }
            seen[index] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_pre_order_multiple_roots() {
        let skeleton = SkeletonBuilder::new()
            .add_root(bone("a", Vec3::Y))
            .add_root(bone("b", Vec3::Y))
            .add_bone(bone("a1", Vec3::Y), "a")
            .add_bone(bone("b1", Vec3::Y), "b")
            .build()
            .unwrap();

        let order: Vec<usize> = skeleton.pre_order().to_vec();
        let a = skeleton.find_bone("a").unwrap();
        let a1 = skeleton.find_bone("a1").unwrap();
        let b = skeleton.find_bone("b").unwrap();
        let b1 = skeleton.find_bone("b1").unwrap();
        assert_eq!(order, vec![a, a1, b, b1]);
    }

    #[test]
    fn test_update_applies_pose() {
        let mut skeleton = create_test_skeleton();
        let pose = Pose::identity()
            .with_joint("spine", Quat::from_rotation_z(FRAC_PI_2))
            .with_root_position(Vec3::new(3.0, 0.0, 0.0));

        skeleton.update(&pose, true);

        let spine = skeleton.get_bone(skeleton.find_bone("spine").unwrap()).unwrap();
        let translation = spine.transform().w_axis.truncate();
        // +Y rotated 90 degrees about Z is -X
        assert!(translation.abs_diff_eq(Vec3::NEG_X, 1e-5));

        // Bones without a joint entry stay at rest
        let head = skeleton.get_bone(skeleton.find_bone("head").unwrap()).unwrap();
        assert_eq!(head.transform(), head.rest_transform());

        assert_eq!(skeleton.root_position(), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_update_relative_ignores_root_translation() {
        let mut skeleton = create_test_skeleton();
        let pose = Pose::identity().with_root_position(Vec3::new(3.0, 0.0, 0.0));

        skeleton.update(&pose, false);
        assert_eq!(skeleton.root_position(), Vec3::ZERO);
    }

    #[test]
    fn test_reset_to_rest() {
        let mut skeleton = create_test_skeleton();
        let pose = Pose::identity()
            .with_joint("root", Quat::from_rotation_x(0.4))
            .with_root_position(Vec3::ONE);
        skeleton.update(&pose, true);
        skeleton.reset_to_rest();

        for index in 0..skeleton.bone_count() {
            let bone = skeleton.get_bone(index).unwrap();
            assert_eq!(bone.transform(), bone.rest_transform());
        }
        assert_eq!(skeleton.root_position(), Vec3::ZERO);
    }

    #[test]
    fn test_world_transforms_compose_down_the_chain() {
        let mut skeleton = create_test_skeleton();
        skeleton.update(&Pose::identity(), true);

        let world = skeleton.world_transforms(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        let head = skeleton.find_bone("head").unwrap();
        let lknee = skeleton.find_bone("lknee").unwrap();

        // root(+Y) -> spine(+Y) -> head(+Y)
        assert!(world[head].w_axis.truncate().abs_diff_eq(Vec3::new(10.0, 3.0, 0.0), 1e-5));
        // root(+Y) -> lhip(-X) -> lknee(-Y)
        assert!(world[lknee].w_axis.truncate().abs_diff_eq(Vec3::new(9.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_bone_segments() {
        let mut skeleton = create_test_skeleton();
        skeleton.update(&Pose::identity().with_root_position(Vec3::new(0.0, 0.0, 2.0)), true);

        let segments = skeleton.bone_segments(Mat4::IDENTITY);
        assert_eq!(segments.len(), skeleton.bone_count());

        let root = skeleton.find_bone("root").unwrap();
        let spine = skeleton.find_bone("spine").unwrap();
        assert!(segments[root].0.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
        assert!(segments[root].1.abs_diff_eq(Vec3::new(0.0, 1.0, 2.0), 1e-5));
        assert!(segments[spine].0.abs_diff_eq(segments[root].1, 1e-5));
    }

    #[test]
    fn test_max_bones() {
        let mut skeleton = Skeleton::new();

        for i in 0..MAX_BONES {
            skeleton.add_bone(bone(&format!("bone_{}", i), Vec3::Y), None).unwrap();
        }

        let result = skeleton.add_bone(bone("overflow", Vec3::Y), None);
        assert!(matches!(result, Err(Error::Skeleton(_))));
    }

    #[test]
    fn test_skeleton_builder_invalid_parent() {
        let result = SkeletonBuilder::new()
            .add_root(bone("root", Vec3::Y))
            .add_bone(bone("child", Vec3::Y), "nonexistent")
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_skeleton_builder_empty() {
        assert!(SkeletonBuilder::new().build().is_err());
    }

    #[test]
    fn test_duplicate_bone_name() {
        let mut skeleton = Skeleton::new();
        skeleton.add_bone(bone("root", Vec3::Y), None).unwrap();
        let result = skeleton.add_bone(bone("root", Vec3::Y), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_parent_index() {
        let mut skeleton = Skeleton::new();
        let result = skeleton.add_bone(bone("orphan", Vec3::Y), Some(999));
        assert!(result.is_err());
    }
}
