//! Fixed kinematic hierarchy of the machine.
//!
//! Nodes live in an arena ordered parent-before-child:
//!
//! ```text
//! chassis ─┬─ cab ── boom ── stick ── arm tip ─┬─ bucket
//!          │                                   └─ thumb
//!          └─ blade
//! ```
//!
//! [`Skeleton::pose`] rebuilds every world transform from the root pose and
//! the joint values in one forward pass. Nothing is carried over from the
//! previous pose, so identical inputs give bit-identical transforms.

use bevy::math::{Quat, Vec3};
use bevy::transform::components::Transform;
use serde::{Deserialize, Serialize};

use crate::joint::{JointId, JointValues};

/// Index of a node in the skeleton arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Chassis,
    Cab,
    Boom,
    Stick,
    ArmTip,
    Bucket,
    Thumb,
    Blade,
}

impl NodeId {
    pub const COUNT: usize = 8;

    /// All nodes in arena order (parents first).
    pub const ALL: [NodeId; NodeId::COUNT] = [
        NodeId::Chassis,
        NodeId::Cab,
        NodeId::Boom,
        NodeId::Stick,
        NodeId::ArmTip,
        NodeId::Bucket,
        NodeId::Thumb,
        NodeId::Blade,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            NodeId::Chassis => "chassis",
            NodeId::Cab => "cab",
            NodeId::Boom => "boom",
            NodeId::Stick => "stick",
            NodeId::ArmTip => "arm_tip",
            NodeId::Bucket => "bucket",
            NodeId::Thumb => "thumb",
            NodeId::Blade => "blade",
        }
    }
}

/// How a joint value moves a node relative to its pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointDrive {
    /// No joint (root and arm tip)
    Fixed,
    /// Rotation about the local Y axis
    Yaw(JointId),
    /// Rotation about the local X axis; positive raises a -Z pointing segment
    Pitch(JointId),
    /// Translation along the local Y axis
    Lift(JointId),
}

impl JointDrive {
    /// Local transform for this drive at `pivot` given the joint values.
    pub fn local_transform(&self, pivot: Vec3, joints: &JointValues) -> Transform {
        match *self {
            JointDrive::Fixed => Transform::from_translation(pivot),
            JointDrive::Yaw(id) => Transform::from_translation(pivot)
                .with_rotation(Quat::from_rotation_y(joints.get(id))),
            JointDrive::Pitch(id) => Transform::from_translation(pivot)
                .with_rotation(Quat::from_rotation_x(joints.get(id))),
            JointDrive::Lift(id) => Transform::from_translation(pivot + Vec3::Y * joints.get(id)),
        }
    }
}

/// One posed node.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonNode {
    /// Parent in the arena; `None` only for the root
    pub parent: Option<NodeId>,
    /// Fixed pivot offset in the parent frame
    pub pivot: Vec3,
    pub drive: JointDrive,
    world: Transform,
}

impl SkeletonNode {
    pub fn world(&self) -> &Transform {
        &self.world
    }
}

/// Pivot offsets of every non-root node, each in its parent's frame.
///
/// The boom and stick pivots double as segment lengths, so they should track
/// the boom and stick part dimensions when those are tuned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonLayout {
    pub cab: [f32; 3],
    pub boom: [f32; 3],
    pub stick: [f32; 3],
    pub arm_tip: [f32; 3],
    pub bucket: [f32; 3],
    pub thumb: [f32; 3],
    pub blade: [f32; 3],
}

impl Default for SkeletonLayout {
    fn default() -> Self {
        Self {
            // Top of the undercarriage
            cab: [0.0, 0.2, 0.0],
            // Boom hinge at the front of the cab
            boom: [0.0, 0.35, -0.45],
            // Boom length
            stick: [0.0, 0.0, -1.6],
            // Stick length
            arm_tip: [0.0, 0.0, -1.1],
            bucket: [0.0, 0.0, 0.0],
            thumb: [0.0, 0.08, 0.0],
            // Front of the undercarriage, clear of the ground at rest
            blade: [0.0, 0.05, -1.15],
        }
    }
}

impl SkeletonLayout {
    /// Pivot offset of `id` in its parent's frame. The root has none.
    pub fn pivot(&self, id: NodeId) -> Vec3 {
        let offset = match id {
            NodeId::Chassis => return Vec3::ZERO,
            NodeId::Cab => self.cab,
            NodeId::Boom => self.boom,
            NodeId::Stick => self.stick,
            NodeId::ArmTip => self.arm_tip,
            NodeId::Bucket => self.bucket,
            NodeId::Thumb => self.thumb,
            NodeId::Blade => self.blade,
        };
        Vec3::from_array(offset)
    }
}

/// The posed hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    nodes: [SkeletonNode; NodeId::COUNT],
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new(&SkeletonLayout::default())
    }
}

impl Skeleton {
    pub fn new(layout: &SkeletonLayout) -> Self {
        let node = |id, parent, drive| SkeletonNode {
            parent,
            pivot: layout.pivot(id),
            drive,
            world: Transform::IDENTITY,
        };

        Self {
            nodes: [
                node(NodeId::Chassis, None, JointDrive::Fixed),
                node(NodeId::Cab, Some(NodeId::Chassis), JointDrive::Yaw(JointId::Swing)),
                node(NodeId::Boom, Some(NodeId::Cab), JointDrive::Pitch(JointId::Boom)),
                node(NodeId::Stick, Some(NodeId::Boom), JointDrive::Pitch(JointId::Stick)),
                node(NodeId::ArmTip, Some(NodeId::Stick), JointDrive::Fixed),
                node(NodeId::Bucket, Some(NodeId::ArmTip), JointDrive::Pitch(JointId::Bucket)),
                node(NodeId::Thumb, Some(NodeId::ArmTip), JointDrive::Pitch(JointId::Thumb)),
                node(NodeId::Blade, Some(NodeId::Chassis), JointDrive::Lift(JointId::Blade)),
            ],
        }
    }

    /// Recompute every world transform from scratch.
    ///
    /// `root` is the world pose of the chassis node (the skeleton root).
    pub fn pose(&mut self, root: Transform, joints: &JointValues) {
        for id in NodeId::ALL {
            let node = &self.nodes[id.index()];
            let local = node.drive.local_transform(node.pivot, joints);
            let world = match node.parent {
                Some(parent) => self.nodes[parent.index()].world.mul_transform(local),
                None => root.mul_transform(local),
            };
            self.nodes[id.index()].world = world;
        }
    }

    pub fn world(&self, id: NodeId) -> &Transform {
        &self.nodes[id.index()].world
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SkeletonNode)> {
        NodeId::ALL.into_iter().zip(self.nodes.iter())
    }
}

/// Skeleton root pose for a chassis body whose centre of mass sits at
/// `com_offset` in the root frame.
pub fn root_from_chassis(chassis_position: Vec3, chassis_rotation: Quat, com_offset: Vec3) -> Transform {
    Transform::from_translation(chassis_position - chassis_rotation * com_offset)
        .with_rotation(chassis_rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::JointState;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_arena_is_parent_first() {
        let skeleton = Skeleton::default();
        for (id, node) in skeleton.iter() {
            if let Some(parent) = node.parent {
                assert!(parent.index() < id.index(), "{} before parent", id.name());
            }
        }
    }

    #[test]
    fn test_zero_joints_chain_pivots_straight() {
        let mut skeleton = Skeleton::default();
        let layout = SkeletonLayout::default();
        skeleton.pose(Transform::IDENTITY, &JointValues::default());

        let expected_tip = [NodeId::Cab, NodeId::Boom, NodeId::Stick, NodeId::ArmTip]
            .into_iter()
            .map(|id| layout.pivot(id))
            .sum::<Vec3>();
        assert!(approx(skeleton.world(NodeId::ArmTip).translation, expected_tip));
        assert!(approx(
            skeleton.world(NodeId::Blade).translation,
            layout.pivot(NodeId::Blade)
        ));
    }

    #[test]
    fn test_boom_pitch_raises_arm() {
        let mut skeleton = Skeleton::default();
        let mut joints = JointValues::default();
        skeleton.pose(Transform::IDENTITY, &joints);
        let flat = skeleton.world(NodeId::Stick).translation;

        joints.boom = 0.5;
        skeleton.pose(Transform::IDENTITY, &joints);
        let raised = skeleton.world(NodeId::Stick).translation;

        assert!(raised.y > flat.y, "Positive boom pitch should raise the stick pivot");
    }

    #[test]
    fn test_swing_rotates_arm_about_vertical() {
        let mut skeleton = Skeleton::default();
        let mut joints = JointValues::default();
        joints.swing = std::f32::consts::FRAC_PI_2;
        skeleton.pose(Transform::IDENTITY, &joints);

        let tip = skeleton.world(NodeId::ArmTip).translation;
        // -Z forward rotated +90 degrees about Y points to -X
        assert!(tip.x < -2.0, "Arm should swing to -X, got {:?}", tip);
        assert!(tip.z.abs() < 1e-4);
    }

    #[test]
    fn test_blade_lift_translates_only() {
        let mut skeleton = Skeleton::default();
        let mut joints = JointValues::default();
        joints.blade = -0.1;
        skeleton.pose(Transform::IDENTITY, &joints);

        let blade = skeleton.world(NodeId::Blade);
        let layout = SkeletonLayout::default();
        assert!(approx(blade.translation, layout.pivot(NodeId::Blade) - Vec3::Y * 0.1));
        assert_eq!(blade.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_root_pose_propagates_to_children() {
        let mut skeleton = Skeleton::default();
        let root = Transform::from_xyz(3.0, 1.0, -2.0).with_rotation(Quat::from_rotation_y(0.7));
        skeleton.pose(root, &JointValues::default());

        let layout = SkeletonLayout::default();
        let expected = root.translation + root.rotation * layout.pivot(NodeId::Cab);
        assert!(approx(skeleton.world(NodeId::Cab).translation, expected));
    }

    #[test]
    fn test_repose_is_bit_identical() {
        let mut state = JointState::default();
        state.apply_delta(JointId::Boom, 0.37);
        state.apply_delta(JointId::Bucket, -0.81);
        let root = Transform::from_xyz(0.5, 0.2, 0.1).with_rotation(Quat::from_rotation_y(1.3));

        let mut skeleton = Skeleton::default();
        skeleton.pose(root, &state.values());
        let first = skeleton.clone();

        // Pose somewhere else and come back
        let mut other = state.values();
        other.stick = -2.0;
        skeleton.pose(Transform::IDENTITY, &other);
        for _ in 0..100 {
            skeleton.pose(root, &state.values());
        }

        assert_eq!(skeleton, first);
    }

    #[test]
    fn test_root_from_chassis_removes_offset() {
        let rotation = Quat::from_rotation_y(0.4);
        let offset = Vec3::new(0.0, 0.0, 0.15);
        let root = root_from_chassis(Vec3::new(1.0, 0.5, 0.0), rotation, offset);

        let com = root.translation + root.rotation * offset;
        assert!(approx(com, Vec3::new(1.0, 0.5, 0.0)));
        assert_eq!(root.rotation, rotation);
    }
}
