//! Position-driven physics stand-ins for the vehicle parts.
//!
//! Each [`PartId`] gets one kinematic box whose pose is copied from its
//! skeleton node. The solver never integrates these bodies; they exist so
//! the contact graph can report what the vehicle touches.

use bevy::prelude::*;
use rapier3d::prelude as rapier;

use excavator_core::{PartGeometry, PartId, PartTable, Skeleton};

use crate::world::{to_isometry, PhysicsWorld, OBSTACLE_GROUP, PROXY_GROUP};

/// Pose of a part's box given its node's world transform.
///
/// The box centre sits at `center_offset` in the node frame.
pub fn proxy_pose(node_world: &Transform, center_offset: Vec3) -> (Vec3, Quat) {
    (
        node_world.translation + node_world.rotation * center_offset,
        node_world.rotation,
    )
}

/// One kinematic proxy box.
#[derive(Debug, Clone)]
pub struct ProxyBody {
    pub part: PartId,
    pub half_extents: Vec3,
    pub center_offset: Vec3,
    /// Volume share of the vehicle mass (bookkeeping only)
    pub mass: f32,
    /// World pose as of the last sync
    pub position: Vec3,
    pub rotation: Quat,
    pub body: rapier::RigidBodyHandle,
    pub collider: rapier::ColliderHandle,
}

/// All seven proxies, indexed by [`PartId`].
#[derive(Debug, Clone)]
pub struct ProxySet {
    proxies: Vec<ProxyBody>,
}

impl ProxySet {
    /// Register one kinematic body per part, posed from `skeleton`.
    pub fn spawn(world: &mut PhysicsWorld, parts: &PartTable, skeleton: &Skeleton) -> Self {
        let proxies = PartId::ALL
            .iter()
            .map(|&part| Self::spawn_one(world, parts.get(part), skeleton))
            .collect();
        Self { proxies }
    }

    fn spawn_one(world: &mut PhysicsWorld, geometry: &PartGeometry, skeleton: &Skeleton) -> ProxyBody {
        let (position, rotation) =
            proxy_pose(skeleton.world(geometry.part.node()), geometry.center_offset);

        let body = rapier::RigidBodyBuilder::kinematic_position_based()
            .position(to_isometry(position, rotation));
        let body = world.rigid_body_set.insert(body);

        let half = geometry.half_extents;
        let collider = rapier::ColliderBuilder::cuboid(half.x, half.y, half.z)
            .density(0.0)
            .collision_groups(rapier::InteractionGroups::new(PROXY_GROUP, OBSTACLE_GROUP))
            .active_collision_types(
                rapier::ActiveCollisionTypes::default()
                    | rapier::ActiveCollisionTypes::KINEMATIC_FIXED,
            );
        let collider = world
            .collider_set
            .insert_with_parent(collider, body, &mut world.rigid_body_set);

        ProxyBody {
            part: geometry.part,
            half_extents: half,
            center_offset: geometry.center_offset,
            mass: geometry.mass,
            position,
            rotation,
            body,
            collider,
        }
    }

    pub fn get(&self, part: PartId) -> &ProxyBody {
        &self.proxies[part.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProxyBody> {
        self.proxies.iter()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProxyBody> {
        self.proxies.iter_mut()
    }

    /// Part owning `collider`, if it is one of ours.
    pub fn part_for_collider(&self, collider: rapier::ColliderHandle) -> Option<PartId> {
        self.proxies
            .iter()
            .find(|proxy| proxy.collider == collider)
            .map(|proxy| proxy.part)
    }

    pub fn mass_sum(&self) -> f32 {
        self.proxies.iter().map(|proxy| proxy.mass).sum()
    }
}

/// Copies skeleton poses onto the proxies.
pub struct ProxySynchronizer;

impl ProxySynchronizer {
    /// Update every proxy record from the posed skeleton.
    pub fn sync(skeleton: &Skeleton, proxies: &mut ProxySet) {
        for proxy in proxies.iter_mut() {
            let (position, rotation) = proxy_pose(skeleton.world(proxy.part.node()), proxy.center_offset);
            proxy.position = position;
            proxy.rotation = rotation;
        }
    }

    /// Schedule the recorded poses as each body's target for the next step.
    pub fn push(proxies: &ProxySet, world: &mut PhysicsWorld) {
        for proxy in proxies.iter() {
            if let Some(body) = world.rigid_body_set.get_mut(proxy.body) {
                body.set_next_kinematic_position(to_isometry(proxy.position, proxy.rotation));
            }
        }
    }

    /// Move the bodies to the recorded poses immediately, without sweeping.
    pub fn teleport(proxies: &ProxySet, world: &mut PhysicsWorld) {
        for proxy in proxies.iter() {
            if let Some(body) = world.rigid_body_set.get_mut(proxy.body) {
                let pose = to_isometry(proxy.position, proxy.rotation);
                body.set_position(pose, true);
                body.set_next_kinematic_position(pose);
            }
        }
    }
}
