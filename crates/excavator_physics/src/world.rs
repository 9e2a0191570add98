//! Rapier world resource and glam/nalgebra conversions.
//!
//! Collision groups split the scene into disjoint obstacle classes:
//! proxies only see [`OBSTACLE_GROUP`] colliders, never the ground plane.
//! Ground contact for proxies is handled by the manual detector instead.

use bevy::prelude::*;
use rapier3d::prelude as rapier;
use rapier::nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};

use excavator_core::StepConfig;

use crate::resolver::SolverContact;

/// Static ground plane.
pub const GROUND_GROUP: rapier::Group = rapier::Group::GROUP_1;
/// Kinematic vehicle proxies.
pub const PROXY_GROUP: rapier::Group = rapier::Group::GROUP_2;
/// Everything else a proxy can hit.
pub const OBSTACLE_GROUP: rapier::Group = rapier::Group::GROUP_3;

/// Half thickness of the ground slab whose top face is y = 0.
const GROUND_HALF_THICKNESS: f32 = 0.5;

pub fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub fn from_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn to_rotation(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

pub fn from_rotation(q: &UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

pub fn to_isometry(position: Vec3, rotation: Quat) -> Isometry3<f32> {
    Isometry3::from_parts(Translation3::from(to_vector(position)), to_rotation(rotation))
}

/// All rapier pipeline state in one resource.
///
/// `PhysicsPipeline::step()` needs every set mutably at once, so they live together.
#[derive(Resource)]
pub struct PhysicsWorld {
    pub gravity: Vector3<f32>,
    pub integration_parameters: rapier::IntegrationParameters,
    pub physics_pipeline: rapier::PhysicsPipeline,
    pub island_manager: rapier::IslandManager,
    pub broad_phase: rapier::DefaultBroadPhase,
    pub narrow_phase: rapier::NarrowPhase,
    pub rigid_body_set: rapier::RigidBodySet,
    pub collider_set: rapier::ColliderSet,
    pub impulse_joint_set: rapier::ImpulseJointSet,
    pub multibody_joint_set: rapier::MultibodyJointSet,
    pub ccd_solver: rapier::CCDSolver,
}

impl PhysicsWorld {
    pub fn new(stepping: &StepConfig) -> Self {
        let mut integration_parameters = rapier::IntegrationParameters::default();
        integration_parameters.dt = stepping.fixed_timestep;

        Self {
            gravity: Vector3::new(0.0, stepping.gravity, 0.0),
            integration_parameters,
            physics_pipeline: rapier::PhysicsPipeline::new(),
            island_manager: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            rigid_body_set: rapier::RigidBodySet::new(),
            collider_set: rapier::ColliderSet::new(),
            impulse_joint_set: rapier::ImpulseJointSet::new(),
            multibody_joint_set: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
        }
    }

    /// Advance the solver by one fixed timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    pub fn timestep(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Insert the ground slab. Its top face is the plane y = 0.
    pub fn insert_ground(&mut self, half_size: f32) -> rapier::ColliderHandle {
        let body = rapier::RigidBodyBuilder::fixed()
            .translation(Vector3::new(0.0, -GROUND_HALF_THICKNESS, 0.0));
        let handle = self.rigid_body_set.insert(body);
        let collider = rapier::ColliderBuilder::cuboid(half_size, GROUND_HALF_THICKNESS, half_size)
            .collision_groups(rapier::InteractionGroups::new(GROUND_GROUP, OBSTACLE_GROUP));
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set)
    }

    /// Insert a box obstacle. Fixed obstacles are walls and rocks, dynamic ones can be pushed.
    pub fn insert_obstacle(
        &mut self,
        position: Vec3,
        half_extents: Vec3,
        dynamic: bool,
    ) -> rapier::RigidBodyHandle {
        let builder = if dynamic {
            rapier::RigidBodyBuilder::dynamic()
        } else {
            rapier::RigidBodyBuilder::fixed()
        };
        let handle = self
            .rigid_body_set
            .insert(builder.translation(to_vector(position)));
        let collider =
            rapier::ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
                .collision_groups(rapier::InteractionGroups::new(
                    OBSTACLE_GROUP,
                    GROUND_GROUP | PROXY_GROUP | OBSTACLE_GROUP,
                ));
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Number of solver-integrated bodies, the chassis included.
    pub fn dynamic_body_count(&self) -> usize {
        self.rigid_body_set
            .iter()
            .filter(|(_, body)| body.is_dynamic())
            .count()
    }

    /// World pose of a body.
    pub fn body_pose(&self, handle: rapier::RigidBodyHandle) -> Option<(Vec3, Quat)> {
        self.rigid_body_set
            .get(handle)
            .map(|body| (from_vector(body.translation()), from_rotation(body.rotation())))
    }

    /// Touching contact pairs involving `collider`, as of the last step.
    ///
    /// A touching pair whose manifolds carry no contact point yields a
    /// contact without a normal; the resolver skips it.
    pub fn contacts_with(&self, collider: rapier::ColliderHandle) -> Vec<SolverContact> {
        self.narrow_phase
            .contact_pairs_with(collider)
            .filter(|pair| pair.has_any_active_contact)
            .map(|pair| SolverContact {
                collider_a: pair.collider1,
                collider_b: pair.collider2,
                // Rapier's manifold normal points from collider1 to collider2;
                // negated it is the push-out direction for collider1.
                normal: pair
                    .manifolds
                    .iter()
                    .find(|manifold| !manifold.points.is_empty())
                    .map(|manifold| -from_vector(&manifold.data.normal)),
            })
            .collect()
    }
}
