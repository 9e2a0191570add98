//! The one solver-integrated body.
//!
//! The chassis body carries the whole vehicle mass at its centre of mass and
//! has no collider of its own: everything it touches reaches it as a force
//! from the contact resolver. Tread propulsion is recomputed every step from
//! the current orientation and added to the pending reaction forces.

use bevy::prelude::*;
use rapier3d::prelude as rapier;
use rapier::nalgebra::{Point3, Vector3};

use excavator_core::{root_from_chassis, ChassisConfig, TreadCommand};

use crate::resolver::ForceAccumulator;
use crate::world::{from_rotation, from_vector, to_isometry, to_vector, PhysicsWorld};

/// Force and yaw torque from the treads at `rotation`.
///
/// Forward is the body's -Z axis; yaw is about the body's up axis.
pub fn propulsion(rotation: Quat, tread: TreadCommand, force_gain: f32, torque_gain: f32) -> (Vec3, Vec3) {
    let forward = rotation * Vec3::NEG_Z;
    let up = rotation * Vec3::Y;
    let force = forward * ((tread.left + tread.right) * 0.5 * force_gain);
    let torque = up * ((tread.right - tread.left) * torque_gain);
    (force, torque)
}

/// Principal inertia of a solid box with the given half extents.
fn box_inertia(mass: f32, half: Vec3) -> Vector3<f32> {
    let (x2, y2, z2) = (half.x * half.x, half.y * half.y, half.z * half.z);
    Vector3::new(y2 + z2, x2 + z2, x2 + y2) * (mass / 3.0)
}

/// Handle and tuning of the chassis body.
#[derive(Debug, Clone)]
pub struct ChassisBody {
    body: rapier::RigidBodyHandle,
    spawn_position: Vec3,
    com_offset: Vec3,
    force_gain: f32,
    torque_gain: f32,
    tread: TreadCommand,
}

impl ChassisBody {
    /// Insert the chassis as a dynamic body of `mass`, inertia taken from a
    /// box with `half_extents`.
    pub fn spawn(world: &mut PhysicsWorld, config: &ChassisConfig, mass: f32, half_extents: Vec3) -> Self {
        let spawn_position = Vec3::from_array(config.spawn_position);
        let mass_properties =
            rapier::MassProperties::new(Point3::origin(), mass, box_inertia(mass, half_extents));

        let body = rapier::RigidBodyBuilder::dynamic()
            .position(to_isometry(spawn_position, Quat::IDENTITY))
            .additional_mass_properties(mass_properties)
            .linear_damping(config.linear_damping)
            .angular_damping(config.angular_damping)
            .can_sleep(false);
        let body = world.rigid_body_set.insert(body);

        Self {
            body,
            spawn_position,
            com_offset: Vec3::from_array(config.center_of_mass_offset),
            force_gain: config.force_gain,
            torque_gain: config.torque_gain,
            tread: TreadCommand::default(),
        }
    }

    pub fn handle(&self) -> rapier::RigidBodyHandle {
        self.body
    }

    /// Centre of mass position and orientation.
    pub fn pose(&self, world: &PhysicsWorld) -> (Vec3, Quat) {
        world
            .body_pose(self.body)
            .unwrap_or((self.spawn_position, Quat::IDENTITY))
    }

    /// World pose of the skeleton root.
    pub fn root_transform(&self, world: &PhysicsWorld) -> Transform {
        let (position, rotation) = self.pose(world);
        root_from_chassis(position, rotation, self.com_offset)
    }

    pub fn linear_velocity(&self, world: &PhysicsWorld) -> Vec3 {
        world
            .rigid_body_set
            .get(self.body)
            .map(|body| from_vector(body.linvel()))
            .unwrap_or(Vec3::ZERO)
    }

    pub fn angular_velocity(&self, world: &PhysicsWorld) -> Vec3 {
        world
            .rigid_body_set
            .get(self.body)
            .map(|body| from_vector(body.angvel()))
            .unwrap_or(Vec3::ZERO)
    }

    pub fn tread(&self) -> TreadCommand {
        self.tread
    }

    pub fn set_tread(&mut self, tread: TreadCommand) {
        self.tread = tread;
    }

    /// Forward force contributed by each tread (N).
    pub fn tread_forces(&self) -> (f32, f32) {
        (
            self.tread.left * 0.5 * self.force_gain,
            self.tread.right * 0.5 * self.force_gain,
        )
    }

    /// Replace the body's user forces with propulsion plus `reaction`.
    ///
    /// Returns the total that was applied.
    pub fn apply_forces(&self, world: &mut PhysicsWorld, reaction: &ForceAccumulator) -> ForceAccumulator {
        let (_, rotation) = self.pose(world);
        let (force, torque) = propulsion(rotation, self.tread, self.force_gain, self.torque_gain);

        let mut total = *reaction;
        total.add_force(force);
        total.add_torque(torque);

        if let Some(body) = world.rigid_body_set.get_mut(self.body) {
            body.reset_forces(true);
            body.reset_torques(true);
            body.add_force(to_vector(total.force), true);
            body.add_torque(to_vector(total.torque), true);
        }
        total
    }

    /// Put the chassis back at its spawn pose at rest with idle treads.
    pub fn reset(&mut self, world: &mut PhysicsWorld) {
        self.tread = TreadCommand::default();
        if let Some(body) = world.rigid_body_set.get_mut(self.body) {
            body.set_position(to_isometry(self.spawn_position, Quat::IDENTITY), true);
            body.set_linvel(Vector3::zeros(), true);
            body.set_angvel(Vector3::zeros(), true);
            body.reset_forces(true);
            body.reset_torques(true);
        }
    }

    /// Current yaw about world Y, for display.
    pub fn heading(&self, world: &PhysicsWorld) -> f32 {
        let rotation = world
            .rigid_body_set
            .get(self.body)
            .map(|body| from_rotation(body.rotation()))
            .unwrap_or(Quat::IDENTITY);
        let forward = rotation * Vec3::NEG_Z;
        (-forward.x).atan2(-forward.z)
    }
}
