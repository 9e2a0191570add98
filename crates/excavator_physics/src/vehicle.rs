//! Per-vehicle simulation context.
//!
//! [`Vehicle`] owns every piece of mutable per-vehicle state (joints,
//! skeleton, proxies, resolver, ledger) and drives them in a fixed order:
//!
//! 1. `ledger.begin_frame()`
//! 2. for each fixed step the accumulator grants:
//!    - apply tread propulsion plus pending contact reactions to the chassis
//!    - advance the solver
//!    - drain solver contacts of every proxy into the resolver
//!    - re-pose the skeleton from the chassis and sync the proxies
//!    - scan proxies for ground penetration into the resolver
//! 3. map the frame's input into joint deltas and the tread command
//! 4. re-pose and sync again so the proxies carry this frame's joint values
//! 5. age ledger entries
//!
//! Rigid bodies live in [`PhysicsWorld`]; the vehicle only holds handles.

use bevy::prelude::*;

use excavator_core::{
    CollisionLedger, ControlCommand, ControlInput, ControlMapping, JointId, JointState, PartId,
    PartTable, Skeleton, VehicleConfig,
};

use crate::chassis::ChassisBody;
use crate::ground::GroundContactDetector;
use crate::proxy::{ProxySet, ProxySynchronizer};
use crate::resolver::ContactResolver;
use crate::stepper::FixedStepper;
use crate::telemetry::{JointReading, TelemetrySnapshot};
use crate::world::PhysicsWorld;

/// What one call to [`Vehicle::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    pub steps: u32,
    /// Parts that took ground and solver forces in the same step
    pub overlaps: u32,
    pub command: ControlCommand,
}

#[derive(Resource)]
pub struct Vehicle {
    joints: JointState,
    skeleton: Skeleton,
    parts: PartTable,
    proxies: ProxySet,
    chassis: ChassisBody,
    detector: GroundContactDetector,
    resolver: ContactResolver,
    ledger: CollisionLedger,
    stepper: FixedStepper,
    mapping: ControlMapping,
    quiescence_secs: f64,
    clock: f64,
    total_steps: u64,
}

impl Vehicle {
    /// Register the chassis and proxies in `world` and pose them from the spawn state.
    pub fn spawn(config: &VehicleConfig, world: &mut PhysicsWorld) -> Self {
        let parts = PartTable::new(&config.parts, config.total_mass);
        let joints = JointState::new(&config.joints);

        let chassis = ChassisBody::spawn(
            world,
            &config.chassis,
            parts.total_mass(),
            parts.get(PartId::Chassis).half_extents,
        );

        let mut skeleton = Skeleton::new(&config.layout);
        skeleton.pose(chassis.root_transform(world), &joints.values());
        let proxies = ProxySet::spawn(world, &parts, &skeleton);

        info!(
            "Spawned excavator: {:.0} kg over {} parts, {} dynamic bodies in world",
            parts.mass_sum(),
            PartId::COUNT,
            world.dynamic_body_count()
        );

        Self {
            joints,
            skeleton,
            parts,
            proxies,
            chassis,
            detector: GroundContactDetector::new(&config.ground),
            resolver: ContactResolver::new(&config.ground, &config.contact),
            ledger: CollisionLedger::new(),
            stepper: FixedStepper::new(&config.stepping),
            mapping: config.control.clone(),
            quiescence_secs: config.contact.quiescence_secs,
            clock: 0.0,
            total_steps: 0,
        }
    }

    /// Run one rendered frame of `delta` seconds with the merged `input`.
    pub fn frame(&mut self, world: &mut PhysicsWorld, input: &ControlInput, delta: f32) -> FrameReport {
        self.ledger.begin_frame();

        let steps = self.stepper.advance(delta);
        let mut overlaps = 0;
        for _ in 0..steps {
            overlaps += self.step(world);
        }

        let dt = self.stepper.clamp_delta(delta);
        let command = self.mapping.map(input, dt);
        self.apply_command(&command);
        self.repose(world);

        self.ledger.expire(self.clock, self.quiescence_secs);

        FrameReport {
            steps,
            overlaps,
            command,
        }
    }

    /// One fixed solver step and its post-step contact pass.
    ///
    /// Returns the number of parts flagged for taking both contact kinds.
    pub fn step(&mut self, world: &mut PhysicsWorld) -> u32 {
        let reaction = self.resolver.take();
        self.chassis.apply_forces(world, &reaction);

        world.step();
        self.clock += f64::from(world.timestep());
        self.total_steps += 1;

        let (center_of_mass, _) = self.chassis.pose(world);

        // Contacts were generated against the poses the solver just used
        for proxy in self.proxies.iter() {
            for contact in world.contacts_with(proxy.collider) {
                self.resolver.apply_solver(
                    proxy,
                    &contact,
                    center_of_mass,
                    self.clock,
                    &mut self.ledger,
                );
            }
        }

        self.repose(world);

        for penetration in self.detector.scan(&self.proxies) {
            self.resolver
                .apply_ground(&penetration, center_of_mass, self.clock, &mut self.ledger);
        }

        self.resolver.finish_step(&mut self.ledger)
    }

    /// Apply joint deltas and set the tread command for the following steps.
    pub fn apply_command(&mut self, command: &ControlCommand) {
        for id in JointId::ALL {
            self.joints.apply_delta(id, command.delta(id));
        }
        self.chassis.set_tread(command.tread);
    }

    /// Re-pose the skeleton from the chassis and push proxy targets.
    fn repose(&mut self, world: &mut PhysicsWorld) {
        self.skeleton
            .pose(self.chassis.root_transform(world), &self.joints.values());
        ProxySynchronizer::sync(&self.skeleton, &mut self.proxies);
        ProxySynchronizer::push(&self.proxies, world);
    }

    /// Back to the spawn pose with initial joints and an empty ledger.
    pub fn reset(&mut self, world: &mut PhysicsWorld) {
        self.joints.reset();
        self.chassis.reset(world);
        self.resolver.clear();
        self.ledger.clear();
        self.stepper.reset();
        self.clock = 0.0;

        self.skeleton
            .pose(self.chassis.root_transform(world), &self.joints.values());
        ProxySynchronizer::sync(&self.skeleton, &mut self.proxies);
        ProxySynchronizer::teleport(&self.proxies, world);

        info!("Excavator reset to spawn pose");
    }

    pub fn joints(&self) -> &JointState {
        &self.joints
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn parts(&self) -> &PartTable {
        &self.parts
    }

    pub fn proxies(&self) -> &ProxySet {
        &self.proxies
    }

    pub fn chassis(&self) -> &ChassisBody {
        &self.chassis
    }

    pub fn ledger(&self) -> &CollisionLedger {
        &self.ledger
    }

    pub fn resolver(&self) -> &ContactResolver {
        &self.resolver
    }

    /// Simulation time (seconds).
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn telemetry(&self, world: &PhysicsWorld) -> TelemetrySnapshot {
        let (position, _) = self.chassis.pose(world);
        TelemetrySnapshot {
            clock: self.clock,
            total_steps: self.total_steps,
            joints: self
                .joints
                .iter()
                .map(|joint| JointReading {
                    id: joint.id(),
                    value: joint.value(),
                    min: joint.min(),
                    max: joint.max(),
                    at_limit: joint.at_limit(),
                })
                .collect(),
            tread: self.chassis.tread(),
            tread_forces: self.chassis.tread_forces(),
            chassis_position: position,
            heading: self.chassis.heading(world),
            linear_velocity: self.chassis.linear_velocity(world),
            angular_velocity: self.chassis.angular_velocity(world),
            contacts: self.ledger.entries().cloned().collect(),
            total_collisions: self.ledger.total_collisions(),
            frame_collisions: self.ledger.frame_collisions(),
            overlapping_contacts: self.ledger.overlapping_contacts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn spawn() -> (PhysicsWorld, Vehicle) {
        let config = VehicleConfig::default();
        let mut world = PhysicsWorld::new(&config.stepping);
        world.insert_ground(50.0);
        let vehicle = Vehicle::spawn(&config, &mut world);
        (world, vehicle)
    }

    #[test]
    fn test_only_chassis_is_dynamic() {
        let (world, vehicle) = spawn();
        assert_eq!(world.dynamic_body_count(), 1);
        assert!((vehicle.proxies().mass_sum() - vehicle.parts().total_mass()).abs() < 1e-2);
    }

    #[test]
    fn test_frame_runs_fixed_steps() {
        let (mut world, mut vehicle) = spawn();
        let idle = ControlInput::default();

        assert_eq!(vehicle.frame(&mut world, &idle, DT).steps, 1);
        assert_eq!(vehicle.frame(&mut world, &idle, 1.0).steps, 3, "Long frame is capped");
        assert_eq!(vehicle.total_steps(), 4);
        assert!((vehicle.clock() - 4.0 * f64::from(DT)).abs() < 1e-6);
    }

    #[test]
    fn test_settles_on_ground_with_ground_contacts() {
        let (mut world, mut vehicle) = spawn();
        let idle = ControlInput::default();

        for _ in 0..240 {
            vehicle.frame(&mut world, &idle, DT);
        }

        let (position, rotation) = vehicle.chassis().pose(&world);
        let chassis = vehicle.proxies().get(PartId::Chassis);
        let bottom = crate::ground::lowest_point(chassis.position, chassis.rotation, chassis.half_extents);
        assert!(bottom.y > -0.1 && bottom.y < 0.05, "Chassis bottom at {}", bottom.y);
        assert!(position.y > 0.0, "Centre of mass sank below ground: {}", position.y);
        assert!((rotation * Vec3::Y).y > 0.95, "Chassis should stay upright");

        let contact = vehicle.ledger().get(PartId::Chassis).expect("Chassis should touch ground");
        assert_eq!(contact.source, excavator_core::ContactSource::Ground);
        assert!(contact.active);
    }

    #[test]
    fn test_joint_input_moves_joint_and_proxy() {
        let (mut world, mut vehicle) = spawn();
        let before = vehicle.proxies().get(PartId::Stick).position;

        let raise = ControlInput {
            axis_y2: 1.0,
            ..Default::default()
        };
        for _ in 0..30 {
            vehicle.frame(&mut world, &raise, DT);
        }

        let boom = vehicle.joints().get(JointId::Boom);
        assert!(boom.value() > 0.3, "Boom should have risen from its initial value");
        let after = vehicle.proxies().get(PartId::Stick).position;
        assert!(after.y > before.y, "Stick proxy should follow the boom");
    }

    #[test]
    fn test_holding_against_limit_flags_joint() {
        let (mut world, mut vehicle) = spawn();
        let open = ControlInput {
            button_y: true,
            ..Default::default()
        };
        // Thumb range is 1.25 rad at 1 rad/s: two seconds is plenty
        for _ in 0..120 {
            vehicle.frame(&mut world, &open, DT);
        }
        let thumb = vehicle.joints().get(JointId::Thumb);
        assert_eq!(thumb.value(), thumb.max());
        assert!(thumb.at_limit());

        vehicle.frame(&mut world, &ControlInput::default(), DT);
        assert!(!vehicle.joints().get(JointId::Thumb).at_limit(), "Released input clears the flag");
    }

    #[test]
    fn test_proxies_track_skeleton_every_frame() {
        let (mut world, mut vehicle) = spawn();
        let input = ControlInput {
            axis_x: 1.0,
            trigger_l: 1.0,
            ..Default::default()
        };

        for _ in 0..20 {
            vehicle.frame(&mut world, &input, DT);
            for proxy in vehicle.proxies().iter() {
                let node = vehicle.skeleton().world(proxy.part.node());
                let expected = node.translation + node.rotation * proxy.center_offset;
                assert!((proxy.position - expected).length() < 1e-5);
            }
        }
    }

    #[test]
    fn test_reset_clears_state() {
        let (mut world, mut vehicle) = spawn();
        let input = ControlInput {
            axis_x: 1.0,
            trigger_r: 1.0,
            trigger_l: 1.0,
            ..Default::default()
        };
        for _ in 0..60 {
            vehicle.frame(&mut world, &input, DT);
        }

        vehicle.reset(&mut world);
        assert_eq!(vehicle.joints().get(JointId::Swing).value(), 0.0);
        assert!(vehicle.ledger().is_empty());
        assert_eq!(vehicle.clock(), 0.0);
        assert!(vehicle.resolver().pending().is_zero());

        let config = VehicleConfig::default();
        let (position, _) = vehicle.chassis().pose(&world);
        assert!((position - Vec3::from_array(config.chassis.spawn_position)).length() < 1e-5);
    }

    #[test]
    fn test_telemetry_reports_joints_and_treads() {
        let (mut world, mut vehicle) = spawn();
        let input = ControlInput {
            trigger_l: 1.0,
            trigger_r: 0.5,
            ..Default::default()
        };
        vehicle.frame(&mut world, &input, DT);

        let snapshot = vehicle.telemetry(&world);
        assert_eq!(snapshot.joints.len(), JointId::ALL.len());
        assert_eq!(snapshot.joints[JointId::Stick.index()].name(), "stick");
        assert!(snapshot.tread_forces.0 > snapshot.tread_forces.1);
        assert_eq!(snapshot.total_steps, 1);
    }
}
