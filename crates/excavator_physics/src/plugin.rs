//! Bevy wiring for the vehicle simulation.

use bevy::prelude::*;

use excavator_core::{ControlInput, VehicleConfig};

use crate::telemetry::TelemetrySnapshot;
use crate::vehicle::Vehicle;
use crate::world::PhysicsWorld;

/// Half size of the ground slab spawned with the vehicle.
pub const GROUND_HALF_SIZE: f32 = 50.0;

/// Ordering of vehicle systems within `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum VehicleSet {
    /// Input samplers write their [`InputSources`] slot here
    Input,
    /// Merge input, run the frame, publish telemetry
    Simulate,
}

/// Request to put the vehicle back at its spawn pose.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct ResetVehicle;

/// Raw state of each input device, merged into [`ControlInput`] every frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct InputSources {
    pub keyboard: ControlInput,
    pub gamepad: ControlInput,
}

impl InputSources {
    pub fn merged(&self) -> ControlInput {
        ControlInput::merge_all([&self.keyboard, &self.gamepad])
    }
}

/// Spawns the physics world, ground and vehicle, then steps them every frame.
///
/// Insert a [`VehicleConfig`] before adding the plugin to override the defaults.
pub struct VehiclePlugin;

impl Plugin for VehiclePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VehicleConfig>()
            .init_resource::<InputSources>()
            .init_resource::<ControlInput>()
            .init_resource::<TelemetrySnapshot>()
            .add_message::<ResetVehicle>()
            .configure_sets(Update, (VehicleSet::Input, VehicleSet::Simulate).chain())
            .add_systems(Startup, spawn_vehicle)
            .add_systems(
                Update,
                (
                    handle_reset,
                    merge_input_sources,
                    step_vehicle,
                    publish_telemetry,
                )
                    .chain()
                    .in_set(VehicleSet::Simulate),
            );
    }
}

/// Spawn from the [`VehicleConfig`] resource, falling back to the defaults
/// when it does not validate.
pub fn spawn_vehicle(mut commands: Commands, mut config: ResMut<VehicleConfig>) {
    if let Err(e) = config.validate() {
        warn!("Vehicle config rejected, spawning with defaults: {}", e);
        *config = VehicleConfig::default();
    }

    let mut world = PhysicsWorld::new(&config.stepping);
    world.insert_ground(GROUND_HALF_SIZE);
    let vehicle = Vehicle::spawn(&config, &mut world);

    commands.insert_resource(world);
    commands.insert_resource(vehicle);
}

fn handle_reset(
    mut requests: MessageReader<ResetVehicle>,
    vehicle: Option<ResMut<Vehicle>>,
    world: Option<ResMut<PhysicsWorld>>,
) {
    if requests.read().count() == 0 {
        return;
    }
    if let (Some(mut vehicle), Some(mut world)) = (vehicle, world) {
        vehicle.reset(&mut world);
    }
}

fn merge_input_sources(sources: Res<InputSources>, mut input: ResMut<ControlInput>) {
    *input = sources.merged();
}

fn step_vehicle(
    time: Res<Time>,
    input: Res<ControlInput>,
    vehicle: Option<ResMut<Vehicle>>,
    world: Option<ResMut<PhysicsWorld>>,
) {
    let (Some(mut vehicle), Some(mut world)) = (vehicle, world) else {
        return;
    };

    let report = vehicle.frame(&mut world, &input, time.delta_secs());
    if report.overlaps > 0 {
        debug!(
            "{} part(s) took ground and solver forces this frame",
            report.overlaps
        );
    }
}

fn publish_telemetry(
    vehicle: Option<Res<Vehicle>>,
    world: Option<Res<PhysicsWorld>>,
    mut telemetry: ResMut<TelemetrySnapshot>,
) {
    if let (Some(vehicle), Some(world)) = (vehicle, world) {
        *telemetry = vehicle.telemetry(&world);
    }
}
