//! Rapier side of the excavator simulation.
//!
//! The chassis is the only dynamic body. Every other part is a
//! position-driven proxy box that follows the kinematic skeleton from
//! `excavator_core`, and whatever the proxies touch is turned into forces
//! on the chassis.

pub mod chassis;
pub mod ground;
pub mod plugin;
pub mod proxy;
pub mod resolver;
pub mod stepper;
pub mod telemetry;
pub mod vehicle;
pub mod world;

pub use chassis::{propulsion, ChassisBody};
pub use ground::{detect_penetration, lowest_point, GroundContactDetector, GroundPenetration};
pub use plugin::{
    spawn_vehicle, InputSources, ResetVehicle, VehiclePlugin, VehicleSet, GROUND_HALF_SIZE,
};
pub use proxy::{proxy_pose, ProxyBody, ProxySet, ProxySynchronizer};
pub use resolver::{
    ground_force_magnitude, resolve_outward_normal, ContactResolver, ForceAccumulator,
    SolverContact,
};
pub use stepper::FixedStepper;
pub use telemetry::{JointReading, TelemetrySnapshot};
pub use vehicle::{FrameReport, Vehicle};
pub use world::{PhysicsWorld, GROUND_GROUP, OBSTACLE_GROUP, PROXY_GROUP};
