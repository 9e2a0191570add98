//! Kinematic side of the excavator simulation.
//!
//! This crate provides:
//! - Clamped joint state for the swing, boom, stick, bucket, thumb and blade
//! - The fixed skeleton hierarchy and its world-transform pass
//! - Part geometry and the volume-based mass split
//! - Normalized controller input, merging and mapping to joint/tread commands
//! - The per-part collision ledger
//! - Vehicle tuning and JSON config loading
//!
//! Nothing here touches the physics solver; see `excavator_physics`.

pub mod config;
pub mod input;
pub mod joint;
pub mod ledger;
pub mod parts;
pub mod skeleton;

pub use config::{
    config_to_json, load_config, ChassisConfig, ConfigError, ConfigResult, ContactConfig,
    GroundContactConfig, JointLimit, JointLimits, PartDimension, PartDimensions, StepConfig,
    VehicleConfig, TOTAL_VEHICLE_MASS,
};
pub use input::{ControlCommand, ControlInput, ControlMapping, TreadCommand};
pub use joint::{JointId, JointSpec, JointState, JointValues};
pub use ledger::{CollisionLedger, ContactEvent, ContactSource};
pub use parts::{distribute_mass, PartGeometry, PartId, PartTable};
pub use skeleton::{root_from_chassis, JointDrive, NodeId, Skeleton, SkeletonLayout, SkeletonNode};
