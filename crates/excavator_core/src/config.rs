//! Vehicle tuning: joint ranges, part dimensions, chassis gains and stepping.
//!
//! Every value has a default that drives the stock machine. A JSON file can
//! override any subset of fields:
//!
//! ```ignore
//! use excavator_core::config::load_config;
//!
//! let config = load_config("tuning/heavy.json")?;
//! assert!(config.total_mass > 0.0);
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::input::ControlMapping;
use crate::skeleton::SkeletonLayout;

/// Total vehicle mass shared out between the seven physics parts (kg).
pub const TOTAL_VEHICLE_MASS: f32 = 907.0;

/// Errors that can occur while loading or validating a vehicle config.
#[derive(Debug)]
pub enum ConfigError {
    /// File system error
    Io(std::io::Error),
    /// JSON parse error
    Json(serde_json::Error),
    /// A value is outside its allowed range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Range and starting value of a single joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimit {
    pub min: f32,
    pub max: f32,
    pub initial: f32,
}

impl JointLimit {
    pub const fn new(min: f32, max: f32, initial: f32) -> Self {
        Self { min, max, initial }
    }
}

/// Limits for every joint of the machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointLimits {
    /// Cab yaw about the chassis up axis (radians)
    pub swing: JointLimit,
    /// Arm segment 1 pitch (radians, positive raises)
    pub boom: JointLimit,
    /// Arm segment 2 pitch relative to the boom (radians)
    pub stick: JointLimit,
    /// Bucket pitch at the arm tip (radians)
    pub bucket: JointLimit,
    /// Thumb pitch at the arm tip (radians)
    pub thumb: JointLimit,
    /// Blade lift relative to its pivot (meters)
    pub blade: JointLimit,
}

impl Default for JointLimits {
    fn default() -> Self {
        Self {
            swing: JointLimit::new(-std::f32::consts::PI, std::f32::consts::PI, 0.0),
            boom: JointLimit::new(-0.5, 1.1, 0.3),
            stick: JointLimit::new(-2.2, -0.3, -1.0),
            bucket: JointLimit::new(-1.8, 1.0, 0.0),
            thumb: JointLimit::new(0.0, 1.25, 0.0),
            blade: JointLimit::new(-0.15, 0.25, 0.0),
        }
    }
}

/// Box size of one part plus the centre of its volume in the owning node's frame.
///
/// Several parts hang off their pivot (the boom extends forward from its hinge),
/// so `center_offset` is rarely zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartDimension {
    /// Full box size (x, y, z) in meters
    pub size: [f32; 3],
    /// Box centre relative to the node pivot
    pub center_offset: [f32; 3],
}

impl PartDimension {
    pub const fn new(size: [f32; 3], center_offset: [f32; 3]) -> Self {
        Self {
            size,
            center_offset,
        }
    }

    pub fn volume(&self) -> f32 {
        self.size[0] * self.size[1] * self.size[2]
    }
}

/// Box dimensions of the seven physics-bound parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartDimensions {
    pub chassis: PartDimension,
    pub cab: PartDimension,
    pub boom: PartDimension,
    pub stick: PartDimension,
    pub bucket: PartDimension,
    pub thumb: PartDimension,
    pub blade: PartDimension,
}

impl Default for PartDimensions {
    fn default() -> Self {
        Self {
            chassis: PartDimension::new([1.8, 0.4, 2.2], [0.0, 0.0, 0.0]),
            cab: PartDimension::new([1.3, 0.9, 1.4], [0.0, 0.45, 0.15]),
            boom: PartDimension::new([0.22, 0.26, 1.6], [0.0, 0.0, -0.8]),
            stick: PartDimension::new([0.16, 0.2, 1.1], [0.0, 0.0, -0.55]),
            bucket: PartDimension::new([0.6, 0.35, 0.4], [0.0, -0.2, -0.15]),
            thumb: PartDimension::new([0.12, 0.08, 0.45], [0.0, 0.0, -0.22]),
            blade: PartDimension::new([1.9, 0.35, 0.12], [0.0, 0.0, 0.0]),
        }
    }
}

impl PartDimensions {
    /// Iterate dimensions in part order (chassis first, blade last).
    pub fn as_array(&self) -> [PartDimension; 7] {
        [
            self.chassis,
            self.cab,
            self.boom,
            self.stick,
            self.bucket,
            self.thumb,
            self.blade,
        ]
    }
}

/// Chassis body and tread propulsion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisConfig {
    /// Initial centre-of-mass position in world space
    pub spawn_position: [f32; 3],
    /// Centre of mass relative to the skeleton root (root frame)
    pub center_of_mass_offset: [f32; 3],
    /// Solver linear damping
    pub linear_damping: f32,
    /// Solver angular damping
    pub angular_damping: f32,
    /// Forward force per unit of averaged tread input (N)
    pub force_gain: f32,
    /// Yaw torque per unit of tread speed difference (N*m)
    pub torque_gain: f32,
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            spawn_position: [0.0, 0.15, 0.0],
            // Heavy undercarriage: below the root keeps the ground push above the COM
            center_of_mass_offset: [0.0, -0.1, 0.0],
            linear_damping: 1.0,
            angular_damping: 1.5,
            force_gain: 6000.0,
            torque_gain: 2500.0,
        }
    }
}

/// Penalty spring used for synthetic ground contacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundContactConfig {
    /// Bottom points below this height count as penetrating
    pub threshold: f32,
    /// Force applied at zero depth (N)
    pub base_force: f32,
    /// Linear growth of the force per meter of depth
    pub penetration_gain: f32,
}

impl Default for GroundContactConfig {
    fn default() -> Self {
        Self {
            threshold: 0.01,
            base_force: 4500.0,
            penetration_gain: 50.0,
        }
    }
}

/// Reaction to solver-reported contacts and ledger aging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Force per solver contact along the outward normal (N)
    pub reaction_multiplier: f32,
    /// Seconds without a new contact before a ledger entry goes inactive
    pub quiescence_secs: f64,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            reaction_multiplier: 2000.0,
            quiescence_secs: 0.1,
        }
    }
}

/// Fixed-step solver loop parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Solver timestep (seconds)
    pub fixed_timestep: f32,
    /// Upper bound on solver steps run in one frame
    pub max_steps_per_frame: u32,
    /// Wall-clock frame delta is capped to this (seconds)
    pub max_frame_delta: f32,
    /// Gravity along Y (m/s^2)
    pub gravity: f32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            max_steps_per_frame: 3,
            max_frame_delta: 0.1,
            gravity: -9.81,
        }
    }
}

/// Complete tuning for one vehicle.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Mass shared between the parts (kg)
    pub total_mass: f32,
    pub joints: JointLimits,
    pub parts: PartDimensions,
    /// Pivot offsets of the skeleton nodes
    pub layout: SkeletonLayout,
    pub chassis: ChassisConfig,
    pub ground: GroundContactConfig,
    pub contact: ContactConfig,
    pub control: ControlMapping,
    pub stepping: StepConfig,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            total_mass: TOTAL_VEHICLE_MASS,
            joints: JointLimits::default(),
            parts: PartDimensions::default(),
            layout: SkeletonLayout::default(),
            chassis: ChassisConfig::default(),
            ground: GroundContactConfig::default(),
            contact: ContactConfig::default(),
            control: ControlMapping::default(),
            stepping: StepConfig::default(),
        }
    }
}

impl VehicleConfig {
    /// Check ranges that the simulation relies on.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.total_mass > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "total_mass must be positive, got {}",
                self.total_mass
            )));
        }

        let joints = [
            ("swing", self.joints.swing),
            ("boom", self.joints.boom),
            ("stick", self.joints.stick),
            ("bucket", self.joints.bucket),
            ("thumb", self.joints.thumb),
            ("blade", self.joints.blade),
        ];
        for (name, limit) in joints {
            if !(limit.min <= limit.initial && limit.initial <= limit.max) {
                return Err(ConfigError::Invalid(format!(
                    "joint {} initial {} outside [{}, {}]",
                    name, limit.initial, limit.min, limit.max
                )));
            }
        }

        for dimension in self.parts.as_array() {
            if dimension.size.iter().any(|s| !(*s > 0.0)) {
                return Err(ConfigError::Invalid(format!(
                    "part size must be positive, got {:?}",
                    dimension.size
                )));
            }
        }

        let pivots = [
            self.layout.cab,
            self.layout.boom,
            self.layout.stick,
            self.layout.arm_tip,
            self.layout.bucket,
            self.layout.thumb,
            self.layout.blade,
        ];
        if pivots.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid("skeleton pivots must be finite".into()));
        }

        if !(self.stepping.fixed_timestep > 0.0) || self.stepping.max_steps_per_frame == 0 {
            return Err(ConfigError::Invalid(
                "stepping needs a positive timestep and at least one step per frame".into(),
            ));
        }

        if !(self.stepping.max_frame_delta > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_frame_delta must be positive, got {}",
                self.stepping.max_frame_delta
            )));
        }

        if self.ground.base_force < 0.0
            || self.ground.penetration_gain < 0.0
            || self.contact.reaction_multiplier < 0.0
        {
            return Err(ConfigError::Invalid(
                "contact force gains must be non-negative".into(),
            ));
        }

        Ok(())
    }
}

/// Load a vehicle config from a JSON file and validate it.
///
/// Missing fields keep their defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> ConfigResult<VehicleConfig> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let config: VehicleConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}

/// Serialize a config to pretty JSON.
pub fn config_to_json(config: &VehicleConfig) -> ConfigResult<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(VehicleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_initial_outside_range_rejected() {
        let mut config = VehicleConfig::default();
        config.joints.thumb = JointLimit::new(0.0, 1.25, 2.0);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("thumb"));
    }

    #[test]
    fn test_non_positive_frame_delta_cap_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "stepping": {{ "max_frame_delta": -0.1 }} }}"#).unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_frame_delta"), "Got {}", err);

        let mut config = VehicleConfig::default();
        config.stepping.max_frame_delta = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_joint_range_rejected() {
        let mut config = VehicleConfig::default();
        config.joints.boom = JointLimit::new(1.0, -1.0, 0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_layout_loads_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "layout": {{ "stick": [0.0, 0.0, -2.0] }} }}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.layout.stick, [0.0, 0.0, -2.0]);
        assert_eq!(config.layout.blade, SkeletonLayout::default().blade);
    }

    #[test]
    fn test_zero_part_size_rejected() {
        let mut config = VehicleConfig::default();
        config.parts.bucket.size = [0.6, 0.0, 0.4];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "chassis": {{ "force_gain": 9000.0 }}, "ground": {{ "threshold": 0.02 }} }}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.chassis.force_gain, 9000.0);
        assert_eq!(config.chassis.torque_gain, ChassisConfig::default().torque_gain);
        assert_eq!(config.ground.threshold, 0.02);
        assert_eq!(config.total_mass, TOTAL_VEHICLE_MASS);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_malformed_json_is_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_json_round_trip_preserves_config() {
        let mut config = VehicleConfig::default();
        config.contact.reaction_multiplier = 1234.0;

        let json = config_to_json(&config).unwrap();
        let parsed: VehicleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
