//! Read-only view of the vehicle for UI and logging.

use bevy::prelude::*;

use excavator_core::{ContactEvent, JointId, TreadCommand};

/// One joint as shown to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct JointReading {
    pub id: JointId,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub at_limit: bool,
}

impl JointReading {
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    /// Position inside the range, 0 at `min` and 1 at `max`.
    pub fn fraction(&self) -> f32 {
        let span = self.max - self.min;
        if span > 0.0 {
            ((self.value - self.min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// State published once per frame after the simulation ran.
#[derive(Resource, Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    /// Simulation clock (seconds)
    pub clock: f64,
    pub total_steps: u64,
    pub joints: Vec<JointReading>,
    pub tread: TreadCommand,
    /// Forward force of the (left, right) tread (N)
    pub tread_forces: (f32, f32),
    pub chassis_position: Vec3,
    pub heading: f32,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Latest contact per part, active or not
    pub contacts: Vec<ContactEvent>,
    pub total_collisions: u64,
    pub frame_collisions: u32,
    pub overlapping_contacts: u64,
}

impl TelemetrySnapshot {
    pub fn active_contacts(&self) -> impl Iterator<Item = &ContactEvent> {
        self.contacts.iter().filter(|c| c.active)
    }

    /// Ground speed ignoring vertical motion (m/s).
    pub fn ground_speed(&self) -> f32 {
        Vec2::new(self.linear_velocity.x, self.linear_velocity.z).length()
    }

    pub fn any_joint_at_limit(&self) -> bool {
        self.joints.iter().any(|j| j.at_limit)
    }
}
