//! Normalized controller state and its mapping to joint and tread commands.
//!
//! Keyboard and gamepad samplers each produce a [`ControlInput`]; the frame
//! uses their [`ControlInput::merge`]. [`ControlMapping::map`] then turns the
//! merged state into per-joint deltas and a tread command.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::joint::JointId;

/// Normalized input state from one or more sources.
///
/// Sticks are in `[-1, 1]`, triggers in `[0, 1]`.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlInput {
    pub axis_x: f32,
    pub axis_y: f32,
    pub axis_x2: f32,
    pub axis_y2: f32,
    pub trigger_l: f32,
    pub trigger_r: f32,
    pub bumper_l: bool,
    pub bumper_r: bool,
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub button_y: bool,
    pub button_a: bool,
}

impl ControlInput {
    /// Combine two sources: analog values add and clamp, buttons OR.
    pub fn merge(&self, other: &ControlInput) -> ControlInput {
        let stick = |a: f32, b: f32| (a + b).clamp(-1.0, 1.0);
        let trigger = |a: f32, b: f32| (a + b).clamp(0.0, 1.0);

        ControlInput {
            axis_x: stick(self.axis_x, other.axis_x),
            axis_y: stick(self.axis_y, other.axis_y),
            axis_x2: stick(self.axis_x2, other.axis_x2),
            axis_y2: stick(self.axis_y2, other.axis_y2),
            trigger_l: trigger(self.trigger_l, other.trigger_l),
            trigger_r: trigger(self.trigger_r, other.trigger_r),
            bumper_l: self.bumper_l || other.bumper_l,
            bumper_r: self.bumper_r || other.bumper_r,
            dpad_up: self.dpad_up || other.dpad_up,
            dpad_down: self.dpad_down || other.dpad_down,
            button_y: self.button_y || other.button_y,
            button_a: self.button_a || other.button_a,
        }
    }

    /// Fold any number of sources into one.
    pub fn merge_all<'a>(sources: impl IntoIterator<Item = &'a ControlInput>) -> ControlInput {
        sources
            .into_iter()
            .fold(ControlInput::default(), |acc, s| acc.merge(s))
    }
}

/// Left/right tread speeds in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TreadCommand {
    pub left: f32,
    pub right: f32,
}

impl TreadCommand {
    pub fn new(left: f32, right: f32) -> Self {
        Self {
            left: left.clamp(-1.0, 1.0),
            right: right.clamp(-1.0, 1.0),
        }
    }
}

/// Output of [`ControlMapping::map`] for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlCommand {
    /// Finite deltas indexed by [`JointId::index`]
    pub joint_deltas: [f32; 6],
    pub tread: TreadCommand,
}

impl ControlCommand {
    pub fn delta(&self, id: JointId) -> f32 {
        self.joint_deltas[id.index()]
    }
}

/// Joint speeds and dead zone for turning input into motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlMapping {
    /// Analog magnitudes below this are treated as zero
    pub dead_zone: f32,
    /// Cab swing rate at full deflection (rad/s)
    pub swing_rate: f32,
    /// Boom rate (rad/s)
    pub boom_rate: f32,
    /// Stick rate (rad/s)
    pub stick_rate: f32,
    /// Bucket rate (rad/s)
    pub bucket_rate: f32,
    /// Thumb rate (rad/s)
    pub thumb_rate: f32,
    /// Blade lift rate (m/s)
    pub blade_rate: f32,
}

impl Default for ControlMapping {
    fn default() -> Self {
        Self {
            dead_zone: 0.1,
            swing_rate: 0.8,
            boom_rate: 0.6,
            stick_rate: 0.7,
            bucket_rate: 1.0,
            thumb_rate: 1.0,
            blade_rate: 0.25,
        }
    }
}

impl ControlMapping {
    fn axis(&self, raw: f32) -> f32 {
        if raw.abs() < self.dead_zone {
            0.0
        } else {
            raw
        }
    }

    fn buttons(positive: bool, negative: bool) -> f32 {
        f32::from(u8::from(positive)) - f32::from(u8::from(negative))
    }

    /// Map merged input over `dt` seconds.
    ///
    /// Left stick X swings the cab, left stick Y drives the stick, right stick
    /// X the bucket and right stick Y the boom. Y/A open and close the thumb,
    /// the d-pad raises and lowers the blade. Triggers drive each tread
    /// forward, bumpers reverse it.
    ///
    /// Non-finite values never reach the joints: such a delta is dropped.
    pub fn map(&self, input: &ControlInput, dt: f32) -> ControlCommand {
        let mut joint_deltas = [0.0; 6];
        let rates = [
            (JointId::Swing, self.axis(input.axis_x), self.swing_rate),
            (JointId::Stick, self.axis(input.axis_y), self.stick_rate),
            (JointId::Bucket, self.axis(input.axis_x2), self.bucket_rate),
            (JointId::Boom, self.axis(input.axis_y2), self.boom_rate),
            (
                JointId::Thumb,
                Self::buttons(input.button_y, input.button_a),
                self.thumb_rate,
            ),
            (
                JointId::Blade,
                Self::buttons(input.dpad_up, input.dpad_down),
                self.blade_rate,
            ),
        ];

        for (id, amount, rate) in rates {
            let delta = amount * rate * dt;
            if delta.is_finite() {
                joint_deltas[id.index()] = delta;
            } else {
                warn!("Dropping non-finite {} delta {}", id.name(), delta);
            }
        }

        let tread_speed = |trigger: f32, reverse: bool| {
            let speed = self.axis(trigger) - f32::from(u8::from(reverse));
            if speed.is_finite() {
                speed
            } else {
                0.0
            }
        };

        ControlCommand {
            joint_deltas,
            tread: TreadCommand::new(
                tread_speed(input.trigger_l, input.bumper_l),
                tread_speed(input.trigger_r, input.bumper_r),
            ),
        }
    }
}
