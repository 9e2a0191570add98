//! Clamped joint values for the swing, arm and blade actuators.
//!
//! A joint only changes through [`JointSpec::apply_delta`], which clamps the
//! result into `[min, max]` and records whether the move was blocked by a limit.

use crate::config::{JointLimit, JointLimits};

/// The six actuated degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointId {
    /// Cab yaw
    Swing,
    /// Arm segment 1 pitch
    Boom,
    /// Arm segment 2 pitch
    Stick,
    /// Bucket pitch
    Bucket,
    /// Thumb pitch
    Thumb,
    /// Blade linear height
    Blade,
}

impl JointId {
    pub const ALL: [JointId; 6] = [
        JointId::Swing,
        JointId::Boom,
        JointId::Stick,
        JointId::Bucket,
        JointId::Thumb,
        JointId::Blade,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            JointId::Swing => "swing",
            JointId::Boom => "boom",
            JointId::Stick => "stick",
            JointId::Bucket => "bucket",
            JointId::Thumb => "thumb",
            JointId::Blade => "blade",
        }
    }

    /// True for the prismatic blade, false for the revolute joints.
    pub const fn is_linear(self) -> bool {
        matches!(self, JointId::Blade)
    }
}

/// A single joint value with its range.
#[derive(Debug, Clone, PartialEq)]
pub struct JointSpec {
    id: JointId,
    value: f32,
    min: f32,
    max: f32,
    initial: f32,
    at_limit: bool,
}

impl JointSpec {
    /// Create a joint. The initial value is clamped into range.
    pub fn new(id: JointId, limit: JointLimit) -> Self {
        let initial = limit.initial.clamp(limit.min, limit.max);
        Self {
            id,
            value: initial,
            min: limit.min,
            max: limit.max,
            initial,
            at_limit: false,
        }
    }

    /// Move the joint by `delta`, clamped into `[min, max]`.
    ///
    /// `at_limit` becomes true when a nonzero delta was cut short by a limit,
    /// which includes a push against a limit that leaves the value unchanged.
    /// The caller must pass a finite delta.
    pub fn apply_delta(&mut self, delta: f32) -> f32 {
        let requested = self.value + delta;
        let clamped = requested.clamp(self.min, self.max);
        self.at_limit = delta != 0.0 && clamped != requested;
        self.value = clamped;
        self.value
    }

    /// Return to the initial value and clear the limit flag.
    pub fn reset(&mut self) {
        self.value = self.initial;
        self.at_limit = false;
    }

    pub fn id(&self) -> JointId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn at_limit(&self) -> bool {
        self.at_limit
    }
}

/// Plain copy of the current joint values, used to pose the skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointValues {
    pub swing: f32,
    pub boom: f32,
    pub stick: f32,
    pub bucket: f32,
    pub thumb: f32,
    pub blade: f32,
}

impl JointValues {
    pub fn get(&self, id: JointId) -> f32 {
        match id {
            JointId::Swing => self.swing,
            JointId::Boom => self.boom,
            JointId::Stick => self.stick,
            JointId::Bucket => self.bucket,
            JointId::Thumb => self.thumb,
            JointId::Blade => self.blade,
        }
    }
}

/// All joints of one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct JointState {
    joints: [JointSpec; 6],
}

impl Default for JointState {
    fn default() -> Self {
        Self::new(&JointLimits::default())
    }
}

impl JointState {
    pub fn new(limits: &JointLimits) -> Self {
        Self {
            joints: [
                JointSpec::new(JointId::Swing, limits.swing),
                JointSpec::new(JointId::Boom, limits.boom),
                JointSpec::new(JointId::Stick, limits.stick),
                JointSpec::new(JointId::Bucket, limits.bucket),
                JointSpec::new(JointId::Thumb, limits.thumb),
                JointSpec::new(JointId::Blade, limits.blade),
            ],
        }
    }

    pub fn get(&self, id: JointId) -> &JointSpec {
        &self.joints[id.index()]
    }

    pub fn apply_delta(&mut self, id: JointId, delta: f32) -> f32 {
        self.joints[id.index()].apply_delta(delta)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JointSpec> {
        self.joints.iter()
    }

    pub fn reset(&mut self) {
        for joint in &mut self.joints {
            joint.reset();
        }
    }

    pub fn values(&self) -> JointValues {
        JointValues {
            swing: self.get(JointId::Swing).value(),
            boom: self.get(JointId::Boom).value(),
            stick: self.get(JointId::Stick).value(),
            bucket: self.get(JointId::Bucket).value(),
            thumb: self.get(JointId::Thumb).value(),
            blade: self.get(JointId::Blade).value(),
        }
    }
}
