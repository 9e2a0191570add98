//! Turns ground penetrations and solver contacts into chassis forces.
//!
//! Every contact becomes a force applied at the contacting part's position
//! relative to the chassis centre of mass. [`ForceAccumulator`] folds the
//! off-centre part into torque, so no separate torque path exists.
//!
//! Ground and solver contacts address disjoint obstacles (proxies cannot
//! touch the ground slab), so both sources are summed. A step in which the
//! same part got both is still flagged on the ledger.

use bevy::prelude::*;
use rapier3d::prelude as rapier;

use excavator_core::{
    CollisionLedger, ContactConfig, ContactEvent, ContactSource, GroundContactConfig, PartId,
};

use crate::ground::GroundPenetration;
use crate::proxy::ProxyBody;

/// Force and torque about the centre of mass, summed over one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ForceAccumulator {
    pub force: Vec3,
    pub torque: Vec3,
}

impl ForceAccumulator {
    /// Add `force` acting at `relative` (world-space offset from the centre of mass).
    pub fn add_force_at(&mut self, force: Vec3, relative: Vec3) {
        self.force += force;
        self.torque += relative.cross(force);
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    pub fn is_zero(&self) -> bool {
        self.force == Vec3::ZERO && self.torque == Vec3::ZERO
    }
}

/// One active contact pair from the solver's contact graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverContact {
    pub collider_a: rapier::ColliderHandle,
    pub collider_b: rapier::ColliderHandle,
    /// Unit normal pointing from B into A, if the pair produced a manifold
    pub normal: Option<Vec3>,
}

/// Normal pointing away from the obstacle and into `self_collider`.
///
/// Returns `None` when the contact carries no normal or does not involve
/// `self_collider` at all.
pub fn resolve_outward_normal(
    contact: &SolverContact,
    self_collider: rapier::ColliderHandle,
) -> Option<Vec3> {
    let normal = contact.normal?;
    if self_collider == contact.collider_a {
        Some(normal)
    } else if self_collider == contact.collider_b {
        Some(-normal)
    } else {
        None
    }
}

/// Penalty spring magnitude for a ground penetration of `depth`.
pub fn ground_force_magnitude(depth: f32, base_force: f32, penetration_gain: f32) -> f32 {
    (base_force * (1.0 + depth.max(0.0) * penetration_gain)).max(0.0)
}

#[derive(Debug, Clone, Copy, Default)]
struct StepContacts {
    ground: bool,
    solver: bool,
}

/// Collects contact forces between solver steps.
#[derive(Debug, Clone)]
pub struct ContactResolver {
    base_force: f32,
    penetration_gain: f32,
    reaction_multiplier: f32,
    pending: ForceAccumulator,
    touched: [StepContacts; PartId::COUNT],
}

impl ContactResolver {
    pub fn new(ground: &GroundContactConfig, contact: &ContactConfig) -> Self {
        Self {
            base_force: ground.base_force,
            penetration_gain: ground.penetration_gain,
            reaction_multiplier: contact.reaction_multiplier,
            pending: ForceAccumulator::default(),
            touched: [StepContacts::default(); PartId::COUNT],
        }
    }

    /// Push the chassis up out of a ground penetration.
    pub fn apply_ground(
        &mut self,
        penetration: &GroundPenetration,
        center_of_mass: Vec3,
        timestamp: f64,
        ledger: &mut CollisionLedger,
    ) -> Vec3 {
        let magnitude =
            ground_force_magnitude(penetration.depth, self.base_force, self.penetration_gain);
        let force = Vec3::Y * magnitude;

        self.pending
            .add_force_at(force, penetration.position - center_of_mass);
        self.touched[penetration.part.index()].ground = true;

        ledger.record(ContactEvent {
            part: penetration.part,
            timestamp,
            normal: Vec3::Y,
            force,
            source: ContactSource::Ground,
            active: true,
        });

        force
    }

    /// React to one solver contact of `proxy`.
    ///
    /// A contact without a usable normal is skipped and returns `None`.
    pub fn apply_solver(
        &mut self,
        proxy: &ProxyBody,
        contact: &SolverContact,
        center_of_mass: Vec3,
        timestamp: f64,
        ledger: &mut CollisionLedger,
    ) -> Option<Vec3> {
        let normal = resolve_outward_normal(contact, proxy.collider)?;
        if !normal.is_finite() {
            return None;
        }
        let normal = normal.normalize_or_zero();
        if normal == Vec3::ZERO {
            return None;
        }

        let force = normal * self.reaction_multiplier;
        self.pending
            .add_force_at(force, proxy.position - center_of_mass);
        self.touched[proxy.part.index()].solver = true;

        ledger.record(ContactEvent {
            part: proxy.part,
            timestamp,
            normal,
            force,
            source: ContactSource::Solver,
            active: true,
        });

        Some(force)
    }

    /// Close the step: flag every part that took both kinds of contact.
    ///
    /// Returns the number of flagged parts.
    pub fn finish_step(&mut self, ledger: &mut CollisionLedger) -> u32 {
        let mut overlaps = 0;
        for part in PartId::ALL {
            let touched = std::mem::take(&mut self.touched[part.index()]);
            if touched.ground && touched.solver {
                debug!(
                    "{} took ground and solver contact forces in the same step",
                    part.name()
                );
                ledger.flag_overlap();
                overlaps += 1;
            }
        }
        overlaps
    }

    /// Forces waiting for the next solver step.
    pub fn pending(&self) -> &ForceAccumulator {
        &self.pending
    }

    /// Hand the collected forces to the chassis and start over.
    pub fn take(&mut self) -> ForceAccumulator {
        std::mem::take(&mut self.pending)
    }

    /// Drop pending forces and per-step flags.
    pub fn clear(&mut self) {
        self.pending = ForceAccumulator::default();
        self.touched = [StepContacts::default(); PartId::COUNT];
    }
}
