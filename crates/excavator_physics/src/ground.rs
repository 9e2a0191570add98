//! Manual ground-plane penetration test for the kinematic proxies.
//!
//! Position-driven proxies never collide with the ground slab (their
//! collision groups exclude it), so ground contact is found here instead:
//! after every solver step each proxy's bottom-centre point is compared
//! against the plane y = 0.

use bevy::prelude::*;

use excavator_core::{GroundContactConfig, PartId};

use crate::proxy::ProxySet;

/// One proxy below the ground threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPenetration {
    pub part: PartId,
    /// Proxy centre in world space
    pub position: Vec3,
    /// World-space bottom-centre point of the box
    pub bottom: Vec3,
    /// `|bottom.y|`
    pub depth: f32,
}

/// World-space bottom-centre point of a box.
pub fn lowest_point(position: Vec3, rotation: Quat, half_extents: Vec3) -> Vec3 {
    position + rotation * Vec3::new(0.0, -half_extents.y, 0.0)
}

/// Penetration depth of a box against y = 0, or `None` when its bottom
/// point is at or above `threshold`.
pub fn detect_penetration(
    position: Vec3,
    rotation: Quat,
    half_extents: Vec3,
    threshold: f32,
) -> Option<f32> {
    let bottom = lowest_point(position, rotation, half_extents);
    (bottom.y < threshold).then(|| bottom.y.abs())
}

/// Scans proxies for ground penetration once per solver step.
#[derive(Debug, Clone)]
pub struct GroundContactDetector {
    threshold: f32,
}

impl GroundContactDetector {
    pub fn new(config: &GroundContactConfig) -> Self {
        Self {
            threshold: config.threshold,
        }
    }

    /// All penetrating proxies, in part order.
    pub fn scan(&self, proxies: &ProxySet) -> Vec<GroundPenetration> {
        proxies
            .iter()
            .filter_map(|proxy| {
                let bottom = lowest_point(proxy.position, proxy.rotation, proxy.half_extents);
                (bottom.y < self.threshold).then(|| GroundPenetration {
                    part: proxy.part,
                    position: proxy.position,
                    bottom,
                    depth: bottom.y.abs(),
                })
            })
            .collect()
    }
}
