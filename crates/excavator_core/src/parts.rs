//! The seven physics-bound parts and their share of the vehicle mass.

use bevy::math::Vec3;

use crate::config::PartDimensions;
use crate::skeleton::NodeId;

/// Parts that are mirrored into the physics world as proxy boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartId {
    Chassis,
    Cab,
    Boom,
    Stick,
    Bucket,
    Thumb,
    Blade,
}

impl PartId {
    pub const COUNT: usize = 7;

    pub const ALL: [PartId; PartId::COUNT] = [
        PartId::Chassis,
        PartId::Cab,
        PartId::Boom,
        PartId::Stick,
        PartId::Bucket,
        PartId::Thumb,
        PartId::Blade,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            PartId::Chassis => "chassis",
            PartId::Cab => "cab",
            PartId::Boom => "boom",
            PartId::Stick => "stick",
            PartId::Bucket => "bucket",
            PartId::Thumb => "thumb",
            PartId::Blade => "blade",
        }
    }

    /// Skeleton node whose world pose drives this part.
    pub const fn node(self) -> NodeId {
        match self {
            PartId::Chassis => NodeId::Chassis,
            PartId::Cab => NodeId::Cab,
            PartId::Boom => NodeId::Boom,
            PartId::Stick => NodeId::Stick,
            PartId::Bucket => NodeId::Bucket,
            PartId::Thumb => NodeId::Thumb,
            PartId::Blade => NodeId::Blade,
        }
    }
}

/// Fixed geometry of one part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartGeometry {
    pub part: PartId,
    /// Box half-extents
    pub half_extents: Vec3,
    /// Box centre in the node frame
    pub center_offset: Vec3,
    /// Volume share of the total mass. Bookkeeping only; proxies are never integrated.
    pub mass: f32,
}

/// Geometry for all parts, indexed by [`PartId`].
#[derive(Debug, Clone, PartialEq)]
pub struct PartTable {
    parts: [PartGeometry; PartId::COUNT],
    total_mass: f32,
}

impl PartTable {
    /// Build the table, splitting `total_mass` by box volume.
    pub fn new(dimensions: &PartDimensions, total_mass: f32) -> Self {
        let dims = dimensions.as_array();
        let volumes = dims.map(|d| d.volume());
        let masses = distribute_mass(&volumes, total_mass);

        let parts = PartId::ALL.map(|part| {
            let d = dims[part.index()];
            PartGeometry {
                part,
                half_extents: Vec3::from_array(d.size) * 0.5,
                center_offset: Vec3::from_array(d.center_offset),
                mass: masses[part.index()],
            }
        });

        Self { parts, total_mass }
    }

    pub fn get(&self, part: PartId) -> &PartGeometry {
        &self.parts[part.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartGeometry> {
        self.parts.iter()
    }

    pub fn total_mass(&self) -> f32 {
        self.total_mass
    }

    pub fn mass_sum(&self) -> f32 {
        self.parts.iter().map(|p| p.mass).sum()
    }
}

/// Split `total` proportionally to `volumes`.
///
/// Accumulates in f64 so the f32 shares sum back to `total` within rounding.
/// An all-zero volume list splits evenly.
pub fn distribute_mass<const N: usize>(volumes: &[f32; N], total: f32) -> [f32; N] {
    let volume_sum: f64 = volumes.iter().map(|v| f64::from(v.max(0.0))).sum();
    if volume_sum <= 0.0 {
        return [total / N as f32; N];
    }
    volumes.map(|v| (f64::from(total) * f64::from(v.max(0.0)) / volume_sum) as f32)
}
