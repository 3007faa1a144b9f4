//! Math type re-exports and export-specific math utilities.
//!
//! Transforms are handled in double precision throughout; the host scene
//! and the archive both speak `DMat4`.

pub use glam::{DMat4, DQuat, DVec3, EulerRot};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 3D bounding box with double precision.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct BBox3d {
    pub min: DVec3,
    pub max: DVec3,
}

impl BBox3d {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// The six extents in `min.xyz, max.xyz` order, zeros for an empty box.
    pub fn extents(&self) -> [f64; 6] {
        if self.is_empty() {
            return [0.0; 6];
        }
        [self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z]
    }
}

impl Default for BBox3d {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3d({:?} - {:?})", self.min, self.max)
    }
}

/// Compose a matrix from translate, euler rotate (degrees, XYZ order) and scale.
pub fn compose_trs(translate: [f64; 3], rotate_deg: [f64; 3], scale: [f64; 3]) -> DMat4 {
    let rotation = DQuat::from_euler(
        EulerRot::XYZ,
        rotate_deg[0].to_radians(),
        rotate_deg[1].to_radians(),
        rotate_deg[2].to_radians(),
    );
    DMat4::from_scale_rotation_translation(DVec3::from(scale), rotation, DVec3::from(translate))
}

/// Translation part of an affine matrix.
#[inline]
pub fn translation_of(m: &DMat4) -> DVec3 {
    m.w_axis.truncate()
}

/// Chrono type - time value (seconds).
pub type Chrono = f64;
