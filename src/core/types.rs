//! Identifier, point and voxel index types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Persistent instance identifier for one physical object across frames.
///
/// Labels are opaque, monotonically increasing and never reused. A label
/// that has been merged away still resolves to its live canonical label
/// through [`crate::labeling::CanonicalMap`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Label(pub u32);

impl Label {
    /// Raw numeric id.
    #[inline]
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// A 3D point in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Point3 {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
    /// Z coordinate in meters
    pub z: f32,
}

impl Point3 {
    /// Origin point.
    pub const ZERO: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point3) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Packed 8-bit RGB color carried by colored point payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Create a new color.
    #[inline]
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Fold a sample into a running average over `weight` observations,
    /// the sample included. `weight = 1.0` replaces the color outright.
    #[inline]
    pub fn blend(self, sample: Rgb, weight: f32) -> Rgb {
        let t = 1.0 / weight.max(1.0);
        let mix = |old: u8, new: u8| (old as f32 + (new as f32 - old as f32) * t).round() as u8;
        Rgb {
            r: mix(self.r, sample.r),
            g: mix(self.g, sample.g),
            b: mix(self.b, sample.b),
        }
    }
}

/// Integer coordinates of one voxel in the persistent map grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct VoxelIndex {
    /// Grid X index
    pub x: i32,
    /// Grid Y index
    pub y: i32,
    /// Grid Z index
    pub z: i32,
}

impl VoxelIndex {
    /// Create a new voxel index.
    #[inline]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Quantize a world point to its containing voxel (floor convention).
    #[inline]
    pub fn from_point(point: &Point3, voxel_size: f32) -> Self {
        let inv = 1.0 / voxel_size;
        Self {
            x: (point.x * inv).floor() as i32,
            y: (point.y * inv).floor() as i32,
            z: (point.z * inv).floor() as i32,
        }
    }

    /// World position of this voxel's center.
    #[inline]
    pub fn center(&self, voxel_size: f32) -> Point3 {
        Point3::new(
            (self.x as f32 + 0.5) * voxel_size,
            (self.y as f32 + 0.5) * voxel_size,
            (self.z as f32 + 0.5) * voxel_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_ordering() {
        assert!(Label(1) < Label(2));
        assert_eq!(Label(7).to_string(), "L7");
    }

    #[test]
    fn test_voxel_quantization() {
        let size = 0.1;
        let p = Point3::new(0.05, 0.15, -0.05);
        let v = VoxelIndex::from_point(&p, size);
        assert_eq!(v, VoxelIndex::new(0, 1, -1));

        // Center of the voxel quantizes back to the same index
        let c = v.center(size);
        assert_eq!(VoxelIndex::from_point(&c, size), v);
    }

    #[test]
    fn test_color_blend_running_average() {
        let first = Rgb::default().blend(Rgb::new(200, 100, 0), 1.0);
        assert_eq!(first, Rgb::new(200, 100, 0));

        // Second observation of (100, 100, 100): plain mean of the two.
        let second = first.blend(Rgb::new(100, 100, 100), 2.0);
        assert_eq!(second, Rgb::new(150, 100, 50));
    }

    #[test]
    fn test_point_distance() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 0.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }
}
