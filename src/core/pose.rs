//! Sensor pose types for 3D mapping.

use serde::{Deserialize, Serialize};

use super::types::Point3;

/// Unit quaternion representing a 3D rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// Scalar component
    pub w: f32,
    /// X vector component
    pub x: f32,
    /// Y vector component
    pub y: f32,
    /// Z vector component
    pub z: f32,
}

impl Quaternion {
    /// Identity rotation.
    #[inline]
    pub fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Create a quaternion, normalized to unit length.
    ///
    /// A degenerate (near-zero) quaternion falls back to identity.
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        let norm = (w * w + x * x + y * y + z * z).sqrt();
        if norm < 1e-9 {
            return Self::identity();
        }
        let inv = 1.0 / norm;
        Self {
            w: w * inv,
            x: x * inv,
            y: y * inv,
            z: z * inv,
        }
    }

    /// Rotation of `angle` radians around the Z axis.
    pub fn from_yaw(angle: f32) -> Self {
        let half = angle * 0.5;
        Self {
            w: half.cos(),
            x: 0.0,
            y: 0.0,
            z: half.sin(),
        }
    }

    /// Rotate a point by this quaternion.
    ///
    /// Uses the expanded form `v' = v + 2w(q×v) + 2(q×(q×v))` which avoids
    /// building a rotation matrix.
    #[inline]
    pub fn rotate(&self, p: &Point3) -> Point3 {
        // t = 2 * (q_vec × v)
        let tx = 2.0 * (self.y * p.z - self.z * p.y);
        let ty = 2.0 * (self.z * p.x - self.x * p.z);
        let tz = 2.0 * (self.x * p.y - self.y * p.x);

        Point3::new(
            p.x + self.w * tx + (self.y * tz - self.z * ty),
            p.y + self.w * ty + (self.z * tx - self.x * tz),
            p.z + self.w * tz + (self.x * ty - self.y * tx),
        )
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

/// Sensor pose in the world frame.
///
/// Represents the rigid transform from the sensor frame to the world frame:
/// rotation followed by translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Pose3 {
    /// Translation in meters
    pub translation: Point3,
    /// Orientation as a unit quaternion
    pub rotation: Quaternion,
}

impl Pose3 {
    /// Create a new pose.
    #[inline]
    pub fn new(translation: Point3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Identity pose at the world origin.
    #[inline]
    pub fn identity() -> Self {
        Self {
            translation: Point3::ZERO,
            rotation: Quaternion::identity(),
        }
    }

    /// Transform a point from the sensor frame to the world frame.
    #[inline]
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        let r = self.rotation.rotate(point);
        Point3::new(
            r.x + self.translation.x,
            r.y + self.translation.y,
            r.z + self.translation.z,
        )
    }
}
