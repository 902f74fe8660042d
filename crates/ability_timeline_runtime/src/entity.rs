// SPDX-License-Identifier: MIT OR Apache-2.0
//! Entity identity and pose.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a simulated entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

const IDENTITY_ROTATION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const MIN_HEADING_LENGTH_SQ: f32 = 1e-6;

/// World-space position and facing of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    /// Position
    pub position: [f32; 3],
    /// Facing direction (need not be normalized)
    pub heading: [f32; 3],
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            heading: [0.0, 0.0, 1.0],
        }
    }
}

impl Pose {
    /// Pose at a position, facing +Z
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Set the heading
    pub fn facing(mut self, heading: [f32; 3]) -> Self {
        self.heading = heading;
        self
    }

    /// Yaw angle of the heading around +Y, if the heading is usable
    pub fn yaw(&self) -> Option<f32> {
        let [x, y, z] = self.heading;
        (x * x + y * y + z * z > MIN_HEADING_LENGTH_SQ).then(|| x.atan2(z))
    }

    /// Rotation (quaternion xyzw) facing along the heading; identity when the
    /// heading is degenerate
    pub fn rotation(&self) -> [f32; 4] {
        match self.yaw() {
            Some(yaw) => {
                let half = yaw * 0.5;
                [0.0, half.sin(), 0.0, half.cos()]
            }
            None => IDENTITY_ROTATION,
        }
    }

    /// Position plus `offset`, rotated by the heading when `use_heading`
    pub fn offset_position(&self, offset: [f32; 3], use_heading: bool) -> [f32; 3] {
        let [ox, oy, oz] = match self.yaw() {
            Some(yaw) if use_heading => {
                let (sin, cos) = yaw.sin_cos();
                let [x, y, z] = offset;
                [x * cos + z * sin, y, z * cos - x * sin]
            }
            _ => offset,
        };
        let [px, py, pz] = self.position;
        [px + ox, py + oy, pz + oz]
    }
}

/// Hamilton product of two quaternions (xyzw)
pub fn quat_mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    let [ax, ay, az, aw] = a;
    let [bx, by, bz, bw] = b;
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}
