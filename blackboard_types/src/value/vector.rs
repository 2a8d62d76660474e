//! Three-component vector values.

use serde::{Deserialize, Serialize};

/// A 3D vector, typically a position or direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);

    /// Create a new vector.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Component-wise equality where NaN matches NaN.
    pub fn same_as(&self, other: &Vector3) -> bool {
        fn component(a: f32, b: f32) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }
        component(self.x, other.x) && component(self.y, other.y) && component(self.z, other.z)
    }
}

impl std::fmt::Display for Vector3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
