//! Three-dimensional world coordinates.

use std::fmt;
use std::ops::{Add, Mul, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A position or offset in world space, in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vector3 {
    /// Lateral component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
    /// Longitudinal component.
    pub z: f64,
}

impl Vector3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a vector from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared euclidean distance to another point.
    #[must_use]
    pub fn distance_squared_to(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    /// The point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        (self + other) * 0.5
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coord() -> impl Strategy<Value = f64> {
        -1.0e6..1.0e6
    }

    fn vector() -> impl Strategy<Value = Vector3> {
        (coord(), coord(), coord()).prop_map(|(x, y, z)| Vector3::new(x, y, z))
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Vector3::new(1.0, 2.0, 2.0);
        assert_eq!(a.distance_to(Vector3::ZERO), 3.0);
        assert_eq!(Vector3::ZERO.distance_to(a), 3.0);
    }

    #[test]
    fn midpoint_halves_each_axis() {
        let m = Vector3::new(0.0, 4.0, -2.0).midpoint(Vector3::new(2.0, 0.0, 2.0));
        assert_eq!(m, Vector3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn display() {
        assert_eq!(Vector3::new(1.0, 0.5, -3.0).to_string(), "(1, 0.5, -3)");
    }

    proptest! {
        #[test]
        fn distance_is_symmetric_and_non_negative(a in vector(), b in vector()) {
            let d = a.distance_to(b);
            prop_assert!(d >= 0.0);
            prop_assert_eq!(d, b.distance_to(a));
        }

        #[test]
        fn midpoint_is_order_independent(a in vector(), b in vector()) {
            prop_assert_eq!(a.midpoint(b), b.midpoint(a));
        }
    }
}
