//! Spatial force vectors.
//!
//! A spatial force is a `(torque, force)` pair applied at a body's origin
//! and expressed in the ground frame. Flattened to six components it follows
//! Featherstone's `[angular; linear]` ordering.

use nalgebra::{Vector3, Vector6};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Torque and linear force acting on a rigid body, about the body origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpatialForce {
    /// Moment about the body origin (N·m), ground frame.
    pub torque: Vector3<f64>,
    /// Linear force (N), ground frame.
    pub force: Vector3<f64>,
}

impl SpatialForce {
    /// Create a spatial force from its parts.
    #[must_use]
    pub const fn new(torque: Vector3<f64>, force: Vector3<f64>) -> Self {
        Self { torque, force }
    }

    /// The zero spatial force.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Force `force` applied at `offset` from the body origin.
    ///
    /// `offset` is the application point relative to the body origin,
    /// already re-expressed in ground. The torque is `offset × force`.
    #[must_use]
    pub fn at_offset(offset: &Vector3<f64>, force: Vector3<f64>) -> Self {
        Self::new(offset.cross(&force), force)
    }

    /// Flatten to `[torque; force]`.
    #[must_use]
    pub fn to_vector6(&self) -> Vector6<f64> {
        Vector6::new(
            self.torque.x,
            self.torque.y,
            self.torque.z,
            self.force.x,
            self.force.y,
            self.force.z,
        )
    }

    /// Check if any component is `NaN` or `Inf`.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.torque.iter().chain(self.force.iter()).all(|x| x.is_finite())
    }
}

impl From<Vector6<f64>> for SpatialForce {
    fn from(v: Vector6<f64>) -> Self {
        Self::new(
            Vector3::new(v[0], v[1], v[2]),
            Vector3::new(v[3], v[4], v[5]),
        )
    }
}

impl Add for SpatialForce {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.torque + rhs.torque, self.force + rhs.force)
    }
}

impl Sub for SpatialForce {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.torque - rhs.torque, self.force - rhs.force)
    }
}

impl AddAssign for SpatialForce {
    fn add_assign(&mut self, rhs: Self) {
        self.torque += rhs.torque;
        self.force += rhs.force;
    }
}

impl SubAssign for SpatialForce {
    fn sub_assign(&mut self, rhs: Self) {
        self.torque -= rhs.torque;
        self.force -= rhs.force;
    }
}

impl Neg for SpatialForce {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.torque, -self.force)
    }
}
