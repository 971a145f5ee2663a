//! Gravitational acceleration.
//!
//! Presets point along `-Z`, the workspace's down axis.

use nalgebra::{Unit, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Uniform gravitational acceleration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gravity {
    /// Acceleration due to gravity (m/s²).
    pub acceleration: Vector3<f64>,
}

impl Default for Gravity {
    fn default() -> Self {
        Self::earth()
    }
}

impl Gravity {
    /// Standard Earth gravity (9.81 m/s² in -Z direction).
    #[must_use]
    pub fn earth() -> Self {
        Self {
            acceleration: Vector3::new(0.0, 0.0, -9.81),
        }
    }

    /// Moon gravity (1.62 m/s² in -Z direction).
    #[must_use]
    pub fn moon() -> Self {
        Self {
            acceleration: Vector3::new(0.0, 0.0, -1.62),
        }
    }

    /// Mars gravity (3.71 m/s² in -Z direction).
    #[must_use]
    pub fn mars() -> Self {
        Self {
            acceleration: Vector3::new(0.0, 0.0, -3.71),
        }
    }

    /// Zero gravity.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            acceleration: Vector3::zeros(),
        }
    }

    /// Custom gravity vector.
    #[must_use]
    pub fn custom(acceleration: Vector3<f64>) -> Self {
        Self { acceleration }
    }

    /// `|g|`.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.acceleration.norm()
    }

    /// Unit direction of `g`. A zero vector has no direction, so `+Z` is
    /// returned for it.
    #[must_use]
    pub fn direction(&self) -> Unit<Vector3<f64>> {
        Unit::try_new(self.acceleration, 0.0).unwrap_or_else(Vector3::z_axis)
    }

    /// Gravitational force on a point mass.
    #[must_use]
    pub fn force_on_mass(&self, mass: f64) -> Vector3<f64> {
        self.acceleration * mass
    }
}
