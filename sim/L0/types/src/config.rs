//! Construction-time configuration for force elements.
//!
//! These values are fixed for an element's lifetime. Anything the user may
//! tune per snapshot (stiffness, gravity, ...) is copied from here into the
//! element's default state variables when the system is built.

use crate::{BodyId, Gravity, MatterId};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a linear spring between two body-fixed stations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpringConfig {
    /// Matter collection holding both bodies.
    pub matter: MatterId,
    /// First body.
    pub body1: BodyId,
    /// Station on the first body, in that body's frame.
    pub station1: Vector3<f64>,
    /// Second body.
    pub body2: BodyId,
    /// Station on the second body, in that body's frame.
    pub station2: Vector3<f64>,
    /// Default stiffness (N/m).
    pub stiffness: f64,
    /// Default natural length (m).
    pub natural_length: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            matter: MatterId::new(0),
            body1: BodyId::new(0),
            station1: Vector3::zeros(),
            body2: BodyId::new(1),
            station2: Vector3::zeros(),
            stiffness: 1.0,
            natural_length: 0.0,
        }
    }
}

impl SpringConfig {
    /// Spring joining the origins of two bodies.
    #[must_use]
    pub fn between(body1: BodyId, body2: BodyId) -> Self {
        Self {
            body1,
            body2,
            ..Default::default()
        }
    }

    /// Set the station on the first body.
    #[must_use]
    pub fn with_station1(mut self, station: Vector3<f64>) -> Self {
        self.station1 = station;
        self
    }

    /// Set the station on the second body.
    #[must_use]
    pub fn with_station2(mut self, station: Vector3<f64>) -> Self {
        self.station2 = station;
        self
    }

    /// Set the default stiffness.
    #[must_use]
    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = stiffness;
        self
    }

    /// Set the default natural length.
    #[must_use]
    pub fn with_natural_length(mut self, natural_length: f64) -> Self {
        self.natural_length = natural_length;
        self
    }

    /// Attach to a matter collection other than the first.
    #[must_use]
    pub fn in_matter(mut self, matter: MatterId) -> Self {
        self.matter = matter;
        self
    }
}

/// Configuration for a uniform gravity field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GravityConfig {
    /// Default gravity vector.
    pub gravity: Gravity,
    /// Default height at which gravitational potential energy is zero.
    pub zero_height: f64,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self::earth()
    }
}

impl GravityConfig {
    /// Earth gravity, zero height at the origin.
    #[must_use]
    pub fn earth() -> Self {
        Self {
            gravity: Gravity::earth(),
            zero_height: 0.0,
        }
    }

    /// No gravity.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            gravity: Gravity::zero(),
            zero_height: 0.0,
        }
    }

    /// Custom gravity vector.
    #[must_use]
    pub fn custom(acceleration: Vector3<f64>) -> Self {
        Self {
            gravity: Gravity::custom(acceleration),
            zero_height: 0.0,
        }
    }

    /// Set the zero-energy height.
    #[must_use]
    pub fn with_zero_height(mut self, zero_height: f64) -> Self {
        self.zero_height = zero_height;
        self
    }
}
