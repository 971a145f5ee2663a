//! Identifiers and rigid body data.
//!
//! Bodies and particles are addressed by dense indices within the matter
//! collection that owns them. Matter collections and subsystems are in turn
//! addressed by dense indices within the system.

use nalgebra::{Isometry3, Matrix3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub usize);

        impl $name {
            /// Create a new ID.
            #[must_use]
            pub const fn new(id: usize) -> Self {
                Self(id)
            }

            /// Get the raw index.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(id: usize) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

dense_id!(
    /// Index of a rigid body within its matter collection.
    BodyId,
    "Body"
);

dense_id!(
    /// Index of a particle within its matter collection.
    ParticleId,
    "Particle"
);

dense_id!(
    /// Index of a matter collection registered with the system.
    MatterId,
    "Matter"
);

dense_id!(
    /// Index of a subsystem (matter collection or force element) that owns
    /// state slots.
    SubsystemId,
    "Subsystem"
);

/// Position and orientation of a rigid body in the ground frame.
///
/// # Example
///
/// ```
/// use sim_types::Pose;
/// use nalgebra::Point3;
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let x_gb = pose.to_isometry();
/// assert_eq!(x_gb * Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position of the body origin in ground coordinates.
    pub position: Point3<f64>,
    /// Orientation of the body frame relative to ground.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Convert to an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.position.coords.into(), self.rotation)
    }
}

/// Mass properties of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass in kg.
    pub mass: f64,
    /// Center of mass offset from body origin in body coordinates.
    pub center_of_mass: Vector3<f64>,
    /// Inertia tensor about the center of mass in body coordinates (kg·m²).
    pub inertia: Matrix3<f64>,
}

impl MassProperties {
    /// Create mass properties with given values.
    #[must_use]
    pub const fn new(mass: f64, center_of_mass: Vector3<f64>, inertia: Matrix3<f64>) -> Self {
        Self {
            mass,
            center_of_mass,
            inertia,
        }
    }

    /// Create mass properties for a point mass at the body origin.
    #[must_use]
    pub fn point_mass(mass: f64) -> Self {
        Self {
            mass,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::zeros(),
        }
    }

    /// Create mass properties for a uniform sphere.
    ///
    /// Inertia of a solid sphere: I = (2/5) * m * r²
    #[must_use]
    pub fn sphere(mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self {
            mass,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::from_diagonal(&Vector3::new(i, i, i)),
        }
    }

    /// Move the center of mass away from the body origin.
    #[must_use]
    pub fn with_center_of_mass(mut self, center_of_mass: Vector3<f64>) -> Self {
        self.center_of_mass = center_of_mass;
        self
    }
}

impl Default for MassProperties {
    fn default() -> Self {
        Self::point_mass(1.0)
    }
}
