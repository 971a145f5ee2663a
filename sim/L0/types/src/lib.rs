//! Core types for staged force computation.
//!
//! This crate provides the vocabulary shared by the state container, the
//! kinematics providers and every force element:
//!
//! - [`Stage`] - The ordered ladder a simulation snapshot is realized along
//! - [`BodyId`], [`ParticleId`], [`MatterId`], [`SubsystemId`] - Dense indices
//! - [`Pose`], [`MassProperties`] - Rigid body data
//! - [`SpatialForce`] - Torque/force pairs accumulated per body
//! - [`SpringConfig`], [`GravityConfig`] - Construction-time element settings
//! - [`SimError`] - Stage and value-domain failures
//!
//! # Layer 0
//!
//! These types are **pure data**: no state, no realization logic. They have
//! zero engine dependencies and can be used headless.
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: forward
//! - Z: up
//! - Right-handed
//!
//! # Example
//!
//! ```
//! use sim_types::{SpatialForce, Stage};
//! use nalgebra::Vector3;
//!
//! assert!(Stage::Configured > Stage::Timed);
//!
//! // 1 N along +Y applied 1 m along +X from the body origin
//! let f = SpatialForce::at_offset(&Vector3::x(), Vector3::y());
//! assert_eq!(f.torque, Vector3::z());
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::neg_cmp_op_on_partial_ord, // !(x >= 0.0) is intentional for NaN rejection
    clippy::missing_errors_doc,        // Error docs added where non-obvious
    clippy::module_name_repetitions,
)]

mod body;
mod config;
mod dynamics;
mod error;
mod spatial;
mod stage;

pub use body::{BodyId, MassProperties, MatterId, ParticleId, Pose, SubsystemId};
pub use config::{GravityConfig, SpringConfig};
pub use dynamics::Gravity;
pub use error::{SimError, check_nonnegative, check_stage_ge};
pub use spatial::SpatialForce;
pub use stage::Stage;

// Re-export math types for convenience
pub use nalgebra::{DVector, Isometry3, Point3, Unit, UnitQuaternion, Vector3};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
