//! Force elements realized along the stage ladder.
//!
//! A force element contributes forces and potential energy to a multibody
//! snapshot. It declares its own variable and cache slots once, derives
//! cached quantities stage by stage, and at `Dynamics` adds its
//! contribution into a shared [`ForceAccumulator`] through an additive-only
//! [`ForceSink`].
//!
//! - [`ForceElement`] - The per-stage hook contract
//! - [`TwoPointSpring`] - Linear spring between two body stations
//! - [`UniformGravity`] - Uniform field over every body and particle
//! - [`EmptyForces`] - Contributes nothing
//! - [`Kinematics`], [`RigidMatter`] - Body poses, masses and velocities
//! - [`ForceSystem`] - Registers matter and elements and realizes snapshots
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be
//! used headless, in tests, or embedded in a larger multibody pipeline.
//!
//! # Example
//!
//! ```
//! use sim_forces::{ForceSystem, RigidMatter, TwoPointSpring, UniformGravity};
//! use sim_types::{GravityConfig, MassProperties, Point3, Pose, SpringConfig, Stage};
//!
//! let mut matter = RigidMatter::new("pendulum");
//! let anchor = matter.add_body(MassProperties::point_mass(1.0));
//! let bob = matter.add_body_at(
//!     MassProperties::point_mass(0.5),
//!     Pose::from_position(Point3::new(0.0, 0.0, -1.5)),
//! );
//!
//! let mut system = ForceSystem::new();
//! system.add_matter(matter).unwrap();
//! system
//!     .add_force(TwoPointSpring::from_config(
//!         &SpringConfig::between(anchor, bob).with_stiffness(20.0).with_natural_length(1.0),
//!     ))
//!     .unwrap();
//! system.add_force(UniformGravity::from_config(&GravityConfig::earth())).unwrap();
//! system.realize_topology().unwrap();
//!
//! let mut state = system.default_state().unwrap();
//! system.realize(&mut state, Stage::Dynamics).unwrap();
//!
//! // Spring pe + gravity pe of the bob
//! let expected = 0.5 * 20.0 * 0.25 + 0.5 * -9.81 * -1.5;
//! assert!((state.potential_energy().unwrap() - expected).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-forces/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // Formulas kept in textbook form
    clippy::missing_errors_doc,        // Error docs added where non-obvious
    clippy::module_name_repetitions,
    clippy::float_cmp,                 // Exact zero checks gate short-circuits
)]

mod accumulator;
mod element;
mod empty;
mod gravity;
mod matter;
mod spring;
mod system;

pub use accumulator::{ForceAccumulator, ForceSink, MatterForces};
pub use element::{ForceElement, ForceIndex};
pub use empty::EmptyForces;
pub use gravity::{GravityCache, GravityParameters, UniformGravity};
pub use matter::{Kinematics, Matter, RigidMatter};
pub use spring::{SpringConfiguration, SpringDynamics, SpringParameters, TwoPointSpring};
pub use system::{ForceSystem, SystemState};
