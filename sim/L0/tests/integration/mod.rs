//! Integration tests for the staged force pipeline.
//!
//! These tests drive `sim-state`, `sim-forces` and `sim-types` together:
//! - Spring and gravity elements realized end to end through `ForceSystem`
//! - Accumulator additivity and order independence across elements
//! - Variable changes rewinding the stage ladder and invalidating caches
//! - Property tests for the spring law, gravity and the slot state machine

pub mod accumulator_additivity;
pub mod gravity_properties;
pub mod invalidation;
pub mod spring_properties;
