//! Stage-tagged state container.
//!
//! A [`State`] is one simulation snapshot. Subsystems (matter collections,
//! force elements) declare their slots once, while the state is being Built:
//!
//! - **Variables** hold user-tunable inputs. Each is tagged with the lowest
//!   stage that depends on it; changing a variable invalidates that stage
//!   and everything above it.
//! - **Cache entries** hold derived results. Each is tagged with the stage
//!   that computes it; it may only be written while that stage is being
//!   realized and only read once that stage has been realized.
//!
//! Slots live in arenas inside the state and are addressed by typed,
//! copyable handles ([`VariableHandle`], [`CacheHandle`]). Subsystems keep
//! their handles and stay immutable after allocation; all mutable derived
//! data lives here.
//!
//! # Stage ladder
//!
//! ```text
//!   begin_stage(s) ─▶ realizing = s ─▶ complete_stage() ─▶ stage = s
//!                          │
//!                          └─ abort_stage() ─▶ writes at s discarded
//! ```
//!
//! `begin_stage` only accepts the stage directly above the realized one, so
//! the ladder can never be skipped.
//! Code that should only tune inputs gets a [`VariablesMut`] view, which can
//! write variables but has no way to begin or complete a stage.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**.

#![doc(html_root_url = "https://docs.rs/sim-state/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
)]

mod handle;
mod slot;
mod state;
mod variables;

pub use handle::{CacheHandle, VariableHandle};
pub use slot::SlotStatus;
pub use state::State;
pub use variables::VariablesMut;
