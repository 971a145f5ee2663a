//! The force element contract.
//!
//! A force element is realized alongside the state, one hook per stage:
//!
//! | Hook | Runs while realizing | May read | May write |
//! |------|----------------------|----------|-----------|
//! | `allocate` | Built | nothing | declares own slots |
//! | `realize_modeling` | Modeled | own variables | own Modeled caches |
//! | `realize_parameters` | Parametrized | own variables | own Parametrized caches |
//! | `realize_time` | Timed | lower caches | own Timed caches |
//! | `realize_configuration` | Configured | lower caches, poses | own Configured caches |
//! | `realize_motion` | Moving | lower caches, velocities | own Moving caches |
//! | `realize_dynamics` | Dynamics | lower caches, kinematics | own Dynamics caches, [`ForceSink`] |
//! | `realize_reaction` | Reaction | everything below | own Reaction caches |
//!
//! Each hook's precondition is that the state has been realized through the
//! stage below the hook's own; hooks check it themselves and report a
//! [`SimError::StageViolation`](sim_types::SimError::StageViolation) naming
//! the hook. Within one stage the driver may call elements in any order.
//!
//! Every hook except `allocate` takes `&self`: after allocation an element
//! is immutable and everything it computes lives in its state slots.

use crate::accumulator::ForceSink;
use crate::matter::Matter;
use sim_state::State;
use sim_types::{Result, SubsystemId};
use std::any::Any;
use std::fmt;

/// Index of a force element registered with a system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForceIndex(pub usize);

impl ForceIndex {
    /// Get the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A unit that contributes forces and potential energy.
///
/// Hooks default to no-ops, so an element implements only the stages it
/// cares about. See the module docs for what each hook may touch.
pub trait ForceElement: Any + fmt::Debug + Send + Sync {
    /// Stable name, used as the subsystem name and in error locations.
    fn name(&self) -> &'static str;

    /// Declare this element's variable and cache slots.
    ///
    /// Called exactly once, while the template state is being Built. Slot
    /// identities are fixed from then on, for every snapshot cloned from
    /// that template.
    fn allocate(&mut self, _state: &mut State, _owner: SubsystemId) -> Result<()> {
        Ok(())
    }

    /// Resolve discrete modeling choices.
    fn realize_modeling(&self, _state: &mut State, _matter: &Matter) -> Result<()> {
        Ok(())
    }

    /// Validate parameters and derive parameter-only caches.
    fn realize_parameters(&self, _state: &mut State, _matter: &Matter) -> Result<()> {
        Ok(())
    }

    /// Derive time-dependent caches.
    fn realize_time(&self, _state: &mut State, _matter: &Matter) -> Result<()> {
        Ok(())
    }

    /// Derive position-dependent caches.
    fn realize_configuration(&self, _state: &mut State, _matter: &Matter) -> Result<()> {
        Ok(())
    }

    /// Derive velocity-dependent caches.
    fn realize_motion(&self, _state: &mut State, _matter: &Matter) -> Result<()> {
        Ok(())
    }

    /// Add this element's forces and potential energy.
    ///
    /// The only hook that touches shared data, and only through `forces`.
    fn realize_dynamics(
        &self,
        _state: &mut State,
        _matter: &Matter,
        _forces: &mut ForceSink<'_>,
    ) -> Result<()> {
        Ok(())
    }

    /// Post-dynamics adjustments.
    fn realize_reaction(&self, _state: &mut State, _matter: &Matter) -> Result<()> {
        Ok(())
    }

    /// Upcast for typed lookup.
    fn as_any(&self) -> &dyn Any;
}
