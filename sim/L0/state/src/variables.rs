//! Variable-only write access.

use crate::handle::VariableHandle;
use crate::state::State;
use sim_types::{Result, Stage};
use std::any::Any;

/// A write view of a [`State`] that can change variables but cannot move
/// the stage ladder forward.
///
/// Every write rewinds the state to below the variable's tag, exactly as
/// [`State::set_variable`] does. Each write consumes the view; take a new
/// one from [`State::variables_mut`] for the next.
#[derive(Debug)]
pub struct VariablesMut<'a> {
    state: &'a mut State,
}

impl<'a> VariablesMut<'a> {
    pub(crate) fn new(state: &'a mut State) -> Self {
        Self { state }
    }

    /// Stage the underlying state has been realized through.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    /// Read a variable.
    ///
    /// # Errors
    ///
    /// As for [`State::variable`].
    pub fn variable<T: Any>(&self, handle: &VariableHandle<T>) -> Result<&T> {
        self.state.variable(handle)
    }

    /// Replace a variable's value.
    ///
    /// # Errors
    ///
    /// As for [`State::set_variable`].
    pub fn set_variable<T: Any>(self, handle: &VariableHandle<T>, value: T) -> Result<()> {
        self.state.set_variable(handle, value)
    }

    /// Modify a variable in place.
    ///
    /// # Errors
    ///
    /// As for [`State::update_variable`].
    pub fn update_variable<T: Any>(
        self,
        handle: &VariableHandle<T>,
        location: &str,
        f: impl FnOnce(&mut T),
    ) -> Result<()> {
        self.state.update_variable(handle, location, f)
    }
}
