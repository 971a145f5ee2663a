//! A force element that contributes nothing.

use crate::element::ForceElement;
use std::any::Any;

/// Placeholder element: no slots, no forces, no energy.
///
/// Useful where a system expects at least one force subsystem, and as a
/// baseline when checking that a pipeline is unaffected by extra elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyForces;

impl EmptyForces {
    /// Create the element.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ForceElement for EmptyForces {
    fn name(&self) -> &'static str {
        "EmptyForces"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
