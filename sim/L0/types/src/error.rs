//! Error types for staged force computation.

use crate::Stage;
use thiserror::Error;

/// Errors that can occur while building or realizing a simulation snapshot.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A stage precondition failed: something was attempted before the
    /// snapshot had been realized far enough.
    #[error("{location}: expected stage >= {required}, but state is at {actual}")]
    StageViolation {
        /// Where the check failed, e.g. `"TwoPointSpring::realize_dynamics"`.
        location: String,
        /// Stage the caller needed.
        required: Stage,
        /// Stage the state was actually at.
        actual: Stage,
    },

    /// A variable holds a value outside its legal range.
    #[error("{location}: {field} = {value} is out of range ({constraint})")]
    ValueOutOfRange {
        /// Offending variable.
        field: String,
        /// Where the check failed.
        location: String,
        /// The rejected value.
        value: f64,
        /// Human-readable constraint, e.g. `"must be >= 0"`.
        constraint: &'static str,
    },

    /// A cache slot's stage is realized but its owner never wrote it.
    #[error("{location}: cache entry for stage {stage} was never realized")]
    CacheNotRealized {
        /// Where the read happened.
        location: String,
        /// The slot's stage tag.
        stage: Stage,
    },

    /// A cache slot was written twice within one stage advance.
    #[error("{location}: cache entry for stage {stage} was already realized")]
    CacheAlreadyRealized {
        /// Where the write happened.
        location: String,
        /// The slot's stage tag.
        stage: Stage,
    },

    /// A slot handle was used with the wrong value type.
    #[error("{location}: slot does not hold a value of type {expected}")]
    SlotTypeMismatch {
        /// Where the access happened.
        location: String,
        /// Type the handle expected.
        expected: &'static str,
    },

    /// A slot handle does not refer to any slot in this state.
    #[error("invalid slot index: {index}")]
    InvalidSlot {
        /// The dangling index.
        index: usize,
    },

    /// Slots or subsystems were declared after the Built stage.
    #[error("{location}: topology is frozen once the state is Built")]
    TopologyFrozen {
        /// Where the allocation was attempted.
        location: String,
    },

    /// Slots were requested for a subsystem that was never registered.
    #[error("invalid subsystem ID: {0}")]
    InvalidSubsystem(usize),

    /// Invalid body ID referenced.
    #[error("invalid body ID: {0}")]
    InvalidBodyId(usize),

    /// Invalid particle ID referenced.
    #[error("invalid particle ID: {0}")]
    InvalidParticleId(usize),

    /// Invalid matter collection referenced.
    #[error("invalid matter ID: {0}")]
    InvalidMatterId(usize),

    /// Force element index out of range, or not of the requested type.
    #[error("invalid force element index: {0}")]
    InvalidForceIndex(usize),

    /// Two sizes that must agree do not.
    #[error("{what}: expected length {expected}, got {actual}")]
    SizeMismatch {
        /// What was being sized.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
}

impl SimError {
    /// Create a stage violation error.
    #[must_use]
    pub fn stage_violation(location: impl Into<String>, required: Stage, actual: Stage) -> Self {
        Self::StageViolation {
            location: location.into(),
            required,
            actual,
        }
    }

    /// Create a value-domain error.
    #[must_use]
    pub fn out_of_range(
        field: impl Into<String>,
        location: impl Into<String>,
        value: f64,
        constraint: &'static str,
    ) -> Self {
        Self::ValueOutOfRange {
            field: field.into(),
            location: location.into(),
            value,
            constraint,
        }
    }

    /// Create a frozen-topology error.
    #[must_use]
    pub fn topology_frozen(location: impl Into<String>) -> Self {
        Self::TopologyFrozen {
            location: location.into(),
        }
    }

    /// Check if this is a stage precondition failure.
    #[must_use]
    pub fn is_stage_violation(&self) -> bool {
        matches!(self, Self::StageViolation { .. })
    }

    /// Check if this is a value-domain failure.
    #[must_use]
    pub fn is_value_error(&self) -> bool {
        matches!(self, Self::ValueOutOfRange { .. })
    }
}

/// Fail unless `actual >= required`.
///
/// # Errors
///
/// Returns [`SimError::StageViolation`] naming `location`.
pub fn check_stage_ge(actual: Stage, required: Stage, location: &str) -> crate::Result<()> {
    if actual >= required {
        Ok(())
    } else {
        Err(SimError::stage_violation(location, required, actual))
    }
}

/// Fail unless `value >= 0`. `NaN` is rejected too.
///
/// # Errors
///
/// Returns [`SimError::ValueOutOfRange`] naming `field` and `location`.
pub fn check_nonnegative(value: f64, field: &str, location: &str) -> crate::Result<()> {
    // !(x >= 0.0) also catches NaN
    if !(value >= 0.0) {
        return Err(SimError::out_of_range(field, location, value, "must be >= 0"));
    }
    Ok(())
}
