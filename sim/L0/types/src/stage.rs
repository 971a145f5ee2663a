//! The stage ladder.
//!
//! A simulation snapshot is realized one stage at a time. Each stage adds
//! derived knowledge on top of everything below it:
//!
//! ```text
//! Allocated → Built → Modeled → Parametrized → Timed
//!           → Configured → Moving → Dynamics → Reaction
//! ```
//!
//! Stages are totally ordered, so "has this snapshot been realized through
//! `Configured`?" is a plain `>=` comparison.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A computation stage, ordered from least to most derived knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Stage {
    /// Storage exists but nothing has been declared yet.
    #[default]
    Allocated,
    /// Every subsystem has declared its variable and cache slots.
    Built,
    /// Discrete modeling choices are resolved.
    Modeled,
    /// Parameter variables are validated and fixed for this snapshot.
    Parametrized,
    /// Time is known.
    Timed,
    /// Positions and orientations are known.
    Configured,
    /// Velocities are known.
    Moving,
    /// Forces and potential energy are known.
    Dynamics,
    /// Post-dynamics adjustments are done.
    Reaction,
}

impl Stage {
    /// Every stage, lowest first.
    pub const ALL: [Self; 9] = [
        Self::Allocated,
        Self::Built,
        Self::Modeled,
        Self::Parametrized,
        Self::Timed,
        Self::Configured,
        Self::Moving,
        Self::Dynamics,
        Self::Reaction,
    ];

    /// The lowest stage.
    pub const LOWEST: Self = Self::Allocated;

    /// The highest stage.
    pub const HIGHEST: Self = Self::Reaction;

    /// Position of this stage on the ladder (`Allocated` is 0).
    #[must_use]
    pub const fn level(self) -> usize {
        self as usize
    }

    /// The stage directly above this one, or `None` at the top.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Allocated => Some(Self::Built),
            Self::Built => Some(Self::Modeled),
            Self::Modeled => Some(Self::Parametrized),
            Self::Parametrized => Some(Self::Timed),
            Self::Timed => Some(Self::Configured),
            Self::Configured => Some(Self::Moving),
            Self::Moving => Some(Self::Dynamics),
            Self::Dynamics => Some(Self::Reaction),
            Self::Reaction => None,
        }
    }

    /// The stage directly below this one, or `None` at the bottom.
    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        match self {
            Self::Allocated => None,
            Self::Built => Some(Self::Allocated),
            Self::Modeled => Some(Self::Built),
            Self::Parametrized => Some(Self::Modeled),
            Self::Timed => Some(Self::Parametrized),
            Self::Configured => Some(Self::Timed),
            Self::Moving => Some(Self::Configured),
            Self::Dynamics => Some(Self::Moving),
            Self::Reaction => Some(Self::Dynamics),
        }
    }

    /// The stage below this one, saturating at `Allocated`.
    #[must_use]
    pub const fn prev_or_lowest(self) -> Self {
        match self.prev() {
            Some(stage) => stage,
            None => Self::LOWEST,
        }
    }

    /// Human-readable stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Allocated => "Allocated",
            Self::Built => "Built",
            Self::Modeled => "Modeled",
            Self::Parametrized => "Parametrized",
            Self::Timed => "Timed",
            Self::Configured => "Configured",
            Self::Moving => "Moving",
            Self::Dynamics => "Dynamics",
            Self::Reaction => "Reaction",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
