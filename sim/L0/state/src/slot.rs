//! Slot storage and the per-slot validity state machine.

use sim_types::{Stage, SubsystemId};
use std::any::Any;
use std::fmt;

/// Type-erased, cloneable slot contents.
pub(crate) trait SlotValue: Any + Send + Sync {
    fn clone_value(&self) -> Box<dyn SlotValue>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Clone + Send + Sync> SlotValue for T {
    fn clone_value(&self) -> Box<dyn SlotValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Validity of a cache slot.
///
/// ```text
///            set_cache (while realizing tag)
///   Invalid ─────────────────────────────────▶ Valid
///      ▲                                         │
///      └──────── invalidate_from(s <= tag) ──────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotStatus {
    /// Not written since the last invalidation; reads fail.
    #[default]
    Invalid,
    /// Written during the current realization of its stage.
    Valid,
}

impl SlotStatus {
    /// Whether the slot may be read (subject to the stage check).
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

pub(crate) struct VariableSlot {
    pub owner: SubsystemId,
    pub stage: Stage,
    pub value: Box<dyn SlotValue>,
}

impl Clone for VariableSlot {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            stage: self.stage,
            value: self.value.clone_value(),
        }
    }
}

impl fmt::Debug for VariableSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableSlot")
            .field("owner", &self.owner)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

pub(crate) struct CacheSlot {
    pub owner: SubsystemId,
    pub stage: Stage,
    pub status: SlotStatus,
    pub value: Box<dyn SlotValue>,
}

impl Clone for CacheSlot {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            stage: self.stage,
            status: self.status,
            value: self.value.clone_value(),
        }
    }
}

impl fmt::Debug for CacheSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSlot")
            .field("owner", &self.owner)
            .field("stage", &self.stage)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
