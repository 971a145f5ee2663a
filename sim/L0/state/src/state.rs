//! The state container.

use crate::handle::{CacheHandle, VariableHandle};
use crate::slot::{CacheSlot, SlotStatus, VariableSlot};
use crate::variables::VariablesMut;
use sim_types::{Result, SimError, Stage, SubsystemId, check_stage_ge};
use std::any::{Any, type_name};

/// One simulation snapshot: every subsystem's variables and caches plus the
/// stage the snapshot has been realized through.
///
/// Slots live in two arenas and are reached through typed handles. The
/// realized stage only moves up through [`State::begin_stage`] /
/// [`State::complete_stage`] and only moves down through invalidation,
/// either explicitly ([`State::invalidate_from`]) or as a side effect of
/// changing a variable.
///
/// # Example
///
/// ```
/// use sim_state::State;
/// use sim_types::Stage;
///
/// let mut state = State::new();
/// let owner = state.add_subsystem("demo").unwrap();
/// let k = state.allocate_variable(owner, Stage::Parametrized, 10.0_f64).unwrap();
/// let pe = state.allocate_cache::<f64>(owner, Stage::Parametrized).unwrap();
///
/// state.begin_stage(Stage::Built).unwrap();
/// state.complete_stage().unwrap();
/// state.begin_stage(Stage::Modeled).unwrap();
/// state.complete_stage().unwrap();
///
/// state.begin_stage(Stage::Parametrized).unwrap();
/// let doubled = 2.0 * *state.variable(&k).unwrap();
/// state.set_cache(&pe, doubled).unwrap();
/// state.complete_stage().unwrap();
///
/// assert_eq!(*state.cache(&pe).unwrap(), 20.0);
///
/// // Changing k rewinds the snapshot below Parametrized.
/// state.set_variable(&k, 1.0).unwrap();
/// assert_eq!(state.stage(), Stage::Modeled);
/// assert!(state.cache(&pe).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct State {
    stage: Stage,
    realizing: Option<Stage>,
    subsystems: Vec<String>,
    variables: Vec<VariableSlot>,
    caches: Vec<CacheSlot>,
}

impl State {
    /// Create an empty state at [`Stage::Allocated`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The highest stage this snapshot has been fully realized through.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The stage currently being realized, if a pass is in progress.
    #[must_use]
    pub fn realizing(&self) -> Option<Stage> {
        self.realizing
    }

    // ==================== Topology ====================

    /// Register a subsystem that will own slots.
    ///
    /// # Errors
    ///
    /// [`SimError::TopologyFrozen`] once the state has been Built.
    pub fn add_subsystem(&mut self, name: impl Into<String>) -> Result<SubsystemId> {
        self.check_topology_open("State::add_subsystem")?;
        self.subsystems.push(name.into());
        Ok(SubsystemId::new(self.subsystems.len() - 1))
    }

    /// Number of registered subsystems.
    #[must_use]
    pub fn n_subsystems(&self) -> usize {
        self.subsystems.len()
    }

    /// Name a subsystem was registered with.
    #[must_use]
    pub fn subsystem_name(&self, id: SubsystemId) -> Option<&str> {
        self.subsystems.get(id.index()).map(String::as_str)
    }

    /// Number of allocated variable slots.
    #[must_use]
    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of allocated cache slots.
    #[must_use]
    pub fn n_caches(&self) -> usize {
        self.caches.len()
    }

    /// Declare a variable owned by `owner`.
    ///
    /// `stage` is the lowest stage whose results depend on the variable;
    /// changing it invalidates that stage and everything above. Variables
    /// can only be tagged `Modeled` or higher.
    ///
    /// # Errors
    ///
    /// [`SimError::TopologyFrozen`] once Built, [`SimError::InvalidSubsystem`]
    /// for an unknown owner, [`SimError::StageViolation`] for a tag below
    /// `Modeled`.
    pub fn allocate_variable<T>(
        &mut self,
        owner: SubsystemId,
        stage: Stage,
        initial: T,
    ) -> Result<VariableHandle<T>>
    where
        T: Any + Clone + Send + Sync,
    {
        const LOC: &str = "State::allocate_variable";
        self.check_topology_open(LOC)?;
        self.check_owner(owner)?;
        check_stage_ge(stage, Stage::Modeled, LOC)?;

        self.variables.push(VariableSlot {
            owner,
            stage,
            value: Box::new(initial),
        });
        Ok(VariableHandle::new(self.variables.len() - 1))
    }

    /// Declare a cache entry owned by `owner` that becomes valid at `stage`.
    ///
    /// The slot starts as `T::default()` and [`SlotStatus::Invalid`].
    ///
    /// # Errors
    ///
    /// As for [`State::allocate_variable`].
    pub fn allocate_cache<T>(&mut self, owner: SubsystemId, stage: Stage) -> Result<CacheHandle<T>>
    where
        T: Any + Clone + Default + Send + Sync,
    {
        const LOC: &str = "State::allocate_cache";
        self.check_topology_open(LOC)?;
        self.check_owner(owner)?;
        check_stage_ge(stage, Stage::Modeled, LOC)?;

        self.caches.push(CacheSlot {
            owner,
            stage,
            status: SlotStatus::Invalid,
            value: Box::new(T::default()),
        });
        Ok(CacheHandle::new(self.caches.len() - 1))
    }

    // ==================== Variables ====================

    /// Read a variable.
    ///
    /// A variable is available from inside the pass that realizes its tag
    /// onward, i.e. once the stage just below its tag has been realized.
    ///
    /// # Errors
    ///
    /// [`SimError::StageViolation`] if the snapshot is not that far yet.
    pub fn variable<T: Any>(&self, handle: &VariableHandle<T>) -> Result<&T> {
        const LOC: &str = "State::variable";
        let slot = self.variable_slot(handle.index())?;
        check_stage_ge(self.stage, slot.stage.prev_or_lowest(), LOC)?;
        slot.value
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| type_mismatch::<T>(LOC))
    }

    /// Stage tag a variable was declared with.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidSlot`] for a foreign handle.
    pub fn variable_stage<T>(&self, handle: &VariableHandle<T>) -> Result<Stage> {
        Ok(self.variable_slot(handle.index())?.stage)
    }

    /// Owner of a variable.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidSlot`] for a foreign handle.
    pub fn variable_owner<T>(&self, handle: &VariableHandle<T>) -> Result<SubsystemId> {
        Ok(self.variable_slot(handle.index())?.owner)
    }

    /// Replace a variable's value.
    ///
    /// Invalidates every cache tagged at or above the variable's tag.
    ///
    /// # Errors
    ///
    /// [`SimError::StageViolation`] before the state is Built.
    pub fn set_variable<T: Any>(&mut self, handle: &VariableHandle<T>, value: T) -> Result<()> {
        self.update_variable(handle, "State::set_variable", |v| *v = value)
    }

    /// Modify a variable in place.
    ///
    /// Same invalidation rules as [`State::set_variable`].
    ///
    /// # Errors
    ///
    /// As for [`State::set_variable`].
    pub fn update_variable<T: Any>(
        &mut self,
        handle: &VariableHandle<T>,
        location: &str,
        f: impl FnOnce(&mut T),
    ) -> Result<()> {
        check_stage_ge(self.stage, Stage::Built, location)?;
        let index = handle.index();
        let tag = self.variable_slot(index)?.stage;
        let value = self.variables[index]
            .value
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| type_mismatch::<T>(location))?;
        f(value);
        self.invalidate_from(tag);
        Ok(())
    }

    /// A view that can write variables but not realize stages.
    pub fn variables_mut(&mut self) -> VariablesMut<'_> {
        VariablesMut::new(self)
    }

    // ==================== Caches ====================

    /// Read a cache entry.
    ///
    /// # Errors
    ///
    /// [`SimError::StageViolation`] if the slot's stage has not been
    /// realized, [`SimError::CacheNotRealized`] if it was realized without
    /// the owner writing the slot.
    pub fn cache<T: Any>(&self, handle: &CacheHandle<T>) -> Result<&T> {
        const LOC: &str = "State::cache";
        let slot = self.cache_slot(handle.index())?;
        check_stage_ge(self.stage, slot.stage, LOC)?;
        if !slot.status.is_valid() {
            return Err(SimError::CacheNotRealized {
                location: LOC.into(),
                stage: slot.stage,
            });
        }
        slot.value
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| type_mismatch::<T>(LOC))
    }

    /// Stage tag a cache entry was declared with.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidSlot`] for a foreign handle.
    pub fn cache_stage<T>(&self, handle: &CacheHandle<T>) -> Result<Stage> {
        Ok(self.cache_slot(handle.index())?.stage)
    }

    /// Current validity of a cache entry.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidSlot`] for a foreign handle.
    pub fn cache_status<T>(&self, handle: &CacheHandle<T>) -> Result<SlotStatus> {
        Ok(self.cache_slot(handle.index())?.status)
    }

    /// Write a cache entry.
    ///
    /// Legal only while the slot's own stage is being realized, and only
    /// once per realization of that stage.
    ///
    /// # Errors
    ///
    /// [`SimError::StageViolation`] outside the slot's stage pass,
    /// [`SimError::CacheAlreadyRealized`] on a second write.
    pub fn set_cache<T: Any>(&mut self, handle: &CacheHandle<T>, value: T) -> Result<()> {
        const LOC: &str = "State::set_cache";
        let index = handle.index();
        let slot_stage = self.cache_slot(index)?.stage;
        if self.realizing != Some(slot_stage) {
            return Err(SimError::stage_violation(
                LOC,
                slot_stage,
                self.realizing.unwrap_or(self.stage),
            ));
        }

        let slot = &mut self.caches[index];
        if slot.status.is_valid() {
            return Err(SimError::CacheAlreadyRealized {
                location: LOC.into(),
                stage: slot_stage,
            });
        }
        let target = slot
            .value
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| type_mismatch::<T>(LOC))?;
        *target = value;
        slot.status = SlotStatus::Valid;
        Ok(())
    }

    // ==================== Stage ladder ====================

    /// Start realizing `stage`, which must be the one directly above the
    /// current stage.
    ///
    /// # Errors
    ///
    /// [`SimError::StageViolation`] if the ladder would be skipped or a pass
    /// is already in progress.
    pub fn begin_stage(&mut self, stage: Stage) -> Result<()> {
        const LOC: &str = "State::begin_stage";
        if let Some(active) = self.realizing {
            return Err(SimError::stage_violation(LOC, active, self.stage));
        }
        if self.stage.next() != Some(stage) {
            return Err(SimError::stage_violation(
                LOC,
                stage.prev_or_lowest(),
                self.stage,
            ));
        }
        self.realizing = Some(stage);
        tracing::trace!(%stage, "begin stage");
        Ok(())
    }

    /// Finish the pass started by [`State::begin_stage`].
    ///
    /// # Errors
    ///
    /// [`SimError::StageViolation`] if no pass is in progress.
    pub fn complete_stage(&mut self) -> Result<Stage> {
        let stage = self.realizing.take().ok_or_else(|| {
            SimError::stage_violation(
                "State::complete_stage",
                self.stage.next().unwrap_or(Stage::HIGHEST),
                self.stage,
            )
        })?;
        self.stage = stage;
        tracing::debug!(%stage, caches = self.caches.len(), "stage realized");
        Ok(stage)
    }

    /// Abandon an in-progress pass.
    ///
    /// Caches written during the pass are invalidated; the realized stage
    /// stays where it was. A no-op when nothing is being realized.
    pub fn abort_stage(&mut self) {
        if let Some(stage) = self.realizing.take() {
            for slot in self.caches.iter_mut().filter(|s| s.stage == stage) {
                slot.status = SlotStatus::Invalid;
            }
            tracing::debug!(%stage, "stage aborted");
        }
    }

    /// Invalidate `stage` and everything above it.
    ///
    /// Every cache tagged at or above `stage` becomes invalid and the
    /// realized stage drops to at most the one below `stage`. Any pass in
    /// progress at or above `stage` is abandoned. Topology survives: a Built
    /// state never drops below Built.
    pub fn invalidate_from(&mut self, stage: Stage) {
        let stage = if self.stage >= Stage::Built {
            stage.max(Stage::Modeled)
        } else {
            stage
        };
        if self.realizing.is_some_and(|r| r >= stage) {
            self.realizing = None;
        }
        let floor = stage.prev_or_lowest();
        let rewound = self.stage > floor;
        if rewound {
            self.stage = floor;
        }

        let mut invalidated = 0_usize;
        for slot in self.caches.iter_mut().filter(|s| s.stage >= stage) {
            if slot.status.is_valid() {
                slot.status = SlotStatus::Invalid;
                invalidated += 1;
            }
        }
        if rewound || invalidated > 0 {
            tracing::debug!(%stage, realized = %self.stage, invalidated, "state invalidated");
        }
    }

    // ==================== Helpers ====================

    fn check_topology_open(&self, location: &str) -> Result<()> {
        if self.stage >= Stage::Built {
            return Err(SimError::topology_frozen(location));
        }
        Ok(())
    }

    fn check_owner(&self, owner: SubsystemId) -> Result<()> {
        if owner.index() >= self.subsystems.len() {
            return Err(SimError::InvalidSubsystem(owner.index()));
        }
        Ok(())
    }

    fn variable_slot(&self, index: usize) -> Result<&VariableSlot> {
        self.variables
            .get(index)
            .ok_or(SimError::InvalidSlot { index })
    }

    fn cache_slot(&self, index: usize) -> Result<&CacheSlot> {
        self.caches.get(index).ok_or(SimError::InvalidSlot { index })
    }
}

fn type_mismatch<T>(location: &str) -> SimError {
    SimError::SlotTypeMismatch {
        location: location.into(),
        expected: type_name::<T>(),
    }
}
