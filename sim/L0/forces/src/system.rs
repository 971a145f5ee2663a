//! The staged driver.
//!
//! [`ForceSystem`] owns the registered matter and force elements and is
//! immutable once its topology is realized. Each simulation snapshot is a
//! [`SystemState`] cloned from the built template, so every snapshot shares
//! the same slot identities.
//!
//! ```text
//! ForceSystem (static)                 SystemState (per snapshot)
//! ├── Matter ──────────────┐           ├── State   (variables, caches, stage)
//! └── [dyn ForceElement] ──┴─ realize ─┴── ForceAccumulator
//! ```

use crate::accumulator::ForceAccumulator;
use crate::element::{ForceElement, ForceIndex};
use crate::matter::{Kinematics, Matter};
use sim_state::{State, VariablesMut};
use sim_types::{MatterId, Result, SimError, Stage, SubsystemId, check_stage_ge};
use std::any::type_name;

/// One simulation snapshot: the state plus its force buffers.
#[derive(Debug, Clone)]
pub struct SystemState {
    state: State,
    forces: ForceAccumulator,
}

impl SystemState {
    /// Stage this snapshot has been realized through.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    /// The underlying state, for reading responses.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Write access to the variables, for element and matter setters.
    ///
    /// Stages only advance through [`ForceSystem::realize`], so every
    /// element hook runs for each stage a snapshot passes through.
    pub fn variables_mut(&mut self) -> VariablesMut<'_> {
        self.state.variables_mut()
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Accumulated forces. Needs `Dynamics`.
    ///
    /// # Errors
    ///
    /// [`SimError::StageViolation`] before the Dynamics stage is realized.
    pub fn forces(&self) -> Result<&ForceAccumulator> {
        check_stage_ge(self.stage(), Stage::Dynamics, "SystemState::forces")?;
        Ok(&self.forces)
    }

    /// Total potential energy of every element. Needs `Dynamics`.
    ///
    /// # Errors
    ///
    /// As for [`SystemState::forces`].
    pub fn potential_energy(&self) -> Result<f64> {
        Ok(self.forces()?.potential_energy())
    }

    /// Rewind to below `stage`; see [`State::invalidate_from`].
    pub fn invalidate_from(&mut self, stage: Stage) {
        self.state.invalidate_from(stage);
    }
}

/// A set of matter collections and force elements realized together.
///
/// # Example
///
/// ```
/// use nalgebra::Vector3;
/// use sim_forces::{ForceSystem, RigidMatter, UniformGravity};
/// use sim_types::{GravityConfig, MassProperties, MatterId, Stage};
///
/// let mut matter = RigidMatter::new("bodies");
/// matter.add_body(MassProperties::point_mass(2.0));
///
/// let mut system = ForceSystem::new();
/// system.add_matter(matter).unwrap();
/// system.add_force(UniformGravity::from_config(&GravityConfig::earth())).unwrap();
/// system.realize_topology().unwrap();
///
/// let mut state = system.default_state().unwrap();
/// system.realize(&mut state, Stage::Dynamics).unwrap();
///
/// let forces = state.forces().unwrap().matter(MatterId::new(0)).unwrap();
/// assert_eq!(forces.body_forces()[0].force, Vector3::new(0.0, 0.0, -19.62));
/// ```
#[derive(Debug, Default)]
pub struct ForceSystem {
    matter: Matter,
    forces: Vec<Box<dyn ForceElement>>,
    template: Option<SystemState>,
}

impl ForceSystem {
    /// Empty system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a matter collection.
    ///
    /// # Errors
    ///
    /// [`SimError::TopologyFrozen`] after [`ForceSystem::realize_topology`].
    pub fn add_matter<K: Kinematics>(&mut self, kinematics: K) -> Result<MatterId> {
        self.check_open("ForceSystem::add_matter")?;
        Ok(self.matter.push(Box::new(kinematics)))
    }

    /// Register a force element.
    ///
    /// # Errors
    ///
    /// [`SimError::TopologyFrozen`] after [`ForceSystem::realize_topology`].
    pub fn add_force<F: ForceElement>(&mut self, element: F) -> Result<ForceIndex> {
        self.check_open("ForceSystem::add_force")?;
        self.forces.push(Box::new(element));
        Ok(ForceIndex(self.forces.len() - 1))
    }

    /// Allocate every subsystem's slots and build the snapshot template.
    ///
    /// Matter collections become subsystems first, in registration order,
    /// then force elements.
    ///
    /// # Errors
    ///
    /// [`SimError::TopologyFrozen`] if called twice, or any allocation
    /// error from a subsystem.
    pub fn realize_topology(&mut self) -> Result<()> {
        self.check_open("ForceSystem::realize_topology")?;

        let mut state = State::new();
        let mut matter_owners = Vec::with_capacity(self.matter.len());
        for (_, kinematics) in self.matter.iter() {
            matter_owners.push(state.add_subsystem(kinematics.name().to_owned())?);
        }
        let mut force_owners = Vec::with_capacity(self.forces.len());
        for element in &self.forces {
            force_owners.push(state.add_subsystem(element.name())?);
        }

        state.begin_stage(Stage::Built)?;
        let allocated = self.allocate_all(&mut state, &matter_owners, &force_owners);
        if let Err(err) = allocated {
            state.abort_stage();
            return Err(err);
        }
        state.complete_stage()?;

        tracing::debug!(
            matter = self.matter.len(),
            forces = self.forces.len(),
            variables = state.n_variables(),
            caches = state.n_caches(),
            "topology realized"
        );
        let forces = ForceAccumulator::for_matter(&self.matter);
        self.template = Some(SystemState { state, forces });
        Ok(())
    }

    /// Whether [`ForceSystem::realize_topology`] has succeeded.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.template.is_some()
    }

    /// A fresh snapshot at `Built`, with every variable at its default.
    ///
    /// # Errors
    ///
    /// [`SimError::StageViolation`] before the topology is realized.
    pub fn default_state(&self) -> Result<SystemState> {
        self.template.clone().ok_or_else(|| {
            SimError::stage_violation("ForceSystem::default_state", Stage::Built, Stage::Allocated)
        })
    }

    /// Advance `state` one stage at a time until it reaches `target`.
    ///
    /// Every element's hook for a stage runs before any hook of the next.
    /// If a hook fails, the stage in progress is aborted and `state` stays
    /// at the last completed stage. A no-op when `state` is already at or
    /// above `target`.
    ///
    /// # Errors
    ///
    /// The first error returned by any hook.
    pub fn realize(&self, state: &mut SystemState, target: Stage) -> Result<()> {
        while state.stage() < target {
            let Some(stage) = state.stage().next() else {
                break;
            };
            state.state.begin_stage(stage)?;
            if let Err(err) = self.realize_stage(state, stage) {
                state.state.abort_stage();
                tracing::debug!(%stage, %err, "realization aborted");
                return Err(err);
            }
            state.state.complete_stage()?;
        }
        Ok(())
    }

    /// Typed access to a registered force element.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidForceIndex`] or [`SimError::SlotTypeMismatch`].
    pub fn force<T: ForceElement>(&self, index: ForceIndex) -> Result<&T> {
        self.forces
            .get(index.index())
            .ok_or(SimError::InvalidForceIndex(index.index()))?
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| SimError::SlotTypeMismatch {
                location: "ForceSystem::force".into(),
                expected: type_name::<T>(),
            })
    }

    /// Typed access to a registered matter collection.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidMatterId`] or [`SimError::SlotTypeMismatch`].
    pub fn matter<T: Kinematics>(&self, id: MatterId) -> Result<&T> {
        self.matter
            .get(id)?
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| SimError::SlotTypeMismatch {
                location: "ForceSystem::matter".into(),
                expected: type_name::<T>(),
            })
    }

    /// Every registered matter collection.
    #[must_use]
    pub fn matter_set(&self) -> &Matter {
        &self.matter
    }

    /// Number of registered force elements.
    #[must_use]
    pub fn n_forces(&self) -> usize {
        self.forces.len()
    }

    fn check_open(&self, location: &str) -> Result<()> {
        if self.is_built() {
            return Err(SimError::topology_frozen(location));
        }
        Ok(())
    }

    fn allocate_all(
        &mut self,
        state: &mut State,
        matter_owners: &[SubsystemId],
        force_owners: &[SubsystemId],
    ) -> Result<()> {
        for (kinematics, &owner) in self.matter.iter_mut().zip(matter_owners) {
            kinematics.allocate(state, owner)?;
        }
        for (element, &owner) in self.forces.iter_mut().zip(force_owners) {
            element.allocate(state, owner)?;
        }
        Ok(())
    }

    fn realize_stage(&self, snapshot: &mut SystemState, stage: Stage) -> Result<()> {
        let state = &mut snapshot.state;
        let matter = &self.matter;
        match stage {
            Stage::Allocated | Stage::Built => {
                Err(SimError::topology_frozen("ForceSystem::realize"))
            }
            Stage::Modeled => self.each(|f| f.realize_modeling(state, matter)),
            Stage::Parametrized => self.each(|f| f.realize_parameters(state, matter)),
            Stage::Timed => self.each(|f| f.realize_time(state, matter)),
            Stage::Configured => self.each(|f| f.realize_configuration(state, matter)),
            Stage::Moving => self.each(|f| f.realize_motion(state, matter)),
            Stage::Dynamics => {
                snapshot.forces.zero();
                let mut sink = snapshot.forces.sink();
                self.each(|f| f.realize_dynamics(state, matter, &mut sink))
            }
            Stage::Reaction => self.each(|f| f.realize_reaction(state, matter)),
        }
    }

    fn each(&self, mut hook: impl FnMut(&dyn ForceElement) -> Result<()>) -> Result<()> {
        self.forces.iter().try_for_each(|f| hook(f.as_ref()))
    }
}
