//! Uniform gravity acting on every body and particle of every matter
//! collection.
//!
//! For gravity vector `g`, a body of mass `m` whose center of mass sits at
//! `com` in ground receives the force `m g` through its center of mass, and
//! contributes potential energy `m (g·com - |g| h0)` where `h0` is the
//! zero height. Particles receive `m g` and no energy term.

use crate::accumulator::ForceSink;
use crate::element::ForceElement;
use crate::matter::Matter;
use nalgebra::{Unit, Vector3};
use sim_state::{CacheHandle, State, VariableHandle, VariablesMut};
use sim_types::{
    BodyId, Gravity, GravityConfig, ParticleId, Result, SimError, SpatialForce, Stage, SubsystemId,
    check_stage_ge,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Tunable gravity parameters, one `Parametrized` variable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GravityParameters {
    /// Gravity vector in ground (m/s²).
    pub gravity: Vector3<f64>,
    /// Height along the gravity direction at which potential energy is zero.
    pub zero_height: f64,
    /// When false the element contributes nothing.
    pub enabled: bool,
}

/// Derived at `Parametrized`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GravityCache {
    /// Unit direction of `g`; `+Z` when `g` is zero.
    pub direction: Unit<Vector3<f64>>,
    /// `|g|`.
    pub magnitude: f64,
}

impl Default for GravityCache {
    fn default() -> Self {
        Self {
            direction: Vector3::z_axis(),
            magnitude: 0.0,
        }
    }
}

impl GravityCache {
    fn from_gravity(gravity: &Vector3<f64>) -> Self {
        let g = Gravity::custom(*gravity);
        Self {
            direction: g.direction(),
            magnitude: g.magnitude(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GravitySlots {
    parameters: VariableHandle<GravityParameters>,
    cache: CacheHandle<GravityCache>,
}

/// Uniform gravitational field.
#[derive(Debug, Clone)]
pub struct UniformGravity {
    defaults: GravityParameters,
    slots: Option<GravitySlots>,
}

impl Default for UniformGravity {
    fn default() -> Self {
        Self::from_config(&GravityConfig::default())
    }
}

impl UniformGravity {
    /// Gravity `g` with potential energy zero at height `zero_height`.
    #[must_use]
    pub fn new(gravity: Vector3<f64>, zero_height: f64) -> Self {
        Self {
            defaults: GravityParameters {
                gravity,
                zero_height,
                enabled: true,
            },
            slots: None,
        }
    }

    /// Build from a construction config.
    #[must_use]
    pub fn from_config(config: &GravityConfig) -> Self {
        Self::new(config.gravity.acceleration, config.zero_height)
    }

    /// Current gravity vector.
    pub fn gravity(&self, state: &State) -> Result<Vector3<f64>> {
        Ok(self.parameters(state)?.gravity)
    }

    /// Change the gravity vector. Invalidates `Parametrized` and above.
    pub fn set_gravity(&self, variables: VariablesMut<'_>, gravity: Vector3<f64>) -> Result<()> {
        self.update_parameters(variables, |p| p.gravity = gravity)
    }

    /// Current zero height.
    pub fn zero_height(&self, state: &State) -> Result<f64> {
        Ok(self.parameters(state)?.zero_height)
    }

    /// Change the zero height. Invalidates `Parametrized` and above.
    pub fn set_zero_height(&self, variables: VariablesMut<'_>, zero_height: f64) -> Result<()> {
        self.update_parameters(variables, |p| p.zero_height = zero_height)
    }

    /// Whether the element contributes.
    pub fn is_enabled(&self, state: &State) -> Result<bool> {
        Ok(self.parameters(state)?.enabled)
    }

    /// Switch the element on or off. Invalidates `Parametrized` and above.
    pub fn set_enabled(&self, variables: VariablesMut<'_>, enabled: bool) -> Result<()> {
        self.update_parameters(variables, |p| p.enabled = enabled)
    }

    /// All parameters at once.
    pub fn parameters<'s>(&self, state: &'s State) -> Result<&'s GravityParameters> {
        state.variable(&self.slots("UniformGravity::parameters")?.parameters)
    }

    /// `|g|`. Needs `Parametrized`.
    pub fn gravity_magnitude(&self, state: &State) -> Result<f64> {
        Ok(self.cache(state)?.magnitude)
    }

    /// Unit direction of `g`, `+Z` when `g` is zero. Needs `Parametrized`.
    pub fn gravity_direction(&self, state: &State) -> Result<Unit<Vector3<f64>>> {
        Ok(self.cache(state)?.direction)
    }

    fn cache<'s>(&self, state: &'s State) -> Result<&'s GravityCache> {
        state.cache(&self.slots("UniformGravity::cache")?.cache)
    }

    fn slots(&self, location: &str) -> Result<&GravitySlots> {
        self.slots
            .as_ref()
            .ok_or_else(|| SimError::stage_violation(location, Stage::Built, Stage::Allocated))
    }

    fn update_parameters(
        &self,
        variables: VariablesMut<'_>,
        f: impl FnOnce(&mut GravityParameters),
    ) -> Result<()> {
        const LOC: &str = "UniformGravity::update_parameters";
        let slots = self.slots(LOC)?;
        variables.update_variable(&slots.parameters, LOC, f)
    }
}

impl ForceElement for UniformGravity {
    fn name(&self) -> &'static str {
        "UniformGravity"
    }

    fn allocate(&mut self, state: &mut State, owner: SubsystemId) -> Result<()> {
        let parameters = state.allocate_variable(owner, Stage::Parametrized, self.defaults)?;
        let cache = state.allocate_cache(owner, Stage::Parametrized)?;
        self.slots = Some(GravitySlots { parameters, cache });
        Ok(())
    }

    fn realize_modeling(&self, state: &mut State, _matter: &Matter) -> Result<()> {
        check_stage_ge(state.stage(), Stage::Built, "UniformGravity::realize_modeling")
    }

    fn realize_parameters(&self, state: &mut State, _matter: &Matter) -> Result<()> {
        const LOC: &str = "UniformGravity::realize_parameters";
        check_stage_ge(state.stage(), Stage::Modeled, LOC)?;
        let slots = self.slots(LOC)?;
        let gravity = state.variable(&slots.parameters)?.gravity;
        state.set_cache(&slots.cache, GravityCache::from_gravity(&gravity))
    }

    fn realize_time(&self, state: &mut State, _matter: &Matter) -> Result<()> {
        check_stage_ge(state.stage(), Stage::Parametrized, "UniformGravity::realize_time")
    }

    fn realize_configuration(&self, state: &mut State, _matter: &Matter) -> Result<()> {
        check_stage_ge(state.stage(), Stage::Timed, "UniformGravity::realize_configuration")
    }

    fn realize_motion(&self, state: &mut State, _matter: &Matter) -> Result<()> {
        check_stage_ge(state.stage(), Stage::Configured, "UniformGravity::realize_motion")
    }

    fn realize_dynamics(
        &self,
        state: &mut State,
        matter: &Matter,
        forces: &mut ForceSink<'_>,
    ) -> Result<()> {
        const LOC: &str = "UniformGravity::realize_dynamics";
        check_stage_ge(state.stage(), Stage::Moving, LOC)?;
        let slots = self.slots(LOC)?;
        let p = *state.variable(&slots.parameters)?;
        let magnitude = state.cache(&slots.cache)?.magnitude;
        if !p.enabled || magnitude == 0.0 {
            tracing::trace!(enabled = p.enabled, "gravity skipped");
            return Ok(());
        }

        let g = p.gravity;
        let gh0 = magnitude * p.zero_height;
        for (id, kinematics) in matter.iter() {
            for (i, &m) in kinematics.particle_masses().iter().enumerate() {
                forces.add_particle_force(id, ParticleId::new(i), g * m)?;
            }
            for b in 0..kinematics.n_bodies() {
                let body = BodyId::new(b);
                let m = kinematics.body_mass(body)?;
                let x_gb = kinematics.body_transform(state, body)?;
                let com_b_g = x_gb.rotation * kinematics.body_center_of_mass(body)?;
                let com_g = x_gb.translation.vector + com_b_g;
                let mg = g * m;
                forces.add_potential_energy(m * (g.dot(&com_g) - gh0));
                forces.add_body_force(id, body, SpatialForce::at_offset(&com_b_g, mg))?;
            }
        }
        Ok(())
    }

    fn realize_reaction(&self, state: &mut State, _matter: &Matter) -> Result<()> {
        check_stage_ge(state.stage(), Stage::Dynamics, "UniformGravity::realize_reaction")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
