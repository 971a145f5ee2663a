//! Linear spring between two body-fixed stations.
//!
//! With station positions `p1`, `p2` in ground, the separation is
//! `v = p2 - p1` and the current length `x = |v|`. For stiffness `k` and
//! natural length `x0`:
//!
//! ```text
//! pe = k (x - x0)² / 2
//! f1 =  k (x - x0) v / x      (on station 1)
//! f2 = -f1                    (on station 2)
//! ```
//!
//! The force is undefined when the stations coincide. It is returned as
//! `NaN` rather than clamped, so a degenerate model shows up downstream
//! instead of being masked.
//!
//! A nonzero damping coefficient adds `-damping · u` to the generalized
//! forces of the spring's matter collection, independent of the spring
//! geometry.

use crate::accumulator::ForceSink;
use crate::element::ForceElement;
use crate::matter::Matter;
use nalgebra::Vector3;
use sim_state::{CacheHandle, State, VariableHandle, VariablesMut};
use sim_types::{
    BodyId, MatterId, Result, SimError, SpatialForce, SpringConfig, Stage, SubsystemId,
    check_nonnegative, check_stage_ge,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Tunable spring parameters, one `Parametrized` variable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpringParameters {
    /// Stiffness `k` (N/m), must be nonnegative.
    pub stiffness: f64,
    /// Natural length `x0` (m), must be nonnegative.
    pub natural_length: f64,
    /// Ambient gravity. Stored for users of the element; the spring law
    /// does not read it.
    pub gravity: Vector3<f64>,
    /// Generalized damping coefficient.
    pub damping: f64,
}

impl SpringParameters {
    fn new(stiffness: f64, natural_length: f64) -> Self {
        Self {
            stiffness,
            natural_length,
            gravity: Vector3::zeros(),
            damping: 0.0,
        }
    }
}

/// Geometry derived at `Configured`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpringConfiguration {
    /// Station 1 offset from its body origin, re-expressed in ground.
    pub station1_g: Vector3<f64>,
    /// Station 2 offset from its body origin, re-expressed in ground.
    pub station2_g: Vector3<f64>,
    /// Separation `p2 - p1` in ground.
    pub separation: Vector3<f64>,
    /// Current length `|p2 - p1|`.
    pub length: f64,
    /// Scalar force `k (x - x0)`; positive in tension.
    pub tension: f64,
    /// Stored potential energy.
    pub potential_energy: f64,
}

/// Force derived at `Dynamics`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpringDynamics {
    /// Force on station 1 in ground. Station 2 receives the negation.
    pub force_on_station1: Vector3<f64>,
}

#[derive(Debug, Clone, Copy)]
struct SpringSlots {
    parameters: VariableHandle<SpringParameters>,
    configuration: CacheHandle<SpringConfiguration>,
    dynamics: CacheHandle<SpringDynamics>,
}

/// Two-point linear spring with optional generalized damping.
///
/// # Example
///
/// ```
/// use sim_forces::{ForceSystem, RigidMatter, TwoPointSpring};
/// use sim_types::{MassProperties, Point3, Pose, SpringConfig, Stage};
///
/// let mut matter = RigidMatter::new("bodies");
/// let a = matter.add_body(MassProperties::point_mass(1.0));
/// let b = matter.add_body_at(
///     MassProperties::point_mass(1.0),
///     Pose::from_position(Point3::new(2.0, 0.0, 0.0)),
/// );
///
/// let mut system = ForceSystem::new();
/// system.add_matter(matter).unwrap();
/// let spring = system
///     .add_force(TwoPointSpring::from_config(
///         &SpringConfig::between(a, b).with_stiffness(100.0).with_natural_length(1.0),
///     ))
///     .unwrap();
/// system.realize_topology().unwrap();
///
/// let mut state = system.default_state().unwrap();
/// system.realize(&mut state, Stage::Dynamics).unwrap();
///
/// let spring = system.force::<TwoPointSpring>(spring).unwrap();
/// assert_eq!(spring.potential_energy(state.state()).unwrap(), 50.0);
/// ```
#[derive(Debug, Clone)]
pub struct TwoPointSpring {
    matter: MatterId,
    body1: BodyId,
    station1: Vector3<f64>,
    body2: BodyId,
    station2: Vector3<f64>,
    defaults: SpringParameters,
    slots: Option<SpringSlots>,
}

impl TwoPointSpring {
    /// Spring between `station1` on `body1` and `station2` on `body2`.
    #[must_use]
    pub fn new(
        body1: BodyId,
        station1: Vector3<f64>,
        body2: BodyId,
        station2: Vector3<f64>,
        stiffness: f64,
        natural_length: f64,
    ) -> Self {
        Self {
            matter: MatterId::new(0),
            body1,
            station1,
            body2,
            station2,
            defaults: SpringParameters::new(stiffness, natural_length),
            slots: None,
        }
    }

    /// Build from a construction config.
    #[must_use]
    pub fn from_config(config: &SpringConfig) -> Self {
        Self::new(
            config.body1,
            config.station1,
            config.body2,
            config.station2,
            config.stiffness,
            config.natural_length,
        )
        .in_matter(config.matter)
    }

    /// Attach to a matter collection other than the first.
    #[must_use]
    pub fn in_matter(mut self, matter: MatterId) -> Self {
        self.matter = matter;
        self
    }

    /// The two bodies joined by the spring.
    #[must_use]
    pub fn bodies(&self) -> (BodyId, BodyId) {
        (self.body1, self.body2)
    }

    /// The two stations, each in its own body's frame.
    #[must_use]
    pub fn stations(&self) -> (Vector3<f64>, Vector3<f64>) {
        (self.station1, self.station2)
    }

    // ==================== Parameters ====================

    /// Current stiffness.
    pub fn stiffness(&self, state: &State) -> Result<f64> {
        Ok(self.parameters(state)?.stiffness)
    }

    /// Change the stiffness. Invalidates `Parametrized` and above.
    pub fn set_stiffness(&self, variables: VariablesMut<'_>, stiffness: f64) -> Result<()> {
        self.update_parameters(variables, |p| p.stiffness = stiffness)
    }

    /// Current natural length.
    pub fn natural_length(&self, state: &State) -> Result<f64> {
        Ok(self.parameters(state)?.natural_length)
    }

    /// Change the natural length. Invalidates `Parametrized` and above.
    pub fn set_natural_length(
        &self,
        variables: VariablesMut<'_>,
        natural_length: f64,
    ) -> Result<()> {
        self.update_parameters(variables, |p| p.natural_length = natural_length)
    }

    /// Current ambient gravity slot.
    pub fn gravity(&self, state: &State) -> Result<Vector3<f64>> {
        Ok(self.parameters(state)?.gravity)
    }

    /// Change the ambient gravity slot. Invalidates `Parametrized` and above.
    pub fn set_gravity(&self, variables: VariablesMut<'_>, gravity: Vector3<f64>) -> Result<()> {
        self.update_parameters(variables, |p| p.gravity = gravity)
    }

    /// Current damping coefficient.
    pub fn damping(&self, state: &State) -> Result<f64> {
        Ok(self.parameters(state)?.damping)
    }

    /// Change the damping coefficient. Invalidates `Parametrized` and above.
    pub fn set_damping(&self, variables: VariablesMut<'_>, damping: f64) -> Result<()> {
        self.update_parameters(variables, |p| p.damping = damping)
    }

    /// All parameters at once.
    pub fn parameters<'s>(&self, state: &'s State) -> Result<&'s SpringParameters> {
        state.variable(&self.slots("TwoPointSpring::parameters")?.parameters)
    }

    // ==================== Responses ====================

    /// Geometry computed at `Configured`.
    pub fn configuration<'s>(&self, state: &'s State) -> Result<&'s SpringConfiguration> {
        state.cache(&self.slots("TwoPointSpring::configuration")?.configuration)
    }

    /// Stored potential energy. Needs `Configured`.
    pub fn potential_energy(&self, state: &State) -> Result<f64> {
        Ok(self.configuration(state)?.potential_energy)
    }

    /// Current length. Needs `Configured`.
    pub fn length(&self, state: &State) -> Result<f64> {
        Ok(self.configuration(state)?.length)
    }

    /// Scalar force `k (x - x0)`. Needs `Configured`.
    pub fn tension(&self, state: &State) -> Result<f64> {
        Ok(self.configuration(state)?.tension)
    }

    /// Separation vector `p2 - p1` in ground. Needs `Configured`.
    pub fn separation(&self, state: &State) -> Result<Vector3<f64>> {
        Ok(self.configuration(state)?.separation)
    }

    /// Force on station 1 in ground. Needs `Dynamics`.
    pub fn force_on_station1(&self, state: &State) -> Result<Vector3<f64>> {
        let slots = self.slots("TwoPointSpring::force_on_station1")?;
        Ok(state.cache(&slots.dynamics)?.force_on_station1)
    }

    // ==================== Helpers ====================

    fn slots(&self, location: &str) -> Result<&SpringSlots> {
        self.slots
            .as_ref()
            .ok_or_else(|| SimError::stage_violation(location, Stage::Built, Stage::Allocated))
    }

    fn update_parameters(
        &self,
        variables: VariablesMut<'_>,
        f: impl FnOnce(&mut SpringParameters),
    ) -> Result<()> {
        const LOC: &str = "TwoPointSpring::update_parameters";
        let slots = self.slots(LOC)?;
        variables.update_variable(&slots.parameters, LOC, f)
    }
}

fn check_parameter(value: f64, field: &str, location: &str) -> Result<()> {
    check_nonnegative(value, field, location).inspect_err(|err| {
        tracing::warn!(%err, "spring parameter rejected");
    })
}

impl ForceElement for TwoPointSpring {
    fn name(&self) -> &'static str {
        "TwoPointSpring"
    }

    fn allocate(&mut self, state: &mut State, owner: SubsystemId) -> Result<()> {
        let parameters = state.allocate_variable(owner, Stage::Parametrized, self.defaults)?;
        let configuration = state.allocate_cache(owner, Stage::Configured)?;
        let dynamics = state.allocate_cache(owner, Stage::Dynamics)?;
        self.slots = Some(SpringSlots {
            parameters,
            configuration,
            dynamics,
        });
        Ok(())
    }

    fn realize_modeling(&self, state: &mut State, _matter: &Matter) -> Result<()> {
        // No modeling choices yet.
        check_stage_ge(state.stage(), Stage::Built, "TwoPointSpring::realize_modeling")
    }

    fn realize_parameters(&self, state: &mut State, _matter: &Matter) -> Result<()> {
        const LOC: &str = "TwoPointSpring::realize_parameters";
        check_stage_ge(state.stage(), Stage::Modeled, LOC)?;
        let p = self.parameters(state)?;
        check_parameter(p.stiffness, "stiffness", LOC)?;
        check_parameter(p.natural_length, "natural_length", LOC)
    }

    fn realize_time(&self, state: &mut State, _matter: &Matter) -> Result<()> {
        check_stage_ge(state.stage(), Stage::Parametrized, "TwoPointSpring::realize_time")
    }

    fn realize_configuration(&self, state: &mut State, matter: &Matter) -> Result<()> {
        const LOC: &str = "TwoPointSpring::realize_configuration";
        check_stage_ge(state.stage(), Stage::Timed, LOC)?;
        let slots = self.slots(LOC)?;
        let p = *state.variable(&slots.parameters)?;

        let kinematics = matter.get(self.matter)?;
        let x_gb1 = kinematics.body_transform(state, self.body1)?;
        let x_gb2 = kinematics.body_transform(state, self.body2)?;

        let station1_g = x_gb1.rotation * self.station1;
        let station2_g = x_gb2.rotation * self.station2;
        let p1_g = x_gb1.translation.vector + station1_g;
        let p2_g = x_gb2.translation.vector + station2_g;

        let separation = p2_g - p1_g;
        let length = separation.norm();
        let stretch = length - p.natural_length; // + tension, - compression
        let tension = p.stiffness * stretch;
        let potential_energy = 0.5 * tension * stretch;

        tracing::trace!(length, tension, "spring configured");
        state.set_cache(
            &slots.configuration,
            SpringConfiguration {
                station1_g,
                station2_g,
                separation,
                length,
                tension,
                potential_energy,
            },
        )
    }

    fn realize_motion(&self, state: &mut State, _matter: &Matter) -> Result<()> {
        check_stage_ge(state.stage(), Stage::Configured, "TwoPointSpring::realize_motion")
    }

    fn realize_dynamics(
        &self,
        state: &mut State,
        matter: &Matter,
        forces: &mut ForceSink<'_>,
    ) -> Result<()> {
        const LOC: &str = "TwoPointSpring::realize_dynamics";
        check_stage_ge(state.stage(), Stage::Moving, LOC)?;
        let slots = self.slots(LOC)?;
        let cc = *state.cache(&slots.configuration)?;
        let damping = state.variable(&slots.parameters)?.damping;

        // NaN when the stations coincide
        let f1_g = (cc.tension / cc.length) * cc.separation;
        state.set_cache(
            &slots.dynamics,
            SpringDynamics {
                force_on_station1: f1_g,
            },
        )?;

        forces.add_potential_energy(cc.potential_energy);
        forces.add_body_force(
            self.matter,
            self.body1,
            SpatialForce::at_offset(&cc.station1_g, f1_g),
        )?;
        forces.add_body_force(
            self.matter,
            self.body2,
            -SpatialForce::at_offset(&cc.station2_g, f1_g),
        )?;

        if damping != 0.0 {
            let u = matter.get(self.matter)?.generalized_velocity(state)?;
            forces.add_mobility_forces(self.matter, &(u * -damping))?;
        }
        Ok(())
    }

    fn realize_reaction(&self, state: &mut State, _matter: &Matter) -> Result<()> {
        check_stage_ge(state.stage(), Stage::Dynamics, "TwoPointSpring::realize_reaction")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
