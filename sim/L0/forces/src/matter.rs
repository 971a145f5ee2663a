//! Kinematics providers.
//!
//! Force elements never own bodies. They ask a [`Kinematics`] provider where
//! a body is, how heavy it is and how fast the mechanism moves, and the
//! answers are always "as of this snapshot". [`RigidMatter`] is the
//! reference provider: mass properties fixed at construction, poses and
//! generalized velocities stored as state variables.

use nalgebra::{DVector, Isometry3, Vector3};
use sim_state::{State, VariableHandle, VariablesMut};
use sim_types::{
    BodyId, MassProperties, MatterId, ParticleId, Pose, Result, SimError, Stage, SubsystemId,
};
use std::any::Any;
use std::fmt;

/// A collection of bodies and particles whose motion force elements read.
///
/// Mass data is topological (fixed once built). Poses and velocities are
/// read through the [`State`] so that they follow the stage ladder.
pub trait Kinematics: Any + fmt::Debug + Send + Sync {
    /// Name used for the subsystem that owns this collection's slots.
    fn name(&self) -> &str;

    /// Declare state slots. Called once while the state is being Built.
    fn allocate(&mut self, _state: &mut State, _owner: SubsystemId) -> Result<()> {
        Ok(())
    }

    /// Number of rigid bodies.
    fn n_bodies(&self) -> usize;

    /// Number of particles.
    fn n_particles(&self) -> usize;

    /// Number of mobilities (generalized speeds).
    fn n_mobilities(&self) -> usize;

    /// Body frame relative to ground.
    fn body_transform(&self, state: &State, body: BodyId) -> Result<Isometry3<f64>>;

    /// Body mass.
    fn body_mass(&self, body: BodyId) -> Result<f64>;

    /// Center of mass in the body frame.
    fn body_center_of_mass(&self, body: BodyId) -> Result<Vector3<f64>>;

    /// Generalized velocity, one entry per mobility.
    fn generalized_velocity<'s>(&self, state: &'s State) -> Result<&'s DVector<f64>>;

    /// Particle masses, one entry per particle.
    fn particle_masses(&self) -> &[f64];

    /// Upcast for typed lookup.
    fn as_any(&self) -> &dyn Any;
}

/// The ordered set of matter collections registered with a system.
#[derive(Debug, Default)]
pub struct Matter {
    collections: Vec<Box<dyn Kinematics>>,
}

impl Matter {
    /// Number of collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Whether no collection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Look up a collection.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidMatterId`] if `id` is out of range.
    pub fn get(&self, id: MatterId) -> Result<&dyn Kinematics> {
        self.collections
            .get(id.index())
            .map(|k| k.as_ref())
            .ok_or(SimError::InvalidMatterId(id.index()))
    }

    /// All collections with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (MatterId, &dyn Kinematics)> {
        self.collections
            .iter()
            .enumerate()
            .map(|(i, k)| (MatterId::new(i), k.as_ref()))
    }

    pub(crate) fn push(&mut self, kinematics: Box<dyn Kinematics>) -> MatterId {
        self.collections.push(kinematics);
        MatterId::new(self.collections.len() - 1)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Kinematics>> {
        self.collections.iter_mut()
    }
}

#[derive(Debug, Clone, Copy)]
struct MatterSlots {
    poses: VariableHandle<Vec<Isometry3<f64>>>,
    velocity: VariableHandle<DVector<f64>>,
}

/// Reference kinematics provider: free-standing rigid bodies and particles.
///
/// Body poses are a `Configured` variable and generalized velocities a
/// `Moving` variable, so moving a body invalidates every configuration
/// cache and changing a speed invalidates every motion cache.
///
/// # Example
///
/// ```
/// use sim_forces::RigidMatter;
/// use sim_types::{MassProperties, Pose, Point3};
///
/// let mut matter = RigidMatter::new("bodies").with_mobilities(6);
/// let ground = matter.add_body(MassProperties::point_mass(1.0));
/// let bob = matter.add_body_at(
///     MassProperties::sphere(2.0, 0.1),
///     Pose::from_position(Point3::new(0.0, 0.0, -1.0)),
/// );
/// assert_eq!(bob.index(), ground.index() + 1);
/// ```
#[derive(Debug, Clone)]
pub struct RigidMatter {
    name: String,
    bodies: Vec<MassProperties>,
    default_poses: Vec<Isometry3<f64>>,
    particle_masses: Vec<f64>,
    n_mobilities: usize,
    slots: Option<MatterSlots>,
}

impl RigidMatter {
    /// Create an empty collection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bodies: Vec::new(),
            default_poses: Vec::new(),
            particle_masses: Vec::new(),
            n_mobilities: 0,
            slots: None,
        }
    }

    /// Set the number of mobilities.
    #[must_use]
    pub fn with_mobilities(mut self, n_mobilities: usize) -> Self {
        self.n_mobilities = n_mobilities;
        self
    }

    /// Add a body at the ground origin.
    pub fn add_body(&mut self, mass: MassProperties) -> BodyId {
        self.add_body_at(mass, Pose::identity())
    }

    /// Add a body with a default pose.
    pub fn add_body_at(&mut self, mass: MassProperties, pose: Pose) -> BodyId {
        self.bodies.push(mass);
        self.default_poses.push(pose.to_isometry());
        BodyId::new(self.bodies.len() - 1)
    }

    /// Add a particle.
    pub fn add_particle(&mut self, mass: f64) -> ParticleId {
        self.particle_masses.push(mass);
        ParticleId::new(self.particle_masses.len() - 1)
    }

    /// Mass properties of a body.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidBodyId`] if out of range.
    pub fn mass_properties(&self, body: BodyId) -> Result<&MassProperties> {
        self.bodies
            .get(body.index())
            .ok_or(SimError::InvalidBodyId(body.index()))
    }

    /// Move a body. Invalidates `Configured` and above.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidBodyId`], or a stage error before allocation.
    pub fn set_body_pose(
        &self,
        variables: VariablesMut<'_>,
        body: BodyId,
        pose: Pose,
    ) -> Result<()> {
        const LOC: &str = "RigidMatter::set_body_pose";
        self.check_body(body)?;
        let slots = self.slots(LOC)?;
        variables.update_variable(&slots.poses, LOC, |poses| {
            poses[body.index()] = pose.to_isometry();
        })
    }

    /// Replace the generalized velocity. Invalidates `Moving` and above.
    ///
    /// # Errors
    ///
    /// [`SimError::SizeMismatch`] unless `u` has one entry per mobility.
    pub fn set_generalized_velocity(
        &self,
        variables: VariablesMut<'_>,
        u: DVector<f64>,
    ) -> Result<()> {
        const LOC: &str = "RigidMatter::set_generalized_velocity";
        if u.len() != self.n_mobilities {
            return Err(SimError::SizeMismatch {
                what: "generalized velocity",
                expected: self.n_mobilities,
                actual: u.len(),
            });
        }
        let slots = self.slots(LOC)?;
        variables.set_variable(&slots.velocity, u)
    }

    fn slots(&self, location: &str) -> Result<&MatterSlots> {
        self.slots
            .as_ref()
            .ok_or_else(|| SimError::stage_violation(location, Stage::Built, Stage::Allocated))
    }

    fn check_body(&self, body: BodyId) -> Result<()> {
        if body.index() >= self.bodies.len() {
            return Err(SimError::InvalidBodyId(body.index()));
        }
        Ok(())
    }
}

impl Kinematics for RigidMatter {
    fn name(&self) -> &str {
        &self.name
    }

    fn allocate(&mut self, state: &mut State, owner: SubsystemId) -> Result<()> {
        let poses = state.allocate_variable(owner, Stage::Configured, self.default_poses.clone())?;
        let velocity = state.allocate_variable(
            owner,
            Stage::Moving,
            DVector::<f64>::zeros(self.n_mobilities),
        )?;
        self.slots = Some(MatterSlots { poses, velocity });
        Ok(())
    }

    fn n_bodies(&self) -> usize {
        self.bodies.len()
    }

    fn n_particles(&self) -> usize {
        self.particle_masses.len()
    }

    fn n_mobilities(&self) -> usize {
        self.n_mobilities
    }

    fn body_transform(&self, state: &State, body: BodyId) -> Result<Isometry3<f64>> {
        let slots = self.slots("RigidMatter::body_transform")?;
        state
            .variable(&slots.poses)?
            .get(body.index())
            .copied()
            .ok_or(SimError::InvalidBodyId(body.index()))
    }

    fn body_mass(&self, body: BodyId) -> Result<f64> {
        Ok(self.mass_properties(body)?.mass)
    }

    fn body_center_of_mass(&self, body: BodyId) -> Result<Vector3<f64>> {
        Ok(self.mass_properties(body)?.center_of_mass)
    }

    fn generalized_velocity<'s>(&self, state: &'s State) -> Result<&'s DVector<f64>> {
        let slots = self.slots("RigidMatter::generalized_velocity")?;
        state.variable(&slots.velocity)
    }

    fn particle_masses(&self) -> &[f64] {
        &self.particle_masses
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
