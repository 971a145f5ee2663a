//! Shared force and potential-energy accumulation.
//!
//! Every force element adds into the same [`ForceAccumulator`] during the
//! Dynamics pass. Elements never see the accumulator itself, only a
//! [`ForceSink`], which can add but cannot read or overwrite. A contribution
//! therefore cannot depend on what another element contributed, and the
//! result is independent of element order up to floating-point rounding.

use crate::matter::Matter;
use nalgebra::{DVector, Vector3};
use sim_types::{BodyId, MatterId, ParticleId, Result, SimError, SpatialForce};

/// Forces accumulated for one matter collection.
#[derive(Debug, Clone, PartialEq)]
pub struct MatterForces {
    bodies: Vec<SpatialForce>,
    particles: Vec<Vector3<f64>>,
    mobilities: DVector<f64>,
}

impl MatterForces {
    /// Zeroed buffers of the given sizes.
    #[must_use]
    pub fn new(n_bodies: usize, n_particles: usize, n_mobilities: usize) -> Self {
        Self {
            bodies: vec![SpatialForce::zero(); n_bodies],
            particles: vec![Vector3::zeros(); n_particles],
            mobilities: DVector::zeros(n_mobilities),
        }
    }

    /// Spatial force on each body, about its origin, in ground.
    #[must_use]
    pub fn body_forces(&self) -> &[SpatialForce] {
        &self.bodies
    }

    /// Force on each particle, in ground.
    #[must_use]
    pub fn particle_forces(&self) -> &[Vector3<f64>] {
        &self.particles
    }

    /// Generalized force on each mobility.
    #[must_use]
    pub fn mobility_forces(&self) -> &DVector<f64> {
        &self.mobilities
    }

    fn zero(&mut self) {
        self.bodies.fill(SpatialForce::zero());
        self.particles.fill(Vector3::zeros());
        self.mobilities.fill(0.0);
    }
}

/// Per-snapshot force buffers for every matter collection plus the total
/// potential energy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForceAccumulator {
    matter: Vec<MatterForces>,
    potential_energy: f64,
}

impl ForceAccumulator {
    /// Zeroed buffers sized for every collection in `matter`.
    #[must_use]
    pub fn for_matter(matter: &Matter) -> Self {
        Self {
            matter: matter
                .iter()
                .map(|(_, k)| MatterForces::new(k.n_bodies(), k.n_particles(), k.n_mobilities()))
                .collect(),
            potential_energy: 0.0,
        }
    }

    /// Buffers for one collection.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidMatterId`] if out of range.
    pub fn matter(&self, id: MatterId) -> Result<&MatterForces> {
        self.matter
            .get(id.index())
            .ok_or(SimError::InvalidMatterId(id.index()))
    }

    /// Number of collections.
    #[must_use]
    pub fn n_matter(&self) -> usize {
        self.matter.len()
    }

    /// Total potential energy.
    #[must_use]
    pub fn potential_energy(&self) -> f64 {
        self.potential_energy
    }

    /// Additive-only view handed to force elements.
    pub fn sink(&mut self) -> ForceSink<'_> {
        ForceSink { acc: self }
    }

    pub(crate) fn zero(&mut self) {
        for forces in &mut self.matter {
            forces.zero();
        }
        self.potential_energy = 0.0;
    }

    fn matter_mut(&mut self, id: MatterId) -> Result<&mut MatterForces> {
        self.matter
            .get_mut(id.index())
            .ok_or(SimError::InvalidMatterId(id.index()))
    }
}

/// Write-only access to a [`ForceAccumulator`].
///
/// Every method adds; nothing can be read back or replaced.
#[derive(Debug)]
pub struct ForceSink<'a> {
    acc: &'a mut ForceAccumulator,
}

impl ForceSink<'_> {
    /// Add a spatial force to a body.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidMatterId`] or [`SimError::InvalidBodyId`].
    pub fn add_body_force(
        &mut self,
        matter: MatterId,
        body: BodyId,
        force: SpatialForce,
    ) -> Result<()> {
        let slot = self
            .acc
            .matter_mut(matter)?
            .bodies
            .get_mut(body.index())
            .ok_or(SimError::InvalidBodyId(body.index()))?;
        *slot += force;
        Ok(())
    }

    /// Add a force to a particle.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidMatterId`] or [`SimError::InvalidParticleId`].
    pub fn add_particle_force(
        &mut self,
        matter: MatterId,
        particle: ParticleId,
        force: Vector3<f64>,
    ) -> Result<()> {
        let slot = self
            .acc
            .matter_mut(matter)?
            .particles
            .get_mut(particle.index())
            .ok_or(SimError::InvalidParticleId(particle.index()))?;
        *slot += force;
        Ok(())
    }

    /// Add a generalized force vector to a collection's mobilities.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidMatterId`], or [`SimError::SizeMismatch`] unless
    /// `forces` has one entry per mobility.
    pub fn add_mobility_forces(&mut self, matter: MatterId, forces: &DVector<f64>) -> Result<()> {
        let target = &mut self.acc.matter_mut(matter)?.mobilities;
        if target.len() != forces.len() {
            return Err(SimError::SizeMismatch {
                what: "mobility forces",
                expected: target.len(),
                actual: forces.len(),
            });
        }
        *target += forces;
        Ok(())
    }

    /// Add to the total potential energy.
    pub fn add_potential_energy(&mut self, energy: f64) {
        self.acc.potential_energy += energy;
    }
}
