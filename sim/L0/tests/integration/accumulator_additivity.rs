//! Property tests: elements realized together add up to their standalone
//! contributions, in any registration order.
//!
//! Every buffer is compared: body forces, particle forces, mobility forces
//! and potential energy.
//!
//! Run with: cargo test -p sim-conformance-tests -- accumulator_additivity

use approx::relative_eq;
use nalgebra::{DVector, Vector3, Vector6};
use proptest::prelude::*;
use sim_conformance_tests::{build_system, point_masses};
use sim_forces::{
    EmptyForces, ForceAccumulator, ForceIndex, ForceSystem, RigidMatter, TwoPointSpring,
    UniformGravity,
};
use sim_types::{BodyId, MatterId, Point3, Result, SpringConfig, Stage};

const N_BODIES: usize = 4;
const N_MOBILITIES: usize = 3;
const PARTICLE_MASSES: [f64; 2] = [0.5, 2.0];

#[derive(Debug, Clone)]
enum Element {
    Spring {
        body1: usize,
        body2: usize,
        stiffness: f64,
        natural_length: f64,
        damping: f64,
    },
    Gravity(Vector3<f64>),
    Empty,
}

/// Body positions and the generalized velocity shared by every run.
#[derive(Debug, Clone)]
struct Scene {
    positions: Vec<Point3<f64>>,
    velocity: DVector<f64>,
}

/// Everything one Dynamics pass leaves in the accumulator.
#[derive(Debug, Clone, PartialEq)]
struct Totals {
    bodies: Vec<Vector6<f64>>,
    particles: Vec<Vector3<f64>>,
    mobilities: DVector<f64>,
    pe: f64,
}

impl Totals {
    fn zero() -> Self {
        Self {
            bodies: vec![Vector6::zeros(); N_BODIES],
            particles: vec![Vector3::zeros(); PARTICLE_MASSES.len()],
            mobilities: DVector::zeros(N_MOBILITIES),
            pe: 0.0,
        }
    }

    fn add(&mut self, other: &Self) {
        for (total, f) in self.bodies.iter_mut().zip(&other.bodies) {
            *total += f;
        }
        for (total, f) in self.particles.iter_mut().zip(&other.particles) {
            *total += f;
        }
        self.mobilities += &other.mobilities;
        self.pe += other.pe;
    }

    fn close(&self, other: &Self) -> bool {
        const EPS: f64 = 1e-9;
        self.bodies.len() == other.bodies.len()
            && self.particles.len() == other.particles.len()
            && self
                .bodies
                .iter()
                .zip(&other.bodies)
                .all(|(x, y)| relative_eq!(*x, *y, epsilon = EPS, max_relative = EPS))
            && self
                .particles
                .iter()
                .zip(&other.particles)
                .all(|(x, y)| relative_eq!(*x, *y, epsilon = EPS, max_relative = EPS))
            && relative_eq!(self.mobilities, other.mobilities, epsilon = EPS, max_relative = EPS)
            && relative_eq!(self.pe, other.pe, epsilon = EPS, max_relative = EPS)
    }
}

fn add(system: &mut ForceSystem, element: &Element) -> Result<ForceIndex> {
    match *element {
        Element::Spring {
            body1,
            body2,
            stiffness,
            natural_length,
            ..
        } => system.add_force(TwoPointSpring::from_config(
            &SpringConfig::between(BodyId::new(body1), BodyId::new(body2))
                .with_stiffness(stiffness)
                .with_natural_length(natural_length),
        )),
        Element::Gravity(g) => system.add_force(UniformGravity::new(g, 0.0)),
        Element::Empty => system.add_force(EmptyForces::new()),
    }
}

// =============================================================================
// Strategies
// =============================================================================

/// Body positions at least 0.5 apart so no spring is degenerate.
fn arb_positions() -> impl Strategy<Value = Vec<Point3<f64>>> {
    prop::collection::vec(
        prop::array::uniform3(-10.0..10.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z)),
        N_BODIES,
    )
    .prop_filter("bodies too close", |ps| {
        ps.iter().enumerate().all(|(i, a)| {
            ps.iter()
                .skip(i + 1)
                .all(|b| (a - b).norm() > 0.5)
        })
    })
}

fn arb_scene() -> impl Strategy<Value = Scene> {
    (
        arb_positions(),
        prop::collection::vec(-5.0..5.0f64, N_MOBILITIES),
    )
        .prop_map(|(positions, u)| Scene {
            positions,
            velocity: DVector::from_vec(u),
        })
}

fn arb_element() -> impl Strategy<Value = Element> {
    let damping = prop_oneof![Just(0.0), -2.0..2.0f64];
    prop_oneof![
        3 => (0..N_BODIES, 0..N_BODIES, 0.0..100.0f64, 0.0..5.0f64, damping)
            .prop_filter("spring needs two bodies", |(a, b, ..)| a != b)
            .prop_map(|(body1, body2, stiffness, natural_length, damping)| Element::Spring {
                body1,
                body2,
                stiffness,
                natural_length,
                damping,
            }),
        1 => prop::array::uniform3(-20.0..20.0f64)
            .prop_map(|[x, y, z]| Element::Gravity(Vector3::new(x, y, z))),
        1 => Just(Element::Empty),
    ]
}

// =============================================================================
// Helpers
// =============================================================================

/// Accumulator totals after one Dynamics pass over `scene`.
fn dynamics(scene: &Scene, elements: &[Element]) -> Totals {
    let mut matter = point_masses("bodies", &scene.positions, N_MOBILITIES);
    for mass in PARTICLE_MASSES {
        matter.add_particle(mass);
    }
    let (system, indices) = build_system(matter, |system| {
        elements
            .iter()
            .map(|e| add(system, e))
            .collect::<Result<Vec<_>>>()
    })
    .expect("build");

    let mut state = system.default_state().expect("state");
    system
        .matter::<RigidMatter>(MatterId::new(0))
        .expect("matter")
        .set_generalized_velocity(state.variables_mut(), scene.velocity.clone())
        .expect("velocity");
    for (element, &index) in elements.iter().zip(&indices) {
        if let Element::Spring { damping, .. } = *element {
            system
                .force::<TwoPointSpring>(index)
                .expect("spring")
                .set_damping(state.variables_mut(), damping)
                .expect("damping");
        }
    }
    system.realize(&mut state, Stage::Dynamics).expect("realize");
    totals(state.forces().expect("forces"))
}

fn totals(acc: &ForceAccumulator) -> Totals {
    let forces = acc.matter(MatterId::new(0)).expect("matter");
    Totals {
        bodies: forces.body_forces().iter().map(|f| f.to_vector6()).collect(),
        particles: forces.particle_forces().to_vec(),
        mobilities: forces.mobility_forces().clone(),
        pe: acc.potential_energy(),
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn combined_equals_sum_of_standalone(
        scene in arb_scene(),
        elements in prop::collection::vec(arb_element(), 1..6),
    ) {
        let combined = dynamics(&scene, &elements);

        let mut sum = Totals::zero();
        for element in &elements {
            sum.add(&dynamics(&scene, std::slice::from_ref(element)));
        }

        prop_assert!(combined.close(&sum), "combined {combined:?} != sum {sum:?}");
    }

    #[test]
    fn registration_order_is_irrelevant(
        scene in arb_scene(),
        (elements, shuffled) in prop::collection::vec(arb_element(), 1..6)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
    ) {
        let a = dynamics(&scene, &elements);
        let b = dynamics(&scene, &shuffled);
        prop_assert!(a.close(&b), "{a:?} != {b:?}");
    }

    #[test]
    fn empty_element_changes_nothing(
        scene in arb_scene(),
        elements in prop::collection::vec(arb_element(), 0..4),
    ) {
        let base = dynamics(&scene, &elements);
        let mut with_empty = elements.clone();
        with_empty.insert(0, Element::Empty);
        prop_assert_eq!(dynamics(&scene, &with_empty), base);
    }
}
