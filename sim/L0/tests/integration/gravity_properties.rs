//! Property tests for uniform gravity.
//!
//! Run with: cargo test -p sim-conformance-tests -- gravity_properties

use approx::relative_eq;
use nalgebra::Vector3;
use proptest::prelude::*;
use sim_conformance_tests::{build_system, point_masses, realized};
use sim_forces::{SystemState, UniformGravity};
use sim_types::{MatterId, Point3, Stage};

// =============================================================================
// Strategies
// =============================================================================

/// Arbitrary gravity vectors, with the zero vector drawn often enough to
/// exercise the fallback direction.
fn arb_gravity() -> impl Strategy<Value = Vector3<f64>> {
    prop_oneof![
        4 => prop::array::uniform3(-100.0..100.0f64).prop_map(|[x, y, z]| Vector3::new(x, y, z)),
        1 => prop::sample::select(vec![0.0, 1e-3, -50.0])
            .prop_map(|z| Vector3::new(0.0, 0.0, z)),
        1 => Just(Vector3::zeros()),
    ]
}

fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-20.0..20.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

// =============================================================================
// Helpers
// =============================================================================

/// Unit masses at `positions` plus two particles, under gravity `g`.
fn gravity_state(
    positions: &[Point3<f64>],
    g: Vector3<f64>,
    zero_height: f64,
    enabled: bool,
) -> SystemState {
    let mut matter = point_masses("bodies", positions, 0);
    matter.add_particle(0.5);
    matter.add_particle(3.0);
    let (system, index) = build_system(matter, |system| {
        system.add_force(UniformGravity::new(g, zero_height))
    })
    .expect("build");
    let gravity = system.force::<UniformGravity>(index).expect("gravity");

    let mut state = system.default_state().expect("state");
    gravity
        .set_enabled(state.variables_mut(), enabled)
        .expect("enable");
    system.realize(&mut state, Stage::Dynamics).expect("realize");
    state
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// The direction is always a unit vector and `direction · magnitude == g`;
    /// a zero vector reports `+Z` with magnitude zero.
    #[test]
    fn direction_is_normalized(g in arb_gravity()) {
        let matter = point_masses("bodies", &[Point3::origin()], 0);
        let (system, index) =
            build_system(matter, |system| system.add_force(UniformGravity::new(g, 0.0)))
                .expect("build");
        let state = realized(&system, Stage::Parametrized).expect("realize");
        let gravity = system.force::<UniformGravity>(index).expect("gravity");

        let direction = gravity.gravity_direction(state.state()).expect("direction");
        let magnitude = gravity.gravity_magnitude(state.state()).expect("magnitude");

        prop_assert!(relative_eq!(direction.norm(), 1.0, epsilon = 1e-12));
        prop_assert!(relative_eq!(magnitude, g.norm(), epsilon = 1e-12, max_relative = 1e-12));
        if g == Vector3::zeros() {
            prop_assert_eq!(direction, Vector3::z_axis());
            prop_assert_eq!(magnitude, 0.0);
        } else {
            let rebuilt = direction.into_inner() * magnitude;
            prop_assert!(relative_eq!(rebuilt, g, epsilon = 1e-9, max_relative = 1e-9));
        }
    }

    /// A disabled element adds nothing, whatever the gravity vector.
    #[test]
    fn disabled_contributes_nothing(
        positions in prop::collection::vec(arb_point(), 1..4),
        g in arb_gravity(),
        zero_height in -10.0..10.0f64,
    ) {
        let state = gravity_state(&positions, g, zero_height, false);
        let forces = state.forces().expect("forces").matter(MatterId::new(0)).expect("matter");

        for f in forces.body_forces() {
            prop_assert_eq!(f.force, Vector3::zeros());
            prop_assert_eq!(f.torque, Vector3::zeros());
        }
        for f in forces.particle_forces() {
            prop_assert_eq!(*f, Vector3::zeros());
        }
        prop_assert_eq!(state.potential_energy().expect("pe"), 0.0);
    }

    /// An enabled element pulls every particle with `m g`.
    #[test]
    fn particles_feel_weight(g in arb_gravity()) {
        let state = gravity_state(&[Point3::origin()], g, 0.0, true);
        let forces = state.forces().expect("forces").matter(MatterId::new(0)).expect("matter");

        prop_assert!(relative_eq!(forces.particle_forces()[0], g * 0.5, epsilon = 1e-12));
        prop_assert!(relative_eq!(forces.particle_forces()[1], g * 3.0, epsilon = 1e-12));
        prop_assert!(relative_eq!(forces.body_forces()[0].force, g, epsilon = 1e-12));
    }
}
