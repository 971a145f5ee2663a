//! Property tests for the spring law.
//!
//! Run with: cargo test -p sim-conformance-tests -- spring_properties

use approx::relative_eq;
use nalgebra::DVector;
use proptest::prelude::*;
use sim_conformance_tests::{build_system, point_masses, realized};
use sim_forces::{RigidMatter, SystemState, TwoPointSpring};
use sim_types::{BodyId, MatterId, Point3, SpringConfig, Stage};

fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-50.0..50.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

/// Realize a spring between unit masses at `p1` and `p2`.
fn spring_state(
    p1: Point3<f64>,
    p2: Point3<f64>,
    stiffness: f64,
    natural_length: f64,
) -> (SystemState, TwoPointSpring) {
    let matter = point_masses("bodies", &[p1, p2], 0);
    let (system, index) = build_system(matter, |system| {
        system.add_force(TwoPointSpring::from_config(
            &SpringConfig::between(BodyId::new(0), BodyId::new(1))
                .with_stiffness(stiffness)
                .with_natural_length(natural_length),
        ))
    })
    .expect("build");
    let state = realized(&system, Stage::Dynamics).expect("realize");
    let spring = system
        .force::<TwoPointSpring>(index)
        .expect("spring")
        .clone();
    (state, spring)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// pe = k (x - x0)² / 2 and f1 = k (x - x0) v / x in every direction.
    #[test]
    fn hookes_law(
        p1 in arb_point(),
        p2 in arb_point(),
        stiffness in 0.0..1000.0f64,
        natural_length in 0.0..20.0f64,
    ) {
        let v = p2 - p1;
        let x = v.norm();
        prop_assume!(x > 1e-6);

        let (state, spring) = spring_state(p1, p2, stiffness, natural_length);
        let s = state.state();
        let stretch = x - natural_length;

        let pe = spring.potential_energy(s).unwrap();
        prop_assert!(relative_eq!(
            pe,
            0.5 * stiffness * stretch * stretch,
            epsilon = 1e-9,
            max_relative = 1e-9
        ));
        prop_assert!(pe >= 0.0);

        let f1 = spring.force_on_station1(s).unwrap();
        let expected = v * (stiffness * stretch / x);
        prop_assert!(relative_eq!(f1, expected, epsilon = 1e-9, max_relative = 1e-9));
    }

    /// Station 2 receives exactly the negated force, so the pair sums to zero.
    #[test]
    fn newtons_third_law(
        p1 in arb_point(),
        p2 in arb_point(),
        stiffness in 0.0..1000.0f64,
        natural_length in 0.0..20.0f64,
    ) {
        prop_assume!((p2 - p1).norm() > 1e-6);
        let (state, _) = spring_state(p1, p2, stiffness, natural_length);
        let forces = state.forces().unwrap().matter(MatterId::new(0)).unwrap();
        let f1 = forces.body_forces()[0].force;
        let f2 = forces.body_forces()[1].force;
        prop_assert_eq!(f2, -f1);
    }

    /// Coincident stations give an all-NaN force without failing.
    #[test]
    fn coincident_stations_are_nan(
        p in arb_point(),
        stiffness in 0.0..1000.0f64,
        natural_length in 0.0..20.0f64,
    ) {
        let (state, spring) = spring_state(p, p, stiffness, natural_length);
        let f1 = spring.force_on_station1(state.state()).unwrap();
        prop_assert!(f1.iter().all(|c| c.is_nan()));
        prop_assert!(spring.length(state.state()).unwrap() == 0.0);
    }

    /// Damping adds exactly -c u to the mobilities, whatever the geometry.
    #[test]
    fn damping_is_velocity_proportional(
        p2 in arb_point(),
        damping in -10.0..10.0f64,
        u in prop::collection::vec(-5.0..5.0f64, 3),
    ) {
        prop_assume!(p2.coords.norm() > 1e-6);
        let matter = point_masses("bodies", &[Point3::origin(), p2], 3);
        let (system, index) = build_system(matter, |system| {
            system.add_force(TwoPointSpring::from_config(
                &SpringConfig::between(BodyId::new(0), BodyId::new(1)).with_stiffness(10.0),
            ))
        })
        .unwrap();
        let spring = system.force::<TwoPointSpring>(index).unwrap();
        let bodies = system.matter::<RigidMatter>(MatterId::new(0)).unwrap();

        let mut state = system.default_state().unwrap();
        spring.set_damping(state.variables_mut(), damping).unwrap();
        let u = DVector::from_vec(u);
        bodies.set_generalized_velocity(state.variables_mut(), u.clone()).unwrap();
        system.realize(&mut state, Stage::Dynamics).unwrap();

        let forces = state.forces().unwrap().matter(MatterId::new(0)).unwrap();
        let expected = if damping == 0.0 { DVector::zeros(3) } else { &u * -damping };
        prop_assert_eq!(forces.mobility_forces(), &expected);

        // Geometry is the undamped spring's
        let f1 = spring.force_on_station1(state.state()).unwrap();
        prop_assert!(relative_eq!(f1, p2.coords * 10.0, epsilon = 1e-9, max_relative = 1e-9));
    }
}
