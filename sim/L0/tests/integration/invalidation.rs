//! Stage rewinds and cache invalidation.
//!
//! The property tests drive a bare `State` with random slot tags and a
//! random sequence of stage advances, variable writes and explicit
//! invalidations, checking every slot against a reference model of the
//! ladder after each step.

use proptest::prelude::*;
use sim_conformance_tests::{build_system, point_masses, realized};
use sim_forces::{TwoPointSpring, UniformGravity};
use sim_state::{CacheHandle, SlotStatus, State, VariableHandle};
use sim_types::{BodyId, Point3, SimError, SpringConfig, Stage};

#[derive(Debug, Clone)]
enum Op {
    Advance,
    SetVariable(usize),
    Invalidate(Stage),
}

fn arb_tag() -> impl Strategy<Value = Stage> {
    prop::sample::select(Stage::ALL[Stage::Modeled.level()..].to_vec())
}

fn arb_op(n_variables: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Advance),
        1 => (0..n_variables).prop_map(Op::SetVariable),
        1 => prop::sample::select(Stage::ALL.to_vec()).prop_map(Op::Invalidate),
    ]
}

struct Fixture {
    state: State,
    variables: Vec<(VariableHandle<u32>, Stage)>,
    caches: Vec<(CacheHandle<u32>, Stage)>,
}

impl Fixture {
    fn new(variable_tags: &[Stage], cache_tags: &[Stage]) -> Self {
        let mut state = State::new();
        let owner = state.add_subsystem("model").unwrap();
        let variables = variable_tags
            .iter()
            .map(|&tag| (state.allocate_variable(owner, tag, 0_u32).unwrap(), tag))
            .collect();
        let caches = cache_tags
            .iter()
            .map(|&tag| (state.allocate_cache::<u32>(owner, tag).unwrap(), tag))
            .collect();
        state.begin_stage(Stage::Built).unwrap();
        state.complete_stage().unwrap();
        Self {
            state,
            variables,
            caches,
        }
    }

    /// Realize the next stage, writing every cache tagged with it.
    fn advance(&mut self) {
        let Some(next) = self.state.stage().next() else {
            return;
        };
        self.state.begin_stage(next).unwrap();
        for (handle, tag) in &self.caches {
            if *tag == next {
                self.state.set_cache(handle, tag.level() as u32).unwrap();
            }
        }
        self.state.complete_stage().unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn slots_follow_the_ladder(
        variable_tags in prop::collection::vec(arb_tag(), 1..6),
        cache_tags in prop::collection::vec(arb_tag(), 1..8),
        ops in prop::collection::vec(arb_op(5), 1..40),
    ) {
        let mut fx = Fixture::new(&variable_tags, &cache_tags);
        let mut model = Stage::Built;

        for op in ops {
            match op {
                Op::Advance => {
                    fx.advance();
                    model = model.next().unwrap_or(model);
                }
                Op::SetVariable(i) => {
                    let (handle, tag) = fx.variables[i % fx.variables.len()];
                    fx.state.set_variable(&handle, 7).unwrap();
                    model = model.min(tag.prev_or_lowest());
                }
                Op::Invalidate(stage) => {
                    fx.state.invalidate_from(stage);
                    model = model.min(stage.max(Stage::Modeled).prev_or_lowest());
                }
            }

            prop_assert_eq!(fx.state.stage(), model);
            prop_assert_eq!(fx.state.realizing(), None);
            for (handle, tag) in &fx.caches {
                let realized = *tag <= model;
                prop_assert_eq!(fx.state.cache(handle).is_ok(), realized);
                prop_assert_eq!(
                    fx.state.cache_status(handle).unwrap(),
                    if realized { SlotStatus::Valid } else { SlotStatus::Invalid }
                );
                if realized {
                    prop_assert_eq!(*fx.state.cache(handle).unwrap(), tag.level() as u32);
                }
            }
            for (handle, tag) in &fx.variables {
                prop_assert_eq!(
                    fx.state.variable(handle).is_ok(),
                    model >= tag.prev_or_lowest()
                );
            }
        }
    }

    #[test]
    fn topology_survives_any_invalidation(stage in prop::sample::select(Stage::ALL.to_vec())) {
        let mut fx = Fixture::new(&[Stage::Parametrized], &[Stage::Configured]);
        for _ in 0..Stage::ALL.len() {
            fx.advance();
        }
        fx.state.invalidate_from(stage);
        prop_assert!(fx.state.stage() >= Stage::Built);
        let frozen = matches!(
            fx.state.add_subsystem("late"),
            Err(SimError::TopologyFrozen { .. })
        );
        prop_assert!(frozen);
    }
}

/// Test: a gravity change rewinds below Parametrized but leaves other
/// elements' parameters intact.
#[test]
fn parameter_change_rewinds_whole_snapshot() {
    let matter = point_masses("bodies", &[Point3::origin(), Point3::new(0.0, 0.0, 2.0)], 0);
    let (system, (spring, gravity)) = build_system(matter, |system| {
        let spring = system.add_force(TwoPointSpring::from_config(
            &SpringConfig::between(BodyId::new(0), BodyId::new(1)).with_stiffness(5.0),
        ))?;
        let gravity = system.add_force(UniformGravity::default())?;
        Ok((spring, gravity))
    })
    .unwrap();
    let spring = system.force::<TwoPointSpring>(spring).unwrap();
    let gravity = system.force::<UniformGravity>(gravity).unwrap();

    let mut state = realized(&system, Stage::Reaction).unwrap();
    let pe_before = state.potential_energy().unwrap();

    gravity.set_zero_height(state.variables_mut(), 1.0).unwrap();
    assert_eq!(state.stage(), Stage::Modeled);
    // Spring configuration cache was above the rewind point
    assert!(spring.length(state.state()).unwrap_err().is_stage_violation());
    assert_eq!(spring.stiffness(state.state()).unwrap(), 5.0);

    system.realize(&mut state, Stage::Dynamics).unwrap();
    let shift = pe_before - state.potential_energy().unwrap();
    // Two unit masses at |g| = 9.81, zero height moved up by 1
    assert!((shift - 2.0 * 9.81).abs() < 1e-12);
}

/// Test: a failed realization leaves earlier stages readable.
#[test]
fn failed_parameters_keep_modeled() {
    let matter = point_masses("bodies", &[Point3::origin(), Point3::new(1.0, 0.0, 0.0)], 0);
    let (system, index) = build_system(matter, |system| {
        system.add_force(TwoPointSpring::from_config(
            &SpringConfig::between(BodyId::new(0), BodyId::new(1)).with_natural_length(-2.0),
        ))
    })
    .unwrap();
    let spring = system.force::<TwoPointSpring>(index).unwrap();
    let mut state = system.default_state().unwrap();

    let err = system.realize(&mut state, Stage::Configured).unwrap_err();
    assert!(err.is_value_error());
    assert_eq!(state.stage(), Stage::Modeled);
    assert_eq!(spring.natural_length(state.state()).unwrap(), -2.0);

    // Retrying without a fix fails the same way
    assert_eq!(system.realize(&mut state, Stage::Configured).unwrap_err(), err);
}

/// Test: a rejected parameter written to a fully realized snapshot is
/// caught on the way back up; no stage above Modeled can be reached
/// without every element's Parametrized hook.
#[test]
fn parameter_write_reruns_every_hook() {
    let matter = point_masses("bodies", &[Point3::origin(), Point3::new(2.0, 0.0, 0.0)], 0);
    let (system, index) = build_system(matter, |system| {
        system.add_force(TwoPointSpring::from_config(
            &SpringConfig::between(BodyId::new(0), BodyId::new(1)).with_stiffness(100.0),
        ))
    })
    .unwrap();
    let spring = system.force::<TwoPointSpring>(index).unwrap();
    let mut state = realized(&system, Stage::Reaction).unwrap();

    spring.set_stiffness(state.variables_mut(), -100.0).unwrap();
    assert_eq!(state.stage(), Stage::Modeled);

    for target in [Stage::Parametrized, Stage::Dynamics, Stage::Reaction] {
        let err = system.realize(&mut state, target).unwrap_err();
        assert!(err.is_value_error());
        assert_eq!(state.stage(), Stage::Modeled);
        assert!(state.potential_energy().unwrap_err().is_stage_violation());
    }

    spring.set_stiffness(state.variables_mut(), 100.0).unwrap();
    system.realize(&mut state, Stage::Dynamics).unwrap();
    assert!(state.potential_energy().unwrap() > 0.0);
}
