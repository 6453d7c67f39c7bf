//! Property-based tests for the In Situ production core.
//!
//! Uses proptest to generate random catalogs and action sequences, then
//! verify the ledger and builder invariants hold.

use insitu_core::catalog::{Catalog, CatalogBuilder, ResourceAmount};
use insitu_core::id::*;
use insitu_core::production::craft_ratio;
use insitu_core::session::Session;
use insitu_core::test_utils::*;
use proptest::prelude::*;
use std::sync::Arc;

// ===========================================================================
// Generators
// ===========================================================================

/// A catalog with three resources and four machine types, each with one
/// recipe over random input/output rates.
fn arb_catalog() -> impl Strategy<Value = Catalog> {
    (
        proptest::collection::vec(0.0..200.0f64, 3),
        proptest::collection::vec((0..3usize, 0.0..30.0f64, 0..3usize, 0.0..30.0f64), 4),
        proptest::collection::vec(0..3u32, 4),
    )
        .prop_map(|(starting, recipes, counts)| {
            let mut b = CatalogBuilder::new();
            let resources: Vec<ResourceId> = starting
                .iter()
                .enumerate()
                .map(|(i, &amount)| b.register_resource(&format!("r{i}"), &format!("R{i}"), "u", amount))
                .collect();

            for (i, (&(input, in_rate, output, out_rate), &count)) in
                recipes.iter().zip(&counts).enumerate()
            {
                let cost = vec![ResourceAmount::new(resources[i % 3], 5.0 * i as f64)];
                let machine = b.register_machine(&format!("m{i}"), &format!("M{i}"), cost, count);
                b.register_recipe(
                    &format!("p{i}"),
                    vec![machine],
                    vec![ResourceAmount::new(resources[input], in_rate)],
                    vec![ResourceAmount::new(resources[output], out_rate)],
                );
            }
            b.build().expect("generated catalog is valid")
        })
}

/// Player and clock actions.
#[derive(Debug, Clone)]
enum Op {
    Tick(f64),
    Toggle(u32),
    Build(u32),
    Harvest(u32, f64),
    SetRecipe(u32, usize),
}

fn arb_ops(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![
            (-1.0..5.0f64).prop_map(Op::Tick),
            (0..12u32).prop_map(Op::Toggle),
            (0..5u32).prop_map(Op::Build),
            (0..4u32, -50.0..50.0f64).prop_map(|(r, a)| Op::Harvest(r, a)),
            (0..12u32, 0..2usize).prop_map(|(m, i)| Op::SetRecipe(m, i)),
        ],
        1..=max_ops,
    )
}

fn apply(session: &mut Session, op: &Op) {
    match *op {
        Op::Tick(dt) => {
            session.tick(dt);
        }
        Op::Toggle(m) => {
            session.toggle_active(MachineId(m));
        }
        Op::Build(t) => {
            let _ = session.build(MachineTypeId(t));
        }
        Op::Harvest(r, amount) => {
            session.harvest(ResourceId(r), amount);
        }
        Op::SetRecipe(m, i) => {
            session.set_recipe_index(MachineId(m), i);
        }
    }
}

fn all_non_negative(session: &Session) -> bool {
    session.ledger().iter().all(|(_, amount)| amount >= 0.0)
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Stock never goes negative, whatever the action sequence.
    #[test]
    fn stock_stays_non_negative(catalog in arb_catalog(), ops in arb_ops(60)) {
        let mut session = Session::new(Arc::new(catalog));
        activate_all(&mut session);
        for op in &ops {
            apply(&mut session, op);
            prop_assert!(all_non_negative(&session));
        }
    }

    /// Craft ratios always land in [0, 1].
    #[test]
    fn craft_ratio_is_bounded(catalog in arb_catalog(), elapsed in 0.0..10.0f64) {
        let session = Session::new(Arc::new(catalog));
        for (id, _) in session.catalog().recipes() {
            let ratio = craft_ratio(session.catalog(), session.ledger(), id, elapsed);
            prop_assert!((0.0..=1.0).contains(&ratio));
        }
    }

    /// A zero-length tick never changes the ledger or the counters.
    #[test]
    fn zero_tick_is_noop(catalog in arb_catalog()) {
        let mut session = Session::new(Arc::new(catalog));
        activate_all(&mut session);
        let ledger = session.ledger().clone();
        let hash = session.state_hash();
        session.tick(0.0);
        prop_assert_eq!(session.ledger(), &ledger);
        prop_assert_eq!(session.state_hash(), hash);
    }

    /// A failed build leaves the ledger and machine list untouched.
    #[test]
    fn failed_build_has_no_effect(catalog in arb_catalog(), machine in 0..5u32) {
        let mut session = Session::new(Arc::new(catalog));
        let ledger = session.ledger().clone();
        let count = session.machines().len();
        if session.build(MachineTypeId(machine)).is_err() {
            prop_assert_eq!(session.ledger(), &ledger);
            prop_assert_eq!(session.machines().len(), count);
        } else {
            prop_assert_eq!(session.machines().len(), count + 1);
        }
    }

    /// With ample stock, one long tick moves the same amounts as the same
    /// span split into two shorter ticks.
    #[test]
    fn unconstrained_ticks_split_evenly(rate_per_sec in 0.1..50.0f64, dt in 0.01..2.0f64) {
        let mut whole = session_from(converter_catalog(1e6, rate_per_sec, 1));
        let mut split = session_from(converter_catalog(1e6, rate_per_sec, 1));
        activate_all(&mut whole);
        activate_all(&mut split);

        whole.tick(dt);
        split.tick(dt / 2.0);
        split.tick(dt / 2.0);

        let cat = whole.catalog_handle();
        for key in ["x", "y"] {
            let r = resource(&cat, key);
            prop_assert!((whole.stock(r) - split.stock(r)).abs() < 1e-6);
        }
    }

    /// Replaying the same action sequence reproduces the same state hash.
    #[test]
    fn replay_is_deterministic(ops in arb_ops(40)) {
        let run = |ops: &[Op]| {
            let mut session = sample_session();
            activate_all(&mut session);
            for op in ops {
                apply(&mut session, op);
            }
            session.state_hash()
        };
        prop_assert_eq!(run(&ops), run(&ops));
    }
}
