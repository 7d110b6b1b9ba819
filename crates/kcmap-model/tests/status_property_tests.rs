use kcmap_model::caveat::{conjoin, disjoin};
use kcmap_model::{Caveat, Knowledge, Status, Tier};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = Status> {
    prop::sample::select(Status::ALL.to_vec())
}

fn knowledge_strategy() -> impl Strategy<Value = Knowledge> {
    prop::sample::select(vec![
        Knowledge::holds(Tier::Poly),
        Knowledge::holds(Tier::Quasi),
        Knowledge::fails(Tier::Poly),
        Knowledge::fails(Tier::Quasi),
        Knowledge::default(),
    ])
}

fn caveat_strategy() -> impl Strategy<Value = Option<Caveat>> {
    prop::option::of(prop::sample::select(vec!["a", "b", "c"]).prop_map(Caveat::assumption))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn refine_only_moves_toward_more_information(s in status_strategy(), k in knowledge_strategy()) {
        match s.refine(k) {
            Ok(refined) => {
                prop_assert!(refined.is_refinement_of(s));
                if let Some(p) = k.poly {
                    prop_assert_eq!(refined.poly(), Some(p));
                }
                if let Some(q) = k.quasi {
                    prop_assert_eq!(refined.quasi(), Some(q));
                }
            }
            Err(conflict) => {
                prop_assert_eq!(conflict.current, s);
                let opposite = |a: Option<bool>, b: Option<bool>| matches!((a, b), (Some(x), Some(y)) if x != y);
                prop_assert!(opposite(s.poly(), k.poly) || opposite(s.quasi(), k.quasi));
            }
        }
    }

    #[test]
    fn refine_is_idempotent(s in status_strategy(), k in knowledge_strategy()) {
        if let Ok(once) = s.refine(k) {
            prop_assert_eq!(once.refine(k), Ok(once));
        }
    }

    #[test]
    fn poly_guarantee_implies_quasi_guarantee(s in status_strategy()) {
        if s.guarantees(Tier::Poly) {
            prop_assert!(s.guarantees(Tier::Quasi));
        }
        if s.rules_out(Tier::Quasi) {
            prop_assert!(s.rules_out(Tier::Poly));
        }
    }

    #[test]
    fn caveat_merging_is_commutative(a in caveat_strategy(), b in caveat_strategy()) {
        prop_assert_eq!(conjoin(a.clone(), b.clone()), conjoin(b.clone(), a.clone()));
        prop_assert_eq!(disjoin(a.clone(), b.clone()), disjoin(b, a));
    }
}
