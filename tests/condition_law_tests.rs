use morphc::condition::Condition;
use proptest::prelude::*;

fn literal() -> impl Strategy<Value = i32> {
    prop_oneof![1..6i32, -5..0i32]
}

/// A disjunction of conjunctions; no terms means `true`.
fn condition() -> impl Strategy<Value = Condition> {
    prop::collection::vec(prop::collection::vec(literal(), 1..4), 0..4).prop_map(|terms| {
        terms
            .iter()
            .map(|term| {
                term.iter()
                    .fold(Condition::truth(), |acc, l| acc.and(&Condition::var(*l)))
            })
            .reduce(|acc, term| acc.or(&term))
            .unwrap_or_else(Condition::truth)
    })
}

proptest! {
    #[test]
    fn prop_implication_is_reflexive(a in condition()) {
        prop_assert!(a.does_imply(&a));
    }

    #[test]
    fn prop_everything_implies_truth(a in condition()) {
        prop_assert!(a.does_imply(&Condition::truth()));
    }

    #[test]
    fn prop_truth_is_identity_of_and(a in condition()) {
        prop_assert_eq!(Condition::truth().and(&a), a.clone());
        prop_assert_eq!(a.and(&Condition::truth()), a);
    }

    #[test]
    fn prop_conjunction_implies_both_sides(a in condition(), b in condition()) {
        let both = a.and(&b);
        prop_assert!(both.does_imply(&a));
        prop_assert!(both.does_imply(&b));
    }

    #[test]
    fn prop_each_side_implies_disjunction(a in condition(), b in condition()) {
        let either = a.or(&b);
        prop_assert!(a.does_imply(&either));
        prop_assert!(b.does_imply(&either));
    }

    #[test]
    fn prop_and_commutes_up_to_implication(a in condition(), b in condition()) {
        let ab = a.and(&b);
        let ba = b.and(&a);
        prop_assert!(ab.does_imply(&ba));
        prop_assert!(ba.does_imply(&ab));
    }

    #[test]
    fn prop_or_commutes_up_to_implication(a in condition(), b in condition()) {
        let ab = a.or(&b);
        let ba = b.or(&a);
        prop_assert!(ab.does_imply(&ba));
        prop_assert!(ba.does_imply(&ab));
    }

    #[test]
    fn prop_truth_implies_only_truth(x in condition()) {
        prop_assume!(!x.is_true());
        prop_assert!(!Condition::truth().does_imply(&x));
    }

    #[test]
    fn prop_or_with_truth_collapses(a in condition()) {
        prop_assert!(a.or(&Condition::truth()).is_true());
    }
}
