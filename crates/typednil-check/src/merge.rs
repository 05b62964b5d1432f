//! Reconciling the effects of sibling branches.
//!
//! A name is nil after the construct if *some* branch may leave it nil.
//! It is only known non-nil if the construct is exhaustive and every branch
//! leaves it non-nil. Names that not every branch of an exhaustive
//! construct wrote keep the fact they had before the construct.

use std::collections::BTreeSet;

use crate::lattice::Fact;
use crate::scope::Effect;

/// Merge branch effects into the effect of the whole construct.
pub fn merge_branches(branches: &[Effect], exhaustive: bool) -> Effect {
    let names: BTreeSet<&str> = branches.iter().flat_map(Effect::names).collect();
    let mut merged = Effect::default();

    for name in names {
        let facts: Vec<Option<Fact>> = branches.iter().map(|b| b.get(name)).collect();

        if facts.contains(&Some(Fact::Nil)) {
            merged.insert(name, Fact::Nil);
            continue;
        }
        if !exhaustive || facts.iter().any(Option::is_none) {
            continue;
        }
        if facts.iter().all(|f| *f == Some(Fact::NonNil)) {
            merged.insert(name, Fact::NonNil);
        } else {
            merged.insert(name, Fact::Unknown);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(facts: &[(&str, Fact)]) -> Effect {
        facts.iter().map(|(n, f)| (n.to_string(), *f)).collect()
    }

    #[test]
    fn test_nil_in_any_branch_wins() {
        let merged = merge_branches(
            &[
                effect(&[("a", Fact::NonNil)]),
                effect(&[("a", Fact::Nil)]),
            ],
            true,
        );
        assert_eq!(merged.get("a"), Some(Fact::Nil));
    }

    #[test]
    fn test_nil_wins_even_when_not_exhaustive() {
        let merged = merge_branches(&[effect(&[("a", Fact::Nil)])], false);
        assert_eq!(merged.nilled(), BTreeSet::from(["a"]));
    }

    #[test]
    fn test_exhaustive_all_assigned() {
        let merged = merge_branches(
            &[
                effect(&[("a", Fact::NonNil), ("b", Fact::NonNil)]),
                effect(&[("a", Fact::NonNil)]),
            ],
            true,
        );
        assert_eq!(merged.assigned(), BTreeSet::from(["a"]));
        // `b` was written by one branch only.
        assert_eq!(merged.get("b"), None);
    }

    #[test]
    fn test_non_exhaustive_never_assigns() {
        let merged = merge_branches(
            &[
                effect(&[("a", Fact::NonNil)]),
                effect(&[("a", Fact::NonNil)]),
            ],
            false,
        );
        assert!(merged.is_empty());
    }

    #[test]
    fn test_mixed_known_and_unknown_is_unknown() {
        let merged = merge_branches(
            &[
                effect(&[("a", Fact::NonNil)]),
                effect(&[("a", Fact::Unknown)]),
            ],
            true,
        );
        assert_eq!(merged.get("a"), Some(Fact::Unknown));
        assert!(merged.assigned().is_empty());
    }

    #[test]
    fn test_no_branches() {
        assert!(merge_branches(&[], true).is_empty());
        assert!(merge_branches(&[], false).is_empty());
    }

    #[test]
    fn test_single_mandatory_branch_is_identity() {
        let e = effect(&[
            ("a", Fact::NonNil),
            ("b", Fact::Nil),
            ("c", Fact::Unknown),
        ]);
        assert_eq!(merge_branches(std::slice::from_ref(&e), true), e);
    }
}
