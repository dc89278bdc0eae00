//! Default field selection from column-name hints.

use crate::error::{ExploreError, Result};

/// Result of matching candidate column names against a hint list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPick {
    /// Index into the candidates of the selected column.
    pub index: usize,
    /// Every candidate that is also a hint, in hint-list order.
    pub matched: Vec<String>,
}

/// Pick a default column among `candidates`.
///
/// The first hint (in hint order) present in `candidates` wins. With no match the
/// `fallback_index` is used, clamped to the candidate range. Fails only when `candidates`
/// is empty.
pub fn pick<C, H>(candidates: &[C], hints: &[H], fallback_index: usize) -> Result<FieldPick>
where
    C: AsRef<str>,
    H: AsRef<str>,
{
    if candidates.is_empty() {
        return Err(ExploreError::EmptyCandidates);
    }

    let position = |name: &str| candidates.iter().position(|c| c.as_ref() == name);

    let mut matched: Vec<String> = Vec::new();
    let mut index = None;
    for hint in hints {
        let hint = hint.as_ref();
        if matched.iter().any(|m| m == hint) {
            continue;
        }
        if let Some(pos) = position(hint) {
            matched.push(hint.to_string());
            if index.is_none() {
                index = Some(pos);
            }
        }
    }

    let index = index.unwrap_or_else(|| fallback_index.min(candidates.len() - 1));
    Ok(FieldPick { index, matched })
}

/// Like [`pick`] but returns the selected name; `None` when there are no candidates.
pub fn pick_name<C, H>(candidates: &[C], hints: &[H], fallback_index: usize) -> Option<String>
where
    C: AsRef<str>,
    H: AsRef<str>,
{
    pick(candidates, hints, fallback_index)
        .ok()
        .map(|p| candidates[p.index].as_ref().to_string())
}

/// Candidates whose name contains any of `needles`, in candidate order.
pub fn names_containing<C, N>(candidates: &[C], needles: &[N]) -> Vec<String>
where
    C: AsRef<str>,
    N: AsRef<str>,
{
    candidates
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| needles.iter().any(|n| c.contains(n.as_ref())))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pick_first_hint_wins() {
        let candidates = ["value", "y", "x"];
        let p = pick(&candidates, &["x", "y"], 0).unwrap();
        assert_eq!(p.index, 2);
        assert_eq!(p.matched, vec!["x", "y"]);
    }

    #[test]
    fn test_pick_fallback_is_clamped() {
        let candidates = ["a", "b"];
        let p = pick(&candidates, &["zzz"], 5).unwrap();
        assert_eq!(p.index, 1);
        assert!(p.matched.is_empty());

        let p = pick(&candidates, &[] as &[&str], 1).unwrap();
        assert_eq!(p.index, 1);
    }

    #[test]
    fn test_pick_empty_candidates_fails() {
        let candidates: [&str; 0] = [];
        assert!(matches!(
            pick(&candidates, &["x"], 0),
            Err(ExploreError::EmptyCandidates)
        ));
        assert_eq!(pick_name(&candidates, &["x"], 0), None);
    }

    #[test]
    fn test_pick_duplicate_hints_listed_once() {
        let candidates = ["gene_name", "treatment"];
        let p = pick(&candidates, &["treatment", "gene_name", "treatment"], 0).unwrap();
        assert_eq!(p.index, 1);
        assert_eq!(p.matched, vec!["treatment", "gene_name"]);
    }

    #[test]
    fn test_pick_name() {
        let candidates = vec!["mpg".to_string(), "hp".to_string()];
        assert_eq!(pick_name(&candidates, &["hp"], 0).as_deref(), Some("hp"));
        assert_eq!(pick_name(&candidates, &["x"], 1).as_deref(), Some("hp"));
    }

    #[test]
    fn test_names_containing() {
        let candidates = ["gene_name_short", "sample", "target_name", "name"];
        let found = names_containing(&candidates, &["gene_name", "target_name", "name"]);
        assert_eq!(found, vec!["gene_name_short", "target_name", "name"]);
    }

    proptest! {
        #[test]
        fn prop_pick_index_is_valid(
            candidates in proptest::collection::vec("[a-d]{1,2}", 1..8),
            hints in proptest::collection::vec("[a-d]{1,2}", 0..5),
            fallback in 0usize..20,
        ) {
            let p = pick(&candidates, &hints, fallback).unwrap();
            prop_assert!(p.index < candidates.len());
            let overlap = candidates.iter().any(|c| hints.contains(c));
            if !overlap {
                prop_assert_eq!(p.index, fallback.min(candidates.len() - 1));
                prop_assert!(p.matched.is_empty());
            } else {
                prop_assert!(hints.contains(&candidates[p.index]));
            }
        }
    }
}
