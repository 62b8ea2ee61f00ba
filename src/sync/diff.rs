use std::collections::HashSet;
use std::hash::Hash;

/// Membership delta between a persisted list and a requested one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

impl<T> Diff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Set difference of `old` and `new`. Duplicates collapse to one membership;
/// output keeps first-occurrence order of the inputs.
pub fn diff<T>(old: &[T], new: &[T]) -> Diff<T>
where
    T: Eq + Hash + Clone,
{
    let old_set: HashSet<&T> = old.iter().collect();
    let new_set: HashSet<&T> = new.iter().collect();

    Diff {
        added: distinct(new.iter().filter(|id| !old_set.contains(id))),
        removed: distinct(old.iter().filter(|id| !new_set.contains(id))),
    }
}

/// Drop repeated elements, keeping the first occurrence
pub fn distinct<'a, T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_set(items: &[u32]) -> HashSet<u32> {
        items.iter().copied().collect()
    }

    /// added ∩ old = ∅, removed ∩ new = ∅, (old \ removed) ∪ added = new
    fn assert_diff_laws(old: &[u32], new: &[u32]) {
        let d = diff(old, new);
        let (old_s, new_s) = (as_set(old), as_set(new));
        let (added, removed) = (as_set(&d.added), as_set(&d.removed));

        assert!(added.is_disjoint(&old_s), "added overlaps old for {:?} -> {:?}", old, new);
        assert!(removed.is_disjoint(&new_s), "removed overlaps new for {:?} -> {:?}", old, new);

        let rebuilt: HashSet<u32> = old_s.difference(&removed).copied().chain(added).collect();
        assert_eq!(rebuilt, new_s);
    }

    #[test]
    fn diff_laws_hold_for_assorted_inputs() {
        let cases: &[(&[u32], &[u32])] = &[
            (&[], &[]),
            (&[], &[1, 2]),
            (&[1, 2], &[]),
            (&[1, 2, 3], &[2, 3, 4]),
            (&[1, 1, 2], &[2, 2, 3, 3]),
            (&[5, 4, 3], &[3, 4, 5]),
        ];
        for (old, new) in cases {
            assert_diff_laws(old, new);
        }
    }

    #[test]
    fn order_and_duplicates_are_irrelevant() {
        let d = diff(&[3, 1, 2], &[2, 3, 1, 1]);
        assert!(d.is_empty());
    }

    #[test]
    fn duplicates_in_new_are_reported_once() {
        let d = diff(&[1], &[2, 2, 3, 2]);
        assert_eq!(d.added, vec![2, 3]);
        assert_eq!(d.removed, vec![1]);
    }

    #[test]
    fn empty_target_removes_everything() {
        let d = diff(&[7, 8], &[]);
        assert!(d.added.is_empty());
        assert_eq!(d.removed, vec![7, 8]);
    }
}
