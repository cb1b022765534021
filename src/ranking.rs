use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WrappedError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingItem<T> {
    pub item: T,
    pub value: usize,
}

fn ensure_positive(n: usize) -> Result<()> {
    if n == 0 {
        return Err(WrappedError::InvalidArgument(
            "ranking size must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// First `n` items by `key` in the given order. Items whose key is `None`
/// are left out; equal keys keep their input order.
pub fn top_n_by_key<T, K, F>(items: &[T], n: usize, order: SortOrder, key: F) -> Result<Vec<&T>>
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    ensure_positive(n)?;

    let mut keyed: Vec<(K, &T)> = items
        .iter()
        .filter_map(|item| key(item).map(|k| (k, item)))
        .collect();

    // sort_by is stable
    keyed.sort_by(|(a, _), (b, _)| match order {
        SortOrder::Ascending => a.cmp(b),
        SortOrder::Descending => b.cmp(a),
    });

    Ok(keyed.into_iter().take(n).map(|(_, item)| item).collect())
}

/// Occurrence counts, highest first; equal counts ordered by key ascending.
pub fn count_ranking<K, I>(keys: I) -> Vec<RankingItem<K>>
where
    K: Eq + Hash + Ord,
    I: IntoIterator<Item = K>,
{
    let mut counts: HashMap<K, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut ranking: Vec<RankingItem<K>> = counts
        .into_iter()
        .map(|(item, value)| RankingItem { item, value })
        .collect();

    ranking.sort_by(|a, b| match b.value.cmp(&a.value) {
        Ordering::Equal => a.item.cmp(&b.item),
        other => other,
    });

    ranking
}

/// The most frequent key, ties going to the smallest key.
pub fn most_frequent<K, I>(keys: I) -> Option<K>
where
    K: Eq + Hash + Ord,
    I: IntoIterator<Item = K>,
{
    count_ranking(keys).into_iter().next().map(|entry| entry.item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_rejected() {
        let values = [1, 2, 3];
        let err = top_n_by_key(&values, 0, SortOrder::Ascending, |v| Some(*v)).unwrap_err();
        assert!(matches!(err, WrappedError::InvalidArgument(_)));
    }

    #[test]
    fn test_top_n_skips_undefined_keys() {
        let values = [Some(5), None, Some(1), Some(3)];
        let top = top_n_by_key(&values, 3, SortOrder::Ascending, |v| *v).unwrap();
        assert_eq!(top, vec![&Some(1), &Some(3), &Some(5)]);
    }

    #[test]
    fn test_top_n_is_stable() {
        let values = [("a", 2), ("b", 1), ("c", 2), ("d", 2)];
        let top = top_n_by_key(&values, 3, SortOrder::Descending, |(_, v)| Some(*v)).unwrap();
        let names: Vec<&str> = top.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_top_n_without_padding() {
        let values = [4, 2];
        let top = top_n_by_key(&values, 3, SortOrder::Descending, |v| Some(*v)).unwrap();
        assert_eq!(top, vec![&4, &2]);
    }

    #[test]
    fn test_count_ranking_breaks_ties_lexically() {
        let ranking = count_ranking(vec!["zeta", "alpha", "zeta", "beta", "alpha", "gamma"]);
        let flat: Vec<(&str, usize)> = ranking.iter().map(|r| (r.item, r.value)).collect();
        assert_eq!(
            flat,
            vec![("alpha", 2), ("zeta", 2), ("beta", 1), ("gamma", 1)]
        );
    }

    #[test]
    fn test_most_frequent() {
        assert_eq!(most_frequent(Vec::<String>::new()), None);
        assert_eq!(most_frequent(vec!["bob", "alice", "bob"]), Some("bob"));
        assert_eq!(most_frequent(vec!["bob", "alice"]), Some("alice"));
    }
}
