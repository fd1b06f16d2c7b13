use std::collections::BTreeMap;
use std::fmt;

use crate::error::ModelError;

/// A map keyed by unordered pairs of distinct entities.
///
/// Every pair is stored once under its ordered `(smaller, larger)` form, so
/// `(a, b)` and `(b, a)` always address the same slot. Iteration yields the
/// canonical endpoint order and is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct PairMap<K, V> {
    entries: BTreeMap<(K, K), V>,
}

impl<K, V> Default for PairMap<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

fn canonical<K: Ord>(a: K, b: K) -> (K, K) {
    if a <= b { (a, b) } else { (b, a) }
}

impl<K: Ord + Clone + fmt::Display, V> PairMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(a, b, value)` triples. Later triples overwrite
    /// earlier ones for the same pair.
    pub fn from_triples<I>(triples: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (K, K, V)>,
    {
        let mut map = Self::new();
        for (a, b, value) in triples {
            map.insert(a, b, value)?;
        }
        Ok(map)
    }

    /// Store `value` for the pair `{a, b}`, returning the previous value
    pub fn insert(&mut self, a: K, b: K, value: V) -> Result<Option<V>, ModelError> {
        if a == b {
            return Err(ModelError::SelfPair(a.to_string()));
        }
        Ok(self.entries.insert(canonical(a, b), value))
    }

    /// Value stored for `{a, b}`. A pair that was never inserted is an
    /// error, distinct from any stored value.
    pub fn get(&self, a: &K, b: &K) -> Result<&V, ModelError> {
        self.try_get(a, b)
            .ok_or_else(|| ModelError::MissingPair(a.to_string(), b.to_string()))
    }

    pub fn try_get(&self, a: &K, b: &K) -> Option<&V> {
        self.entries.get(&canonical(a.clone(), b.clone()))
    }

    pub fn contains(&self, a: &K, b: &K) -> bool {
        self.try_get(a, b).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every stored pair exactly once, as `(smaller, larger, value)`
    pub fn iter(&self) -> impl Iterator<Item = (&K, &K, &V)> {
        self.entries.iter().map(|((a, b), v)| (a, b, v))
    }

    /// Same pairs with each value mapped through `f`
    pub fn map_values<U>(&self, mut f: impl FnMut(&V) -> U) -> PairMap<K, U> {
        PairMap {
            entries: self
                .entries
                .iter()
                .map(|(key, v)| (key.clone(), f(v)))
                .collect(),
        }
    }
}

#[cfg(feature = "serde")]
impl<K: serde::Serialize, V: serde::Serialize> serde::Serialize for PairMap<K, V> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter().map(|((a, b), v)| (a, b, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_symmetric() {
        let mut map = PairMap::new();
        map.insert("Vito", "Tony", 1).unwrap();

        assert_eq!(map.get(&"Tony", &"Vito"), Ok(&1));
        assert_eq!(map.get(&"Vito", &"Tony"), Ok(&1));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_insert_overwrites_either_order() {
        let mut map = PairMap::new();
        assert_eq!(map.insert("Tony", "Paulie", 2).unwrap(), None);
        assert_eq!(map.insert("Paulie", "Tony", 5).unwrap(), Some(2));

        assert_eq!(map.get(&"Tony", &"Paulie"), Ok(&5));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_missing_pair_is_not_zero() {
        let mut map = PairMap::new();
        map.insert("Vito", "Furio", 0).unwrap();

        assert_eq!(map.get(&"Furio", &"Vito"), Ok(&0));
        assert_eq!(
            map.get(&"Tony", &"Furio"),
            Err(ModelError::MissingPair("Tony".to_string(), "Furio".to_string()))
        );
        assert!(!map.contains(&"Tony", &"Furio"));
    }

    #[test]
    fn test_self_pair_rejected() {
        let mut map: PairMap<&str, i32> = PairMap::new();
        assert_eq!(map.insert("Tony", "Tony", 1), Err(ModelError::SelfPair("Tony".to_string())));
        assert!(map.is_empty());
    }

    #[test]
    fn test_iter_yields_each_pair_once_in_canonical_order() {
        let map = PairMap::from_triples([("c", "a", 1), ("b", "a", 2), ("a", "c", 3)]).unwrap();
        let pairs: Vec<_> = map.iter().map(|(a, b, v)| (*a, *b, *v)).collect();

        assert_eq!(pairs, vec![("a", "b", 2), ("a", "c", 3)]);
        let again: Vec<_> = map.iter().map(|(a, b, v)| (*a, *b, *v)).collect();
        assert_eq!(pairs, again);
    }

    #[test]
    fn test_map_values_keeps_keys() {
        let map = PairMap::from_triples([(2, 1, 10), (3, 1, -4)]).unwrap();
        let signs = map.map_values(|w| *w > 0);

        assert_eq!(signs.get(&1, &2), Ok(&true));
        assert_eq!(signs.get(&3, &1), Ok(&false));
    }
}
