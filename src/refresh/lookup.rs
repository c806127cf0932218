// Sub-key access into mapping-like snapshots.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Snapshots that can be indexed by a sub-key.
pub trait Lookup<Q: ?Sized> {
    type Output;

    fn lookup(&self, key: &Q) -> Option<Self::Output>;
}

impl<K, V, Q, S> Lookup<Q> for HashMap<K, V, S>
where
    K: Borrow<Q> + Eq + Hash,
    Q: Eq + Hash + ?Sized,
    V: Clone,
    S: BuildHasher,
{
    type Output = V;

    fn lookup(&self, key: &Q) -> Option<V> {
        self.get(key).cloned()
    }
}

impl<K, V, Q> Lookup<Q> for BTreeMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
    V: Clone,
{
    type Output = V;

    fn lookup(&self, key: &Q) -> Option<V> {
        self.get(key).cloned()
    }
}

impl Lookup<str> for serde_json::Value {
    type Output = serde_json::Value;

    fn lookup(&self, key: &str) -> Option<serde_json::Value> {
        self.get(key).cloned()
    }
}

impl Lookup<usize> for serde_json::Value {
    type Output = serde_json::Value;

    fn lookup(&self, index: &usize) -> Option<serde_json::Value> {
        self.get(*index).cloned()
    }
}
