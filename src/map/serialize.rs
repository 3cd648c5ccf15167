//! `serde` support: a map serializes as `{key: value}` in key order.
//!
//! Views serialize their visible entries with complete keys. Deserializing
//! always produces a fresh root map.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::SearchableMap;

impl<T: Serialize> Serialize for SearchableMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tree = self.tree.borrow();
        serializer.collect_map(tree.iter_prefix(&self.prefix))
    }
}

// Upper bound on nodes preallocated from an untrusted size hint.
const MAX_PREALLOCATED_NODES: usize = 4096;

struct MapVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for MapVisitor<T> {
    type Value = SearchableMap<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map with string keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let nodes = access.size_hint().unwrap_or(0).saturating_mul(2);
        let mut map = SearchableMap::with_capacity(nodes.min(MAX_PREALLOCATED_NODES));
        while let Some((key, value)) = access.next_entry::<String, T>()? {
            map.set(&key, value);
        }
        Ok(map)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for SearchableMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MapVisitor(PhantomData))
    }
}
