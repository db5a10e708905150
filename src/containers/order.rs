use std::collections::HashMap;
use std::collections::hash_map::Iter as HashMapIter;

use crate::variables::{Key, Values};

/// Where a variable's block lives within the stacked global tangent vector.
#[derive(Debug, Clone, Copy)]
pub struct Idx {
    pub idx: usize,
    pub dim: usize,
}

/// Assigns each variable in a [Values] a contiguous block of the global
/// tangent vector, in iteration order. Rebuilt once per optimizer step.
#[derive(Debug)]
pub struct Order {
    map: HashMap<Key, Idx>,
    dim: usize,
}

impl Order {
    pub fn from_values(values: &Values) -> Self {
        let mut offset = 0;
        let mut map = HashMap::new();
        for (key, value) in values.iter() {
            let d = value.dim();
            map.insert(*key, Idx { idx: offset, dim: d });
            offset += d;
        }
        Self { map, dim: offset }
    }

    pub fn get(&self, key: &Key) -> Option<&Idx> {
        self.map.get(key)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> HashMapIter<'_, Key, Idx> {
        self.map.iter()
    }
}
