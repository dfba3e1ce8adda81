//! One weight table (pairwise or factor keys)

use super::atomic_weight::AtomicWeight;
use dashmap::DashMap;
use std::hash::Hash;

/// Concurrent key → weight map.
///
/// Each key maps to exactly one [`AtomicWeight`] cell. Reads of missing keys
/// return zero without inserting.
#[derive(Debug)]
pub struct WeightTable<K: Eq + Hash> {
    cells: DashMap<K, AtomicWeight>,
}

impl<K: Eq + Hash + Clone> WeightTable<K> {
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }

    /// Weight for `key` (zero if absent)
    pub fn get(&self, key: &K) -> f64 {
        self.cells.get(key).map(|cell| cell.load()).unwrap_or(0.0)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.cells.contains_key(key)
    }

    /// Hogwild-safe additive update; creates the key on first write
    pub fn add_delta(&self, key: &K, delta: f64) {
        if let Some(cell) = self.cells.get(key) {
            cell.fetch_add(delta);
            return;
        }
        self.cells
            .entry(key.clone())
            .or_insert_with(AtomicWeight::default)
            .fetch_add(delta);
    }

    /// Overwrite the weight for `key`
    pub fn set(&self, key: &K, value: f64) {
        if let Some(cell) = self.cells.get(key) {
            cell.store(value);
            return;
        }
        self.cells
            .entry(key.clone())
            .or_insert_with(AtomicWeight::default)
            .store(value);
    }

    /// Create `key` with zero weight if missing
    pub fn ensure(&self, key: &K) {
        if !self.cells.contains_key(key) {
            self.cells.entry(key.clone()).or_insert_with(AtomicWeight::default);
        }
    }

    /// Single-writer update through `&mut self`
    pub fn update_exclusive(&mut self, key: &K, delta: f64) {
        if let Some(mut cell) = self.cells.get_mut(key) {
            cell.add_exclusive(delta);
            return;
        }
        self.cells.insert(key.clone(), AtomicWeight::new(delta));
    }

    /// Set every existing key to `value`
    pub fn fill(&mut self, value: f64) {
        for mut cell in self.cells.iter_mut() {
            *cell.value_mut() = AtomicWeight::new(value);
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Visit every (key, weight) pair
    pub fn for_each(&self, mut f: impl FnMut(&K, f64)) {
        for entry in self.cells.iter() {
            f(entry.key(), entry.value().load());
        }
    }

    /// Copy of all entries (unordered)
    pub fn entries(&self) -> Vec<(K, f64)> {
        let mut out = Vec::with_capacity(self.cells.len());
        self.for_each(|key, weight| out.push((key.clone(), weight)));
        out
    }
}

impl<K: Eq + Hash + Clone> Default for WeightTable<K> {
    fn default() -> Self {
        Self::new()
    }
}
