//! Lock-free f64 cell

use std::sync::atomic::{AtomicU64, Ordering};

/// `f64` stored as raw bits in an `AtomicU64`.
///
/// Additions use a compare-and-swap loop: concurrent `fetch_add` calls may
/// interleave in any order but every delta ends up in the value.
#[derive(Debug)]
pub struct AtomicWeight {
    bits: AtomicU64,
}

impl AtomicWeight {
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    /// Current value
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Overwrite the value
    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Atomically add `delta`, returning the previous value
    pub fn fetch_add(&self, delta: f64) -> f64 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    /// Plain add through exclusive access (no CAS)
    pub fn add_exclusive(&mut self, delta: f64) {
        let bits = self.bits.get_mut();
        *bits = (f64::from_bits(*bits) + delta).to_bits();
    }
}

impl Default for AtomicWeight {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clone for AtomicWeight {
    fn clone(&self) -> Self {
        Self::new(self.load())
    }
}
