//! Compute-once memoization tables keyed by quantized radius.

use crate::error::{Result, TerrainError};
use ahash::AHashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// A dilation radius rounded to a fixed bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RadiusKey(pub i64);

impl RadiusKey {
    /// Buckets `radius` into multiples of `quantum`.
    ///
    /// Fails for negative or non-finite radii.
    pub fn quantize(radius: f64, quantum: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(TerrainError::InvalidRadius(radius));
        }
        Ok(Self((radius / quantum).round() as i64))
    }

    /// The radius every caller in this bucket computes with.
    #[inline]
    pub fn radius(self, quantum: f64) -> f64 {
        self.0 as f64 * quantum
    }
}

/// A point rounded onto the same grid as [`RadiusKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointKey(pub i64, pub i64);

impl PointKey {
    pub fn quantize(x: f64, y: f64, quantum: f64) -> Self {
        Self((x / quantum).round() as i64, (y / quantum).round() as i64)
    }

    /// The grid point every caller in this bucket computes with.
    #[inline]
    pub fn point(self, quantum: f64) -> (f64, f64) {
        (self.0 as f64 * quantum, self.1 as f64 * quantum)
    }
}

type Slot<T> = Arc<OnceLock<Result<Arc<T>>>>;

/// Append-only table where each key is computed at most once.
///
/// The key map lock is held only long enough to fetch the key's slot;
/// callers racing on the same key then block on the slot while one of them
/// computes. Failures are stored like successes and replayed.
pub struct KeyedCache<K, T> {
    slots: Mutex<AHashMap<K, Slot<T>>>,
}

impl<K, T> Default for KeyedCache<K, T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(AHashMap::new()),
        }
    }
}

impl<K: Copy + Eq + Hash, T> KeyedCache<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, running `compute` if this is the
    /// first request for it.
    pub fn get_or_compute(&self, key: K, compute: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };
        slot.get_or_init(|| compute().map(Arc::new)).clone()
    }

    /// True when `key` has a finished entry.
    pub fn contains(&self, key: &K) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).is_some_and(|slot| slot.get().is_some())
    }

    /// Number of finished entries.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, T> fmt::Debug for KeyedCache<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("KeyedCache")
            .field("entries", &slots.len())
            .finish()
    }
}
