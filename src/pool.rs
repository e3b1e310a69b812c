//! The process-wide pool of heap-allocated large-form integers.
//!
//! A pool with an explicit free list; the implementation is an arena keyed
//! by generation-tagged handles rather than bit-stolen pointers. An explicit
//! tagged-variant type and a handle the arena can validate catches
//! use-after-free in debug builds instead of trusting raw indices.
//!
//! The pool is process-global, guarded by a `Mutex` behind a `OnceLock`,
//! the same singleton shape used elsewhere in this codebase for other
//! process-wide precomputed tables (e.g. `static SRS: OnceLock<Mutex<SrsG1>>`
//! for a cached setup reference).

use std::sync::{Mutex, OnceLock};

use crate::bigint::BigInt;
use crate::error::PoolError;

/// A handle into the pool. Carries a generation counter so a handle from a
/// freed-then-reused slot is detected rather than silently aliasing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolIndex {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl std::fmt::Debug for PoolIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PoolIndex(slot={}, gen={})", self.slot, self.generation)
    }
}

struct Slot {
    value: Option<BigInt>,
    generation: u32,
}

#[derive(Default)]
struct PoolInner {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
}

impl PoolInner {
    fn alloc(&mut self, value: BigInt) -> Result<PoolIndex, PoolError> {
        if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            slot.value = Some(value);
            Ok(PoolIndex {
                slot: slot_idx,
                generation: slot.generation,
            })
        } else {
            let slot_idx = u32::try_from(self.slots.len()).map_err(|_| {
                tracing::warn!(live = self.slots.len(), "Int pool exhausted");
                PoolError::Exhausted
            })?;
            self.slots.push(Slot {
                value: Some(value),
                generation: 0,
            });
            if slot_idx != 0 && slot_idx.is_power_of_two() {
                tracing::debug!(slots = slot_idx, "Int pool grew");
            }
            Ok(PoolIndex {
                slot: slot_idx,
                generation: 0,
            })
        }
    }

    fn free(&mut self, idx: PoolIndex) -> Result<(), PoolError> {
        let slot = self
            .slots
            .get_mut(idx.slot as usize)
            .ok_or(PoolError::StaleHandle(idx))?;
        if slot.generation != idx.generation || slot.value.is_none() {
            return Err(PoolError::StaleHandle(idx));
        }
        slot.value = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(idx.slot);
        Ok(())
    }

    fn get(&self, idx: PoolIndex) -> Result<&BigInt, PoolError> {
        let slot = self
            .slots
            .get(idx.slot as usize)
            .ok_or(PoolError::StaleHandle(idx))?;
        if slot.generation != idx.generation {
            return Err(PoolError::StaleHandle(idx));
        }
        slot.value.as_ref().ok_or(PoolError::StaleHandle(idx))
    }

    fn set(&mut self, idx: PoolIndex, value: BigInt) -> Result<(), PoolError> {
        let slot = self
            .slots
            .get_mut(idx.slot as usize)
            .ok_or(PoolError::StaleHandle(idx))?;
        if slot.generation != idx.generation || slot.value.is_none() {
            return Err(PoolError::StaleHandle(idx));
        }
        slot.value = Some(value);
        Ok(())
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
    }
}

fn pool() -> &'static Mutex<PoolInner> {
    static POOL: OnceLock<Mutex<PoolInner>> = OnceLock::new();
    POOL.get_or_init(|| Mutex::new(PoolInner::default()))
}

/// Reserve a new pool entry holding `value`. Panics only on pool exhaustion
/// (more than `u32::MAX` simultaneously live large-form integers), which is
/// an environment failure, not an input-dependent one.
pub(crate) fn promote(value: BigInt) -> PoolIndex {
    pool()
        .lock()
        .unwrap()
        .alloc(value)
        .expect("Int pool exhausted")
}

/// Release a pool entry. The handle must not be used afterward.
pub(crate) fn free(idx: PoolIndex) {
    let _ = pool().lock().unwrap().free(idx);
}

/// Read the current value of a pool entry.
pub(crate) fn with<R>(idx: PoolIndex, f: impl FnOnce(&BigInt) -> R) -> R {
    let guard = pool().lock().unwrap();
    let v = guard.get(idx).expect("stale Int pool handle");
    f(v)
}

/// Overwrite a pool entry's value in place.
pub(crate) fn set(idx: PoolIndex, value: BigInt) {
    pool()
        .lock()
        .unwrap()
        .set(idx, value)
        .expect("stale Int pool handle");
}

/// Release every pool entry and reset the free list. Re-initialization
/// afterward is supported: the pool simply starts empty again on the next
/// `promote`.
pub fn cleanup() {
    pool().lock().unwrap().clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_reuses_freed_slots() {
        cleanup();
        let a = promote(BigInt::from_i64(10));
        let b = promote(BigInt::from_i64(20));
        free(a);
        let c = promote(BigInt::from_i64(30));
        assert_eq!(a.slot, c.slot);
        assert_ne!(a.generation, c.generation);
        assert_eq!(with(b, |v| v.to_i64()), Some(20));
        assert_eq!(with(c, |v| v.to_i64()), Some(30));
        cleanup();
    }

    #[test]
    #[should_panic(expected = "stale Int pool handle")]
    fn stale_handle_panics() {
        cleanup();
        let a = promote(BigInt::from_i64(1));
        free(a);
        let _ = with(a, |v| v.to_i64());
    }
}
