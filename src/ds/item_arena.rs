//! Index-addressed item pool with an intrusive free list.
//!
//! Stores fixed-size item records in a contiguous `Vec` and threads unused
//! slots into a singly linked free stack through each slot's `next` field.
//! The same `next` field doubles as the collision-chain link while a slot is
//! in use, so one `u32` per item covers both roles and the pool never
//! allocates per entry.
//!
//! ## Architecture
//!
//! ```text
//!   slots: Vec<ItemSlot<T>>          first_free = 1
//!
//!   index: 0            1            2            3
//!          [in use]     [vacant]     [in use]     [vacant]
//!          next: 2 ─┐   next: 3 ─┐   next: NONE   next: NONE
//!                   │            │
//!            collision chain     free stack (1 → 3 → NONE)
//! ```
//!
//! A slot is "vacant" when its payload equals the `vacant` template supplied
//! at construction (the caller's free sentinel, e.g. an invalid value or a
//! zero weight). [`ItemArena::release`] swaps the template back in, so the
//! free list and the sentinel can never disagree.
//!
//! ## Growth
//!
//! Allocation from an exhausted free list grows the pool: an empty pool grows
//! to `growth_start` slots (the owner's hash-table size), a non-empty pool
//! doubles. Growth reserves fallibly; on failure the pool is untouched and
//! existing indices stay valid either way.
use std::collections::TryReserveError;
use std::mem;

use crate::ds::NONE;

/// One pooled record: caller payload plus the dual-role link.
#[derive(Debug, Clone)]
pub struct ItemSlot<T> {
    /// Caller payload; equals the vacant template while the slot is free.
    pub payload: T,
    /// Next item index: collision chain while in use, free stack while free.
    pub next: u32,
}

/// Growable pool of `ItemSlot<T>` addressed by stable `u32` indices.
#[derive(Debug)]
pub struct ItemArena<T> {
    slots: Vec<ItemSlot<T>>,
    first_free: u32,
    growth_start: u32,
    vacant: T,
}

impl<T: Clone> ItemArena<T> {
    /// Creates a pool with `num_initial_items` vacant slots.
    ///
    /// `growth_start` is the size the pool jumps to on first growth when it
    /// was created empty. `vacant` is the payload template marking a free
    /// slot. Fails only on allocation failure, leaving nothing to clean up.
    pub fn try_new(
        num_initial_items: u32,
        growth_start: u32,
        vacant: T,
    ) -> Result<Self, TryReserveError> {
        let mut arena = Self {
            slots: Vec::new(),
            first_free: NONE,
            growth_start,
            vacant,
        };
        if num_initial_items != 0 {
            arena.append_slots(num_initial_items)?;
        }
        Ok(arena)
    }

    /// Number of slots (in use + free). Indices are `0..capacity()`.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Head of the free stack, or [`NONE`].
    #[inline]
    pub fn first_free(&self) -> u32 {
        self.first_free
    }

    /// Returns the slot at `index`. Panics on out-of-range indices; callers
    /// only hold indices handed out by `allocate`.
    #[inline]
    pub fn slot(&self, index: u32) -> &ItemSlot<T> {
        &self.slots[index as usize]
    }

    /// Mutable access to the slot at `index`.
    #[inline]
    pub fn slot_mut(&mut self, index: u32) -> &mut ItemSlot<T> {
        &mut self.slots[index as usize]
    }

    /// Iterates every slot in index order, vacant or not.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &ItemSlot<T>)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (i as u32, slot))
    }

    /// Takes a free slot off the stack, growing the pool if none remain.
    ///
    /// The returned slot still carries the vacant payload; the caller fills
    /// it in. On allocation failure the pool is unchanged.
    pub fn allocate(&mut self) -> Result<u32, TryReserveError> {
        if self.first_free == NONE {
            let additional = if self.slots.is_empty() {
                self.growth_start
            } else {
                self.slots.len() as u32
            };
            self.append_slots(additional)?;
        }

        let index = self.first_free;
        debug_assert!((index as usize) < self.slots.len());
        self.first_free = self.slots[index as usize].next;
        Ok(index)
    }

    /// Returns a slot to the free stack, swapping the vacant template back
    /// in. The previous payload is handed back so the caller can settle its
    /// callback and accounting obligations.
    pub fn release(&mut self, index: u32) -> T {
        let first_free = self.first_free;
        let slot = &mut self.slots[index as usize];
        let payload = mem::replace(&mut slot.payload, self.vacant.clone());
        slot.next = first_free;
        self.first_free = index;
        payload
    }

    /// Vacates every slot and rebuilds the free stack over the whole pool.
    /// Capacity is retained.
    pub fn reset(&mut self) {
        let count = self.slots.len();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.payload = self.vacant.clone();
            slot.next = if i + 1 < count { (i + 1) as u32 } else { NONE };
        }
        self.first_free = if count == 0 { NONE } else { 0 };
    }

    /// Appends `additional` vacant slots chained onto the free stack, with
    /// the first new slot becoming the stack head.
    fn append_slots(&mut self, additional: u32) -> Result<(), TryReserveError> {
        debug_assert!(additional != 0);
        let old_len = self.slots.len();
        debug_assert!(old_len + additional as usize <= NONE as usize);

        self.slots.try_reserve_exact(additional as usize)?;

        let new_len = old_len + additional as usize;
        for i in old_len..new_len {
            let next = if i + 1 < new_len { (i + 1) as u32 } else { NONE };
            self.slots.push(ItemSlot {
                payload: self.vacant.clone(),
                next,
            });
        }
        self.first_free = old_len as u32;
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self, is_vacant: impl Fn(&T) -> bool) {
        let mut seen = std::collections::HashSet::new();
        let mut iter = self.first_free;
        while iter != NONE {
            assert!((iter as usize) < self.slots.len());
            assert!(seen.insert(iter), "free stack revisits slot {iter}");
            assert!(is_vacant(&self.slots[iter as usize].payload));
            iter = self.slots[iter as usize].next;
        }

        let vacant_count = self
            .slots
            .iter()
            .filter(|slot| is_vacant(&slot.payload))
            .count();
        assert_eq!(vacant_count, seen.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(initial: u32, growth_start: u32) -> ItemArena<u32> {
        ItemArena::try_new(initial, growth_start, 0).unwrap()
    }

    #[test]
    fn initial_slots_form_a_chain() {
        let a = arena(4, 8);
        assert_eq!(a.capacity(), 4);
        assert_eq!(a.first_free(), 0);
        assert_eq!(a.slot(0).next, 1);
        assert_eq!(a.slot(2).next, 3);
        assert_eq!(a.slot(3).next, NONE);
    }

    #[test]
    fn zero_initial_items_starts_empty() {
        let a = arena(0, 8);
        assert_eq!(a.capacity(), 0);
        assert_eq!(a.first_free(), NONE);
    }

    #[test]
    fn single_initial_item_terminates_chain() {
        let a = arena(1, 8);
        assert_eq!(a.capacity(), 1);
        assert_eq!(a.first_free(), 0);
        assert_eq!(a.slot(0).next, NONE);
    }

    #[test]
    fn first_growth_from_empty_uses_growth_start() {
        let mut a = arena(0, 8);
        let idx = a.allocate().unwrap();
        assert_eq!(idx, 0);
        assert_eq!(a.capacity(), 8);
        assert_eq!(a.first_free(), 1);
    }

    #[test]
    fn exhausted_pool_doubles() {
        let mut a = arena(2, 8);
        assert_eq!(a.allocate().unwrap(), 0);
        assert_eq!(a.allocate().unwrap(), 1);
        let idx = a.allocate().unwrap();
        assert_eq!(idx, 2);
        assert_eq!(a.capacity(), 4);
    }

    #[test]
    fn indices_stable_across_growth() {
        let mut a = arena(1, 8);
        let first = a.allocate().unwrap();
        a.slot_mut(first).payload = 42;
        let _second = a.allocate().unwrap();
        assert_eq!(a.slot(first).payload, 42);
    }

    #[test]
    fn release_returns_payload_and_recycles_lifo() {
        let mut a = arena(2, 8);
        let i0 = a.allocate().unwrap();
        let i1 = a.allocate().unwrap();
        a.slot_mut(i0).payload = 10;
        a.slot_mut(i1).payload = 11;

        assert_eq!(a.release(i0), 10);
        assert_eq!(a.slot(i0).payload, 0);
        assert_eq!(a.allocate().unwrap(), i0);
    }

    #[test]
    fn reset_rebuilds_full_free_stack() {
        let mut a = arena(2, 8);
        let _ = a.allocate().unwrap();
        let _ = a.allocate().unwrap();
        let _ = a.allocate().unwrap(); // forces growth to 4
        a.reset();
        assert_eq!(a.first_free(), 0);
        assert_eq!(a.capacity(), 4);
        a.debug_validate_invariants(|v| *v == 0);
    }

    #[test]
    fn invariants_hold_through_churn() {
        let mut a = arena(0, 4);
        let mut live = Vec::new();
        for round in 0u32..30 {
            let idx = a.allocate().unwrap();
            a.slot_mut(idx).payload = round + 1;
            a.slot_mut(idx).next = NONE;
            live.push(idx);
            if round % 3 == 0 {
                let victim = live.swap_remove(live.len() / 2);
                a.release(victim);
            }
            a.debug_validate_invariants(|v| *v == 0);
        }
    }
}
