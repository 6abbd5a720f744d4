//! Reusable venue items and the bounded free-list that holds them.
//!
//! `ResourcePool` itself never blocks. Each station embeds one inside its own
//! monitor and decides how callers wait for it.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::ids::{AlleyId, CashierId, ShoePairId};

/// An interchangeable item created once at startup and recycled forever.
pub trait Resource: Send + 'static {
    type Id: Copy + Eq + fmt::Display + fmt::Debug;

    /// Human-readable kind, used in logs and contract-violation panics.
    const KIND: &'static str;

    fn from_index(index: usize) -> Self;

    fn id(&self) -> Self::Id;
}

/// A lane bound to one cohort for the duration of a game.
///
/// Copyable because every member of the owning cohort plays on it; the
/// arbiter guarantees only one cohort holds a given alley at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Alley {
    id: AlleyId,
}

impl Resource for Alley {
    type Id = AlleyId;
    const KIND: &'static str = "alley";

    fn from_index(index: usize) -> Self {
        Self {
            id: AlleyId::new(index),
        }
    }

    fn id(&self) -> AlleyId {
        self.id
    }
}

/// A pair of bowling shoes. Deliberately neither `Clone` nor `Copy`: whoever
/// owns the value is the only holder.
#[derive(Debug, PartialEq, Eq)]
pub struct ShoePair {
    id: ShoePairId,
}

impl Resource for ShoePair {
    type Id = ShoePairId;
    const KIND: &'static str = "shoe pair";

    fn from_index(index: usize) -> Self {
        Self {
            id: ShoePairId::new(index),
        }
    }

    fn id(&self) -> ShoePairId {
        self.id
    }
}

/// A register position at the desk.
#[derive(Debug, PartialEq, Eq)]
pub struct Cashier {
    id: CashierId,
}

impl Resource for Cashier {
    type Id = CashierId;
    const KIND: &'static str = "cashier";

    fn from_index(index: usize) -> Self {
        Self {
            id: CashierId::new(index),
        }
    }

    fn id(&self) -> CashierId {
        self.id
    }
}

/// Free/total counts for one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub available: usize,
    pub total: usize,
}

impl PoolSnapshot {
    pub fn issued(&self) -> usize {
        self.total - self.available
    }

    pub fn is_idle(&self) -> bool {
        self.available == self.total
    }
}

/// Bounded free-list of reusable items.
///
/// `issued() + available() == capacity()` at all times: an item is either in
/// the free-list or owned by exactly one caller.
pub struct ResourcePool<R: Resource> {
    free: VecDeque<R>,
    capacity: usize,
}

impl<R: Resource> ResourcePool<R> {
    /// Create `count` fresh items with ids `0..count`.
    pub fn stocked(count: usize) -> Self {
        Self {
            free: (0..count).map(R::from_index).collect(),
            capacity: count,
        }
    }

    /// Hand out the longest-idle item.
    ///
    /// Callers must have checked availability under the same lock; an empty
    /// pool here is a broken monitor, not a runtime condition.
    pub fn take(&mut self) -> R {
        match self.free.pop_front() {
            Some(item) => {
                tracing::trace!(
                    kind = R::KIND,
                    id = %item.id(),
                    available = self.free.len(),
                    total = self.capacity,
                    "Resource taken"
                );
                item
            }
            None => panic!(
                "{} pool exhausted: take() called with 0/{} available",
                R::KIND,
                self.capacity
            ),
        }
    }

    pub fn try_take(&mut self) -> Option<R> {
        if self.free.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    /// Return an item to the free-list.
    ///
    /// Panics if the same id is already free or the pool is full, either of
    /// which means an item was returned twice.
    pub fn put(&mut self, item: R) {
        let id = item.id();
        assert!(
            !self.free.iter().any(|free| free.id() == id),
            "{} {} returned twice",
            R::KIND,
            id
        );
        assert!(
            self.free.len() < self.capacity,
            "{} pool overflow: {} returned with {}/{} already free",
            R::KIND,
            id,
            self.free.len(),
            self.capacity
        );
        self.free.push_back(item);
        tracing::trace!(
            kind = R::KIND,
            %id,
            available = self.free.len(),
            total = self.capacity,
            "Resource returned"
        );
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn issued(&self) -> usize {
        self.capacity - self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn has_free(&self) -> bool {
        !self.free.is_empty()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            available: self.free.len(),
            total: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stocked_pool_is_fully_available() {
        let pool = ResourcePool::<ShoePair>::stocked(4);
        assert_eq!(pool.available(), 4);
        assert_eq!(pool.issued(), 0);
        assert_eq!(pool.capacity(), 4);
    }

    #[test]
    fn take_and_put_keep_inventory_balanced() {
        let mut pool = ResourcePool::<ShoePair>::stocked(3);

        let a = pool.take();
        let b = pool.take();
        assert_eq!(pool.issued() + pool.available(), 3);
        assert_eq!(pool.issued(), 2);

        pool.put(a);
        assert_eq!(pool.issued() + pool.available(), 3);
        pool.put(b);
        assert_eq!(pool.available(), 3);
    }

    #[test]
    fn take_cycles_through_items() {
        let mut pool = ResourcePool::<Alley>::stocked(2);
        let first = pool.take();
        pool.put(first);
        let second = pool.take();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn try_take_on_empty_pool_is_none() {
        let mut pool = ResourcePool::<Cashier>::stocked(1);
        let _held = pool.take();
        assert!(pool.try_take().is_none());
        assert!(!pool.has_free());
    }

    #[test]
    #[should_panic(expected = "pool exhausted")]
    fn take_on_empty_pool_is_a_contract_violation() {
        let mut pool = ResourcePool::<Cashier>::stocked(0);
        let _ = pool.take();
    }

    #[test]
    #[should_panic(expected = "returned twice")]
    fn double_return_is_a_contract_violation() {
        let mut pool = ResourcePool::<Alley>::stocked(2);
        let alley = pool.take();
        pool.put(alley);
        pool.put(alley);
    }

    #[test]
    fn snapshot_reports_issued() {
        let mut pool = ResourcePool::<Alley>::stocked(3);
        let _a = pool.take();
        let snapshot = pool.snapshot();
        assert_eq!(snapshot.issued(), 1);
        assert!(!snapshot.is_idle());
        insta::assert_json_snapshot!(snapshot, @r#"
        {
          "available": 2,
          "total": 3
        }
        "#);
    }
}
