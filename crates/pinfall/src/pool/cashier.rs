//! Cashier pool shared by the register and pay steps.
//!
//! Cashiers are leased per customer, not per cohort. A lease returns its
//! cashier to the pool when released explicitly or when dropped, so a
//! customer always frees the register before blocking anywhere else.

use std::sync::{Condvar, Mutex};

use super::resource::{Cashier, PoolSnapshot, Resource, ResourcePool};
use crate::ids::{ActorId, CashierId};
use crate::monitor;

const MONITOR: &str = "cashier_pool";

/// A cashier held by one customer. Returns to the pool on drop.
#[must_use = "dropping the lease immediately frees the cashier"]
pub struct CashierLease<'a> {
    cashier: Option<Cashier>,
    holder: ActorId,
    pool: &'a CashierPool,
}

impl CashierLease<'_> {
    pub fn cashier_id(&self) -> Option<CashierId> {
        self.cashier.as_ref().map(Resource::id)
    }

    /// Hand the cashier back and wake one waiting customer.
    pub fn release(mut self) {
        if let Some(cashier) = self.cashier.take() {
            self.pool.release(cashier);
        }
    }
}

impl Drop for CashierLease<'_> {
    fn drop(&mut self) {
        if let Some(cashier) = self.cashier.take() {
            tracing::debug!(actor = %self.holder, cashier = %cashier.id(), "Cashier lease dropped - returning to pool");
            self.pool.release(cashier);
        }
    }
}

/// Symmetric N-server pool. Waiters are not ordered.
pub struct CashierPool {
    free: Mutex<ResourcePool<Cashier>>,
    freed: Condvar,
}

impl CashierPool {
    pub fn new(num_cashiers: usize) -> Self {
        Self {
            free: Mutex::new(ResourcePool::stocked(num_cashiers)),
            freed: Condvar::new(),
        }
    }

    /// Block until a cashier is free, then lease it to `actor`.
    pub fn acquire(&self, actor: ActorId) -> CashierLease<'_> {
        let mut free = monitor::lock(MONITOR, &self.free);
        while !free.has_free() {
            tracing::debug!(%actor, "No cashier free - waiting");
            free = monitor::wait(MONITOR, &self.freed, free);
        }
        let cashier = free.take();
        tracing::debug!(
            %actor,
            cashier = %cashier.id(),
            available = free.available(),
            total = free.capacity(),
            "Cashier assigned"
        );
        self.lease(cashier, actor)
    }

    pub fn try_acquire(&self, actor: ActorId) -> Option<CashierLease<'_>> {
        let cashier = monitor::lock(MONITOR, &self.free).try_take()?;
        Some(self.lease(cashier, actor))
    }

    /// Return a cashier and wake one blocked customer.
    pub fn release(&self, cashier: Cashier) {
        let id = cashier.id();
        let mut free = monitor::lock(MONITOR, &self.free);
        free.put(cashier);
        tracing::debug!(cashier = %id, available = free.available(), "Cashier free");
        self.freed.notify_one();
    }

    pub fn available(&self) -> usize {
        monitor::lock(MONITOR, &self.free).available()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        monitor::lock(MONITOR, &self.free).snapshot()
    }

    fn lease(&self, cashier: Cashier, holder: ActorId) -> CashierLease<'_> {
        CashierLease {
            cashier: Some(cashier),
            holder,
            pool: self,
        }
    }
}
