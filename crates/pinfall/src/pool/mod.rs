//! Bounded pools of reusable venue items.
//!
//! - `ResourcePool<R>`: non-blocking free-list, embedded in station monitors
//! - `CashierPool`: blocking pool of cashiers, leased per customer

mod cashier;
mod resource;

pub use cashier::{CashierLease, CashierPool};
pub use resource::{Alley, Cashier, PoolSnapshot, Resource, ResourcePool, ShoePair};
