//! pinfall: synchronization core for a concurrent bowling venue.
//!
//! Customers run on their own threads and meet the venue through a handful
//! of monitors:
//! - `CohortBarrier`: cohort rendezvous, one instance per stage
//! - `AlleyArbiter`: strict FIFO assignment of exclusive alleys to cohorts
//! - `ShoeCounter`: single service slot with returner priority and
//!   cohort-atomic lending
//! - `CashierPool`: leased per customer for registering and paying

mod actor;
mod arbiter;
mod barrier;
mod cohort;
mod config;
mod desk;
mod ids;
mod monitor;
pub mod pool;
mod shoes;
mod venue;

pub use actor::Actor;
pub use arbiter::AlleyArbiter;
pub use barrier::CohortBarrier;
pub use cohort::Cohort;
pub use config::{ConfigError, Timings, VenueConfig};
pub use desk::RegistrationDesk;
pub use ids::{ActorId, AlleyId, CashierId, CohortId, ShoePairId};
pub use pool::{Alley, CashierPool, PoolSnapshot, Resource, ShoePair};
pub use shoes::{ShoeCounter, ShoeCounterSnapshot};
pub use venue::{Venue, VenueSnapshot};
