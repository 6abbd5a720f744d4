//! The venue: every station, built from one validated configuration.

use serde::Serialize;

use crate::arbiter::AlleyArbiter;
use crate::barrier::CohortBarrier;
use crate::config::{ConfigError, VenueConfig};
use crate::desk::RegistrationDesk;
use crate::ids::CohortId;
use crate::pool::PoolSnapshot;
use crate::shoes::{ShoeCounter, ShoeCounterSnapshot};

/// Point-in-time occupancy of the whole venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueSnapshot {
    pub cashiers: PoolSnapshot,
    pub alleys: PoolSnapshot,
    pub shoes: ShoeCounterSnapshot,
    pub queued_cohorts: Vec<CohortId>,
    pub customers_inside: usize,
    pub games_played: u64,
}

impl VenueSnapshot {
    /// Nobody inside and every resource back where it started.
    pub fn is_quiescent(&self) -> bool {
        self.customers_inside == 0
            && self.queued_cohorts.is_empty()
            && self.cashiers.is_idle()
            && self.alleys.is_idle()
            && self.shoes.issued == 0
            && self.shoes.returners_pending == 0
            && !self.shoes.in_service
    }
}

pub struct Venue {
    config: VenueConfig,
    desk: RegistrationDesk,
    shoes: ShoeCounter,
    dance_floor: CohortBarrier,
    lanes: CohortBarrier,
    arbiter: AlleyArbiter,
}

impl Venue {
    pub fn new(config: VenueConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let timings = config.timings;
        Ok(Self {
            desk: RegistrationDesk::new(
                config.cashiers,
                config.cohort_size,
                timings.register,
                timings.pay,
            ),
            shoes: ShoeCounter::new(config.shoe_pairs, timings.shoe_service),
            dance_floor: CohortBarrier::new("dance_floor"),
            lanes: CohortBarrier::new("lanes"),
            arbiter: AlleyArbiter::new(config.alleys, timings.play),
            config,
        })
    }

    pub fn config(&self) -> &VenueConfig {
        &self.config
    }

    pub fn desk(&self) -> &RegistrationDesk {
        &self.desk
    }

    pub fn shoes(&self) -> &ShoeCounter {
        &self.shoes
    }

    /// Where a shod cohort gathers before asking for an alley.
    pub fn dance_floor(&self) -> &CohortBarrier {
        &self.dance_floor
    }

    /// Where a cohort gathers at its alley so everyone starts together.
    pub fn lanes(&self) -> &CohortBarrier {
        &self.lanes
    }

    pub fn arbiter(&self) -> &AlleyArbiter {
        &self.arbiter
    }

    pub fn snapshot(&self) -> VenueSnapshot {
        VenueSnapshot {
            cashiers: self.desk.cashier_snapshot(),
            alleys: self.arbiter.snapshot(),
            shoes: self.shoes.snapshot(),
            queued_cohorts: self.arbiter.queued_cohorts(),
            customers_inside: self.desk.customers_inside(),
            games_played: self.arbiter.games_played(),
        }
    }
}
