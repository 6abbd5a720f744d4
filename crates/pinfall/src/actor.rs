//! Per-customer state carried by each actor thread.

use std::sync::Arc;

use crate::cohort::Cohort;
use crate::ids::ActorId;
use crate::pool::ShoePair;

/// One customer. Owned by its own thread and lent to stations as `&Actor`
/// or `&mut Actor` when a station needs to attach or detach something.
#[derive(Debug)]
pub struct Actor {
    id: ActorId,
    cohort: Option<Arc<Cohort>>,
    shoes: Option<ShoePair>,
}

impl Actor {
    pub fn new(id: ActorId) -> Self {
        Self {
            id,
            cohort: None,
            shoes: None,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn cohort(&self) -> Option<&Arc<Cohort>> {
        self.cohort.as_ref()
    }

    pub fn join_cohort(&mut self, cohort: Arc<Cohort>) {
        self.cohort = Some(cohort);
    }

    /// Drop the notion of a cohort once the game is over.
    pub fn forget_cohort(&mut self) -> Option<Arc<Cohort>> {
        self.cohort.take()
    }

    pub fn shoes(&self) -> Option<&ShoePair> {
        self.shoes.as_ref()
    }

    pub(crate) fn put_on_shoes(&mut self, pair: ShoePair) {
        assert!(
            self.shoes.is_none(),
            "{} handed a second shoe pair",
            self.id
        );
        self.shoes = Some(pair);
    }

    pub(crate) fn take_off_shoes(&mut self) -> Option<ShoePair> {
        self.shoes.take()
    }

    /// The actor's cohort, for stations that cannot run without one.
    pub(crate) fn expect_cohort(&self, station: &str) -> &Arc<Cohort> {
        match &self.cohort {
            Some(cohort) => cohort,
            None => panic!("{} reached {station} without a cohort", self.id),
        }
    }
}
