//! Cohort rendezvous.
//!
//! One `CohortBarrier` per stage serves every cohort passing that stage. All
//! waiters share a single condvar, so a wake for one cohort also wakes
//! members of others; each waiter rechecks its own cohort before leaving.

use std::collections::{HashMap, HashSet};
use std::sync::{Condvar, Mutex};

use crate::actor::Actor;
use crate::ids::{ActorId, CohortId};
use crate::monitor;

struct Rendezvous {
    target: usize,
    arrivals: usize,
    departures: usize,
    waiting: HashSet<ActorId>,
}

impl Rendezvous {
    fn new(target: usize) -> Self {
        Self {
            target,
            arrivals: 0,
            departures: 0,
            waiting: HashSet::new(),
        }
    }

    fn is_complete(&self) -> bool {
        self.arrivals == self.target
    }
}

pub struct CohortBarrier {
    stage: &'static str,
    cohorts: Mutex<HashMap<CohortId, Rendezvous>>,
    completed: Condvar,
}

impl CohortBarrier {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            cohorts: Mutex::new(HashMap::new()),
            completed: Condvar::new(),
        }
    }

    /// Block until every member of the actor's cohort has arrived here.
    ///
    /// The member that completes the cohort wakes the others and leaves
    /// without waiting. Bookkeeping for the cohort is dropped when its last
    /// member leaves.
    pub fn arrive_and_wait(&self, actor: &Actor) {
        let cohort = actor.expect_cohort(self.stage);
        let cohort_id = cohort.id();
        let actor_id = actor.id();

        let mut cohorts = monitor::lock(self.stage, &self.cohorts);
        let rendezvous = cohorts
            .entry(cohort_id)
            .or_insert_with(|| Rendezvous::new(cohort.target_size()));
        assert!(
            rendezvous.arrivals < rendezvous.target,
            "{actor_id} arrived at {} after all {} members of {cohort_id}",
            self.stage,
            rendezvous.target
        );
        rendezvous.arrivals += 1;

        if rendezvous.is_complete() {
            tracing::info!(
                stage = self.stage,
                actor = %actor_id,
                cohort = %cohort_id,
                "Cohort complete"
            );
            self.completed.notify_all();
        } else {
            tracing::debug!(
                stage = self.stage,
                actor = %actor_id,
                cohort = %cohort_id,
                arrived = rendezvous.arrivals,
                target = rendezvous.target,
                "Waiting for cohort"
            );
            rendezvous.waiting.insert(actor_id);
            loop {
                cohorts = monitor::wait(self.stage, &self.completed, cohorts);
                if cohorts.get(&cohort_id).is_some_and(Rendezvous::is_complete) {
                    break;
                }
            }
        }

        let finished = match cohorts.get_mut(&cohort_id) {
            Some(rendezvous) => {
                rendezvous.waiting.remove(&actor_id);
                rendezvous.departures += 1;
                rendezvous.departures == rendezvous.target
            }
            None => false,
        };
        if finished {
            cohorts.remove(&cohort_id);
            tracing::trace!(stage = self.stage, cohort = %cohort_id, "Rendezvous cleared");
        }
    }

    /// Members of `cohort` currently parked here.
    pub fn waiting(&self, cohort: CohortId) -> usize {
        monitor::lock(self.stage, &self.cohorts)
            .get(&cohort)
            .map_or(0, |r| r.waiting.len())
    }

    /// Cohorts with live bookkeeping (some member has arrived, not all left).
    pub fn tracked_cohorts(&self) -> usize {
        monitor::lock(self.stage, &self.cohorts).len()
    }
}
