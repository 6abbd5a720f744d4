//! Alley assignment.
//!
//! Cohorts without an alley queue in the order their first member asks. A
//! cohort leaves the queue only when it is at the head and an alley is free;
//! the binding is made atomically with the dequeue so every other member of
//! the cohort simply finds it on the cohort.
//!
//! Members only ask after the dance-floor rendezvous, so queue order is the
//! order in which cohorts finished dancing.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::actor::Actor;
use crate::cohort::Cohort;
use crate::ids::CohortId;
use crate::monitor;
use crate::pool::{Alley, PoolSnapshot, Resource, ResourcePool};

const MONITOR: &str = "alley_arbiter";

struct ArbiterState {
    alleys: ResourcePool<Alley>,
    queue: VecDeque<CohortId>,
    games_played: u64,
}

impl ArbiterState {
    fn is_next(&self, cohort: CohortId) -> bool {
        self.queue.front() == Some(&cohort) && self.alleys.has_free()
    }
}

pub struct AlleyArbiter {
    state: Mutex<ArbiterState>,
    /// Signalled on every release and every dequeue: both can make some
    /// waiting cohort the eligible head.
    changed: Condvar,
    play_time: Duration,
}

impl AlleyArbiter {
    pub fn new(num_alleys: usize, play_time: Duration) -> Self {
        Self {
            state: Mutex::new(ArbiterState {
                alleys: ResourcePool::stocked(num_alleys),
                queue: VecDeque::new(),
                games_played: 0,
            }),
            changed: Condvar::new(),
            play_time,
        }
    }

    /// Block until `cohort` owns an alley and return it.
    ///
    /// Every member calls this; the first call enqueues the cohort, and
    /// whichever member finds the cohort eligible makes the binding.
    pub fn request_alley(&self, cohort: &Cohort) -> Alley {
        let cohort_id = cohort.id();
        let mut state = monitor::lock(MONITOR, &self.state);

        if cohort.alley().is_none() && !state.queue.contains(&cohort_id) {
            state.queue.push_back(cohort_id);
            tracing::debug!(
                cohort = %cohort_id,
                position = state.queue.len(),
                "Cohort queued for an alley"
            );
        }

        loop {
            if let Some(alley) = cohort.alley() {
                return alley;
            }

            if state.is_next(cohort_id) {
                state.queue.pop_front();
                let alley = state.alleys.take();
                cohort.bind_alley(alley);
                tracing::info!(
                    cohort = %cohort_id,
                    alley = %alley.id(),
                    available = state.alleys.available(),
                    total = state.alleys.capacity(),
                    "Alley assigned"
                );
                self.changed.notify_all();
                return alley;
            }

            tracing::debug!(
                cohort = %cohort_id,
                head = ?state.queue.front(),
                free = state.alleys.available(),
                "No alley for cohort yet - dancing"
            );
            state = monitor::wait(MONITOR, &self.changed, state);
        }
    }

    /// The fixed-length game itself. Holds no lock.
    pub fn play(&self, actor: &Actor, alley: Alley) {
        tracing::debug!(actor = %actor.id(), alley = %alley.id(), "Bowling");
        if !self.play_time.is_zero() {
            std::thread::sleep(self.play_time);
        }
    }

    /// Report the end of `cohort`'s game.
    ///
    /// Safe to call from every member: only the first caller finds the alley
    /// still bound, releases it and gets it back; the rest get `None`.
    pub fn end_game(&self, cohort: &Cohort) -> Option<Alley> {
        let alley = cohort.take_alley()?;
        let mut state = monitor::lock(MONITOR, &self.state);
        state.games_played += 1;
        tracing::info!(
            cohort = %cohort.id(),
            alley = %alley.id(),
            games_played = state.games_played,
            "Game over"
        );
        self.free_alley(&mut state, alley);
        Some(alley)
    }

    /// Mark `alley` free and wake every requester so the queue head can
    /// claim it.
    pub fn release_alley(&self, alley: Alley) {
        let mut state = monitor::lock(MONITOR, &self.state);
        self.free_alley(&mut state, alley);
    }

    fn free_alley(&self, state: &mut ArbiterState, alley: Alley) {
        state.alleys.put(alley);
        tracing::debug!(
            alley = %alley.id(),
            available = state.alleys.available(),
            total = state.alleys.capacity(),
            "Alley free"
        );
        self.changed.notify_all();
    }

    /// Cohorts waiting for an alley, head first.
    pub fn queued_cohorts(&self) -> Vec<CohortId> {
        monitor::lock(MONITOR, &self.state)
            .queue
            .iter()
            .copied()
            .collect()
    }

    pub fn games_played(&self) -> u64 {
        monitor::lock(MONITOR, &self.state).games_played
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        monitor::lock(MONITOR, &self.state).alleys.snapshot()
    }
}
