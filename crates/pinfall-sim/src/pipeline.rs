//! One customer's evening, station by station.

use std::time::Duration;

use pinfall::{Actor, ActorId, AlleyId, CohortId, Resource, Venue};
use rand::Rng;
use serde::Serialize;

/// What a customer went through, as seen from its own thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CustomerOutcome {
    pub actor: ActorId,
    pub cohort: CohortId,
    pub alley: AlleyId,
    /// Whether this customer was the one that reported the game over.
    pub reported_game_end: bool,
}

/// Walks an actor through registration, shoes, dancing, play, payment and
/// shoe return. Holds no state of its own beyond the venue.
pub struct StationPipeline<'a> {
    venue: &'a Venue,
}

impl<'a> StationPipeline<'a> {
    pub fn new(venue: &'a Venue) -> Self {
        Self { venue }
    }

    pub fn run(&self, mut actor: Actor) -> CustomerOutcome {
        self.arrive(actor.id());

        let cohort = self.venue.desk().register(&mut actor);
        tracing::debug!(actor = %actor.id(), cohort = %cohort.id(), "Registered");

        self.venue.shoes().request_borrow(&mut actor);
        self.venue.dance_floor().arrive_and_wait(&actor);

        let alley = self.venue.arbiter().request_alley(&cohort);
        self.venue.lanes().arrive_and_wait(&actor);
        self.venue.arbiter().play(&actor, alley);
        let reported_game_end = self.venue.arbiter().end_game(&cohort).is_some();

        let cohort_id = cohort.id();
        drop(cohort);
        actor.forget_cohort();

        self.venue.desk().charge_fee(&actor);
        self.venue.shoes().request_return(&mut actor);
        tracing::debug!(actor = %actor.id(), "Going home");

        CustomerOutcome {
            actor: actor.id(),
            cohort: cohort_id,
            alley: alley.id(),
            reported_game_end,
        }
    }

    /// Spread arrivals out so cohorts form from a realistic trickle.
    fn arrive(&self, actor: ActorId) {
        let max = self.venue.config().timings.max_arrival_delay;
        if max.is_zero() {
            return;
        }
        let max_millis = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        let delay_ms = rand::thread_rng().gen_range(0..=max_millis);
        tracing::trace!(%actor, delay_ms, "Arriving");
        std::thread::sleep(Duration::from_millis(delay_ms));
    }
}
