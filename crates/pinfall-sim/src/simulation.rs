//! Thread-per-customer driver.
//!
//! Spawns one named OS thread per customer, joins them all, and summarizes
//! the run. A customer never gives up once started, so a run either finishes
//! or (on a panicking customer) reports the first panic it joins.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use chrono::{DateTime, Utc};
use pinfall::{Actor, ActorId, ConfigError, Venue, VenueConfig, VenueSnapshot};
use serde::Serialize;

use crate::pipeline::{CustomerOutcome, StationPipeline};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid venue configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to spawn thread for {actor}: {source}")]
    Spawn {
        actor: ActorId,
        #[source]
        source: std::io::Error,
    },

    #[error("{actor} panicked: {message}")]
    ActorPanicked { actor: ActorId, message: String },
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub config: VenueConfig,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub customers: usize,
    pub games_played: u64,
    pub outcomes: Vec<CustomerOutcome>,
    pub final_snapshot: VenueSnapshot,
}

pub struct Simulation {
    config: VenueConfig,
}

impl Simulation {
    pub fn new(config: VenueConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn run(&self) -> Result<RunReport, SimulationError> {
        let venue = Arc::new(Venue::new(self.config.clone())?);
        let customers = self.config.actor_count();
        let started_at = Utc::now();
        let clock = Instant::now();

        tracing::info!(
            customers,
            cohort_size = self.config.cohort_size,
            cashiers = self.config.cashiers,
            alleys = self.config.alleys,
            shoe_pairs = self.config.shoe_pairs,
            "Venue open"
        );

        let mut handles = Vec::with_capacity(customers);
        for index in 0..customers {
            let actor = ActorId::new(index);
            let venue = Arc::clone(&venue);
            let handle = thread::Builder::new()
                .name(actor.to_string())
                .spawn(move || StationPipeline::new(&venue).run(Actor::new(actor)))
                .map_err(|source| SimulationError::Spawn { actor, source })?;
            handles.push((actor, handle));
        }

        let mut outcomes = Vec::with_capacity(customers);
        for (actor, handle) in handles {
            let outcome = handle
                .join()
                .map_err(|payload| SimulationError::ActorPanicked {
                    actor,
                    message: panic_message(payload.as_ref()),
                })?;
            outcomes.push(outcome);
        }

        let elapsed_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
        let final_snapshot = venue.snapshot();
        if !final_snapshot.is_quiescent() {
            tracing::error!(?final_snapshot, "Venue not quiescent after every customer left");
        }
        tracing::info!(
            games_played = final_snapshot.games_played,
            elapsed_ms,
            "Venue closed"
        );

        Ok(RunReport {
            config: self.config.clone(),
            started_at,
            finished_at: Utc::now(),
            elapsed_ms,
            customers,
            games_played: final_snapshot.games_played,
            outcomes,
            final_snapshot,
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
