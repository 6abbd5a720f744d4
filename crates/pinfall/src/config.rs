//! Venue configuration.
//!
//! Every count is fixed at startup and handed to each station when it is
//! built. Durations are the simulated service times; zero means "instant".

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },

    #[error("{shoe_pairs} shoe pairs cannot outfit a cohort of {cohort_size}")]
    NotEnoughShoes { shoe_pairs: usize, cohort_size: usize },

    #[error("{field} must be a whole number of milliseconds")]
    FractionalMillis { field: &'static str },
}

/// Simulated service times, serialized as whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    #[serde(rename = "register_ms", with = "millis")]
    pub register: Duration,
    #[serde(rename = "pay_ms", with = "millis")]
    pub pay: Duration,
    #[serde(rename = "shoe_service_ms", with = "millis")]
    pub shoe_service: Duration,
    #[serde(rename = "play_ms", with = "millis")]
    pub play: Duration,
    #[serde(rename = "max_arrival_delay_ms", with = "millis")]
    pub max_arrival_delay: Duration,
}

impl Timings {
    /// No simulated work at all. Only the synchronization remains.
    pub const fn instant() -> Self {
        Self {
            register: Duration::ZERO,
            pay: Duration::ZERO,
            shoe_service: Duration::ZERO,
            play: Duration::ZERO,
            max_arrival_delay: Duration::ZERO,
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            register: Duration::from_millis(100),
            pay: Duration::from_millis(100),
            shoe_service: Duration::from_millis(100),
            play: Duration::from_millis(300),
            max_arrival_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueConfig {
    pub cohort_size: usize,
    /// Number of cohorts, and therefore games, in one run.
    pub cohorts: usize,
    pub cashiers: usize,
    pub alleys: usize,
    pub shoe_pairs: usize,
    pub timings: Timings,
}

impl Default for VenueConfig {
    fn default() -> Self {
        let cohort_size = 5;
        let alleys = 3;
        Self {
            cohort_size,
            cohorts: 10,
            cashiers: 3,
            alleys,
            shoe_pairs: cohort_size * alleys,
            timings: Timings::default(),
        }
    }
}

impl VenueConfig {
    pub fn actor_count(&self) -> usize {
        self.cohort_size * self.cohorts
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Reject configurations under which a run could never finish, or whose
    /// timings the report could not record exactly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("cohort_size", self.cohort_size),
            ("cohorts", self.cohorts),
            ("cashiers", self.cashiers),
            ("alleys", self.alleys),
            ("shoe_pairs", self.shoe_pairs),
        ];
        if let Some(&(field, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Zero { field });
        }
        // A cohort is shod atomically; fewer pairs than members can never finish.
        if self.shoe_pairs < self.cohort_size {
            return Err(ConfigError::NotEnoughShoes {
                shoe_pairs: self.shoe_pairs,
                cohort_size: self.cohort_size,
            });
        }
        self.timings.validate()
    }
}

impl Timings {
    /// Every timing must be a whole number of milliseconds, the unit it is
    /// reported in.
    fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("register", self.register),
            ("pay", self.pay),
            ("shoe_service", self.shoe_service),
            ("play", self.play),
            ("max_arrival_delay", self.max_arrival_delay),
        ];
        match durations
            .iter()
            .find(|(_, duration)| duration.subsec_nanos() % 1_000_000 != 0)
        {
            Some(&(field, _)) => Err(ConfigError::FractionalMillis { field }),
            None => Ok(()),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
