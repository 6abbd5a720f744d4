//! Drives a pinfall venue with one thread per customer.

pub mod pipeline;
pub mod simulation;

pub use pipeline::{CustomerOutcome, StationPipeline};
pub use simulation::{RunReport, Simulation, SimulationError};
