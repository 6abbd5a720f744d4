//! pinfall-sim: run one evening at the bowling venue and print a JSON report.
//!
//! Logging goes to stderr so the report on stdout stays machine-readable.
//! `RUST_LOG` wins when set; otherwise `PINFALL_LOG` picks the level for the
//! pinfall crates. `LOG_FORMAT=json` switches to JSON log lines.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use pinfall::{Timings, VenueConfig};
use pinfall_sim::Simulation;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pinfall-sim")]
#[command(about = "Simulate customers sharing cashiers, shoes and alleys", long_about = None)]
struct Args {
    /// Customers per cohort
    #[arg(long, default_value = "5")]
    cohort_size: usize,

    /// Number of cohorts (one game each)
    #[arg(long, default_value = "10")]
    cohorts: usize,

    #[arg(long, default_value = "3")]
    cashiers: usize,

    #[arg(long, default_value = "3")]
    alleys: usize,

    /// Shoe pairs at the counter [default: cohort-size x alleys]
    #[arg(long)]
    shoe_pairs: Option<usize>,

    #[arg(long, default_value = "100")]
    register_ms: u64,

    #[arg(long, default_value = "100")]
    pay_ms: u64,

    #[arg(long, default_value = "100")]
    shoe_service_ms: u64,

    #[arg(long, default_value = "300")]
    play_ms: u64,

    /// Upper bound of the random delay before a customer walks in
    #[arg(long, default_value = "1000")]
    max_arrival_delay_ms: u64,

    /// Skip every simulated delay
    #[arg(long)]
    instant: bool,

    /// Emit the report as a single line
    #[arg(long)]
    compact: bool,
}

impl Args {
    fn venue_config(&self) -> VenueConfig {
        let timings = if self.instant {
            Timings::instant()
        } else {
            Timings {
                register: Duration::from_millis(self.register_ms),
                pay: Duration::from_millis(self.pay_ms),
                shoe_service: Duration::from_millis(self.shoe_service_ms),
                play: Duration::from_millis(self.play_ms),
                max_arrival_delay: Duration::from_millis(self.max_arrival_delay_ms),
            }
        };
        VenueConfig {
            cohort_size: self.cohort_size,
            cohorts: self.cohorts,
            cashiers: self.cashiers,
            alleys: self.alleys,
            shoe_pairs: self
                .shoe_pairs
                .unwrap_or(self.cohort_size.saturating_mul(self.alleys)),
            timings,
        }
    }
}

fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match std::env::var("PINFALL_LOG").as_deref() {
            Ok("trace") => "trace",
            Ok("debug") => "debug",
            Ok("warn") | Ok("warning") => "warn",
            Ok("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("pinfall={level},pinfall_sim={level}"))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");
    if use_json {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_thread_names(true).with_writer(std::io::stderr))
            .try_init();
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let simulation = Simulation::new(args.venue_config()).context("invalid venue")?;
    let report = simulation.run().context("simulation failed")?;

    let rendered = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shoe_pairs_default_to_one_cohort_per_alley() {
        let args = Args::parse_from(["pinfall-sim", "--cohort-size", "4", "--alleys", "2"]);
        let config = args.venue_config();
        assert_eq!(config.shoe_pairs, 8);
        assert_eq!(config.cohorts, 10);
        assert_eq!(config.timings, Timings::default());
    }

    #[test]
    fn instant_overrides_timing_flags() {
        let args = Args::parse_from(["pinfall-sim", "--instant", "--play-ms", "900"]);
        assert_eq!(args.venue_config().timings, Timings::instant());
    }

    #[test]
    fn explicit_shoe_pairs_are_kept() {
        let args = Args::parse_from(["pinfall-sim", "--shoe-pairs", "7"]);
        assert_eq!(args.venue_config().shoe_pairs, 7);
    }
}
