//! Sweep simulator module
//!
//! Runs the contention engine across a grid of station counts and per-station
//! arrival rates and collects one ordered series per arrival rate:
//! - efficiency vs. population
//! - throughput (Mbps) vs. population
//!
//! Results are printed as tables and optionally exported as CSV.

pub mod config;
pub mod event_sink;
pub mod runner;
pub mod stats;

pub use config::SweepConfig;
pub use runner::SweepRunner;
#[allow(unused_imports)]
pub use stats::{RateSeries, SweepResult};
