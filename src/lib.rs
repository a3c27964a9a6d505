//! # csma_cd - Persistent CSMA/CD contention simulator
//!
//! A discrete-event model of stations sharing one linear bus under persistent
//! CSMA/CD. Each station holds a queue of pregenerated Poisson arrivals; every
//! round the station with the earliest pending frame transmits, and its frame
//! is checked against every other station for collisions and busy-channel
//! deferral under a propagation delay proportional to bus distance.
//!
//! ## Core Components
//!
//! - **Arrivals**: Poisson arrival pregeneration per station
//! - **Node**: per-station arrival queue, collision counter and repair pass
//! - **Resolver**: sender selection and collision / deferral resolution
//! - **Backoff**: binary exponential backoff and the retry-limit drop policy
//! - **Engine**: round loop bounded by simulated time, efficiency/throughput
//!
//! ## Usage
//!
//! ```no_run
//! use csma_cd::{run_simulation, ChannelConfig};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let config = ChannelConfig::default();
//! let rng = StdRng::from_seed([42u8; 32]);
//!
//! let report = run_simulation(40, 10.0, &config, rng).unwrap();
//! println!("efficiency={} throughput={}Mbps", report.efficiency, report.throughput_mbps);
//! ```
//!
//! ## Sweeps and Reporting
//!
//! Sweeping populations and arrival rates, and tabulating the resulting series,
//! is done by the binaries in `simulator/` on top of this library.

pub mod csma_arrivals;
pub mod csma_backoff;
pub mod csma_config;
pub mod csma_engine;
pub mod csma_error;
pub mod csma_interface;
pub mod csma_node;
pub mod csma_resolver;

// Re-export commonly used types
pub use csma_config::ChannelConfig;
pub use csma_engine::{run_simulation, CsmaEngine, SimReport};
pub use csma_error::{CsmaError, CsmaResult};
pub use csma_interface::{
    Event, EventSink, NoOpSink, NodeIndex, Role, RoundOutcome, SimTime, BACKOFF_SLOT_BITS,
    MAX_RETRIES,
};
pub use csma_node::Node;
pub use csma_resolver::{resolve_round, select_sender};
