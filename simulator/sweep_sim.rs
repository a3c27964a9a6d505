//! Persistent CSMA/CD sweep with the built-in grid
//!
//! N = 20, 40, ..., 100 stations at 7, 10 and 20 packets/s per station over
//! 10 simulated seconds.
//!
//! Run with: cargo run --bin sweep_sim [--csv results.csv]

mod sweep;

use log::{error, info};
use simple_logger::SimpleLogger;
use std::env;
use sweep::{SweepConfig, SweepRunner};

fn main() {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();

    println!("╔════════════════════════════════════════════════════════╗");
    println!("║        Persistent CSMA/CD Simulator                    ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    let args: Vec<String> = env::args().collect();
    let csv_output_path = match args.iter().position(|a| a == "--csv") {
        Some(i) => args.get(i + 1).cloned(),
        None => None,
    };

    let config = SweepConfig {
        csv_output_path,
        ..Default::default()
    };

    info!("Configuration:");
    info!("  Populations: {:?}", config.populations);
    info!("  Arrival rates: {:?}", config.arrival_rates);
    info!("  Horizon: {}s", config.channel.horizon);
    info!(
        "  Frame: {} bits @ {} bit/s",
        config.channel.frame_bits, config.channel.bit_rate
    );

    let runner = SweepRunner::new(config);
    match runner.run() {
        Ok(result) => {
            result.print_summary();
            info!("✓ Sweep complete!");
        }
        Err(e) => {
            error!("Sweep failed: {}", e);
            std::process::exit(1);
        }
    }
}
