//! Sweep results and reporting

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csma_cd::{CsmaResult, SimReport};
use indexmap::IndexMap;

/// All runs sharing one arrival rate, ordered by population as configured
#[derive(Debug, Clone)]
pub struct RateSeries {
    pub arrival_rate: f64,
    pub points: Vec<SimReport>,
}

impl RateSeries {
    pub fn new(arrival_rate: f64) -> Self {
        Self {
            arrival_rate,
            points: Vec::new(),
        }
    }

    /// (population, efficiency) pairs
    pub fn efficiency_series(&self) -> Vec<(usize, f64)> {
        self.points
            .iter()
            .map(|p| (p.population, p.efficiency))
            .collect()
    }

    /// (population, throughput in Mbps) pairs
    pub fn throughput_series(&self) -> Vec<(usize, f64)> {
        self.points
            .iter()
            .map(|p| (p.population, p.throughput_mbps))
            .collect()
    }
}

/// Sweep result
#[derive(Debug)]
pub struct SweepResult {
    /// Seed used for the sweep
    pub seed_used: [u8; 32],

    /// Series keyed by arrival-rate label, in configured order
    pub series: IndexMap<String, RateSeries>,
}

impl SweepResult {
    /// Label used as series key and in reports
    pub fn rate_label(arrival_rate: f64) -> String {
        format!("{}", arrival_rate)
    }

    pub fn series_for(&self, arrival_rate: f64) -> Option<&RateSeries> {
        self.series.get(&Self::rate_label(arrival_rate))
    }

    pub fn total_runs(&self) -> usize {
        self.series.values().map(|s| s.points.len()).sum()
    }

    /// Print a summary of the sweep results
    pub fn print_summary(&self) {
        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║        Persistent CSMA/CD Sweep Results                ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Configuration:");
        println!("  Seed: {:?}", self.seed_used);
        println!("  Runs: {}\n", self.total_runs());

        println!("Efficiency vs. N:");
        self.print_table(|p| p.efficiency);
        println!();

        println!("Throughput (Mbps) vs. N:");
        self.print_table(|p| p.throughput_mbps);
        println!();

        println!("Frames (transmitted / succeeded / dropped):");
        for (label, series) in &self.series {
            println!("  Arrival rate = {}", label);
            for p in &series.points {
                println!(
                    "    N={:>4}: {:>8} / {:>8} / {:>6}  ({} collision rounds, {} deferrals)",
                    p.population,
                    p.transmitted,
                    p.succeeded,
                    p.dropped,
                    p.collision_rounds,
                    p.deferrals
                );
            }
        }
        println!();
    }

    fn print_table<F>(&self, value: F)
    where
        F: Fn(&SimReport) -> f64,
    {
        for (label, series) in &self.series {
            let row: Vec<String> = series
                .points
                .iter()
                .map(|p| format!("N={}: {:.4}", p.population, value(p)))
                .collect();
            println!("  Arrival rate = {:<6} {}", label, row.join("  "));
        }
    }

    /// Write every run as one CSV row
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> CsmaResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "arrival_rate,population,efficiency,throughput_mbps,transmitted,succeeded,dropped"
        )?;
        for series in self.series.values() {
            for p in &series.points {
                writeln!(
                    writer,
                    "{},{},{:.6},{:.6},{},{},{}",
                    series.arrival_rate,
                    p.population,
                    p.efficiency,
                    p.throughput_mbps,
                    p.transmitted,
                    p.succeeded,
                    p.dropped
                )?;
            }
        }
        writer.flush()?;

        Ok(())
    }
}
