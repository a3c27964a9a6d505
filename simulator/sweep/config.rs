//! Configuration for population / arrival-rate sweeps

use csma_cd::ChannelConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Configuration for a sweep over populations and offered loads
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Station counts to simulate, in report order
    pub populations: Vec<usize>,

    /// Per-station arrival rates (packets/s); one series per rate
    pub arrival_rates: Vec<f64>,

    /// Random seed (None = generate random)
    pub seed: Option<[u8; 32]>,

    /// Bus and timing constants shared by every run
    pub channel: ChannelConfig,

    /// Route per-round engine events to the logger
    pub enable_event_logging: bool,

    /// Write all series to this CSV file when set
    pub csv_output_path: Option<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            populations: vec![20, 40, 60, 80, 100],
            arrival_rates: vec![7.0, 10.0, 20.0],
            seed: None,
            channel: ChannelConfig::default(),
            enable_event_logging: false,
            csv_output_path: None,
        }
    }
}

impl SweepConfig {
    /// Get or generate seed
    pub fn resolve_seed(&self) -> [u8; 32] {
        self.seed.unwrap_or_else(|| {
            let mut temp_rng = StdRng::from_entropy();
            let mut seed = [0u8; 32];
            use rand::RngCore;
            temp_rng.fill_bytes(&mut seed);
            seed
        })
    }

    /// Total number of engine runs in the sweep
    pub fn run_count(&self) -> usize {
        self.populations.len() * self.arrival_rates.len()
    }
}
