//! Simulation driver
//!
//! Runs contention rounds until the earliest pending frame lies beyond the
//! simulated horizon or every station has run out of frames, then turns the
//! accumulated counts into efficiency and throughput.

use log::{debug, info};
use rand::Rng;

use crate::csma_arrivals::pregen_arrivals;
use crate::csma_config::ChannelConfig;
use crate::csma_error::{CsmaError, CsmaResult};
use crate::csma_interface::{EventSink, NoOpSink, RoundOutcome, SimTime};
use crate::csma_node::Node;
use crate::csma_resolver::{resolve_round, select_sender};

/// Aggregate result of one simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimReport {
    pub population: usize,
    /// Offered load per node (packets/s); 0.0 for explicit schedules
    pub arrival_rate: f64,
    /// Frames that touched the medium, collided ones included
    pub transmitted: u64,
    /// Frames delivered
    pub succeeded: u64,
    /// Frames discarded after exceeding the retry limit
    pub dropped: u64,
    /// Rounds that ended in a collision
    pub collision_rounds: u64,
    /// Busy-channel deferrals across all rounds
    pub deferrals: u64,
    pub rounds: u64,
    /// Head timestamp of the last sender that got a round
    pub last_sender_time: SimTime,
    /// `succeeded / transmitted`, 0.0 when nothing was transmitted
    pub efficiency: f64,
    pub throughput_mbps: f64,
}

impl SimReport {
    /// False when no frame ever reached the medium, in which case
    /// `efficiency` carries no information.
    pub fn has_traffic(&self) -> bool {
        self.transmitted > 0
    }
}

#[derive(Debug, Default, Clone)]
struct Totals {
    transmitted: u64,
    succeeded: u64,
    dropped: u64,
    collision_rounds: u64,
    deferrals: u64,
    rounds: u64,
    last_sender_time: SimTime,
}

impl Totals {
    fn record(&mut self, outcome: &RoundOutcome) {
        self.transmitted += outcome.transmitted;
        self.succeeded += outcome.succeeded;
        self.dropped += outcome.dropped;
        self.deferrals += outcome.deferred as u64;
        if outcome.is_collision() {
            self.collision_rounds += 1;
        }
        self.rounds += 1;
        self.last_sender_time = outcome.sender_time;
    }
}

/// Owns every station of one run and drives contention rounds over them
pub struct CsmaEngine<R: Rng> {
    config: ChannelConfig,
    nodes: Vec<Node>,
    rng: R,
    arrival_rate: f64,
    totals: Totals,
    event_sink: Box<dyn EventSink>,
}

impl<R: Rng> CsmaEngine<R> {
    /// Create `population` stations with Poisson arrivals at `arrival_rate`,
    /// pregenerated up to the configured horizon.
    pub fn with_arrivals(
        config: ChannelConfig,
        population: usize,
        arrival_rate: f64,
        mut rng: R,
    ) -> CsmaResult<Self> {
        config.validate()?;

        let mut nodes = Vec::with_capacity(population);
        for index in 0..population {
            let arrivals = pregen_arrivals(arrival_rate, config.horizon, &mut rng)?;
            nodes.push(Node::new(index, arrivals));
        }

        debug!(
            "generated {} frames for {} nodes at {} pkt/s",
            nodes.iter().map(Node::len).sum::<usize>(),
            population,
            arrival_rate
        );

        Ok(Self::from_nodes(config, nodes, arrival_rate, rng))
    }

    /// Create one station per schedule, in bus order.
    ///
    /// Schedules must be non-negative and sorted.
    pub fn from_schedules(
        config: ChannelConfig,
        schedules: &[Vec<SimTime>],
        rng: R,
    ) -> CsmaResult<Self> {
        config.validate()?;

        let mut nodes = Vec::with_capacity(schedules.len());
        for (index, schedule) in schedules.iter().enumerate() {
            if let Some(bad) = schedule.iter().find(|t| !t.is_finite() || **t < 0.0) {
                return Err(CsmaError::InvalidSchedule {
                    node: index,
                    reason: format!("timestamp {} is not a non-negative time", bad),
                });
            }
            let node = Node::from_schedule(index, schedule);
            if !node.is_sorted() {
                return Err(CsmaError::InvalidSchedule {
                    node: index,
                    reason: "timestamps are not in order".to_string(),
                });
            }
            nodes.push(node);
        }

        Ok(Self::from_nodes(config, nodes, 0.0, rng))
    }

    fn from_nodes(config: ChannelConfig, nodes: Vec<Node>, arrival_rate: f64, rng: R) -> Self {
        Self {
            config,
            nodes,
            rng,
            arrival_rate,
            totals: Totals::default(),
            event_sink: Box::new(NoOpSink),
        }
    }

    /// Route engine events to a custom sink for debugging/analysis
    pub fn with_sink(mut self, event_sink: Box<dyn EventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Play a single round.
    ///
    /// Returns `None` once there is no traffic left or the earliest pending
    /// frame arrives after the horizon.
    pub fn step(&mut self) -> Option<RoundOutcome> {
        let sender = select_sender(&self.nodes)?;
        let head = self.nodes[sender].head()?;
        if head > self.config.horizon {
            return None;
        }

        let outcome = resolve_round(
            &mut self.nodes,
            sender,
            &self.config,
            &mut self.rng,
            self.totals.rounds,
            &mut *self.event_sink,
        );
        self.totals.record(&outcome);
        Some(outcome)
    }

    /// Run rounds until the horizon is reached or traffic runs out.
    pub fn run(&mut self) -> SimReport {
        while self.step().is_some() {}

        let report = self.report();
        info!(
            "N={} rate={}: {} rounds, transmitted={} succeeded={} dropped={} eff={:.4} tp={:.4}Mbps",
            report.population,
            report.arrival_rate,
            report.rounds,
            report.transmitted,
            report.succeeded,
            report.dropped,
            report.efficiency,
            report.throughput_mbps
        );
        report
    }

    /// Snapshot of the counts accumulated so far
    pub fn report(&self) -> SimReport {
        let totals = &self.totals;
        let efficiency = if totals.transmitted == 0 {
            0.0
        } else {
            totals.succeeded as f64 / totals.transmitted as f64
        };

        SimReport {
            population: self.nodes.len(),
            arrival_rate: self.arrival_rate,
            transmitted: totals.transmitted,
            succeeded: totals.succeeded,
            dropped: totals.dropped,
            collision_rounds: totals.collision_rounds,
            deferrals: totals.deferrals,
            rounds: totals.rounds,
            last_sender_time: totals.last_sender_time,
            efficiency,
            throughput_mbps: self.config.throughput_mbps(totals.succeeded),
        }
    }
}

/// Simulate `population` stations offering `arrival_rate` packets/s each.
pub fn run_simulation<R: Rng>(
    population: usize,
    arrival_rate: f64,
    config: &ChannelConfig,
    rng: R,
) -> CsmaResult<SimReport> {
    let mut engine = CsmaEngine::with_arrivals(config.clone(), population, arrival_rate, rng)?;
    Ok(engine.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::from_seed([42u8; 32])
    }

    #[test]
    fn test_single_node_delivers_everything() {
        let config = ChannelConfig {
            horizon: 1.0,
            ..Default::default()
        };
        let mut engine =
            CsmaEngine::from_schedules(config, &[vec![0.1, 0.3, 0.9]], rng()).unwrap();

        let report = engine.run();

        assert_eq!(report.transmitted, 3);
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.efficiency, 1.0);
        assert_eq!(report.rounds, 3);
        assert!(engine.nodes()[0].is_idle());
    }

    #[test]
    fn test_frames_past_horizon_are_not_sent() {
        let config = ChannelConfig {
            horizon: 1.0,
            ..Default::default()
        };
        let mut engine =
            CsmaEngine::from_schedules(config, &[vec![0.2, 1.5], vec![2.0]], rng()).unwrap();

        let report = engine.run();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.last_sender_time, 0.2);
        assert_eq!(engine.nodes()[0].head(), Some(1.5));
        assert_eq!(engine.nodes()[1].head(), Some(2.0));
    }

    #[test]
    fn test_no_traffic_reports_zero_efficiency() {
        let mut engine =
            CsmaEngine::from_schedules(ChannelConfig::default(), &[vec![], vec![]], rng())
                .unwrap();

        let report = engine.run();

        assert!(!report.has_traffic());
        assert_eq!(report.efficiency, 0.0);
        assert_eq!(report.throughput_mbps, 0.0);
        assert_eq!(engine.step(), None);
    }

    #[test]
    fn test_rejects_bad_schedules() {
        let negative =
            CsmaEngine::from_schedules(ChannelConfig::default(), &[vec![-0.1]], rng());
        assert!(matches!(
            negative,
            Err(CsmaError::InvalidSchedule { node: 0, .. })
        ));

        let unordered =
            CsmaEngine::from_schedules(ChannelConfig::default(), &[vec![0.0], vec![0.5, 0.2]], rng());
        assert!(matches!(
            unordered,
            Err(CsmaError::InvalidSchedule { node: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_arrival_rate() {
        let result = run_simulation(5, 0.0, &ChannelConfig::default(), rng());

        assert_eq!(result, Err(CsmaError::InvalidArrivalRate(0.0)));
    }

    #[test]
    fn test_zero_population() {
        let report = run_simulation(0, 5.0, &ChannelConfig::default(), rng()).unwrap();

        assert_eq!(report.population, 0);
        assert!(!report.has_traffic());
    }

    #[test]
    fn test_step_keeps_queues_sorted() {
        let config = ChannelConfig {
            horizon: 1.0,
            ..Default::default()
        };
        let mut engine = CsmaEngine::with_arrivals(config, 20, 20.0, rng()).unwrap();

        while let Some(outcome) = engine.step() {
            assert!(outcome.succeeded <= outcome.transmitted);
            for node in engine.nodes() {
                assert!(node.is_sorted());
                assert!(node.collisions() <= engine.config().max_retries);
            }
        }
    }

    #[test]
    fn test_report_ratios_in_range() {
        let config = ChannelConfig {
            horizon: 2.0,
            ..Default::default()
        };

        for (population, rate) in [(5, 7.0), (20, 10.0), (40, 20.0)] {
            let report = run_simulation(population, rate, &config, rng()).unwrap();

            assert!(report.has_traffic());
            assert!(report.succeeded <= report.transmitted);
            assert!((0.0..=1.0).contains(&report.efficiency));
            assert!(report.throughput_mbps >= 0.0);
            assert!(report.last_sender_time <= config.horizon);
        }
    }

    #[test]
    fn test_same_seed_same_report() {
        let config = ChannelConfig {
            horizon: 2.0,
            ..Default::default()
        };

        let a = run_simulation(30, 10.0, &config, rng()).unwrap();
        let b = run_simulation(30, 10.0, &config, rng()).unwrap();

        assert_eq!(a, b);
    }
}
