//! Event logging for sweeps

use csma_cd::{Event, EventSink, NodeIndex};
use log::{debug, trace};

/// Event sink that forwards engine events to the `log` facade.
///
/// Collisions, drops and backoffs go to `debug`; clean transmissions and
/// deferrals are chatty and go to `trace`.
pub struct LoggingEventSink {
    enabled: bool,
}

impl LoggingEventSink {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl EventSink for LoggingEventSink {
    fn log(&mut self, round: u64, node: NodeIndex, event: Event) {
        if !self.enabled {
            return;
        }

        match event {
            Event::Transmitted { time, remaining } => {
                trace!(
                    "{:>7} {:>4} tx      t:{:.6} left:{}",
                    round,
                    node,
                    time,
                    remaining
                );
            }
            Event::Collision {
                with,
                time,
                propagation,
            } => {
                debug!(
                    "{:>7} {:>4} coll    with:{} t:{:.6} prop:{:.3e}",
                    round, node, with, time, propagation
                );
            }
            Event::Deferred {
                sender,
                from,
                to,
                cascaded,
            } => {
                trace!(
                    "{:>7} {:>4} defer   by:{} {:.6} -> {:.6} (+{})",
                    round,
                    node,
                    sender,
                    from,
                    to,
                    cascaded
                );
            }
            Event::BackedOff {
                role,
                attempt,
                delay,
                new_head,
            } => {
                debug!(
                    "{:>7} {:>4} backoff {:?} #{} wait:{:.6} next:{:.6}",
                    round, node, role, attempt, delay, new_head
                );
            }
            Event::Dropped { time } => {
                debug!("{:>7} {:>4} drop    t:{:.6}", round, node, time);
            }
        }
    }
}
