// binary exponential backoff and the retry-limit drop policy

use log::debug;
use rand::Rng;

use crate::csma_config::ChannelConfig;
use crate::csma_interface::{Role, SimTime};
use crate::csma_node::Node;

/// What happened to a node's head packet after a collision
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BackoffOutcome {
    /// Head packet will be retried at `new_head`
    Rescheduled {
        attempt: u32,
        delay: SimTime,
        new_head: SimTime,
    },
    /// Head packet exceeded the retry limit and was discarded
    Dropped { time: SimTime },
    /// Node had nothing queued
    Idle,
}

/// Random wait after the `attempt`-th consecutive collision:
/// `r * slot_time` with `r` uniform in `0..=2^attempt - 1`.
pub fn backoff_delay<R: Rng + ?Sized>(
    attempt: u32,
    config: &ChannelConfig,
    rng: &mut R,
) -> SimTime {
    let window = 1u64 << attempt;
    let slots = rng.gen_range(0..window);
    slots as f64 * config.slot_time()
}

/// Reschedule (or drop) a node's head packet after it was part of a collision.
///
/// The sender retries from its own head timestamp; a receiver retries from
/// `sender_reference`, the moment the sender started its frame. In both cases
/// `current_propagation` is added before the random backoff.
///
/// Once the collision counter exceeds `max_retries` the head packet is
/// discarded and the counter reset. The next packet, if any, takes over the
/// transmission slot the dropped frame would have ended at.
pub fn apply_backoff<R: Rng + ?Sized>(
    node: &mut Node,
    role: Role,
    current_propagation: SimTime,
    sender_reference: SimTime,
    config: &ChannelConfig,
    rng: &mut R,
) -> BackoffOutcome {
    let Some(head) = node.head() else {
        return BackoffOutcome::Idle;
    };

    let attempt = node.increment_collisions();

    if attempt > config.max_retries {
        node.reset_collisions();
        node.pop_head();

        if !node.is_idle() {
            node.set_head(head + config.transmission_time());
            node.repair();
        }

        debug!(
            "node {} dropped frame from {:.6} after {} collisions",
            node.index(),
            head,
            attempt - 1
        );
        return BackoffOutcome::Dropped { time: head };
    }

    let delay = backoff_delay(attempt, config, rng);
    let new_head = match role {
        Role::Sender => head + current_propagation + delay,
        Role::Receiver => sender_reference + current_propagation + delay,
    };

    node.set_head(new_head);
    node.repair();

    BackoffOutcome::Rescheduled {
        attempt,
        delay,
        new_head,
    }
}
