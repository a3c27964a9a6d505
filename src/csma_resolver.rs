//! Contention resolution
//!
//! One round picks the station whose head frame arrived first and plays its
//! transmission against every other station on the bus:
//!
//! - a station whose head arrives before the sender's first bit reaches it
//!   cannot have sensed the carrier and collides;
//! - a station whose head arrives while the sender's frame is passing it senses
//!   the channel busy and defers to the end of the frame;
//! - everybody else is unaffected.
//!
//! If anybody collided, every involved station (sender included) backs off and
//! nothing is delivered. Otherwise the sender's head frame is delivered.

use log::{debug, trace};
use rand::Rng;

use crate::csma_backoff::{apply_backoff, BackoffOutcome};
use crate::csma_config::ChannelConfig;
use crate::csma_interface::{Event, EventSink, NodeIndex, Role, RoundOutcome, SimTime};
use crate::csma_node::Node;

/// Station holding the earliest pending frame.
///
/// Ties go to the lowest index. Returns `None` once every queue is empty.
pub fn select_sender(nodes: &[Node]) -> Option<NodeIndex> {
    let mut best: Option<(NodeIndex, SimTime)> = None;

    for (index, node) in nodes.iter().enumerate() {
        let Some(head) = node.head() else {
            continue;
        };
        match best {
            // strict comparison keeps the earlier index on ties
            Some((_, best_head)) if head >= best_head => {}
            _ => best = Some((index, head)),
        }
    }

    best.map(|(index, _)| index)
}

/// Play one round with `sender` transmitting its head frame.
///
/// Every queue touched is left sorted. `round` is only used to tag events.
pub fn resolve_round<R: Rng + ?Sized>(
    nodes: &mut [Node],
    sender: NodeIndex,
    config: &ChannelConfig,
    rng: &mut R,
    round: u64,
    sink: &mut dyn EventSink,
) -> RoundOutcome {
    let Some(reference) = nodes.get(sender).and_then(Node::head) else {
        return RoundOutcome {
            sender,
            ..Default::default()
        };
    };

    let t_trans = config.transmission_time();
    let mut outcome = RoundOutcome {
        sender,
        sender_time: reference,
        ..Default::default()
    };
    let mut colliders: Vec<NodeIndex> = Vec::new();

    for (index, node) in nodes.iter_mut().enumerate() {
        if index == sender {
            continue;
        }
        let Some(head) = node.head() else {
            continue;
        };

        let propagation = config.propagation(sender, index);
        let first_bit = reference + propagation;
        let last_bit = first_bit + t_trans;

        if head <= first_bit {
            sink.log(
                round,
                index,
                Event::Collision {
                    with: sender,
                    time: head,
                    propagation,
                },
            );
            let backoff = apply_backoff(node, Role::Receiver, propagation, reference, config, rng);
            record_backoff(&mut outcome, round, index, Role::Receiver, backoff, sink);
            colliders.push(index);
        } else if head < last_bit {
            node.set_head(last_bit);
            let cascaded = node.raise_window(1, first_bit, last_bit);
            node.repair();

            outcome.deferred += 1;
            sink.log(
                round,
                index,
                Event::Deferred {
                    sender,
                    from: head,
                    to: last_bit,
                    cascaded,
                },
            );
        }
    }

    let sender_node = &mut nodes[sender];

    if !colliders.is_empty() {
        // back off long enough to clear the furthest collider
        let furthest = colliders
            .iter()
            .map(|&index| config.propagation(sender, index))
            .fold(0.0, f64::max);

        debug!(
            "round {}: node {} at {:.6} collided with {} node(s), furthest {:.3e}s",
            round,
            sender,
            reference,
            colliders.len(),
            furthest
        );

        let backoff = apply_backoff(sender_node, Role::Sender, furthest, reference, config, rng);
        record_backoff(&mut outcome, round, sender, Role::Sender, backoff, sink);

        outcome.colliders = colliders.len();
        outcome.transmitted = 1 + colliders.len() as u64;
        outcome.succeeded = 0;
        return outcome;
    }

    // frames queued behind the head cannot start before it has left the wire
    if sender_node.len() > 1 {
        sender_node.raise_window(1, f64::NEG_INFINITY, reference + t_trans);
    }
    sender_node.reset_collisions();
    sender_node.pop_head();
    sender_node.repair();

    trace!(
        "round {}: node {} delivered frame from {:.6}, {} left",
        round,
        sender,
        reference,
        sender_node.len()
    );
    sink.log(
        round,
        sender,
        Event::Transmitted {
            time: reference,
            remaining: sender_node.len(),
        },
    );

    outcome.transmitted = 1;
    outcome.succeeded = 1;
    outcome
}

fn record_backoff(
    outcome: &mut RoundOutcome,
    round: u64,
    node: NodeIndex,
    role: Role,
    backoff: BackoffOutcome,
    sink: &mut dyn EventSink,
) {
    match backoff {
        BackoffOutcome::Rescheduled {
            attempt,
            delay,
            new_head,
        } => sink.log(
            round,
            node,
            Event::BackedOff {
                role,
                attempt,
                delay,
                new_head,
            },
        ),
        BackoffOutcome::Dropped { time } => {
            outcome.dropped += 1;
            sink.log(round, node, Event::Dropped { time });
        }
        BackoffOutcome::Idle => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csma_interface::NoOpSink;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Keeps every event for inspection
    #[derive(Default)]
    struct RecordingSink {
        events: Vec<(u64, NodeIndex, Event)>,
    }

    impl EventSink for RecordingSink {
        fn log(&mut self, round: u64, node: NodeIndex, event: Event) {
            self.events.push((round, node, event));
        }
    }

    fn rng() -> StdRng {
        StdRng::from_seed([21u8; 32])
    }

    fn nodes(schedules: &[&[SimTime]]) -> Vec<Node> {
        schedules
            .iter()
            .enumerate()
            .map(|(index, schedule)| Node::from_schedule(index, schedule))
            .collect()
    }

    #[test]
    fn test_select_sender_picks_earliest_head() {
        let nodes = nodes(&[&[0.5, 0.6], &[0.2], &[], &[0.3]]);

        assert_eq!(select_sender(&nodes), Some(1));
    }

    #[test]
    fn test_select_sender_tie_goes_to_lowest_index() {
        let nodes = nodes(&[&[], &[0.4], &[0.1], &[0.1], &[0.1]]);

        assert_eq!(select_sender(&nodes), Some(2));
    }

    #[test]
    fn test_select_sender_no_traffic() {
        let nodes = nodes(&[&[], &[]]);

        assert_eq!(select_sender(&nodes), None);
        assert_eq!(select_sender(&[]), None);
    }

    #[test]
    fn test_select_sender_random_queue_sets() {
        let mut rng = StdRng::from_seed([33u8; 32]);

        for _ in 0..500 {
            let count = rng.gen_range(1..12);
            let mut nodes = Vec::with_capacity(count);
            for index in 0..count {
                if rng.gen_bool(0.2) {
                    nodes.push(Node::from_schedule(index, &[]));
                } else {
                    // coarse grid so ties are common
                    let head = rng.gen_range(0..8) as f64 * 0.25;
                    nodes.push(Node::from_schedule(index, &[head, head + 1.0]));
                }
            }

            let expected = nodes
                .iter()
                .filter_map(|n| n.head().map(|h| (n.index(), h)))
                .fold(None, |best: Option<(NodeIndex, SimTime)>, (i, h)| match best {
                    Some((_, bh)) if bh <= h => best,
                    _ => Some((i, h)),
                })
                .map(|(i, _)| i);

            let selected = select_sender(&nodes);
            assert_eq!(selected, expected);
            if let Some(index) = selected {
                let head = nodes[index].head().unwrap();
                for node in &nodes {
                    if let Some(other) = node.head() {
                        assert!(head < other || (head == other && index <= node.index()));
                    }
                }
            }
        }
    }

    #[test]
    fn test_clean_transmission_pops_head() {
        let config = ChannelConfig::default();
        let mut nodes = nodes(&[&[1.0, 3.0], &[2.0]]);
        nodes[0].increment_collisions();

        let outcome = resolve_round(&mut nodes, 0, &config, &mut rng(), 0, &mut NoOpSink);

        assert_eq!(outcome.transmitted, 1);
        assert_eq!(outcome.succeeded, 1);
        assert!(!outcome.is_collision());
        assert_eq!(nodes[0].pending().iter().copied().collect::<Vec<_>>(), vec![3.0]);
        assert_eq!(nodes[0].collisions(), 0);
        assert_eq!(nodes[1].head(), Some(2.0));
    }

    #[test]
    fn test_last_frame_empties_queue() {
        let config = ChannelConfig::default();
        let mut nodes = nodes(&[&[0.4]]);
        nodes[0].increment_collisions();

        let outcome = resolve_round(&mut nodes, 0, &config, &mut rng(), 0, &mut NoOpSink);

        assert_eq!((outcome.transmitted, outcome.succeeded), (1, 1));
        assert!(nodes[0].is_idle());
        assert_eq!(nodes[0].collisions(), 0);
    }

    #[test]
    fn test_back_to_back_frames_serialize() {
        let config = ChannelConfig::default();
        let end = 1.0 + config.transmission_time();
        let mut nodes = nodes(&[&[1.0, 1.0005, 1.001, 2.0]]);

        resolve_round(&mut nodes, 0, &config, &mut rng(), 0, &mut NoOpSink);

        assert_eq!(
            nodes[0].pending().iter().copied().collect::<Vec<_>>(),
            vec![end, end, 2.0]
        );
    }

    #[test]
    fn test_busy_channel_cascade() {
        let config = ChannelConfig::default();
        let t_trans = config.transmission_time();
        let a = 1.0;
        let first_bit = a + config.propagation(0, 1);
        let last_bit = first_bit + t_trans;
        let mut nodes = nodes(&[
            &[a],
            &[
                first_bit + 0.0001,
                first_bit + 0.0002,
                first_bit + 0.0009,
                last_bit + 0.5,
                first_bit + 0.0003,
            ],
        ]);
        let mut sink = RecordingSink::default();

        let outcome = resolve_round(&mut nodes, 0, &config, &mut rng(), 7, &mut sink);

        assert_eq!((outcome.transmitted, outcome.succeeded), (1, 1));
        assert_eq!(outcome.deferred, 1);
        assert_eq!(
            nodes[1].pending().iter().copied().collect::<Vec<_>>(),
            vec![last_bit, last_bit, last_bit, last_bit + 0.5, first_bit + 0.0003]
        );
        assert_eq!(nodes[1].collisions(), 0);
        assert!(sink.events.contains(&(
            7,
            1,
            Event::Deferred {
                sender: 0,
                from: first_bit + 0.0001,
                to: last_bit,
                cascaded: 2,
            }
        )));
    }

    #[test]
    fn test_collision_boundary_is_inclusive() {
        let config = ChannelConfig::default();
        let a = 0.5;
        let first_bit = a + config.propagation(0, 3);
        let mut nodes = nodes(&[&[a], &[], &[], &[first_bit]]);

        let outcome = resolve_round(&mut nodes, 0, &config, &mut rng(), 0, &mut NoOpSink);

        assert!(outcome.is_collision());
        assert_eq!(outcome.colliders, 1);
        assert_eq!((outcome.transmitted, outcome.succeeded), (2, 0));
        assert_eq!(nodes[0].collisions(), 1);
        assert_eq!(nodes[3].collisions(), 1);
    }

    #[test]
    fn test_end_of_frame_is_clear_channel() {
        let config = ChannelConfig::default();
        let a = 0.5;
        let last_bit = a + config.propagation(0, 2) + config.transmission_time();
        let mut nodes = nodes(&[&[a], &[], &[last_bit, last_bit + 1.0]]);

        let outcome = resolve_round(&mut nodes, 0, &config, &mut rng(), 0, &mut NoOpSink);

        assert_eq!((outcome.transmitted, outcome.succeeded), (1, 1));
        assert_eq!(outcome.deferred, 0);
        assert_eq!(nodes[2].head(), Some(last_bit));
        assert_eq!(nodes[2].collisions(), 0);
    }

    #[test]
    fn test_sender_backoff_uses_furthest_collider_index() {
        let config = ChannelConfig::default();
        let a = 2.0;
        let empty: &[SimTime] = &[];
        let busy = [a];
        let mut schedules = vec![empty; 8];
        schedules[0] = &busy;
        schedules[7] = &busy;
        let mut nodes = nodes(&schedules);
        let mut sink = RecordingSink::default();

        let outcome = resolve_round(&mut nodes, 0, &config, &mut rng(), 0, &mut sink);

        assert_eq!(outcome.colliders, 1);
        let furthest = config.propagation(0, 7);
        let sender_backoff = sink
            .events
            .iter()
            .find_map(|(_, node, event)| match event {
                Event::BackedOff {
                    role: Role::Sender,
                    delay,
                    new_head,
                    ..
                } if *node == 0 => Some((*delay, *new_head)),
                _ => None,
            })
            .expect("sender must back off");
        assert_eq!(sender_backoff.1, a + furthest + sender_backoff.0);
        assert_eq!(nodes[0].head(), Some(sender_backoff.1));
    }

    #[test]
    fn test_receiver_backoff_anchored_on_sender() {
        let config = ChannelConfig::default();
        let a = 1.0;
        let mut nodes = nodes(&[&[], &[], &[a], &[], &[a - 0.25]]);
        let mut sink = RecordingSink::default();

        // node 4 arrived earlier but node 2 is forced to send
        let outcome = resolve_round(&mut nodes, 2, &config, &mut rng(), 0, &mut sink);

        assert!(outcome.is_collision());
        let receiver = sink
            .events
            .iter()
            .find_map(|(_, node, event)| match event {
                Event::BackedOff {
                    role: Role::Receiver,
                    delay,
                    new_head,
                    ..
                } if *node == 4 => Some((*delay, *new_head)),
                _ => None,
            })
            .expect("receiver must back off");
        assert_eq!(receiver.1, a + config.propagation(2, 4) + receiver.0);
    }

    #[test]
    fn test_round_keeps_all_queues_sorted() {
        let config = ChannelConfig::default();
        let mut rng = StdRng::from_seed([44u8; 32]);

        for _ in 0..200 {
            let count = rng.gen_range(1..10);
            let mut nodes: Vec<Node> = (0..count)
                .map(|index| {
                    let mut t = rng.gen_range(0.0..0.003);
                    let len = rng.gen_range(0..6);
                    let schedule: Vec<SimTime> = (0..len)
                        .map(|_| {
                            t += rng.gen_range(0.0..0.002);
                            t
                        })
                        .collect();
                    Node::from_schedule(index, &schedule)
                })
                .collect();

            if let Some(sender) = select_sender(&nodes) {
                let outcome =
                    resolve_round(&mut nodes, sender, &config, &mut rng, 0, &mut NoOpSink);
                assert!(outcome.succeeded <= outcome.transmitted);
            }
            for node in &nodes {
                assert!(node.is_sorted(), "unsorted queue {:?}", node.pending());
            }
        }
    }
}
