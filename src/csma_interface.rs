// shared types for the contention engine

// position on the bus - doubles as identity and as distance unit
pub type NodeIndex = usize;

// simulated time in seconds
pub type SimTime = f64;

/// Collisions a head packet may suffer before it is dropped
pub const MAX_RETRIES: u32 = 10;

/// Backoff slot, in bit-times at the channel rate
pub const BACKOFF_SLOT_BITS: u32 = 512;

/// Side of a collision a node was on when its backoff is computed.
///
/// The sender advances from its own head timestamp, a receiver re-synchronizes
/// to the timestamp at which the sender started transmitting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Sender,
    Receiver,
}

/// Result of one contention round
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RoundOutcome {
    /// Node selected as sender for this round
    pub sender: NodeIndex,
    /// Head timestamp of the sender when the round started
    pub sender_time: SimTime,
    /// Frames that touched the medium (sender plus every collider)
    pub transmitted: u64,
    /// Frames delivered (0 or 1)
    pub succeeded: u64,
    /// Nodes whose head collided with the sender
    pub colliders: usize,
    /// Nodes that sensed the channel busy and deferred
    pub deferred: usize,
    /// Packets dropped after exceeding the retry limit
    pub dropped: u64,
}

impl RoundOutcome {
    pub fn is_collision(&self) -> bool {
        self.colliders > 0
    }
}

// ============================================================================
// Event Logging System
// ============================================================================

/// Events emitted by the contention engine for debugging and analysis
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Sender put a frame on the medium without interference
    Transmitted { time: SimTime, remaining: usize },
    /// Another node's head overlapped the sender's frame
    Collision {
        with: NodeIndex,
        time: SimTime,
        propagation: SimTime,
    },
    /// Node sensed the channel busy and moved its head to the end of the frame
    Deferred {
        sender: NodeIndex,
        from: SimTime,
        to: SimTime,
        cascaded: usize,
    },
    /// Head packet rescheduled by binary exponential backoff
    BackedOff {
        role: Role,
        attempt: u32,
        delay: SimTime,
        new_head: SimTime,
    },
    /// Head packet dropped after exceeding the retry limit
    Dropped { time: SimTime },
}

/// Trait for consuming events from the contention engine
pub trait EventSink {
    fn log(&mut self, round: u64, node: NodeIndex, event: Event);
}

/// No-op event sink for plain runs (zero overhead)
pub struct NoOpSink;

impl EventSink for NoOpSink {
    #[inline(always)]
    fn log(&mut self, _round: u64, _node: NodeIndex, _event: Event) {}
}
