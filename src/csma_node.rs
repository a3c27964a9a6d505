// per-station queue of pending arrivals

use std::collections::VecDeque;

use crate::csma_interface::{NodeIndex, SimTime};

/// A station on the bus.
///
/// `pending` holds the arrival timestamps of every frame still waiting to be
/// sent, oldest first. `collisions` counts consecutive collisions of the head
/// frame only.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    index: NodeIndex,
    pending: VecDeque<SimTime>,
    collisions: u32,
}

impl Node {
    pub fn new(index: NodeIndex, pending: VecDeque<SimTime>) -> Self {
        Self {
            index,
            pending,
            collisions: 0,
        }
    }

    pub fn from_schedule(index: NodeIndex, schedule: &[SimTime]) -> Self {
        Self::new(index, schedule.iter().copied().collect())
    }

    pub fn index(&self) -> NodeIndex {
        self.index
    }

    pub fn head(&self) -> Option<SimTime> {
        self.pending.front().copied()
    }

    pub fn second(&self) -> Option<SimTime> {
        self.pending.get(1).copied()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// An idle station has nothing left to send and never will again.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &VecDeque<SimTime> {
        &self.pending
    }

    pub fn collisions(&self) -> u32 {
        self.collisions
    }

    pub fn increment_collisions(&mut self) -> u32 {
        self.collisions += 1;
        self.collisions
    }

    pub fn reset_collisions(&mut self) {
        self.collisions = 0;
    }

    /// Overwrite the head timestamp. Does nothing on an idle station.
    ///
    /// The tail may be left out of order; callers follow up with [`Node::repair`].
    pub fn set_head(&mut self, time: SimTime) {
        if let Some(head) = self.pending.front_mut() {
            *head = time;
        }
    }

    pub fn pop_head(&mut self) -> Option<SimTime> {
        self.pending.pop_front()
    }

    /// Restore ordering after the head moved.
    ///
    /// Entries behind the head that now arrive before it are pulled up to the
    /// head value. The tail was sorted before the head changed, so the scan
    /// stops at the first entry already at or after the head.
    pub fn repair(&mut self) {
        let Some(head) = self.head() else {
            return;
        };

        for entry in self.pending.iter_mut().skip(1) {
            if *entry < head {
                *entry = head;
            } else {
                break;
            }
        }
    }

    /// Raise queued entries from position `start` onward to `boundary`.
    ///
    /// An entry is raised while it lies strictly between `floor` and
    /// `boundary`; the scan stops at the first entry outside that window.
    /// Pass `f64::NEG_INFINITY` as `floor` to raise everything below
    /// `boundary`. Returns the number of entries moved.
    pub fn raise_window(
        &mut self,
        start: usize,
        floor: SimTime,
        boundary: SimTime,
    ) -> usize {
        let mut moved = 0;
        for entry in self.pending.iter_mut().skip(start) {
            if floor < *entry && *entry < boundary {
                *entry = boundary;
                moved += 1;
            } else {
                break;
            }
        }
        moved
    }

    pub fn is_sorted(&self) -> bool {
        self.pending
            .iter()
            .zip(self.pending.iter().skip(1))
            .all(|(a, b)| a <= b)
    }
}
