use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, VecDeque};

use log::trace;

use pergola_shared::{LogicalTime, RoutedMessage, SequenceNumber};

/// A timestamped message waiting for its destination to advance far enough.
#[derive(Clone, Debug)]
pub(crate) struct QueuedDelivery {
    pub timestamp: LogicalTime,
    sequence: SequenceNumber,
    pub message: RoutedMessage,
}

// Heap order is (timestamp, sequence). The sequence number is unique per
// queue, so equal timestamps come back out in arrival order.
impl PartialEq for QueuedDelivery {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp && self.sequence == other.sequence
    }
}

impl Eq for QueuedDelivery {}

impl PartialOrd for QueuedDelivery {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedDelivery {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// Per-federate delivery queue for a time-constrained destination.
///
/// Timestamp-ordered messages sit in a min-heap until a grant drains every
/// entry at or below the granted time. Receive-ordered messages held back
/// while asynchronous delivery is off wait in a FIFO backlog.
pub(crate) struct AdvanceQueue {
    heap: BinaryHeap<Reverse<QueuedDelivery>>,
    backlog: VecDeque<RoutedMessage>,
    next_sequence: SequenceNumber,
}

impl AdvanceQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            backlog: VecDeque::new(),
            next_sequence: 0,
        }
    }

    pub fn enqueue(&mut self, timestamp: LogicalTime, message: RoutedMessage) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        trace!("queued delivery at {timestamp} (sequence {sequence})");
        self.heap.push(Reverse(QueuedDelivery {
            timestamp,
            sequence,
            message,
        }));
    }

    /// Timestamp of the earliest queued message, if any.
    pub fn earliest(&self) -> Option<LogicalTime> {
        self.heap.peek().map(|entry| entry.0.timestamp)
    }

    /// Removes and returns every entry with timestamp at or below `bound`,
    /// in timestamp order (arrival order among equal timestamps).
    pub fn drain_up_to(&mut self, bound: LogicalTime) -> Vec<QueuedDelivery> {
        let mut drained = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if entry.0.timestamp > bound {
                break;
            }
            if let Some(Reverse(delivery)) = self.heap.pop() {
                drained.push(delivery);
            }
        }
        drained
    }

    /// Holds back a receive-ordered message until the next grant or until
    /// asynchronous delivery is switched on.
    pub fn hold(&mut self, message: RoutedMessage) {
        self.backlog.push_back(message);
    }

    /// Releases the receive-order backlog in arrival order.
    pub fn release_backlog(&mut self) -> Vec<RoutedMessage> {
        self.backlog.drain(..).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
