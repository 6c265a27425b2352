use std::collections::VecDeque;

use log::trace;

use pergola_shared::{Callback, FederateHandle};

/// Callbacks emitted by the executive, waiting to be handed to federates.
///
/// Order is preserved exactly as emitted. The caller drains the outbox after
/// each request (or batch of requests) and forwards every callback to its
/// addressee; the executive never delivers anything itself.
pub struct Events {
    queue: VecDeque<(FederateHandle, Callback)>,
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Removes and returns every pending callback, in emission order.
    pub fn drain(&mut self) -> impl Iterator<Item = (FederateHandle, Callback)> + '_ {
        self.queue.drain(..)
    }

    /// Removes and returns the callbacks addressed to one federate,
    /// preserving their relative order.
    pub fn take_for(&mut self, federate: FederateHandle) -> Vec<Callback> {
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(self.queue.len());
        for (addressee, callback) in self.queue.drain(..) {
            if addressee == federate {
                taken.push(callback);
            } else {
                kept.push_back((addressee, callback));
            }
        }
        self.queue = kept;
        taken
    }

    pub(crate) fn push(&mut self, federate: FederateHandle, callback: Callback) {
        trace!("callback for federate {federate}: {callback:?}");
        self.queue.push_back((federate, callback));
    }

    /// Drops everything addressed to a federate that is gone.
    pub(crate) fn discard_for(&mut self, federate: FederateHandle) {
        self.queue.retain(|(addressee, _)| *addressee != federate);
    }
}
