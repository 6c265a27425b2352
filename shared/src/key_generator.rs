use std::collections::VecDeque;
use std::marker::PhantomData;

use crate::types::Handle;

/// Issues fresh handles of a given type, recycling the handles of resigned
/// federates and deleted objects so long-running federations do not exhaust
/// the handle space.
pub struct HandleGenerator<K: Handle> {
    next: u32,
    recycled: VecDeque<u32>,
    phantom: PhantomData<K>,
}

impl<K: Handle> HandleGenerator<K> {
    pub fn new() -> Self {
        Self {
            next: 1,
            recycled: VecDeque::new(),
            phantom: PhantomData,
        }
    }

    /// Produces a handle that is not held by any live entity.
    pub fn generate(&mut self) -> K {
        if let Some(value) = self.recycled.pop_front() {
            return K::from_u32(value);
        }
        let value = self.next;
        self.next = self
            .next
            .checked_add(1)
            .expect("handle space exhausted without recycling");
        K::from_u32(value)
    }

    /// Returns a handle to the pool once its owner is gone. The caller must
    /// not recycle a handle that is still referenced anywhere.
    pub fn recycle(&mut self, handle: K) {
        self.recycled.push_back(handle.to_u32());
    }
}

impl<K: Handle> Default for HandleGenerator<K> {
    fn default() -> Self {
        Self::new()
    }
}
