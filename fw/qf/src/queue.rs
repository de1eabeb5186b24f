//! Bounded event queue of an active

use std::collections::VecDeque;

use fw_core::{FwError, FwResult, Hsmn};
use parking_lot::Mutex;

use crate::event::Evt;

pub struct EventQueue {
    owner: Hsmn,
    capacity: usize,
    events: Mutex<VecDeque<Evt>>,
    max_used: Mutex<usize>,
}

impl EventQueue {
    pub fn new(owner: Hsmn, capacity: usize) -> Self {
        Self {
            owner,
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            max_used: Mutex::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn push(&self, e: Evt, front: bool) -> FwResult<()> {
        let mut events = self.events.lock();
        if events.len() >= self.capacity {
            return Err(FwError::QueueFull(self.owner));
        }
        if front {
            events.push_front(e);
        } else {
            events.push_back(e);
        }
        let used = events.len();
        drop(events);
        let mut max_used = self.max_used.lock();
        *max_used = (*max_used).max(used);
        Ok(())
    }

    /// Append `e`.
    pub fn post(&self, e: Evt) -> FwResult<()> {
        self.push(e, false)
    }

    /// Insert `e` ahead of every queued event.
    pub fn post_front(&self, e: Evt) -> FwResult<()> {
        self.push(e, true)
    }

    pub fn pop(&self) -> Option<Evt> {
        self.events.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// High-water mark of queued events
    pub fn max_used(&self) -> usize {
        *self.max_used.lock()
    }

    pub fn contains(&self, pred: impl Fn(&Evt) -> bool) -> bool {
        self.events.lock().iter().any(pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fw_core::Signal;

    fn evt(n: u8) -> Evt {
        Evt::new(Signal::interface(Hsmn(1), n))
    }

    #[test]
    fn test_bounded_post() {
        let q = EventQueue::new(Hsmn(1), 2);
        q.post(evt(0)).unwrap();
        q.post(evt(1)).unwrap();
        assert_eq!(q.post(evt(2)), Err(FwError::QueueFull(Hsmn(1))));
        assert_eq!(q.max_used(), 2);
    }

    #[test]
    fn test_front_post_jumps_queue() {
        let q = EventQueue::new(Hsmn(1), 4);
        q.post(evt(0)).unwrap();
        q.post_front(evt(1)).unwrap();
        assert_eq!(q.pop().map(|e| e.signal.index()), Some(1));
        assert_eq!(q.pop().map(|e| e.signal.index()), Some(0));
        assert!(q.pop().is_none());
    }
}
