use heapless::Deque;

use crate::error::TouchError;

use super::types::TouchEvent;

/// Fixed-capacity FIFO of debounced events. A full queue rejects new events
/// and keeps the unread ones.
pub struct EventQueue<const N: usize> {
    events: Deque<TouchEvent, N>,
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventQueue<N> {
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
        }
    }

    pub fn push(&mut self, event: TouchEvent) -> Result<(), TouchError> {
        self.events
            .push_back(event)
            .map_err(|_| TouchError::QueueFull)
    }

    pub fn pop(&mut self) -> Option<TouchEvent> {
        self.events.pop_front()
    }

    pub fn flush(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.events.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(x: u16) -> TouchEvent {
        TouchEvent { x, y: x + 1 }
    }

    #[test]
    fn events_come_out_in_push_order() {
        let mut queue = EventQueue::<4>::new();
        queue.push(event(1)).expect("space");
        queue.push(event(2)).expect("space");
        assert_eq!(queue.pop(), Some(event(1)));
        assert_eq!(queue.pop(), Some(event(2)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn full_queue_drops_newest_and_keeps_contents() {
        let mut queue = EventQueue::<3>::new();
        for x in 1..=3 {
            queue.push(event(x)).expect("space");
        }
        assert!(queue.is_full());
        assert_eq!(queue.push(event(99)), Err(TouchError::QueueFull));
        assert_eq!(queue.len(), 3);
        let drained: std::vec::Vec<_> = core::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, [event(1), event(2), event(3)]);
    }

    #[test]
    fn wraps_around_after_partial_drain() {
        let mut queue = EventQueue::<2>::new();
        queue.push(event(1)).expect("space");
        queue.push(event(2)).expect("space");
        assert_eq!(queue.pop(), Some(event(1)));
        queue.push(event(3)).expect("space");
        assert_eq!(queue.pop(), Some(event(2)));
        assert_eq!(queue.pop(), Some(event(3)));
        assert!(queue.is_empty());
    }

    #[test]
    fn flush_discards_pending_events() {
        let mut queue = EventQueue::<2>::default();
        queue.push(event(5)).expect("space");
        queue.flush();
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 2);
    }
}
