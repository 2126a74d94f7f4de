//! FIFO of events raised while another event is being processed.

use std::collections::VecDeque;

#[derive(Debug)]
pub(crate) struct EventQueue<E> {
    pending: VecDeque<E>,
}

impl<E> EventQueue<E> {
    pub(crate) fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub(crate) fn push(&mut self, event: E) {
        self.pending.push_back(event);
    }

    pub(crate) fn pop(&mut self) -> Option<E> {
        self.pending.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_leave_in_insertion_order() {
        let mut queue = EventQueue::new();
        queue.push("first");
        queue.push("second");
        queue.push("third");

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some("first"));
        assert_eq!(queue.pop(), Some("second"));
        assert_eq!(queue.pop(), Some("third"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn clear_drops_pending_events() {
        let mut queue = EventQueue::new();
        queue.push(1);
        queue.clear();
        assert!(queue.is_empty());
    }
}
