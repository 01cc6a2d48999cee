//! Bounded buffers owned by the sync client.
//!
//! Both buffers store envelopes by value and evict from the front when
//! full: the outbound queue so that memory stays bounded while offline
//! (old, likely-stale edits go first), the history so the diagnostics view
//! always shows the most recent traffic.

use std::collections::VecDeque;

use crate::protocol::Envelope;

/// FIFO of envelopes awaiting transmission.
///
/// Capacity eviction here is the only place the sync core ever drops an
/// outbound message; transmission failures leave the message at the head.
#[derive(Debug)]
pub struct OutboundQueue {
    queue: VecDeque<Envelope>,
    max_size: usize,
}

impl OutboundQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
        }
    }

    /// Append an envelope. Returns the evicted oldest entry when the queue
    /// was already full, so the caller can surface the drop as a warning.
    pub fn push(&mut self, envelope: Envelope) -> Option<Envelope> {
        let evicted = if self.queue.len() >= self.max_size {
            self.queue.pop_front()
        } else {
            None
        };
        self.queue.push_back(envelope);
        evicted
    }

    /// The next envelope to transmit, without removing it.
    pub fn front(&self) -> Option<&Envelope> {
        self.queue.front()
    }

    /// Remove the head after a confirmed send.
    pub fn pop_front(&mut self) -> Option<Envelope> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

/// Most recent inbound envelopes, oldest evicted first.
///
/// Read-only to consumers; for diagnostics and UI display, not replay.
#[derive(Debug)]
pub struct MessageHistory {
    entries: VecDeque<Envelope>,
    max_size: usize,
}

impl MessageHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    pub fn push(&mut self, envelope: Envelope) {
        if self.entries.len() >= self.max_size {
            self.entries.pop_front();
        }
        self.entries.push_back(envelope);
    }

    /// Snapshot of the retained envelopes, oldest first.
    pub fn recent(&self) -> Vec<Envelope> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Envelope;

    fn envelope(id: usize) -> Envelope {
        Envelope::element_delete("proj-1", &format!("e-{id}"), "user-1")
    }

    #[test]
    fn test_queue_preserves_fifo_order() {
        let mut queue = OutboundQueue::new(10);
        for i in 0..5 {
            assert!(queue.push(envelope(i)).is_none());
        }

        assert_eq!(queue.len(), 5);
        for i in 0..5 {
            assert_eq!(queue.pop_front().unwrap().payload.id, format!("e-{i}"));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_drops_oldest_on_overflow() {
        let mut queue = OutboundQueue::new(3);
        for i in 0..3 {
            queue.push(envelope(i));
        }

        let evicted = queue.push(envelope(3));
        assert_eq!(evicted.unwrap().payload.id, "e-0");
        assert_eq!(queue.len(), 3);

        // Most recent entries survive, in order.
        assert_eq!(queue.front().unwrap().payload.id, "e-1");
        queue.pop_front();
        queue.pop_front();
        assert_eq!(queue.pop_front().unwrap().payload.id, "e-3");
    }

    #[test]
    fn test_queue_holds_min_of_pushes_and_capacity() {
        let mut queue = OutboundQueue::new(100);
        for i in 0..250 {
            queue.push(envelope(i));
        }
        assert_eq!(queue.len(), 100);
        assert_eq!(queue.front().unwrap().payload.id, "e-150");
    }

    #[test]
    fn test_history_caps_and_keeps_newest() {
        let mut history = MessageHistory::new(100);
        for i in 0..150 {
            history.push(envelope(i));
        }

        assert_eq!(history.len(), 100);
        let recent = history.recent();
        // Frames 51..150 (zero-indexed 50..149) survive.
        assert_eq!(recent.first().unwrap().payload.id, "e-50");
        assert_eq!(recent.last().unwrap().payload.id, "e-149");
    }

    #[test]
    fn test_history_clear() {
        let mut history = MessageHistory::new(10);
        history.push(envelope(0));
        history.clear();
        assert!(history.is_empty());
    }
}
