//! Command Queue — ordered record of output readiness.
//!
//! Every time a poll cycle finds a ready output slot, one
//! [`ReadinessEvent`] is appended. `get_frame` consumes events strictly
//! in FIFO order, so frames come out in the order the codec reported them,
//! which is not necessarily the order inputs were submitted.
//!
//! Historically each detection was written as two loose entries,
//! `(HasData, slot)` followed by `(NextPair, slot)`, that had to be popped
//! together. The queue stores one event per detection and only expands it
//! into that pair for the diagnostic [`CommandQueue::pairs`] view.

use std::collections::VecDeque;

use cs_common::SlotIndex;

/// Tag of a command-queue entry as seen through the diagnostic view.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// An output slot holds retrievable payload.
    HasData,
    /// Closes the pair opened by `HasData` for the same slot.
    NextPair,
}

/// One output slot detected as ready.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReadinessEvent {
    pub slot: SlotIndex,
}

impl ReadinessEvent {
    pub fn new(slot: SlotIndex) -> Self {
        Self { slot }
    }

    /// The `(HasData, slot)`, `(NextPair, slot)` pair this event stands for.
    pub fn pair(self) -> [(Command, SlotIndex); 2] {
        [(Command::HasData, self.slot), (Command::NextPair, self.slot)]
    }
}

/// FIFO of readiness events, each consumable exactly once.
///
/// No deduplication: if the codec reports the same slot twice, both
/// reports are kept.
#[derive(Clone, Default)]
pub struct CommandQueue {
    events: VecDeque<ReadinessEvent>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event at the back.
    pub fn enqueue(&mut self, event: ReadinessEvent) {
        self.events.push_back(event);
    }

    /// Pop the oldest event (both halves of its pair at once).
    pub fn dequeue(&mut self) -> Option<ReadinessEvent> {
        self.events.pop_front()
    }

    /// Oldest event, without consuming it.
    pub fn peek(&self) -> Option<&ReadinessEvent> {
        self.events.front()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pending events (pairs, not entries).
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReadinessEvent> {
        self.events.iter()
    }

    /// Diagnostic view: every event expanded into its command pair.
    pub fn pairs(&self) -> Vec<(Command, SlotIndex)> {
        self.events.iter().flat_map(|event| event.pair()).collect()
    }

    /// Drop every pending event.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("len", &self.events.len())
            .field("next", &self.events.front().map(|e| e.slot))
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn event(i: usize) -> ReadinessEvent {
        ReadinessEvent::new(SlotIndex(i))
    }

    // ── Construction ─────────────────────────────────────────────

    #[test]
    fn new_queue_is_empty() {
        let q = CommandQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
        assert!(q.pairs().is_empty());
        assert!(q.peek().is_none());
    }

    // ── FIFO ─────────────────────────────────────────────────────

    #[test]
    fn dequeue_follows_insertion_order() {
        let mut q = CommandQueue::new();
        q.enqueue(event(1));
        q.enqueue(event(0));
        q.enqueue(event(5));

        assert_eq!(q.dequeue(), Some(event(1)));
        assert_eq!(q.dequeue(), Some(event(0)));
        assert_eq!(q.dequeue(), Some(event(5)));
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut q = CommandQueue::new();
        q.enqueue(event(3));
        assert_eq!(q.peek(), Some(&event(3)));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut q = CommandQueue::new();
        q.enqueue(event(2));
        q.enqueue(event(2));
        assert_eq!(q.len(), 2);
    }

    // ── Pair view ────────────────────────────────────────────────

    #[test]
    fn single_event_expands_to_pair() {
        let mut q = CommandQueue::new();
        q.enqueue(event(0));
        assert_eq!(
            q.pairs(),
            vec![
                (Command::HasData, SlotIndex(0)),
                (Command::NextPair, SlotIndex(0)),
            ]
        );
    }

    #[test]
    fn dequeue_consumes_whole_pair() {
        let mut q = CommandQueue::new();
        q.enqueue(event(1));
        q.enqueue(event(0));

        q.dequeue();
        // The next entry is an independent HasData, never a dangling NextPair.
        assert_eq!(
            q.pairs(),
            vec![
                (Command::HasData, SlotIndex(0)),
                (Command::NextPair, SlotIndex(0)),
            ]
        );
    }

    // ── clear / Debug ────────────────────────────────────────────

    #[test]
    fn clear_empties_queue() {
        let mut q = CommandQueue::new();
        q.enqueue(event(0));
        q.enqueue(event(1));
        q.clear();
        assert!(q.is_empty());
    }

    #[test]
    fn debug_format() {
        let mut q = CommandQueue::new();
        q.enqueue(event(4));
        let dbg = format!("{q:?}");
        assert!(dbg.contains("CommandQueue"));
        assert!(dbg.contains("len: 1"));
    }
}
