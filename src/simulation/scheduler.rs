//! Scheduled events keyed by wake time
//!
//! Delayed continuations (the next buffered action) are queued here and
//! drained by the tick loop. Nothing sleeps.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::core::types::{EntityId, SimTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledEvent {
    /// Run the next buffered action of `entity` if its buffer is still on
    /// run `generation`
    BufferStep { entity: EntityId, generation: u64 },
}

impl ScheduledEvent {
    pub fn entity(&self) -> EntityId {
        match self {
            ScheduledEvent::BufferStep { entity, .. } => *entity,
        }
    }
}

/// Heap entry
#[derive(Debug, Clone)]
struct Pending {
    wake: OrderedFloat<SimTime>,
    seq: u64,
    event: ScheduledEvent,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.wake == other.wake && self.seq == other.seq
    }
}

impl Eq for Pending {}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; earlier insert wins ties
        other
            .wake
            .cmp(&self.wake)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Pending>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, wake: SimTime, event: ScheduledEvent) {
        self.queue.push(Pending {
            wake: OrderedFloat(wake),
            seq: self.next_seq,
            event,
        });
        self.next_seq += 1;
    }

    /// Pop the earliest event due at or before `now`
    pub fn pop_due(&mut self, now: SimTime) -> Option<(SimTime, ScheduledEvent)> {
        if self.queue.peek()?.wake.0 > now {
            return None;
        }
        self.queue.pop().map(|p| (p.wake.0, p.event))
    }

    pub fn next_wake(&self) -> Option<SimTime> {
        self.queue.peek().map(|p| p.wake.0)
    }

    /// Drop every event belonging to an entity
    pub fn cancel_entity(&mut self, entity: EntityId) -> usize {
        let before = self.queue.len();
        self.queue.retain(|p| p.event.entity() != entity);
        before - self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(entity: EntityId, generation: u64) -> ScheduledEvent {
        ScheduledEvent::BufferStep { entity, generation }
    }

    #[test]
    fn test_events_come_out_in_wake_order() {
        let e = EntityId::new();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(2.0, step(e, 2));
        scheduler.schedule(1.0, step(e, 1));
        scheduler.schedule(3.0, step(e, 3));

        assert!(scheduler.pop_due(0.5).is_none());
        assert_eq!(scheduler.pop_due(10.0), Some((1.0, step(e, 1))));
        assert_eq!(scheduler.pop_due(10.0), Some((2.0, step(e, 2))));
        assert_eq!(scheduler.next_wake(), Some(3.0));
    }

    #[test]
    fn test_ties_are_fifo() {
        let a = EntityId::new();
        let b = EntityId::new();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, step(a, 0));
        scheduler.schedule(1.0, step(b, 0));
        assert_eq!(scheduler.pop_due(1.0).map(|(_, e)| e.entity()), Some(a));
        assert_eq!(scheduler.pop_due(1.0).map(|(_, e)| e.entity()), Some(b));
    }

    #[test]
    fn test_cancel_entity() {
        let a = EntityId::new();
        let b = EntityId::new();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, step(a, 0));
        scheduler.schedule(2.0, step(b, 0));
        scheduler.schedule(3.0, step(a, 1));
        assert_eq!(scheduler.cancel_entity(a), 2);
        assert_eq!(scheduler.len(), 1);
    }
}
