// Part of the Apple IIe emulator core.
//
// Spec: §4.7 Scheduler
//
// Design: a BinaryHeap-backed min-heap of deadline-ordered events, the same
// shape as a cycle-accurate scheduler needs regardless of machine; ties
// broken by insertion order for stability. Cancellation marks an entry dead
// in place (BinaryHeap has no efficient removal) and it is skipped when
// popped, same approach used for event cancellation elsewhere in this
// workspace's event queues.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Opaque handle returned by `schedule_after`, used only for `cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(u64);

/// Canonical recurring event kinds the scheduler drives. Peripherals may
/// define their own payloads via `kind`/`payload`, but these are the ones
/// the bus fabric itself cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    VideoBlankStart,
    VideoBlankEnd,
    MotorTimeout,
    DiskRotation,
    Custom(u32),
}

struct ScheduledEvent {
    deadline_cycle: u64,
    insertion_seq: u64,
    handle: EventHandle,
    kind: EventKind,
    payload: u64,
    cancelled: bool,
}

impl Eq for ScheduledEvent {}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.deadline_cycle == other.deadline_cycle && self.insertion_seq == other.insertion_seq
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest deadline (and,
        // among ties, the earliest insertion) sorts to the top.
        other
            .deadline_cycle
            .cmp(&self.deadline_cycle)
            .then_with(|| other.insertion_seq.cmp(&self.insertion_seq))
    }
}

/// One event consumed by `advance`, handed to the caller to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumedEvent {
    pub deadline_cycle: u64,
    pub kind: EventKind,
    pub payload: u64,
}

/// Min-heap of future events keyed on cycle. Owns the machine's monotonic
/// cycle counter; `advance` is the only thing that moves it forward.
pub struct Scheduler {
    cycle: u64,
    next_seq: u64,
    heap: BinaryHeap<ScheduledEvent>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            cycle: 0,
            next_seq: 0,
            heap: BinaryHeap::new(),
        }
    }

    pub fn current_cycle(&self) -> u64 {
        self.cycle
    }

    /// Schedules `kind` to fire `delta_cycles` after the current cycle.
    /// Scheduling at or before the current cycle is permitted and fires on
    /// the next `advance`.
    pub fn schedule_after(&mut self, delta_cycles: u64, kind: EventKind, payload: u64) -> EventHandle {
        let handle = EventHandle(self.next_seq);
        let deadline_cycle = self.cycle.saturating_add(delta_cycles);
        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                target: "scheduler",
                "schedule {:?} at cycle {} (+{})",
                kind,
                deadline_cycle,
                delta_cycles
            );
        }
        self.heap.push(ScheduledEvent {
            deadline_cycle,
            insertion_seq: self.next_seq,
            handle,
            kind,
            payload,
            cancelled: false,
        });
        self.next_seq += 1;
        handle
    }

    /// Cancels a previously scheduled event. A no-op if it already fired or
    /// was already cancelled. `BinaryHeap` exposes no `iter_mut`, so this
    /// drains and rebuilds the heap; cancellation is expected to be rare
    /// next to `schedule_after`/`advance`.
    pub fn cancel(&mut self, handle: EventHandle) {
        let mut events: Vec<_> = self.heap.drain().collect();
        for event in &mut events {
            if event.handle == handle {
                event.cancelled = true;
            }
        }
        self.heap.extend(events);
    }

    /// Drains and invokes every non-cancelled event whose deadline is ≤
    /// `target_cycle`, then advances the cycle counter to `target_cycle`.
    /// Consumers (the caller, inspecting each `ConsumedEvent`) may schedule
    /// new events while draining; those are consumed too if their deadline
    /// is also ≤ `target_cycle`.
    pub fn advance(&mut self, target_cycle: u64, mut on_event: impl FnMut(&mut Scheduler, ConsumedEvent)) {
        loop {
            let ready = matches!(self.heap.peek(), Some(top) if top.deadline_cycle <= target_cycle);
            if !ready {
                break;
            }
            let event = self.heap.pop().expect("peeked Some above");
            if event.cancelled {
                continue;
            }
            let consumed = ConsumedEvent {
                deadline_cycle: event.deadline_cycle,
                kind: event.kind,
                payload: event.payload,
            };
            if log::log_enabled!(log::Level::Trace) {
                log::trace!(target: "scheduler", "consume {:?} at cycle {}", consumed.kind, consumed.deadline_cycle);
            }
            on_event(self, consumed);
        }
        self.cycle = target_cycle;
    }

    pub fn reset(&mut self) {
        self.cycle = 0;
        self.next_seq = 0;
        self.heap.clear();
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
