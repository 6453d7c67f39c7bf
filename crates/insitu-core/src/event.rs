//! Typed event system with pre-allocated ring buffers.
//!
//! Events emitted while a tick runs are delivered in batch at the end of that
//! tick. Events from a player action are delivered as soon as the action
//! returns. Each event type has its own [`EventBuffer`] ring buffer with a
//! configurable capacity.
//!
//! Listeners are passive: they observe events for UI refresh, audio or
//! analytics and cannot mutate the session.
//!
//! # Suppression
//!
//! Event types can be suppressed via [`EventBus::suppress`], which prevents
//! any allocation or recording for that type.

use crate::id::*;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // -- Production --
    ResourceProduced {
        resource: ResourceId,
        amount: f64,
        tick: u64,
    },
    ResourceConsumed {
        resource: ResourceId,
        amount: f64,
        tick: u64,
    },

    // -- Machine state --
    MachineStalled {
        machine: MachineId,
        tick: u64,
    },
    MachineResumed {
        machine: MachineId,
        tick: u64,
    },

    // -- Player actions --
    ResourceHarvested {
        resource: ResourceId,
        amount: f64,
        tick: u64,
    },
    MachineBuilt {
        machine: MachineId,
        machine_type: MachineTypeId,
        tick: u64,
    },
    MachineToggled {
        machine: MachineId,
        active: bool,
        tick: u64,
    },
    RecipeChanged {
        machine: MachineId,
        recipe: RecipeId,
        tick: u64,
    },
}

/// Discriminant tag for event types, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ResourceProduced,
    ResourceConsumed,
    MachineStalled,
    MachineResumed,
    ResourceHarvested,
    MachineBuilt,
    MachineToggled,
    RecipeChanged,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 8;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ResourceProduced { .. } => EventKind::ResourceProduced,
            Event::ResourceConsumed { .. } => EventKind::ResourceConsumed,
            Event::MachineStalled { .. } => EventKind::MachineStalled,
            Event::MachineResumed { .. } => EventKind::MachineResumed,
            Event::ResourceHarvested { .. } => EventKind::ResourceHarvested,
            Event::MachineBuilt { .. } => EventKind::MachineBuilt,
            Event::MachineToggled { .. } => EventKind::MachineToggled,
            Event::RecipeChanged { .. } => EventKind::RecipeChanged,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer (pre-allocated ring buffer)
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// Create a new ring buffer with the given capacity.
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event into the ring buffer. If full, the oldest event is dropped.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Iterate over events in order from oldest to newest.
    pub fn iter(&self) -> EventBufferIter<'_> {
        let start = if self.len < self.capacity() {
            0
        } else {
            // head points to the next write position, which is the oldest entry
            self.head
        };
        EventBufferIter {
            buffer: self,
            index: start,
            remaining: self.len,
        }
    }

    /// Clear all events. `total_written` is kept.
    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

/// Iterator over events in an [`EventBuffer`], from oldest to newest.
pub struct EventBufferIter<'a> {
    buffer: &'a EventBuffer,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventBufferIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.buffer.events[self.index].as_ref();
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventBufferIter<'_> {}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only. `Send` so a session can be
/// driven from a scheduler thread.
pub type PassiveListener = Box<dyn FnMut(&Event) + Send>;

/// Optional predicate that filters events for a listener.
pub type EventFilter = Box<dyn Fn(&Event) -> bool + Send>;

/// Priority level for listeners. Lower priorities run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListenerPriority {
    Pre = 0,
    Normal = 1,
    Post = 2,
}

struct ListenerEntry {
    listener: PassiveListener,
    priority: ListenerPriority,
    filter: Option<EventFilter>,
    insertion_order: u64,
}

impl std::fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("priority", &self.priority)
            .field("filtered", &self.filter.is_some())
            .field("insertion_order", &self.insertion_order)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Holds one ring buffer per event kind, listener lists, and suppression flags.
#[derive(Debug)]
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<ListenerEntry>; EVENT_KIND_COUNT],
    default_capacity: usize,
    next_insertion_order: u64,
}

impl EventBus {
    /// Create a new event bus with the given default buffer capacity per type.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            default_capacity,
            next_insertion_order: 0,
        }
    }

    /// Suppress an event kind. Suppressed events are never allocated or buffered.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Emit an event. No-ops if the event kind is suppressed.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.default_capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Register a listener with Normal priority and no filter.
    ///
    /// Listeners run on whichever thread ticks the session. Under a
    /// [`TickScheduler`](crate::scheduler::TickScheduler) that thread holds
    /// the session lock, so a listener must not lock the same session.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.on_passive_filtered(kind, ListenerPriority::Normal, None, listener);
    }

    /// Register a listener with explicit priority and optional filter.
    pub fn on_passive_filtered(
        &mut self,
        kind: EventKind,
        priority: ListenerPriority,
        filter: Option<EventFilter>,
        listener: PassiveListener,
    ) {
        let order = self.next_insertion_order;
        self.next_insertion_order += 1;
        let list = &mut self.listeners[kind.index()];
        list.push(ListenerEntry {
            listener,
            priority,
            filter,
            insertion_order: order,
        });
        list.sort_by_key(|entry| (entry.priority, entry.insertion_order));
    }

    /// Deliver all buffered events to listeners, kind by kind, oldest first
    /// within a kind, then clear the buffers.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            let Some(buffer) = self.buffers[idx].as_mut() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }

            for entry in &mut self.listeners[idx] {
                for event in buffer.iter() {
                    if entry.filter.as_ref().is_some_and(|f| !f(event)) {
                        continue;
                    }
                    (entry.listener)(event);
                }
            }

            buffer.clear();
        }
    }

    /// Get the event buffer for a specific event kind (read-only).
    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    /// Count of events currently buffered for a kind.
    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.len())
            .unwrap_or(0)
    }

    /// Total events ever emitted for a kind (including delivered and dropped).
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffers[kind.index()]
            .as_ref()
            .map(|b| b.total_written())
            .unwrap_or(0)
    }

    /// Clear all buffers. Listeners and suppression settings stay.
    pub fn clear_all(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.clear();
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn produced(amount: f64, tick: u64) -> Event {
        Event::ResourceProduced {
            resource: ResourceId(0),
            amount,
            tick,
        }
    }

    fn toggled(tick: u64) -> Event {
        Event::MachineToggled {
            machine: MachineId(0),
            active: true,
            tick,
        }
    }

    #[test]
    fn event_buffer_push_and_iterate() {
        let mut buf = EventBuffer::new(8);
        buf.push(produced(1.0, 0));
        buf.push(produced(2.0, 1));
        let ticks: Vec<u64> = buf
            .iter()
            .map(|e| match e {
                Event::ResourceProduced { tick, .. } => *tick,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ticks, vec![0, 1]);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn event_buffer_overwrites_oldest_when_full() {
        let mut buf = EventBuffer::new(2);
        buf.push(produced(1.0, 0));
        buf.push(produced(2.0, 1));
        buf.push(produced(3.0, 2));
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.total_written(), 3);
        let first = buf.iter().next().unwrap();
        assert_eq!(*first, produced(2.0, 1));
    }

    #[test]
    fn zero_capacity_clamped_to_one() {
        let buf = EventBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
    }

    #[test]
    fn emit_buffers_by_kind() {
        let mut bus = EventBus::new(16);
        bus.emit(produced(1.0, 0));
        bus.emit(toggled(0));
        bus.emit(toggled(1));
        assert_eq!(bus.buffered_count(EventKind::ResourceProduced), 1);
        assert_eq!(bus.buffered_count(EventKind::MachineToggled), 2);
        assert_eq!(bus.buffered_count(EventKind::MachineBuilt), 0);
    }

    #[test]
    fn suppressed_events_are_not_buffered() {
        let mut bus = EventBus::new(16);
        bus.suppress(EventKind::ResourceProduced);
        bus.emit(produced(1.0, 0));
        assert!(bus.is_suppressed(EventKind::ResourceProduced));
        assert!(bus.buffer(EventKind::ResourceProduced).is_none());
        assert_eq!(bus.total_emitted(EventKind::ResourceProduced), 0);
    }

    #[test]
    fn deliver_calls_listeners_and_clears() {
        let mut bus = EventBus::new(16);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.on_passive(
            EventKind::ResourceProduced,
            Box::new(move |e| sink.lock().unwrap().push(e.clone())),
        );

        bus.emit(produced(1.0, 0));
        bus.emit(produced(2.0, 0));
        bus.emit(toggled(0));
        bus.deliver();

        assert_eq!(*seen.lock().unwrap(), vec![produced(1.0, 0), produced(2.0, 0)]);
        assert_eq!(bus.buffered_count(EventKind::ResourceProduced), 0);
        assert_eq!(bus.total_emitted(EventKind::ResourceProduced), 2);
    }

    #[test]
    fn listeners_run_in_priority_then_insertion_order() {
        let mut bus = EventBus::new(16);
        let order = Arc::new(Mutex::new(Vec::new()));

        for (label, priority) in [
            ("normal-a", ListenerPriority::Normal),
            ("post", ListenerPriority::Post),
            ("pre", ListenerPriority::Pre),
            ("normal-b", ListenerPriority::Normal),
        ] {
            let sink = Arc::clone(&order);
            bus.on_passive_filtered(
                EventKind::MachineToggled,
                priority,
                None,
                Box::new(move |_| sink.lock().unwrap().push(label)),
            );
        }

        bus.emit(toggled(0));
        bus.deliver();

        assert_eq!(
            *order.lock().unwrap(),
            vec!["pre", "normal-a", "normal-b", "post"]
        );
    }

    #[test]
    fn filter_skips_events() {
        let mut bus = EventBus::new(16);
        let count = Arc::new(Mutex::new(0u32));
        let sink = Arc::clone(&count);
        bus.on_passive_filtered(
            EventKind::ResourceProduced,
            ListenerPriority::Normal,
            Some(Box::new(|e| {
                matches!(e, Event::ResourceProduced { amount, .. } if *amount > 1.5)
            })),
            Box::new(move |_| *sink.lock().unwrap() += 1),
        );

        bus.emit(produced(1.0, 0));
        bus.emit(produced(2.0, 0));
        bus.deliver();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn clear_all_keeps_listeners() {
        let mut bus = EventBus::new(16);
        let count = Arc::new(Mutex::new(0u32));
        let sink = Arc::clone(&count);
        bus.on_passive(
            EventKind::MachineToggled,
            Box::new(move |_| *sink.lock().unwrap() += 1),
        );

        bus.emit(toggled(0));
        bus.clear_all();
        bus.deliver();
        assert_eq!(*count.lock().unwrap(), 0);

        bus.emit(toggled(1));
        bus.deliver();
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
