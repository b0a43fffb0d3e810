//! Control-event queue between the UI and the render loop.
//!
//! Widgets hold an `EventEmitter` and push typed events; the app drains the
//! queue once per frame with `poll()` and dispatches with `downcast_event`.
//! Events are kept in emission order.

use log::{trace, warn};
use std::any::Any;
use std::sync::{Arc, Mutex};

/// Maximum events in queue before oldest are evicted
const MAX_QUEUE_SIZE: usize = 1000;

/// Marker trait for events. Events must be Send + Sync + 'static.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Boxed event for queue storage
pub type BoxedEvent = Box<dyn Event>;

type Queue = Arc<Mutex<Vec<BoxedEvent>>>;

fn push(queue: &Queue, event: BoxedEvent) {
    let mut queue = queue.lock().unwrap_or_else(|e| e.into_inner());
    if queue.len() >= MAX_QUEUE_SIZE {
        let evict_count = queue.len() / 2;
        warn!("Event queue full ({} events), evicting oldest {}", queue.len(), evict_count);
        queue.drain(0..evict_count);
    }
    trace!("Event queued: {}", (*event).type_name());
    queue.push(event);
}

#[derive(Clone, Default)]
pub struct EventBus {
    queue: Queue,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit<E: Event>(&self, event: E) {
        push(&self.queue, Box::new(event));
    }

    /// Take every event emitted since the last poll
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Handle for widgets
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            queue: Arc::clone(&self.queue),
        }
    }
}

/// Cloneable emit-only handle
#[derive(Clone)]
pub struct EventEmitter {
    queue: Queue,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("queue_len", &self.queue.lock().map(|q| q.len()).unwrap_or(0))
            .finish()
    }
}

impl EventEmitter {
    pub fn emit<E: Event>(&self, event: E) {
        push(&self.queue, Box::new(event));
    }
}

/// Downcast a queued event to its concrete type.
///
/// Derefs to `dyn Event` first: calling `as_any()` on the `Box` itself would
/// hit the blanket impl for `Box<dyn Event>` and the downcast would always fail.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Ping(u32);

    #[derive(Clone, Debug)]
    struct Pong;

    #[test]
    fn test_poll_drains_in_order() {
        let bus = EventBus::new();
        bus.emit(Ping(1));
        bus.emit(Pong);
        bus.emitter().emit(Ping(2));

        let events = bus.poll();
        assert_eq!(events.len(), 3);
        assert_eq!(downcast_event::<Ping>(&events[0]).map(|p| p.0), Some(1));
        assert!(downcast_event::<Pong>(&events[1]).is_some());
        assert_eq!(downcast_event::<Ping>(&events[2]).map(|p| p.0), Some(2));
        assert!(bus.poll().is_empty());
    }

    #[test]
    fn test_downcast_wrong_type() {
        let bus = EventBus::new();
        bus.emit(Pong);
        let events = bus.poll();
        assert!(downcast_event::<Ping>(&events[0]).is_none());
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let bus = EventBus::new();
        for i in 0..(MAX_QUEUE_SIZE as u32 + 1) {
            bus.emit(Ping(i));
        }
        let events = bus.poll();
        assert_eq!(events.len(), MAX_QUEUE_SIZE / 2 + 1);
        assert_eq!(downcast_event::<Ping>(events.last().unwrap()).map(|p| p.0), Some(MAX_QUEUE_SIZE as u32));
    }
}
