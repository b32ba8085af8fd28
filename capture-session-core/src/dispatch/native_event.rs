use std::sync::{Arc, Weak};

/// Native event code: the notification marker was reached.
pub const EVENT_MARKER: i32 = 2;
/// Native event code: a periodic position update.
pub const EVENT_NEW_POS: i32 = 3;
/// Native event code: the routed input device changed.
pub const EVENT_ROUTING_CHANGED: i32 = 1000;

/// An event raised by the native engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEvent {
    MarkerReached { position: i32 },
    PeriodicNotification { position: i32 },
    RoutingChanged,
    Unknown(i32),
}

impl NativeEvent {
    pub fn from_code(what: i32, arg1: i32) -> Self {
        match what {
            EVENT_MARKER => Self::MarkerReached { position: arg1 },
            EVENT_NEW_POS => Self::PeriodicNotification { position: arg1 },
            EVENT_ROUTING_CHANGED => Self::RoutingChanged,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::MarkerReached { .. } => EVENT_MARKER,
            Self::PeriodicNotification { .. } => EVENT_NEW_POS,
            Self::RoutingChanged => EVENT_ROUTING_CHANGED,
            Self::Unknown(code) => *code,
        }
    }
}

/// Receiver of native events, implemented by the session.
pub trait NativeEventTarget: Send + Sync {
    fn on_native_event(&self, event: NativeEvent);
}

/// Handle the engine uses to report events from its own threads.
///
/// Holds only a weak reference: an engine keeping its sink alive never keeps
/// the session alive, and events for a dropped session go nowhere.
#[derive(Clone)]
pub struct EventSink {
    target: Weak<dyn NativeEventTarget>,
}

struct Detached;

impl NativeEventTarget for Detached {
    fn on_native_event(&self, _event: NativeEvent) {}
}

impl EventSink {
    pub fn new<T: NativeEventTarget + 'static>(target: &Arc<T>) -> Self {
        let weak: Weak<T> = Arc::downgrade(target);
        Self { target: weak }
    }

    /// A sink that is not connected to any session.
    pub fn detached() -> Self {
        Self {
            target: Weak::<Detached>::new(),
        }
    }

    /// Post a raw native event. Never blocks on listener delivery.
    pub fn post(&self, what: i32, arg1: i32, _arg2: i32) {
        self.post_event(NativeEvent::from_code(what, arg1));
    }

    pub fn post_event(&self, event: NativeEvent) {
        match self.target.upgrade() {
            Some(target) => target.on_native_event(event),
            None => log::trace!("dropping native event {:?}: session is gone", event),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.target.strong_count() > 0
    }
}
