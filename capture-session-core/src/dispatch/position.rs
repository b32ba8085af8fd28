use std::sync::Arc;

use parking_lot::Mutex;

use crate::session::capture_session::WeakCaptureSession;
use crate::traits::dispatch_context::DispatchContext;
use crate::traits::listeners::RecordPositionListener;

/// Position events forwarded to the registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionEvent {
    MarkerReached,
    PeriodicNotification,
}

/// One (listener, context) registration. Never mutated after creation.
struct PositionSlot {
    listener: Arc<dyn RecordPositionListener>,
    context: Arc<dyn DispatchContext>,
    generation: u64,
}

struct SlotState {
    current: Option<Arc<PositionSlot>>,
    generation: u64,
}

/// Single-slot position channel.
///
/// The listener and its context are swapped together as one slot, and each
/// registration gets a new generation. An event is tagged with the generation
/// it was posted under and is dropped on delivery if that generation is no
/// longer current, so a replaced or cleared listener never sees late events
/// and a new listener never receives events routed through the old context.
pub struct PositionDispatcher {
    state: Mutex<SlotState>,
}

impl PositionDispatcher {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                current: None,
                generation: 0,
            }),
        }
    }

    /// Install a listener, replacing any previous one. Returns the new generation.
    pub fn set(
        &self,
        listener: Arc<dyn RecordPositionListener>,
        context: Arc<dyn DispatchContext>,
    ) -> u64 {
        let mut state = self.state.lock();
        state.generation += 1;
        state.current = Some(Arc::new(PositionSlot {
            listener,
            context,
            generation: state.generation,
        }));
        state.generation
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.current = None;
    }

    pub fn has_listener(&self) -> bool {
        self.state.lock().current.is_some()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        let state = self.state.lock();
        state.current.is_some() && state.generation == generation
    }

    /// Post `event` to the current listener's context.
    ///
    /// Returns `false` when there is no listener or the context refused the task.
    pub fn dispatch(self: &Arc<Self>, event: PositionEvent, session: WeakCaptureSession) -> bool {
        let slot = match self.state.lock().current.clone() {
            Some(slot) => slot,
            None => {
                log::trace!("no position listener for {:?}", event);
                return false;
            }
        };

        let dispatcher = Arc::clone(self);
        let delivered = Arc::clone(&slot);
        let posted = slot.context.post(Box::new(move || {
            if !dispatcher.is_current(delivered.generation) {
                log::trace!(
                    "dropping {:?} for replaced listener generation {}",
                    event,
                    delivered.generation
                );
                return;
            }
            let Some(session) = session.upgrade() else {
                return;
            };
            match event {
                PositionEvent::MarkerReached => delivered.listener.on_marker_reached(&session),
                PositionEvent::PeriodicNotification => {
                    delivered.listener.on_periodic_notification(&session)
                }
            }
        }));

        if !posted {
            log::warn!("position listener context rejected {:?}", event);
        }
        posted
    }
}

impl Default for PositionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
