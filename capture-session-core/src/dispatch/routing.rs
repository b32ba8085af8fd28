use std::sync::Arc;

use parking_lot::Mutex;

use crate::session::capture_session::WeakCaptureSession;
use crate::traits::dispatch_context::DispatchContext;
use crate::traits::listeners::RoutingChangedListener;
use crate::traits::native_engine::DeviceCallbackControl;

/// A registered routing listener and the context it runs on.
#[derive(Clone)]
struct RoutingEntry {
    listener: Arc<dyn RoutingChangedListener>,
    context: Arc<dyn DispatchContext>,
}

fn same_listener(a: &Arc<dyn RoutingChangedListener>, b: &Arc<dyn RoutingChangedListener>) -> bool {
    // compare data pointers only, vtables may be duplicated across codegen units
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Routing-change listeners, keyed by listener identity.
///
/// Native device-change notifications are enabled while at least one listener
/// is registered: the 0→1 transition enables them once, 1→0 disables them
/// once. Both decisions are taken under the registry lock.
pub struct RoutingRegistry {
    entries: Mutex<Vec<RoutingEntry>>,
}

impl RoutingRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Register `listener`. Returns `false` if it was already registered.
    pub fn add<C: DeviceCallbackControl + ?Sized>(
        &self,
        control: &C,
        listener: Arc<dyn RoutingChangedListener>,
        context: Arc<dyn DispatchContext>,
    ) -> bool {
        let mut entries = self.entries.lock();
        if entries.iter().any(|e| same_listener(&e.listener, &listener)) {
            return false;
        }
        if entries.is_empty() {
            control.enable_device_callback();
        }
        entries.push(RoutingEntry { listener, context });
        true
    }

    /// Unregister `listener`. Returns `false` if it was not registered.
    pub fn remove<C: DeviceCallbackControl + ?Sized>(
        &self,
        control: &C,
        listener: &Arc<dyn RoutingChangedListener>,
    ) -> bool {
        let mut entries = self.entries.lock();
        let Some(index) = entries
            .iter()
            .position(|e| same_listener(&e.listener, listener))
        else {
            return false;
        };
        entries.remove(index);
        if entries.is_empty() {
            control.disable_device_callback();
        }
        true
    }

    pub fn contains(&self, listener: &Arc<dyn RoutingChangedListener>) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|e| same_listener(&e.listener, listener))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Post a routing-changed notification to every registered listener.
    ///
    /// The listener set is snapshotted and the lock released before anything
    /// is posted. Returns how many contexts accepted the notification.
    pub fn broadcast(&self, session: &WeakCaptureSession) -> usize {
        let snapshot: Vec<RoutingEntry> = self.entries.lock().clone();

        let mut posted = 0;
        for entry in snapshot {
            let listener = entry.listener;
            let session = session.clone();
            let accepted = entry.context.post(Box::new(move || {
                if let Some(session) = session.upgrade() {
                    listener.on_routing_changed(&session);
                }
            }));
            if accepted {
                posted += 1;
            } else {
                log::warn!("routing listener context rejected a routing change");
            }
        }
        posted
    }
}

impl Default for RoutingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
