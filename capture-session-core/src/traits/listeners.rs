use crate::session::capture_session::CaptureSession;

/// Position notifications for a capture session.
///
/// Called on the dispatch context the listener was registered with, never on
/// the native callback thread.
pub trait RecordPositionListener: Send + Sync {
    /// The marker set with `set_notification_marker_position` was reached.
    fn on_marker_reached(&self, session: &CaptureSession);

    /// Another `set_position_notification_period` frames were captured.
    fn on_periodic_notification(&self, session: &CaptureSession);
}

/// Notified when the input device backing a session changes.
pub trait RoutingChangedListener: Send + Sync {
    fn on_routing_changed(&self, session: &CaptureSession);
}
