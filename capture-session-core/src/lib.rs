//! # capture-session-core
//!
//! Platform-agnostic audio capture session core.
//!
//! Validates capture parameters, runs the session state machine, gates
//! operations behind runtime policy, and relays native engine events to
//! listeners on the dispatch contexts they chose. Native engines, policy
//! backends, device enumeration and the submix side channel plug in through
//! the traits in [`traits`].
//!
//! ## Architecture
//!
//! ```text
//! capture-session-core (this crate)
//! ├── models/       ← CaptureError, SessionState, CaptureFormat, SessionConfig, etc.
//! ├── validation/   ← source / rate / encoding / channel / buffer checks
//! ├── traits/       ← NativeCaptureEngine, PolicyBackend, DeviceEnumerator, listeners
//! ├── dispatch/     ← EventLoop, EventSink, PositionDispatcher, RoutingRegistry
//! └── session/      ← CaptureSession, SessionBuilder, PolicyGate, Collaborators
//! ```
//!
//! Native events flow:
//! ```text
//! [engine thread] → EventSink (weak) → PositionDispatcher ─post→ [listener context]
//!                                    └→ RoutingRegistry ──post→ [listener contexts]
//! ```

pub mod dispatch;
pub mod models;
pub mod session;
pub mod traits;
pub mod validation;

// Re-export key types at crate root for convenience.
pub use dispatch::event_loop::EventLoop;
pub use dispatch::native_event::{EventSink, NativeEvent};
pub use models::attributes::CaptureAttributes;
pub use models::audio_models::{
    channel_mask, AudioDeviceInfo, AudioSource, AudioTransportType, Encoding, ReadMode, SyncEvent,
};
pub use models::config::{PolicyConfig, SessionConfig};
pub use models::error::{CaptureError, FatalPolicyViolation, Result};
pub use models::format::CaptureFormat;
pub use models::state::{RecordingState, SessionState};
pub use session::builder::SessionBuilder;
pub use session::capture_session::{CaptureSession, WeakCaptureSession};
pub use session::collaborators::Collaborators;
pub use session::policy_gate::{CallerIdentity, PolicyGate};
pub use traits::device_enumerator::DeviceEnumerator;
pub use traits::dispatch_context::{DispatchContext, Task};
pub use traits::listeners::{RecordPositionListener, RoutingChangedListener};
pub use traits::native_engine::{DeviceCallbackControl, NativeCaptureEngine, NativeSetup};
pub use traits::notifier::SubmixVolumeNotifier;
pub use traits::policy::PolicyBackend;
