use crate::dispatch::native_event::EventSink;
use crate::models::attributes::CaptureAttributes;
use crate::models::audio_models::{Encoding, SyncEvent};
use crate::models::error::CaptureError;

/// Native setup failed: zero frame count.
pub const SETUP_ERROR_ZERO_FRAME_COUNT: i32 = -16;
/// Native setup failed: invalid channel mask.
pub const SETUP_ERROR_INVALID_CHANNEL_MASK: i32 = -17;
/// Native setup failed: invalid format.
pub const SETUP_ERROR_INVALID_FORMAT: i32 = -18;
/// Native setup failed: invalid source.
pub const SETUP_ERROR_INVALID_SOURCE: i32 = -19;
/// Native setup failed: the engine could not initialize.
pub const SETUP_ERROR_NATIVE_INIT_FAILED: i32 = -20;

/// Validated parameters handed to [`NativeCaptureEngine::setup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSetup {
    /// Attributes with reserved tags already stripped.
    pub attributes: CaptureAttributes,
    pub sample_rate: i32,
    pub channel_mask: i32,
    pub channel_index_mask: i32,
    pub encoding: Encoding,
    pub buffer_size_bytes: usize,
    /// Requested session id, 0 to let the engine allocate one.
    pub session_id: i32,
    /// Package name of the calling application, if known.
    pub op_package_name: Option<String>,
}

/// Switches native device-change notifications on and off.
///
/// Split out of [`NativeCaptureEngine`] so the routing registry only needs
/// the two toggles.
pub trait DeviceCallbackControl {
    fn enable_device_callback(&self);
    fn disable_device_callback(&self);
}

/// The low-level capture engine a session sits on.
///
/// Implementations own the device I/O and buffering. The engine is exclusively
/// owned by one session and called from whichever thread the application
/// uses, so every method takes `&self`; reads may be in flight while another
/// thread calls `stop` or `release`, and `release` must unblock them.
///
/// Read primitives return the transferred element count, or a negative status
/// code that the session passes back to the caller unchanged.
pub trait NativeCaptureEngine: DeviceCallbackControl + Send + Sync {
    /// Configure the engine. Returns the session id actually in use.
    ///
    /// `events` is how the engine reports markers, periodic positions and
    /// routing changes; it may be cloned onto any thread.
    fn setup(&self, request: &NativeSetup, events: EventSink) -> Result<i32, i32>;

    fn start(&self, sync: SyncEvent) -> Result<(), CaptureError>;

    fn stop(&self);

    /// Free native resources. Must be safe to call more than once.
    fn release(&self);

    fn read_bytes(&self, buffer: &mut [u8], blocking: bool) -> i32;

    fn read_shorts(&self, buffer: &mut [i16], blocking: bool) -> i32;

    fn read_floats(&self, buffer: &mut [f32], blocking: bool) -> i32;

    /// Read into a caller-provided direct buffer. Defaults to the byte path.
    fn read_direct(&self, buffer: &mut [u8], blocking: bool) -> i32 {
        self.read_bytes(buffer, blocking)
    }

    fn buffer_size_in_frames(&self) -> i32;

    fn marker_position(&self) -> i32;

    fn set_marker_position(&self, frames: i32) -> i32;

    fn position_update_period(&self) -> i32;

    fn set_position_update_period(&self, frames: i32) -> i32;

    /// Id of the device currently feeding this session, 0 if none.
    fn routed_device_id(&self) -> i32;

    /// Route to the given input device, 0 to clear the preference.
    fn set_input_device(&self, device_id: i32) -> bool;

    /// Native permission check for the calling package, 0 = granted.
    fn check_permission(&self, package_name: &str) -> i32;

    /// Minimum buffer size in bytes for the given parameters.
    /// Returns 0 if the parameters are unsupported, -1 on a query failure.
    fn min_buffer_size(&self, sample_rate: i32, channel_count: usize, encoding: Encoding) -> i32;

    /// Sampling rate of the primary output, used when the caller leaves the
    /// rate unset. Non-positive means unknown.
    fn primary_output_sample_rate(&self) -> i32 {
        0
    }
}
