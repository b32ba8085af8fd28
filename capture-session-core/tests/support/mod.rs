//! Shared fixtures for capture-session-core integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use capture_session_core::{
    CaptureError, CaptureSession, DeviceCallbackControl, Encoding, EventSink, NativeCaptureEngine,
    NativeSetup, PolicyBackend, RecordPositionListener, RoutingChangedListener,
    SubmixVolumeNotifier, SyncEvent,
};

/// Everything the mock engine saw, shared with the test.
pub struct EngineLog {
    pub calls: Mutex<Vec<&'static str>>,
    pub setup_result: Mutex<Result<i32, i32>>,
    pub start_result: Mutex<Result<(), CaptureError>>,
    pub last_setup: Mutex<Option<NativeSetup>>,
    pub sink: Mutex<Option<EventSink>>,
    pub read_result: AtomicI32,
    pub last_read_len: AtomicUsize,
    pub permission: AtomicI32,
    pub min_buffer: AtomicI32,
    pub routed_device: AtomicI32,
    pub accept_input_device: AtomicBool,
    pub marker: AtomicI32,
    pub period: AtomicI32,
    pub enable_calls: AtomicUsize,
    pub disable_calls: AtomicUsize,
    /// How long start, stop and release take, in microseconds.
    pub lifecycle_micros: AtomicU64,
    /// Lifecycle calls that found another one still running.
    pub overlaps: AtomicUsize,
    busy: AtomicBool,
}

impl EngineLog {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            setup_result: Mutex::new(Ok(42)),
            start_result: Mutex::new(Ok(())),
            last_setup: Mutex::new(None),
            sink: Mutex::new(None),
            read_result: AtomicI32::new(-100),
            last_read_len: AtomicUsize::new(0),
            permission: AtomicI32::new(0),
            min_buffer: AtomicI32::new(3840),
            routed_device: AtomicI32::new(0),
            accept_input_device: AtomicBool::new(true),
            marker: AtomicI32::new(0),
            period: AtomicI32::new(0),
            enable_calls: AtomicUsize::new(0),
            disable_calls: AtomicUsize::new(0),
            lifecycle_micros: AtomicU64::new(0),
            overlaps: AtomicUsize::new(0),
            busy: AtomicBool::new(false),
        }
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls.lock().iter().any(|c| *c == name)
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == name).count()
    }

    /// Post a raw native event through the sink handed over at setup.
    pub fn post(&self, what: i32, arg1: i32) {
        let sink = self.sink.lock().clone().expect("engine was never set up");
        sink.post(what, arg1, 0);
    }

    /// Names recorded after the first native release.
    pub fn calls_after_release(&self) -> Vec<&'static str> {
        let calls = self.calls.lock();
        match calls.iter().position(|c| *c == "release") {
            Some(index) => calls[index + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().push(name);
    }

    /// Record a lifecycle call, flagging it if another is in progress.
    fn lifecycle(&self, name: &'static str) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        self.record(name);
        let micros = self.lifecycle_micros.load(Ordering::SeqCst);
        if micros > 0 {
            thread::sleep(Duration::from_micros(micros));
        }
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Read result: a configured negative code, otherwise the slice length.
    fn read(&self, len: usize) -> i32 {
        self.last_read_len.store(len, Ordering::SeqCst);
        let configured = self.read_result.load(Ordering::SeqCst);
        if configured == -100 {
            len as i32
        } else {
            configured
        }
    }
}

pub struct MockEngine {
    log: Arc<EngineLog>,
}

pub fn mock_engine() -> (Box<dyn NativeCaptureEngine>, Arc<EngineLog>) {
    let log = Arc::new(EngineLog::new());
    (Box::new(MockEngine { log: Arc::clone(&log) }), log)
}

impl DeviceCallbackControl for MockEngine {
    fn enable_device_callback(&self) {
        self.log.enable_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn disable_device_callback(&self) {
        self.log.disable_calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl NativeCaptureEngine for MockEngine {
    fn setup(&self, request: &NativeSetup, events: EventSink) -> Result<i32, i32> {
        self.log.record("setup");
        *self.log.last_setup.lock() = Some(request.clone());
        *self.log.sink.lock() = Some(events);
        *self.log.setup_result.lock()
    }

    fn start(&self, _sync: SyncEvent) -> Result<(), CaptureError> {
        self.log.lifecycle("start");
        self.log.start_result.lock().clone()
    }

    fn stop(&self) {
        self.log.lifecycle("stop");
    }

    fn release(&self) {
        self.log.lifecycle("release");
    }

    fn read_bytes(&self, buffer: &mut [u8], _blocking: bool) -> i32 {
        self.log.record("read_bytes");
        self.log.read(buffer.len())
    }

    fn read_shorts(&self, buffer: &mut [i16], _blocking: bool) -> i32 {
        self.log.record("read_shorts");
        self.log.read(buffer.len())
    }

    fn read_floats(&self, buffer: &mut [f32], _blocking: bool) -> i32 {
        self.log.record("read_floats");
        self.log.read(buffer.len())
    }

    fn read_direct(&self, buffer: &mut [u8], _blocking: bool) -> i32 {
        self.log.record("read_direct");
        self.log.read(buffer.len())
    }

    fn buffer_size_in_frames(&self) -> i32 {
        1024
    }

    fn marker_position(&self) -> i32 {
        self.log.marker.load(Ordering::SeqCst)
    }

    fn set_marker_position(&self, frames: i32) -> i32 {
        self.log.record("set_marker_position");
        self.log.marker.store(frames, Ordering::SeqCst);
        0
    }

    fn position_update_period(&self) -> i32 {
        self.log.period.load(Ordering::SeqCst)
    }

    fn set_position_update_period(&self, frames: i32) -> i32 {
        self.log.record("set_position_update_period");
        self.log.period.store(frames, Ordering::SeqCst);
        0
    }

    fn routed_device_id(&self) -> i32 {
        self.log.routed_device.load(Ordering::SeqCst)
    }

    fn set_input_device(&self, device_id: i32) -> bool {
        self.log.record("set_input_device");
        let accepted = self.log.accept_input_device.load(Ordering::SeqCst);
        if accepted {
            self.log.routed_device.store(device_id, Ordering::SeqCst);
        }
        accepted
    }

    fn check_permission(&self, _package_name: &str) -> i32 {
        self.log.record("check_permission");
        self.log.permission.load(Ordering::SeqCst)
    }

    fn min_buffer_size(&self, _sample_rate: i32, channel_count: usize, _encoding: Encoding) -> i32 {
        let configured = self.log.min_buffer.load(Ordering::SeqCst);
        if configured > 0 {
            configured * channel_count as i32
        } else {
            configured
        }
    }

    fn primary_output_sample_rate(&self) -> i32 {
        48_000
    }
}

/// Policy backend with switchable answers. `None` = unreachable.
pub struct SwitchPolicy {
    pub microphone: Mutex<Option<bool>>,
    pub record: Mutex<Option<bool>>,
    /// Delay before answering the microphone query, in milliseconds.
    pub microphone_delay_millis: AtomicU64,
}

impl SwitchPolicy {
    pub fn new(microphone: Option<bool>, record: Option<bool>) -> Arc<Self> {
        Arc::new(Self {
            microphone: Mutex::new(microphone),
            record: Mutex::new(record),
            microphone_delay_millis: AtomicU64::new(0),
        })
    }
}

impl PolicyBackend for SwitchPolicy {
    fn is_microphone_enabled(&self, _show_notice: bool) -> Result<bool, CaptureError> {
        let delay = self.microphone_delay_millis.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
        self.microphone
            .lock()
            .ok_or_else(|| CaptureError::PolicyUnavailable("unreachable".into()))
    }

    fn is_audio_record_allowed(&self, _show_notice: bool) -> Result<bool, CaptureError> {
        self.record
            .lock()
            .ok_or_else(|| CaptureError::PolicyUnavailable("unreachable".into()))
    }
}

/// Submix notifier recording each request, optionally failing.
#[derive(Default)]
pub struct RecordingNotifier {
    pub requests: Mutex<Vec<bool>>,
    pub fail: AtomicBool,
}

impl SubmixVolumeNotifier for RecordingNotifier {
    fn force_submix_full_volume(&self, starting: bool, _token: u64) -> Result<(), CaptureError> {
        self.requests.lock().push(starting);
        if self.fail.load(Ordering::SeqCst) {
            Err(CaptureError::Error("audio service unreachable".into()))
        } else {
            Ok(())
        }
    }
}

/// Which listener callback fired, and on which thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heard {
    Marker(&'static str),
    Periodic(&'static str),
    Routing(&'static str),
}

/// Listener that records what it heard under a name.
pub struct NamedListener {
    pub name: &'static str,
    pub heard: Arc<Mutex<Vec<Heard>>>,
}

impl NamedListener {
    pub fn new(name: &'static str, heard: &Arc<Mutex<Vec<Heard>>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            heard: Arc::clone(heard),
        })
    }
}

impl RecordPositionListener for NamedListener {
    fn on_marker_reached(&self, _session: &CaptureSession) {
        self.heard.lock().push(Heard::Marker(self.name));
    }

    fn on_periodic_notification(&self, _session: &CaptureSession) {
        self.heard.lock().push(Heard::Periodic(self.name));
    }
}

impl RoutingChangedListener for NamedListener {
    fn on_routing_changed(&self, _session: &CaptureSession) {
        self.heard.lock().push(Heard::Routing(self.name));
    }
}
