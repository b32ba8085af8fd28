//! Software capture engine fed by the host instead of a device.
//!
//! Data pushed through the `feed_*` methods while the engine is running lands
//! in a ring buffer sized to the session's native buffer. Reads drain it,
//! blocking reads wait for more. Frame positions advance with each feed and
//! drive the marker and periodic notifications.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use capture_session_core::dispatch::native_event::NativeEvent;
use capture_session_core::models::error::{ERROR, ERROR_BAD_VALUE, ERROR_INVALID_OPERATION, SUCCESS};
use capture_session_core::traits::native_engine::{
    SETUP_ERROR_INVALID_CHANNEL_MASK, SETUP_ERROR_INVALID_FORMAT, SETUP_ERROR_NATIVE_INIT_FAILED,
    SETUP_ERROR_ZERO_FRAME_COUNT,
};
use capture_session_core::validation::params::{SAMPLE_RATE_HZ_MAX, SAMPLE_RATE_HZ_MIN};
use capture_session_core::{
    channel_mask, CaptureError, DeviceCallbackControl, Encoding, EventSink, NativeCaptureEngine,
    NativeSetup, SyncEvent,
};

use crate::ring_buffer::RingBuffer;

/// Granularity of the minimum buffer size.
pub const MIN_BUFFER_MILLIS: i32 = 20;

/// Permission status reported for a denied package.
pub const PERMISSION_DENIED: i32 = -1;

const DEFAULT_PRIMARY_OUTPUT_RATE: i32 = 48_000;

static NEXT_SESSION_ID: AtomicI32 = AtomicI32::new(1);

/// Per-setup stream state.
struct Stream {
    sink: EventSink,
    ring: RingBuffer<u8>,
    frame_size: usize,
    frames: i64,
    marker: i32,
    marker_pending: bool,
    period: i32,
    next_period_at: i64,
}

impl Stream {
    /// Advance the position and collect the notifications it crosses.
    fn advance(&mut self, frames: usize, events: &mut Vec<NativeEvent>) {
        let previous = self.frames;
        self.frames += frames as i64;

        let marker = self.marker as i64;
        if self.marker_pending && marker > previous && marker <= self.frames {
            self.marker_pending = false;
            events.push(NativeEvent::MarkerReached { position: self.marker });
        }

        if self.period > 0 {
            while self.next_period_at <= self.frames {
                events.push(NativeEvent::PeriodicNotification {
                    position: i32::try_from(self.next_period_at).unwrap_or(i32::MAX),
                });
                self.next_period_at += self.period as i64;
            }
        }
    }
}

#[derive(Default)]
struct EngineState {
    stream: Option<Stream>,
    running: bool,
    released: bool,
    routed_device: i32,
}

struct Shared {
    state: Mutex<EngineState>,
    data_ready: Condvar,
    device_callback: AtomicBool,
    input_devices: Mutex<Vec<i32>>,
    default_device: i32,
    denied_packages: Mutex<Vec<String>>,
    primary_output_rate: AtomicI32,
}

/// Loopback implementation of [`NativeCaptureEngine`].
///
/// Cloning yields another handle to the same engine, so a producer can keep
/// feeding after the engine has been handed to a session.
#[derive(Clone)]
pub struct LoopbackEngine {
    shared: Arc<Shared>,
}

impl Default for LoopbackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackEngine {
    /// Engine with no routable devices and a 48 kHz primary output.
    pub fn new() -> Self {
        Self::with_devices(0, &[])
    }

    /// Engine routed to `default_device`, able to route to any of `input_devices`.
    pub fn with_devices(default_device: i32, input_devices: &[i32]) -> Self {
        let mut devices = input_devices.to_vec();
        if default_device != 0 && !devices.contains(&default_device) {
            devices.push(default_device);
        }
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState {
                    routed_device: default_device,
                    ..EngineState::default()
                }),
                data_ready: Condvar::new(),
                device_callback: AtomicBool::new(false),
                input_devices: Mutex::new(devices),
                default_device,
                denied_packages: Mutex::new(Vec::new()),
                primary_output_rate: AtomicI32::new(DEFAULT_PRIMARY_OUTPUT_RATE),
            }),
        }
    }

    /// Rate reported to sessions that leave the sample rate unset.
    pub fn set_primary_output_rate(&self, rate: i32) {
        self.shared.primary_output_rate.store(rate, Ordering::SeqCst);
    }

    /// Make `check_permission` fail for `package_name`.
    pub fn deny_permission(&self, package_name: impl Into<String>) {
        self.shared.denied_packages.lock().push(package_name.into());
    }

    /// Make another input device routable, as if it had been plugged in.
    pub fn attach_device(&self, device_id: i32) {
        let mut devices = self.shared.input_devices.lock();
        if device_id != 0 && !devices.contains(&device_id) {
            devices.push(device_id);
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    pub fn is_released(&self) -> bool {
        self.shared.state.lock().released
    }

    pub fn device_callback_enabled(&self) -> bool {
        self.shared.device_callback.load(Ordering::SeqCst)
    }

    /// Frames captured since setup.
    pub fn position(&self) -> i64 {
        self.with_stream(0, |s| s.frames)
    }

    /// Bytes dropped because nobody read them in time.
    pub fn overrun_bytes(&self) -> u64 {
        self.with_stream(0, |s| s.ring.overrun())
    }

    /// Push raw captured bytes. Returns how many were accepted, 0 when the
    /// engine is not running. Trailing bytes that do not fill a frame are
    /// discarded.
    pub fn feed_bytes(&self, data: &[u8]) -> usize {
        let mut events = Vec::new();
        let (sink, accepted) = {
            let mut state = self.shared.state.lock();
            if !state.running || state.released {
                return 0;
            }
            let Some(stream) = state.stream.as_mut() else {
                return 0;
            };
            let whole = data.len() - data.len() % stream.frame_size;
            if whole != data.len() {
                log::warn!("discarding {} trailing byte(s) of a partial frame", data.len() - whole);
            }
            stream.ring.write(&data[..whole]);
            stream.advance(whole / stream.frame_size, &mut events);
            (stream.sink.clone(), whole)
        };
        self.shared.data_ready.notify_all();

        // events leave after the lock is dropped
        for event in events {
            sink.post_event(event);
        }
        accepted
    }

    /// Push 16-bit samples, stored little-endian.
    pub fn feed_pcm16(&self, samples: &[i16]) -> usize {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.feed_bytes(&bytes) / 2
    }

    /// Push float samples, stored little-endian.
    pub fn feed_f32(&self, samples: &[f32]) -> usize {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.feed_bytes(&bytes) / 4
    }

    /// Reroute to `device_id` (0 = default device), as if the device set
    /// changed underneath the session.
    pub fn reroute(&self, device_id: i32) -> bool {
        let target = if device_id == 0 {
            self.shared.default_device
        } else {
            device_id
        };
        if target != 0 && !self.shared.input_devices.lock().contains(&target) {
            log::warn!("cannot route to unknown input device {}", target);
            return false;
        }

        let sink = {
            let mut state = self.shared.state.lock();
            if state.routed_device == target {
                return true;
            }
            state.routed_device = target;
            state.stream.as_ref().map(|s| s.sink.clone())
        };
        log::debug!("loopback routed to input device {}", target);

        if self.device_callback_enabled() {
            if let Some(sink) = sink {
                sink.post_event(NativeEvent::RoutingChanged);
            }
        }
        true
    }

    /// Read whole `unit`-byte elements into `out`.
    fn read_units(&self, out: &mut [u8], unit: usize, blocking: bool) -> i32 {
        let mut state = self.shared.state.lock();
        let mut filled = 0;
        loop {
            if state.released {
                break;
            }
            let Some(stream) = state.stream.as_mut() else {
                return ERROR_INVALID_OPERATION;
            };
            let ready = stream.ring.count() - stream.ring.count() % unit;
            let want = (out.len() - filled).min(ready);
            filled += stream.ring.read_into(&mut out[filled..filled + want]);

            if filled == out.len() || !blocking || !state.running {
                break;
            }
            self.shared.data_ready.wait(&mut state);
        }
        if state.released && filled == 0 {
            return ERROR_INVALID_OPERATION;
        }
        (filled / unit) as i32
    }

    fn with_stream<R>(&self, missing: R, f: impl FnOnce(&mut Stream) -> R) -> R {
        let mut state = self.shared.state.lock();
        match state.stream.as_mut() {
            Some(stream) => f(stream),
            None => missing,
        }
    }
}

fn frame_size(setup: &NativeSetup) -> Result<usize, i32> {
    let channels = if setup.channel_mask != channel_mask::INVALID {
        channel_mask::channel_count(setup.channel_mask)
    } else {
        channel_mask::channel_count(setup.channel_index_mask)
    };
    if channels == 0 {
        return Err(SETUP_ERROR_INVALID_CHANNEL_MASK);
    }
    match setup.encoding.bytes_per_sample() {
        Some(bytes) => Ok(channels * bytes),
        None if setup.encoding.is_compressed() => Ok(channels),
        None => Err(SETUP_ERROR_INVALID_FORMAT),
    }
}

impl DeviceCallbackControl for LoopbackEngine {
    fn enable_device_callback(&self) {
        log::debug!("loopback device callback enabled");
        self.shared.device_callback.store(true, Ordering::SeqCst);
    }

    fn disable_device_callback(&self) {
        log::debug!("loopback device callback disabled");
        self.shared.device_callback.store(false, Ordering::SeqCst);
    }
}

impl NativeCaptureEngine for LoopbackEngine {
    fn setup(&self, request: &NativeSetup, events: EventSink) -> Result<i32, i32> {
        let mut state = self.shared.state.lock();
        if state.released || state.stream.is_some() {
            log::error!("loopback engine cannot be set up twice");
            return Err(SETUP_ERROR_NATIVE_INIT_FAILED);
        }
        let frame_size = frame_size(request)?;
        if request.buffer_size_bytes < frame_size {
            return Err(SETUP_ERROR_ZERO_FRAME_COUNT);
        }

        state.stream = Some(Stream {
            sink: events,
            ring: RingBuffer::new(request.buffer_size_bytes),
            frame_size,
            frames: 0,
            marker: 0,
            marker_pending: false,
            period: 0,
            next_period_at: 0,
        });

        let session_id = if request.session_id > 0 {
            request.session_id
        } else {
            NEXT_SESSION_ID.fetch_add(1, Ordering::SeqCst)
        };
        log::info!(
            "loopback engine set up: session {}, {}Hz, {} byte frames, {} byte buffer",
            session_id,
            request.sample_rate,
            frame_size,
            request.buffer_size_bytes
        );
        Ok(session_id)
    }

    fn start(&self, sync: SyncEvent) -> Result<(), CaptureError> {
        let mut state = self.shared.state.lock();
        if state.released || state.stream.is_none() {
            return Err(CaptureError::InvalidOperation("loopback engine is not set up".into()));
        }
        if sync.sync_type != 0 {
            log::debug!(
                "loopback engine ignores sync event {} from session {}, starting now",
                sync.sync_type,
                sync.session_id
            );
        }
        state.running = true;
        Ok(())
    }

    fn stop(&self) {
        self.shared.state.lock().running = false;
        self.shared.data_ready.notify_all();
    }

    fn release(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.released {
                return;
            }
            state.released = true;
            state.running = false;
            if let Some(stream) = state.stream.as_mut() {
                stream.sink = EventSink::detached();
                stream.ring.reset();
            }
        }
        self.shared.data_ready.notify_all();
        log::debug!("loopback engine released");
    }

    fn read_bytes(&self, buffer: &mut [u8], blocking: bool) -> i32 {
        self.read_units(buffer, 1, blocking)
    }

    fn read_shorts(&self, buffer: &mut [i16], blocking: bool) -> i32 {
        let mut bytes = vec![0u8; buffer.len() * 2];
        let count = self.read_units(&mut bytes, 2, blocking);
        if count > 0 {
            for (dst, src) in buffer.iter_mut().zip(bytes.chunks_exact(2)).take(count as usize) {
                *dst = i16::from_le_bytes([src[0], src[1]]);
            }
        }
        count
    }

    fn read_floats(&self, buffer: &mut [f32], blocking: bool) -> i32 {
        let mut bytes = vec![0u8; buffer.len() * 4];
        let count = self.read_units(&mut bytes, 4, blocking);
        if count > 0 {
            for (dst, src) in buffer.iter_mut().zip(bytes.chunks_exact(4)).take(count as usize) {
                *dst = f32::from_le_bytes([src[0], src[1], src[2], src[3]]);
            }
        }
        count
    }

    fn buffer_size_in_frames(&self) -> i32 {
        self.with_stream(0, |s| (s.ring.capacity() / s.frame_size) as i32)
    }

    fn marker_position(&self) -> i32 {
        self.with_stream(0, |s| s.marker)
    }

    fn set_marker_position(&self, frames: i32) -> i32 {
        if frames < 0 {
            return ERROR_BAD_VALUE;
        }
        self.with_stream(ERROR_INVALID_OPERATION, |s| {
            s.marker = frames;
            s.marker_pending = frames > 0 && frames as i64 > s.frames;
            SUCCESS
        })
    }

    fn position_update_period(&self) -> i32 {
        self.with_stream(0, |s| s.period)
    }

    fn set_position_update_period(&self, frames: i32) -> i32 {
        if frames < 0 {
            return ERROR_BAD_VALUE;
        }
        self.with_stream(ERROR_INVALID_OPERATION, |s| {
            s.period = frames;
            s.next_period_at = s.frames + frames as i64;
            SUCCESS
        })
    }

    fn routed_device_id(&self) -> i32 {
        self.shared.state.lock().routed_device
    }

    fn set_input_device(&self, device_id: i32) -> bool {
        self.reroute(device_id)
    }

    fn check_permission(&self, package_name: &str) -> i32 {
        if self.shared.denied_packages.lock().iter().any(|p| p == package_name) {
            log::warn!("record permission denied for {}", package_name);
            PERMISSION_DENIED
        } else {
            SUCCESS
        }
    }

    fn min_buffer_size(&self, sample_rate: i32, channel_count: usize, encoding: Encoding) -> i32 {
        if !(SAMPLE_RATE_HZ_MIN..=SAMPLE_RATE_HZ_MAX).contains(&sample_rate) || channel_count == 0 {
            return 0;
        }
        let Some(bytes) = encoding.bytes_per_sample() else {
            return 0;
        };
        let frames = sample_rate as i64 * MIN_BUFFER_MILLIS as i64 / 1000;
        i32::try_from(frames * (channel_count * bytes) as i64).unwrap_or(ERROR)
    }

    fn primary_output_sample_rate(&self) -> i32 {
        self.shared.primary_output_rate.load(Ordering::SeqCst)
    }
}
