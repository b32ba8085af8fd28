use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::dispatch::native_event::{EventSink, NativeEvent, NativeEventTarget};
use crate::dispatch::position::{PositionDispatcher, PositionEvent};
use crate::dispatch::routing::RoutingRegistry;
use crate::models::attributes::CaptureAttributes;
use crate::models::audio_models::{
    channel_mask, AudioDeviceInfo, AudioSource, Encoding, ReadMode, SyncEvent,
};
use crate::models::config::SessionConfig;
use crate::models::error::{CaptureError, Result, ERROR, SUCCESS};
use crate::models::format::{
    CaptureFormat, PROPERTY_CHANNEL_INDEX_MASK, PROPERTY_CHANNEL_MASK, PROPERTY_ENCODING,
};
use crate::models::state::{RecordingState, SessionState};
use crate::session::collaborators::Collaborators;
use crate::session::policy_gate::PolicyGate;
use crate::traits::device_enumerator::DeviceEnumerator;
use crate::traits::dispatch_context::DispatchContext;
use crate::traits::listeners::{RecordPositionListener, RoutingChangedListener};
use crate::traits::native_engine::{NativeCaptureEngine, NativeSetup};
use crate::traits::notifier::SubmixVolumeNotifier;
use crate::validation::params;

/// Parameters derived from a validated [`SessionConfig`].
#[derive(Debug, Clone)]
struct DerivedParams {
    attributes: CaptureAttributes,
    submix_full_volume: bool,
    source: AudioSource,
    sample_rate: i32,
    encoding: Encoding,
    channel_mask: i32,
    channel_index_mask: i32,
    channel_count: usize,
    buffer_size_bytes: usize,
}

impl DerivedParams {
    fn derive(config: &SessionConfig, primary_output_rate: i32) -> Result<Self> {
        let preset = config.attributes.capture_preset.ok_or_else(|| {
            CaptureError::BadValue("no valid capture preset in attributes".into())
        })?;
        let (attributes, submix_full_volume) = config.attributes.extract_submix_full_volume();
        if submix_full_volume {
            log::debug!("will record from remote submix at full fixed volume");
        }

        let format = &config.format;
        let source = params::validate_source(preset)?;
        let sample_rate =
            params::validate_sample_rate(params::resolve_sample_rate(format, primary_output_rate))?;
        let requested_encoding = if format.has(PROPERTY_ENCODING) {
            format.encoding
        } else {
            Encoding::DEFAULT
        };
        let encoding = params::validate_encoding(requested_encoding)?;

        let mut channel_mask = channel_mask::INVALID;
        let mut channel_index_mask = channel_mask::INVALID;
        let mut channel_count = 0;
        if format.has(PROPERTY_CHANNEL_INDEX_MASK) {
            channel_index_mask = format.channel_index_mask;
            channel_count = channel_mask::channel_count(channel_index_mask);
        }
        if format.has(PROPERTY_CHANNEL_MASK) {
            channel_mask = params::resolve_channel_mask(format.channel_mask, false)?;
            channel_count = channel_mask::channel_count(channel_mask);
        } else if channel_index_mask == channel_mask::INVALID {
            channel_mask = params::resolve_channel_mask(channel_mask::IN_DEFAULT, false)?;
            channel_count = channel_mask::channel_count(channel_mask);
        }

        let buffer_size_bytes = params::validate_buffer_size(
            config.buffer_size_bytes,
            channel_count,
            encoding,
            source,
        )?;

        Ok(Self {
            attributes,
            submix_full_volume,
            source,
            sample_rate,
            encoding,
            channel_mask,
            channel_index_mask,
            channel_count,
            buffer_size_bytes,
        })
    }
}

/// Shared session state. Native events hold only a `Weak` to this.
struct Inner {
    weak_self: Weak<Inner>,
    engine: Box<dyn NativeCaptureEngine>,
    gate: PolicyGate,
    op_package_name: Option<String>,
    submix_notifier: Arc<dyn SubmixVolumeNotifier>,
    devices: Arc<dyn DeviceEnumerator>,
    default_context: Option<Arc<dyn DispatchContext>>,

    params: DerivedParams,

    initialized: AtomicBool,
    session_id: AtomicI32,

    // The three locks below are never held at the same time.
    recording: Mutex<RecordingState>,
    position: Arc<PositionDispatcher>,
    routing: RoutingRegistry,

    preferred_device: Mutex<Option<AudioDeviceInfo>>,
}

impl Inner {
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn require_initialized(&self, operation: &str) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(CaptureError::InvalidOperation(format!(
                "{} called on an uninitialized capture session",
                operation
            )))
        }
    }

    fn weak_session(&self) -> WeakCaptureSession {
        WeakCaptureSession {
            inner: self.weak_self.clone(),
        }
    }

    fn token(&self) -> u64 {
        self as *const Inner as usize as u64
    }

    /// Best-effort side notification; failures never abort the transition.
    fn handle_full_volume(&self, starting: bool) {
        if !self.params.submix_full_volume {
            return;
        }
        if let Err(e) = self.submix_notifier.force_submix_full_volume(starting, self.token()) {
            log::error!("failed to notify submix full volume (starting: {}): {}", starting, e);
        }
    }

    fn stop_locked(&self, recording: &mut RecordingState) {
        self.handle_full_volume(false);
        self.engine.stop();
        *recording = RecordingState::Stopped;
    }

    fn stop(&self) -> Result<()> {
        self.require_initialized("stop()")?;
        let mut recording = self.recording.lock();
        // release() may have run while we waited for the lock
        self.require_initialized("stop()")?;
        self.stop_locked(&mut recording);
        Ok(())
    }

    /// Holds the recording lock throughout so no start or stop interleaves.
    fn release(&self) {
        let mut recording = self.recording.lock();
        if self.is_initialized() {
            self.stop_locked(&mut recording);
        }
        self.engine.release();
        self.initialized.store(false, Ordering::SeqCst);
    }
}

impl NativeEventTarget for Inner {
    fn on_native_event(&self, event: NativeEvent) {
        match event {
            NativeEvent::MarkerReached { .. } => {
                self.position.dispatch(PositionEvent::MarkerReached, self.weak_session());
            }
            NativeEvent::PeriodicNotification { .. } => {
                self.position
                    .dispatch(PositionEvent::PeriodicNotification, self.weak_session());
            }
            NativeEvent::RoutingChanged => {
                let posted = self.routing.broadcast(&self.weak_session());
                log::debug!("routing change posted to {} listener(s)", posted);
            }
            NativeEvent::Unknown(code) => {
                log::error!("unknown native event type: {}", code);
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if self.is_initialized() {
            log::warn!(
                "capture session {} dropped without release(), releasing now",
                self.session_id.load(Ordering::SeqCst)
            );
            self.release();
        } else {
            self.engine.release();
        }
    }
}

/// An audio capture session over a native engine.
///
/// Cloning yields another handle to the same session. Call [`release`]
/// explicitly when done; dropping the last handle only releases as a
/// fallback.
///
/// [`release`]: CaptureSession::release
#[derive(Clone)]
pub struct CaptureSession {
    inner: Arc<Inner>,
}

/// Non-owning handle to a [`CaptureSession`].
#[derive(Clone)]
pub struct WeakCaptureSession {
    inner: Weak<Inner>,
}

impl WeakCaptureSession {
    pub fn upgrade(&self) -> Option<CaptureSession> {
        self.inner.upgrade().map(|inner| CaptureSession { inner })
    }
}

impl CaptureSession {
    /// Validate `config` and set up the native engine.
    ///
    /// Invalid parameters return `BadValue`. A policy refusal or a native
    /// setup failure still returns a session, left in
    /// [`SessionState::Uninitialized`]; check [`state`](Self::state) before use.
    pub fn new(
        config: SessionConfig,
        engine: Box<dyn NativeCaptureEngine>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let params = DerivedParams::derive(&config, engine.primary_output_sample_rate())?;
        let gate = collaborators.policy_gate();

        let inner = Arc::new_cyclic(|weak_self| Inner {
            weak_self: weak_self.clone(),
            engine,
            gate,
            op_package_name: collaborators.op_package_name.clone(),
            submix_notifier: Arc::clone(&collaborators.submix_notifier),
            devices: Arc::clone(&collaborators.devices),
            default_context: collaborators.default_context.clone(),
            params,
            initialized: AtomicBool::new(false),
            session_id: AtomicI32::new(0),
            recording: Mutex::new(RecordingState::Stopped),
            position: Arc::new(PositionDispatcher::new()),
            routing: RoutingRegistry::new(),
            preferred_device: Mutex::new(None),
        });

        if inner.params.source == AudioSource::HOTWORD && !inner.gate.microphone_enabled_quietly() {
            log::error!("policy does not allow initializing a hotword capture session");
            return Ok(Self { inner });
        }

        let request = NativeSetup {
            attributes: inner.params.attributes.clone(),
            sample_rate: inner.params.sample_rate,
            channel_mask: inner.params.channel_mask,
            channel_index_mask: inner.params.channel_index_mask,
            encoding: inner.params.encoding,
            buffer_size_bytes: inner.params.buffer_size_bytes,
            session_id: config.session_id,
            op_package_name: inner.op_package_name.clone(),
        };
        match inner.engine.setup(&request, EventSink::new(&inner)) {
            Ok(session_id) => {
                inner.session_id.store(session_id, Ordering::SeqCst);
                inner.initialized.store(true, Ordering::SeqCst);
            }
            Err(code) => {
                log::error!("error code {} when initializing native capture engine", code);
            }
        }

        Ok(Self { inner })
    }

    /// Legacy constructor taking a raw channel configuration. The deprecated
    /// mono/stereo aliases are accepted here.
    pub fn from_legacy(
        source: AudioSource,
        sample_rate: i32,
        channel_config: i32,
        encoding: Encoding,
        buffer_size_bytes: i32,
        engine: Box<dyn NativeCaptureEngine>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let mask = params::resolve_channel_mask(channel_config, true)?;
        let format = CaptureFormat::builder()
            .channel_mask(mask)
            .encoding(encoding)
            .sample_rate(sample_rate)
            .build();
        let attributes = CaptureAttributes::with_preset(source);
        let config = SessionConfig::new(attributes, format, buffer_size_bytes);
        Self::new(config, engine, collaborators)
    }

    pub fn downgrade(&self) -> WeakCaptureSession {
        self.inner.weak_session()
    }

    // --- Lifecycle ---

    pub fn start(&self) -> Result<()> {
        self.start_with_sync(SyncEvent::NONE)
    }

    /// Start recording, optionally deferred until `sync` fires.
    pub fn start_with_sync(&self, sync: SyncEvent) -> Result<()> {
        let inner = &self.inner;
        inner.require_initialized("start()")?;
        self.check_record_permission()?;
        inner.gate.check_microphone(inner.params.source)?;

        let mut recording = inner.recording.lock();
        // the policy queries above run unlocked and a release may have won
        inner.require_initialized("start()")?;
        inner.engine.start(sync)?;
        inner.handle_full_volume(true);
        *recording = RecordingState::Recording;
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        self.inner.stop()
    }

    /// Stop if needed and free the native engine. Safe to call repeatedly and
    /// from any thread; a blocking read in flight is released.
    pub fn release(&self) {
        self.inner.release();
    }

    // --- Reads ---

    pub fn read_bytes(
        &self,
        buffer: &mut [u8],
        offset: usize,
        size: usize,
        mode: ReadMode,
    ) -> Result<usize> {
        let range = self.check_read(false, buffer.len(), offset, size)?;
        Self::read_count(self.inner.engine.read_bytes(&mut buffer[range], mode.is_blocking()))
    }

    pub fn read_shorts(
        &self,
        buffer: &mut [i16],
        offset: usize,
        size: usize,
        mode: ReadMode,
    ) -> Result<usize> {
        let range = self.check_read(false, buffer.len(), offset, size)?;
        Self::read_count(self.inner.engine.read_shorts(&mut buffer[range], mode.is_blocking()))
    }

    /// Float reads require a `PCM_FLOAT` session.
    pub fn read_floats(
        &self,
        buffer: &mut [f32],
        offset: usize,
        size: usize,
        mode: ReadMode,
    ) -> Result<usize> {
        let range = self.check_read(true, buffer.len(), offset, size)?;
        Self::read_count(self.inner.engine.read_floats(&mut buffer[range], mode.is_blocking()))
    }

    /// Read `size` bytes into the start of a direct buffer.
    pub fn read_direct(&self, buffer: &mut [u8], size: usize, mode: ReadMode) -> Result<usize> {
        let range = self.check_read(false, buffer.len(), 0, size)?;
        Self::read_count(self.inner.engine.read_direct(&mut buffer[range], mode.is_blocking()))
    }

    fn check_read(
        &self,
        float_variant: bool,
        len: usize,
        offset: usize,
        size: usize,
    ) -> Result<Range<usize>> {
        let inner = &self.inner;
        inner.require_initialized("read()")?;

        let is_float = inner.params.encoding == Encoding::PCM_FLOAT;
        if float_variant && !is_float {
            log::error!("float read requires PCM float encoding");
            return Err(CaptureError::InvalidOperation(
                "float read requires PCM float encoding".into(),
            ));
        }
        if !float_variant && is_float {
            return Err(CaptureError::InvalidOperation(
                "PCM float session must be read with the float variant".into(),
            ));
        }

        let end = offset
            .checked_add(size)
            .filter(|end| *end <= len)
            .ok_or_else(|| {
                CaptureError::BadValue(format!(
                    "read of {} at offset {} exceeds buffer of {}",
                    size, offset, len
                ))
            })?;

        inner.gate.check_microphone(inner.params.source)?;
        inner.gate.check_audio_record(inner.params.source)?;
        Ok(offset..end)
    }

    fn read_count(count: i32) -> Result<usize> {
        if count >= 0 {
            Ok(count as usize)
        } else {
            Err(CaptureError::from_status(count))
        }
    }

    fn check_record_permission(&self) -> Result<()> {
        let Some(package) = self.inner.op_package_name.as_deref() else {
            return Ok(());
        };
        if self.inner.engine.check_permission(package) == SUCCESS {
            Ok(())
        } else {
            log::error!("record permission denied for {}", package);
            Err(CaptureError::InvalidOperation("record permission denied".into()))
        }
    }

    // --- Listeners ---

    /// Install or clear (`None`) the position listener.
    ///
    /// Without an explicit `context` the session's default context is used;
    /// if there is none either, `InvalidOperation` is returned.
    pub fn set_record_position_update_listener(
        &self,
        listener: Option<Arc<dyn RecordPositionListener>>,
        context: Option<Arc<dyn DispatchContext>>,
    ) -> Result<()> {
        match listener {
            None => {
                self.inner.position.clear();
                Ok(())
            }
            Some(listener) => {
                let context = self.resolve_context(context)?;
                self.inner.position.set(listener, context);
                Ok(())
            }
        }
    }

    pub fn add_on_routing_changed_listener(
        &self,
        listener: Arc<dyn RoutingChangedListener>,
        context: Option<Arc<dyn DispatchContext>>,
    ) -> Result<()> {
        let context = self.resolve_context(context)?;
        self.inner.routing.add(self.inner.engine.as_ref(), listener, context);
        Ok(())
    }

    pub fn remove_on_routing_changed_listener(&self, listener: &Arc<dyn RoutingChangedListener>) {
        self.inner.routing.remove(self.inner.engine.as_ref(), listener);
    }

    pub fn routing_listener_count(&self) -> usize {
        self.inner.routing.len()
    }

    fn resolve_context(
        &self,
        context: Option<Arc<dyn DispatchContext>>,
    ) -> Result<Arc<dyn DispatchContext>> {
        context
            .or_else(|| self.inner.default_context.clone())
            .ok_or_else(|| {
                CaptureError::InvalidOperation("no dispatch context for listener".into())
            })
    }

    pub fn set_notification_marker_position(&self, frames: i32) -> Result<()> {
        self.inner.require_initialized("set_notification_marker_position()")?;
        if frames < 0 {
            return Err(CaptureError::BadValue(format!("negative marker position {}", frames)));
        }
        Self::native_status(self.inner.engine.set_marker_position(frames))
    }

    pub fn set_position_notification_period(&self, frames: i32) -> Result<()> {
        self.inner.require_initialized("set_position_notification_period()")?;
        if frames < 0 {
            return Err(CaptureError::InvalidOperation(format!(
                "negative notification period {}",
                frames
            )));
        }
        Self::native_status(self.inner.engine.set_position_update_period(frames))
    }

    fn native_status(status: i32) -> Result<()> {
        if status == SUCCESS {
            Ok(())
        } else {
            Err(CaptureError::from_status(status))
        }
    }

    // --- Queries ---

    pub fn state(&self) -> SessionState {
        if self.inner.is_initialized() {
            SessionState::Initialized
        } else {
            SessionState::Uninitialized
        }
    }

    pub fn recording_state(&self) -> RecordingState {
        *self.inner.recording.lock()
    }

    pub fn sample_rate(&self) -> i32 {
        self.inner.params.sample_rate
    }

    pub fn audio_source(&self) -> AudioSource {
        self.inner.params.source
    }

    pub fn encoding(&self) -> Encoding {
        self.inner.params.encoding
    }

    pub fn channel_mask(&self) -> i32 {
        self.inner.params.channel_mask
    }

    pub fn channel_count(&self) -> usize {
        self.inner.params.channel_count
    }

    pub fn native_buffer_size_bytes(&self) -> usize {
        self.inner.params.buffer_size_bytes
    }

    pub fn is_submix_full_volume(&self) -> bool {
        self.inner.params.submix_full_volume
    }

    pub fn attributes(&self) -> &CaptureAttributes {
        &self.inner.params.attributes
    }

    /// The effective format, rebuilt from the validated parameters.
    pub fn format(&self) -> CaptureFormat {
        let p = &self.inner.params;
        let mut builder = CaptureFormat::builder()
            .sample_rate(p.sample_rate)
            .encoding(p.encoding);
        if p.channel_mask != channel_mask::INVALID {
            builder = builder.channel_mask(p.channel_mask);
        }
        if p.channel_index_mask != channel_mask::INVALID {
            builder = builder.channel_index_mask(p.channel_index_mask);
        }
        builder.build()
    }

    pub fn session_id(&self) -> i32 {
        self.inner.session_id.load(Ordering::SeqCst)
    }

    pub fn buffer_size_in_frames(&self) -> i32 {
        self.inner.engine.buffer_size_in_frames()
    }

    pub fn notification_marker_position(&self) -> i32 {
        self.inner.engine.marker_position()
    }

    pub fn position_notification_period(&self) -> i32 {
        self.inner.engine.position_update_period()
    }

    /// The input device currently feeding the session, if it can be resolved.
    pub fn routed_device(&self) -> Option<AudioDeviceInfo> {
        let id = self.inner.engine.routed_device_id();
        if id == 0 {
            return None;
        }
        self.inner.devices.find_input_device(id)
    }

    /// Ask the engine to route from `device`, or clear the preference with
    /// `None`. Output-only devices are refused.
    pub fn set_preferred_device(&self, device: Option<AudioDeviceInfo>) -> bool {
        if let Some(ref d) = device {
            if !d.is_source {
                return false;
            }
        }
        let id = device.as_ref().map(|d| d.id).unwrap_or(0);
        let accepted = self.inner.engine.set_input_device(id);
        if accepted {
            *self.inner.preferred_device.lock() = device;
        }
        accepted
    }

    pub fn preferred_device(&self) -> Option<AudioDeviceInfo> {
        self.inner.preferred_device.lock().clone()
    }

    /// Minimum buffer size in bytes for a capture with these parameters.
    ///
    /// `BadValue` for an unknown channel configuration or parameters the
    /// engine does not support, `Error` if the engine query failed.
    pub fn min_buffer_size(
        engine: &dyn NativeCaptureEngine,
        sample_rate: i32,
        channel_config: i32,
        encoding: Encoding,
    ) -> Result<usize> {
        let channel_count = params::channel_count_for_legacy_config(channel_config).map_err(|e| {
            log::error!("min_buffer_size(): {}", e);
            e
        })?;
        match engine.min_buffer_size(sample_rate, channel_count, encoding) {
            0 => Err(CaptureError::BadValue(format!(
                "unsupported parameters: {}Hz, {} channel(s), encoding {}",
                sample_rate, channel_count, encoding.0
            ))),
            ERROR => Err(CaptureError::Error("native minimum buffer size query failed".into())),
            size if size < 0 => Err(CaptureError::from_status(size)),
            size => Ok(size as usize),
        }
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("session_id", &self.session_id())
            .field("state", &self.state())
            .field("source", &self.inner.params.source)
            .field("sample_rate", &self.inner.params.sample_rate)
            .field("encoding", &self.inner.params.encoding)
            .field("channel_count", &self.inner.params.channel_count)
            .finish()
    }
}
