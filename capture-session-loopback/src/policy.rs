//! Policy backend with host-controlled answers.
//!
//! Stands in for the platform privacy service: the host flips the microphone
//! and record toggles, or marks the service unreachable to exercise the
//! session's fail-open handling.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use capture_session_core::{CaptureError, PolicyBackend};

#[derive(Debug)]
pub struct StaticPolicy {
    microphone: AtomicBool,
    audio_record: AtomicBool,
    reachable: AtomicBool,
    notices: AtomicUsize,
}

impl Default for StaticPolicy {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl StaticPolicy {
    pub fn new(microphone: bool, audio_record: bool) -> Self {
        Self {
            microphone: AtomicBool::new(microphone),
            audio_record: AtomicBool::new(audio_record),
            reachable: AtomicBool::new(true),
            notices: AtomicUsize::new(0),
        }
    }

    pub fn set_microphone_enabled(&self, enabled: bool) {
        self.microphone.store(enabled, Ordering::SeqCst);
    }

    pub fn set_audio_record_allowed(&self, allowed: bool) {
        self.audio_record.store(allowed, Ordering::SeqCst);
    }

    /// While unreachable every query fails with `PolicyUnavailable`.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// How many denials were answered with a user-visible notice.
    pub fn notices_shown(&self) -> usize {
        self.notices.load(Ordering::SeqCst)
    }

    fn answer(&self, flag: &AtomicBool, show_notice: bool) -> Result<bool, CaptureError> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(CaptureError::PolicyUnavailable("policy service not reachable".into()));
        }
        let allowed = flag.load(Ordering::SeqCst);
        if !allowed && show_notice {
            self.notices.fetch_add(1, Ordering::SeqCst);
        }
        Ok(allowed)
    }
}

impl PolicyBackend for StaticPolicy {
    fn is_microphone_enabled(&self, show_notice: bool) -> Result<bool, CaptureError> {
        self.answer(&self.microphone, show_notice)
    }

    fn is_audio_record_allowed(&self, show_notice: bool) -> Result<bool, CaptureError> {
        self.answer(&self.audio_record, show_notice)
    }
}
