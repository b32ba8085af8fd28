use std::sync::Arc;

use crate::models::audio_models::AudioSource;
use crate::models::config::PolicyConfig;
use crate::models::error::{CaptureError, FatalPolicyViolation};
use crate::traits::policy::PolicyBackend;

/// First uid of the application range.
pub const FIRST_APPLICATION_UID: u32 = 10_000;
/// Last uid of the application range.
pub const LAST_APPLICATION_UID: u32 = 19_999;
/// Uid of the system server.
pub const SYSTEM_UID: u32 = 1000;

/// Who is driving the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallerIdentity {
    pub uid: u32,
}

impl CallerIdentity {
    pub fn system() -> Self {
        Self { uid: SYSTEM_UID }
    }

    pub fn application(uid: u32) -> Self {
        Self { uid }
    }

    /// Whether the caller is an ordinary (non-system) application.
    pub fn is_application(&self) -> bool {
        (FIRST_APPLICATION_UID..=LAST_APPLICATION_UID).contains(&self.uid)
    }
}

impl Default for CallerIdentity {
    fn default() -> Self {
        Self::system()
    }
}

/// Runtime policy checks for one session.
///
/// An unreachable backend is answered with `PolicyConfig::fail_open`
/// (allowed by default). A denial is an `InvalidOperation`, except that a
/// privileged source denied to an application caller becomes `FailFatal`.
#[derive(Clone)]
pub struct PolicyGate {
    backend: Arc<dyn PolicyBackend>,
    config: PolicyConfig,
    caller: CallerIdentity,
}

impl PolicyGate {
    pub fn new(
        backend: Arc<dyn PolicyBackend>,
        config: PolicyConfig,
        caller: CallerIdentity,
    ) -> Self {
        Self {
            backend,
            config,
            caller,
        }
    }

    pub fn caller(&self) -> CallerIdentity {
        self.caller
    }

    pub fn microphone_enabled(&self) -> bool {
        self.resolve("microphone", self.backend.is_microphone_enabled(true))
    }

    /// Microphone query that asks the backend not to surface a notice.
    pub fn microphone_enabled_quietly(&self) -> bool {
        self.resolve("microphone", self.backend.is_microphone_enabled(false))
    }

    pub fn audio_record_allowed(&self) -> bool {
        self.resolve("audio record", self.backend.is_audio_record_allowed(true))
    }

    pub fn check_microphone(&self, source: AudioSource) -> Result<(), CaptureError> {
        if self.microphone_enabled() {
            Ok(())
        } else {
            Err(self.deny("microphone", source))
        }
    }

    /// Only record-restricted sources are subject to this check.
    pub fn check_audio_record(&self, source: AudioSource) -> Result<(), CaptureError> {
        if !source.is_record_restricted() || self.audio_record_allowed() {
            Ok(())
        } else {
            Err(self.deny("audio record", source))
        }
    }

    fn resolve(&self, query: &str, answer: Result<bool, CaptureError>) -> bool {
        match answer {
            Ok(allowed) => allowed,
            Err(e) => {
                log::warn!(
                    "{} policy query failed ({}), treating as {}",
                    query,
                    e,
                    if self.config.fail_open { "allowed" } else { "denied" }
                );
                self.config.fail_open
            }
        }
    }

    fn deny(&self, restriction: &'static str, source: AudioSource) -> CaptureError {
        log::info!("{} is disabled by policy (source {})", restriction, source.0);
        if source.is_privileged() && self.caller.is_application() {
            CaptureError::FailFatal(FatalPolicyViolation {
                restriction,
                source: source.0,
                uid: self.caller.uid,
            })
        } else {
            CaptureError::InvalidOperation(format!("{} disabled by policy", restriction))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        microphone: Result<bool, CaptureError>,
        record: Result<bool, CaptureError>,
    }

    impl PolicyBackend for Fixed {
        fn is_microphone_enabled(&self, _show_notice: bool) -> Result<bool, CaptureError> {
            self.microphone.clone()
        }

        fn is_audio_record_allowed(&self, _show_notice: bool) -> Result<bool, CaptureError> {
            self.record.clone()
        }
    }

    fn gate(
        microphone: Result<bool, CaptureError>,
        record: Result<bool, CaptureError>,
        caller: CallerIdentity,
    ) -> PolicyGate {
        let backend = Arc::new(Fixed { microphone, record });
        PolicyGate::new(backend, PolicyConfig::default(), caller)
    }

    fn unreachable() -> Result<bool, CaptureError> {
        Err(CaptureError::PolicyUnavailable("service down".into()))
    }

    #[test]
    fn unreachable_backend_fails_open_by_default() {
        let gate = gate(unreachable(), unreachable(), CallerIdentity::application(10_050));
        assert!(gate.microphone_enabled());
        assert!(gate.audio_record_allowed());
        assert!(gate.check_microphone(AudioSource::MIC).is_ok());
    }

    #[test]
    fn fail_closed_when_configured() {
        let gate = PolicyGate::new(
            Arc::new(Fixed {
                microphone: unreachable(),
                record: unreachable(),
            }),
            PolicyConfig { fail_open: false },
            CallerIdentity::system(),
        );
        assert!(!gate.microphone_enabled());
        let err = gate.check_microphone(AudioSource::VOICE_CALL).unwrap_err();
        assert_eq!(err.code(), -3);
    }

    #[test]
    fn privileged_denial_for_application_is_fatal() {
        let gate = gate(Ok(false), Ok(true), CallerIdentity::application(10_050));
        let err = gate.check_microphone(AudioSource::MIC).unwrap_err();
        assert!(err.is_fail_fatal());
    }

    #[test]
    fn privileged_denial_for_system_is_invalid_operation() {
        let gate = gate(Ok(false), Ok(true), CallerIdentity::system());
        let err = gate.check_microphone(AudioSource::MIC).unwrap_err();
        assert_eq!(err, CaptureError::InvalidOperation("microphone disabled by policy".into()));
    }

    #[test]
    fn non_privileged_denial_is_invalid_operation() {
        let gate = gate(Ok(false), Ok(true), CallerIdentity::application(10_050));
        let err = gate.check_microphone(AudioSource::VOICE_CALL).unwrap_err();
        assert!(!err.is_fail_fatal());
        assert_eq!(err.code(), -3);
    }

    #[test]
    fn audio_record_only_gates_restricted_sources() {
        let gate = gate(Ok(true), Ok(false), CallerIdentity::application(10_050));
        assert!(gate.check_audio_record(AudioSource::VOICE_RECOGNITION).is_ok());
        let err = gate.check_audio_record(AudioSource::CAMCORDER).unwrap_err();
        assert!(err.is_fail_fatal());
    }

    #[test]
    fn application_uid_range() {
        assert!(!CallerIdentity::application(9_999).is_application());
        assert!(CallerIdentity::application(10_000).is_application());
        assert!(CallerIdentity::application(19_999).is_application());
        assert!(!CallerIdentity::application(20_000).is_application());
        assert!(!CallerIdentity::default().is_application());
    }
}
