use crate::models::error::CaptureError;

/// Backend answering restriction queries (device management policy,
/// parental controls, and so on).
///
/// Returning `Err` means the backend could not be reached; the policy gate
/// decides what that means.
pub trait PolicyBackend: Send + Sync {
    /// Whether the microphone is enabled. `show_notice` asks the backend to
    /// surface its own user-facing notice on denial.
    fn is_microphone_enabled(&self, show_notice: bool) -> Result<bool, CaptureError>;

    /// Whether audio recording is allowed at all.
    fn is_audio_record_allowed(&self, show_notice: bool) -> Result<bool, CaptureError>;
}

/// Backend that allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllPolicy;

impl PolicyBackend for AllowAllPolicy {
    fn is_microphone_enabled(&self, _show_notice: bool) -> Result<bool, CaptureError> {
        Ok(true)
    }

    fn is_audio_record_allowed(&self, _show_notice: bool) -> Result<bool, CaptureError> {
        Ok(true)
    }
}
