use crate::models::error::CaptureError;

/// Cross-process side channel that forces remote-submix capture to full
/// volume while a session records.
///
/// `token` identifies the requesting session so the service can drop the
/// request if the session disappears.
pub trait SubmixVolumeNotifier: Send + Sync {
    fn force_submix_full_volume(&self, starting: bool, token: u64) -> Result<(), CaptureError>;
}

/// Notifier that only logs the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSubmixNotifier;

impl SubmixVolumeNotifier for LoggingSubmixNotifier {
    fn force_submix_full_volume(&self, starting: bool, token: u64) -> Result<(), CaptureError> {
        log::debug!("submix full volume {} for session token {}", starting, token);
        Ok(())
    }
}
