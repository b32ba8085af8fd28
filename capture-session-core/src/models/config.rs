use serde::{Deserialize, Serialize};

use super::attributes::CaptureAttributes;
use super::error::CaptureError;
use super::format::CaptureFormat;

/// Configuration for a capture session.
///
/// Validated once by session construction, immutable afterwards. Can be
/// loaded from JSON so hosts can keep capture profiles on disk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub attributes: CaptureAttributes,
    pub format: CaptureFormat,

    /// Native buffer size in bytes. Must be a positive multiple of the frame size.
    pub buffer_size_bytes: i32,

    /// Requested session id, 0 lets the native layer allocate one.
    #[serde(default)]
    pub session_id: i32,
}

impl SessionConfig {
    pub fn new(
        attributes: CaptureAttributes,
        format: CaptureFormat,
        buffer_size_bytes: i32,
    ) -> Self {
        Self {
            attributes,
            format,
            buffer_size_bytes,
            session_id: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        serde_json::from_str(json)
            .map_err(|e| CaptureError::BadValue(format!("failed to parse session config: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, CaptureError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CaptureError::Error(format!("failed to serialize session config: {}", e)))
    }
}

/// Policy gate tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Treat an unreachable policy backend as "allowed".
    pub fail_open: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self { fail_open: true }
    }
}
