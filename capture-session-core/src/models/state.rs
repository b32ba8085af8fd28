use serde::{Deserialize, Serialize};

/// Lifecycle state of a capture session.
///
/// State transitions:
/// ```text
/// Uninitialized ──(native setup ok)──→ Initialized
///       ↑                                   │
///       └─────────────(release)─────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Uninitialized,
    Initialized,
}

impl SessionState {
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Initialized)
    }

    /// Integer code used by the native layer (0 / 1).
    pub fn code(&self) -> i32 {
        match self {
            Self::Uninitialized => 0,
            Self::Initialized => 1,
        }
    }
}

/// Recording state, orthogonal to [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordingState {
    Stopped,
    Recording,
}

impl RecordingState {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    /// Integer code used by the native layer (1 / 3).
    pub fn code(&self) -> i32 {
        match self {
            Self::Stopped => 1,
            Self::Recording => 3,
        }
    }
}
