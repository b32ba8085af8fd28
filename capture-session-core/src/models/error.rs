use thiserror::Error;

/// Operation succeeded.
pub const SUCCESS: i32 = 0;
/// Generic failure.
pub const ERROR: i32 = -1;
/// An argument was out of range or malformed.
pub const ERROR_BAD_VALUE: i32 = -2;
/// The operation is not allowed in the current state or by policy.
pub const ERROR_INVALID_OPERATION: i32 = -3;

/// A policy denial that the embedding application must answer by
/// terminating the calling process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalPolicyViolation {
    /// Which policy query denied the operation.
    pub restriction: &'static str,
    /// The capture source the caller was using.
    pub source: i32,
    /// The caller's uid.
    pub uid: u32,
}

/// Errors that can occur during capture session operations.
///
/// Every variant maps onto the integer return-code contract via
/// [`CaptureError::code`], so callers bridging to a C-style API can report
/// the same values the native layer uses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("bad value: {0}")]
    BadValue(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("error: {0}")]
    Error(String),

    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("policy backend unavailable: {0}")]
    PolicyUnavailable(String),

    #[error(
        "{} denied for source {} (uid {}): caller must be terminated",
        .0.restriction,
        .0.source,
        .0.uid
    )]
    FailFatal(FatalPolicyViolation),
}

impl CaptureError {
    /// Integer status code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::BadValue(_) | Self::UnsupportedConfiguration(_) => ERROR_BAD_VALUE,
            Self::InvalidOperation(_) | Self::FailFatal(_) => ERROR_INVALID_OPERATION,
            Self::Error(_) | Self::PolicyUnavailable(_) => ERROR,
        }
    }

    /// Convert a negative native status into an error, keeping the code.
    ///
    /// Unknown negative codes become [`CaptureError::Error`].
    pub fn from_status(status: i32) -> Self {
        match status {
            ERROR_BAD_VALUE => Self::BadValue(format!("native status {}", status)),
            ERROR_INVALID_OPERATION => Self::InvalidOperation(format!("native status {}", status)),
            _ => Self::Error(format!("native status {}", status)),
        }
    }

    pub fn is_fail_fatal(&self) -> bool {
        matches!(self, Self::FailFatal(_))
    }
}

/// Result type alias for capture session operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Collapse a unit result into the integer return-code contract.
pub fn status_of(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => SUCCESS,
        Err(e) => e.code(),
    }
}
