//! Error types for vvcsession

use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types returned by the session API
///
/// Variants carrying an empty detail string display the generic message of
/// their [`ErrorCode`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Internal fault, or an input picture that failed validation
    #[error("{}", or_generic(.0, ErrorCode::Unspecified))]
    Unspecified(String),

    /// Session not initialized, initialized twice, or a pass started too early
    #[error("{}", or_generic(.0, ErrorCode::Initialize))]
    Initialize(String),

    /// Allocation of a caller-visible buffer failed
    #[error("{}", or_generic(.0, ErrorCode::Allocate))]
    Allocate(String),

    /// Output buffer cannot hold the serialized access unit
    #[error("access unit payload size is too small to store data (payload size: {capacity}, needed {required})")]
    NotEnoughMemory { capacity: usize, required: usize },

    /// Output buffer is missing or has no capacity at all
    #[error("{}", or_generic(.0, ErrorCode::NotEnoughMemory))]
    NoOutputBuffer(String),

    /// Serializer wrote a different number of bytes than it predicted
    #[error("serialized access unit size mismatch (predicted {predicted}, written {written})")]
    SizeMismatch { predicted: usize, written: usize },

    /// Inconsistent or invalid configuration
    #[error("{}", or_generic(.0, ErrorCode::Parameter))]
    Parameter(String),

    /// Request the session does not support
    #[error("{}", or_generic(.0, ErrorCode::NotSupported))]
    NotSupported(String),

    /// Session must be re-initialized before it accepts this call
    #[error("{}", or_generic(.0, ErrorCode::RestartRequired))]
    RestartRequired(String),
}

fn or_generic(detail: &str, code: ErrorCode) -> &str {
    if detail.is_empty() {
        code.message()
    } else {
        detail
    }
}

/// Error code for FFI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub enum ErrorCode {
    /// Success
    Ok = 0,
    /// Unspecified malfunction
    Unspecified = -1,
    /// Not initialized or initialized twice
    Initialize = -2,
    /// Internal allocation error
    Allocate = -3,
    /// Output buffer too small
    NotEnoughMemory = -5,
    /// Invalid parameters
    Parameter = -7,
    /// Unsupported request
    NotSupported = -10,
    /// Session requires restart
    RestartRequired = -11,
    /// Unsupported CPU
    Cpu = -30,
}

impl ErrorCode {
    /// Every defined code, in table order
    pub const ALL: [ErrorCode; 9] = [
        ErrorCode::Ok,
        ErrorCode::Unspecified,
        ErrorCode::Initialize,
        ErrorCode::Allocate,
        ErrorCode::NotEnoughMemory,
        ErrorCode::Parameter,
        ErrorCode::NotSupported,
        ErrorCode::RestartRequired,
        ErrorCode::Cpu,
    ];

    /// Look up a code by its raw value
    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|code| *code as i32 == raw)
    }

    /// Fixed human-readable message for this code
    pub fn message(self) -> &'static str {
        error_message(self as i32)
    }
}

/// Message for an unrecognized error code
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error code";

/// Map a raw error code to its fixed message
///
/// Pure lookup, no session required. Unrecognized values map to
/// [`UNKNOWN_ERROR_MESSAGE`].
pub fn error_message(code: i32) -> &'static str {
    match code {
        0 => "expected behavior",
        -1 => "unspecified malfunction",
        -2 => "encoder not initialized or tried to initialize multiple times",
        -3 => "internal allocation error",
        -5 => "allocated memory to small to receive encoded data",
        -7 => "inconsistent or invalid parameters",
        -10 => "unsupported request",
        -11 => "encoder requires restart",
        -30 => "unsupported CPU SSE 4.1 needed",
        _ => UNKNOWN_ERROR_MESSAGE,
    }
}

impl From<&Error> for ErrorCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Unspecified(_) => ErrorCode::Unspecified,
            Error::Initialize(_) => ErrorCode::Initialize,
            Error::Allocate(_) => ErrorCode::Allocate,
            Error::NotEnoughMemory { .. } => ErrorCode::NotEnoughMemory,
            Error::NoOutputBuffer(_) => ErrorCode::NotEnoughMemory,
            Error::SizeMismatch { .. } => ErrorCode::NotEnoughMemory,
            Error::Parameter(_) => ErrorCode::Parameter,
            Error::NotSupported(_) => ErrorCode::NotSupported,
            Error::RestartRequired(_) => ErrorCode::RestartRequired,
        }
    }
}

impl Error {
    /// The error code this error is reported as
    pub fn code(&self) -> ErrorCode {
        ErrorCode::from(self)
    }
}

/// Fault raised inside an encoder engine or rate-control advisor
///
/// Never crosses the session API: the boundary turns it into
/// [`Error::Unspecified`] carrying the same message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineFault {
    message: String,
}

impl EngineFault {
    /// Create a fault with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The fault's message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for engine and advisor calls
pub type EngineResult<T> = std::result::Result<T, EngineFault>;
