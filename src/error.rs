//! Error taxonomy and result-code translation.
//!
//! Every native call returns either a non-negative value or one of four
//! negative `sp_return` codes. [`check`] turns that protocol into
//! [`SerialError`], pulling the OS error code and message out of the
//! thread-scoped last-error record when the library reports `SP_ERR_FAIL`.

use crate::ffi::{NativeApi, SP_ERR_ARG, SP_ERR_FAIL, SP_ERR_MEM, SP_ERR_SUPP};
use std::ffi::{c_int, CStr};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by the binding layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerialError {
    /// Invalid argument, or a native resource in the wrong state
    /// (e.g. an operation on a port that is not open). Indicates a bug in
    /// the calling code.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The operating system reported a failure.
    #[error("OS error {code}: {message}")]
    Os { code: i32, message: String },

    /// The operation is not supported by this OS, device or library build.
    #[error("operation not supported on this OS or device")]
    Unsupported,

    /// libserialport could not allocate memory it needed.
    #[error("libserialport was unable to allocate memory")]
    ResourceExhausted,

    /// The wrapper was used after its native resource had been released.
    #[error("{0} already released")]
    Disposed(&'static str),

    /// The library returned a negative code outside the documented set.
    #[error("unrecognised libserialport return code {0}")]
    UnknownCode(i32),
}

impl SerialError {
    /// Create an Argument error from a message.
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    /// Whether this error indicates a usage bug rather than a runtime
    /// condition.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::Argument(_) | Self::Disposed(_))
    }
}

/// Result type for binding operations.
pub type Result<T> = std::result::Result<T, SerialError>;

/// Translate a native return value.
///
/// Must be called immediately after the native call that produced `ret`, on
/// the same thread, with no native call in between: the `SP_ERR_FAIL` detail
/// lives in a last-error record that the next call overwrites.
pub(crate) fn check<N: NativeApi + ?Sized>(native: &N, ret: c_int) -> Result<usize> {
    if ret >= 0 {
        return Ok(ret as usize);
    }
    Err(match ret {
        SP_ERR_ARG => SerialError::argument("libserialport returned SP_ERR_ARG"),
        SP_ERR_FAIL => last_os_error(native),
        SP_ERR_SUPP => SerialError::Unsupported,
        SP_ERR_MEM => SerialError::ResourceExhausted,
        other => SerialError::UnknownCode(other),
    })
}

/// Read and release the calling thread's last-error record.
fn last_os_error<N: NativeApi + ?Sized>(native: &N) -> SerialError {
    // SAFETY: both queries take no arguments; the message pointer is owned by
    // us and released exactly once below, after it has been copied.
    let code = unsafe { native.last_error_code() };
    let raw = unsafe { native.last_error_message() };
    let message = if raw.is_null() {
        String::new()
    } else {
        let copied = unsafe { CStr::from_ptr(raw) }
            .to_string_lossy()
            .trim_end()
            .to_string();
        unsafe { native.free_error_message(raw) };
        copied
    };
    debug!(code, %message, "libserialport reported an OS error");
    SerialError::Os { code, message }
}
