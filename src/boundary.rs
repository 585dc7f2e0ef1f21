//! Fault boundary between the session API and its engine
//!
//! Everything the engine does runs through [`guard`]. Engine faults and
//! panics both come out as [`Error::Unspecified`] with the fault's message.

use crate::error::{EngineResult, Error, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run an engine operation, converting faults and panics into `Unspecified`
pub fn guard<T, F>(op: F) -> Result<T>
where
    F: FnOnce() -> EngineResult<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(fault)) => Err(Error::Unspecified(fault.message().to_string())),
        Err(payload) => Err(Error::Unspecified(panic_message(payload.as_ref()))),
    }
}

/// Run an arbitrary fallible operation, converting panics into `Unspecified`
pub fn catch<T, F>(op: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    panic::catch_unwind(AssertUnwindSafe(op))
        .unwrap_or_else(|payload| Err(Error::Unspecified(panic_message(payload.as_ref()))))
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal panic".to_string()
    }
}
