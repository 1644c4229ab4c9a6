/*
 * Error type shared by the dispatch table, the window controller and the Win32 host.
 * Construction errors (`DuplicateHandler`) are fatal to startup, `OrderingViolation`
 * is reported at runtime and leaves the window state untouched. The remaining
 * variants carry failures surfaced by the native windowing layer.
 */
use crate::types::{EventCategory, SubCodeMatch, WindowState};

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    // Two handlers were registered for the same (category, code, sub-code) tuple.
    DuplicateHandler {
        category: EventCategory,
        code: u32,
        sub_code: SubCodeMatch,
    },
    // A lifecycle event arrived in a state that does not accept it.
    OrderingViolation { state: WindowState, code: u32 },
    InitializationFailed(String),
    InvalidHandle(String),
    OperationFailed(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::DuplicateHandler {
                category,
                code,
                sub_code,
            } => write!(
                f,
                "duplicate handler for {category:?} code 0x{code:04X} sub-code {sub_code:?}"
            ),
            DispatchError::OrderingViolation { state, code } => write!(
                f,
                "event code 0x{code:04X} is out of order in window state {state:?}"
            ),
            DispatchError::InitializationFailed(msg) => write!(f, "initialization failed: {msg}"),
            DispatchError::InvalidHandle(msg) => write!(f, "invalid handle: {msg}"),
            DispatchError::OperationFailed(msg) => write!(f, "operation failed: {msg}"),
        }
    }
}

impl std::error::Error for DispatchError {}

#[cfg(target_os = "windows")]
impl From<windows::core::Error> for DispatchError {
    fn from(err: windows::core::Error) -> Self {
        DispatchError::OperationFailed(format!("Win32 call failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
