/*
 * Public entry point of the windispatch crate: a minimal desktop window whose
 * behavior is driven by a data-driven message map.
 *
 * The dispatch table, the lifecycle controller and the event types are portable
 * and compile on every platform, so the dispatch logic is tested anywhere. The
 * Win32 host (class registration, window procedure, message loop) is only built
 * on Windows.
 */
#[cfg(target_os = "windows")]
pub mod app;
pub mod controller;
pub mod dispatch_table;
pub mod error;
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) mod message_router;
pub mod types;
#[cfg(target_os = "windows")]
pub(crate) mod window_common;

#[cfg(target_os = "windows")]
pub use app::{WindowApp, show_fatal_error};
pub use controller::{EXIT_CODE_SUCCESS, Handler, WindowController, process_exit_code};
pub use dispatch_table::{DispatchTable, DispatchTableBuilder};
pub use error::{DispatchError, Result as WindowResult};
pub use types::{
    CommandId, DispatchResult, Event, EventCategory, EventPayload, ID_ABOUT, MSG_CLOSE,
    MSG_COMMAND, MSG_DESTROY, Notice, SubCodeMatch, WindowConfig, WindowEventHandler, WindowHost,
    WindowState,
};
