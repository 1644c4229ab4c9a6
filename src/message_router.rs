/*
 * Decides what the window procedure does with one message, given whether the
 * controller was free to take it and what the controller answered. Kept free of
 * Win32 calls so the routing rules can be tested on every platform; the Windows
 * router in `window_common` only executes the returned decision.
 */
use crate::error::Result;
use crate::types::{DispatchResult, MSG_CLOSE, MSG_SYSCOMMAND, SC_CLOSE, loword};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageRoute {
    // The controller handled the message; return this result code.
    Handled(isize),
    // Hand the message to the default window procedure.
    Default,
    // Return 0 without default processing.
    Swallow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RouteDecision {
    pub route: MessageRoute,
    // Destroy the native window once the controller borrow is released.
    pub teardown: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContextRelease {
    Now,
    // The controller is still borrowed by an outer frame; free it when that frame unwinds.
    Deferred,
}

/// Whether `msg` would make the default window procedure destroy the window.
pub(crate) fn is_close_request(msg: u32, wparam: usize) -> bool {
    match msg {
        MSG_CLOSE => true,
        // The low four bits of the system command are used internally by Windows.
        MSG_SYSCOMMAND => (loword(wparam) & 0xFFF0) == SC_CLOSE,
        _ => false,
    }
}

/*
 * `outcome` is `None` when the controller was already borrowed, which only
 * happens for messages delivered by a nested modal loop. Close requests arriving
 * that way are swallowed so the window outlives the notice; everything else gets
 * default processing and never reaches a handler.
 */
pub(crate) fn decide_route(
    msg: u32,
    wparam: usize,
    outcome: Option<Result<DispatchResult>>,
    teardown_pending: bool,
) -> RouteDecision {
    let route = match outcome {
        None if is_close_request(msg, wparam) => {
            log::debug!("Close request 0x{msg:04X} swallowed while a modal notice is up.");
            MessageRoute::Swallow
        }
        None => MessageRoute::Default,
        Some(Ok(result)) if result.handled => MessageRoute::Handled(result.result_code),
        Some(Ok(_)) => MessageRoute::Default,
        Some(Err(err)) => {
            log::warn!("Message 0x{msg:04X} rejected: {err}");
            MessageRoute::Default
        }
    };
    RouteDecision {
        route,
        teardown: teardown_pending,
    }
}

pub(crate) fn release_on_final_message(controller_borrowed: bool) -> ContextRelease {
    if controller_borrowed {
        ContextRelease::Deferred
    } else {
        ContextRelease::Now
    }
}
