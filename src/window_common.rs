/*
 * Win32 plumbing for the sample window: window class registration, native window
 * creation, the window procedure router and `Win32WindowHost`, which turns the
 * controller's outbound requests into Win32 calls.
 *
 * The controller for a window lives in a `WindowCreationContext` handed to
 * `CreateWindowExW` and stored in `GWLP_USERDATA` on WM_NCCREATE. It is freed on
 * WM_NCDESTROY, or by the frame holding the controller if the window dies under it.
 */
use crate::controller::{EXIT_CODE_SUCCESS, WindowController};
use crate::error::{DispatchError, Result as WindowResult};
use crate::message_router::{
    ContextRelease, MessageRoute, RouteDecision, decide_route, release_on_final_message,
};
use crate::types::{Event, Notice, WindowConfig, WindowEventHandler, WindowHost};

use windows::{
    Win32::{
        Foundation::{
            ERROR_INVALID_WINDOW_HANDLE, GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM,
        },
        Graphics::Gdi::{COLOR_WINDOW, HBRUSH, UpdateWindow},
        UI::WindowsAndMessaging::*,
    },
    core::{HSTRING, PCWSTR},
};

use std::cell::{Cell, RefCell};
use std::ffi::c_void;

// Represents an invalid HWND, used before WM_NCCREATE attaches the real one.
pub(crate) const HWND_INVALID: HWND = HWND(std::ptr::null_mut());

pub(crate) type SampleController = WindowController<Win32WindowHost>;

/*
 * `WindowHost` backed by a native window. Teardown is deferred: `DestroyWindow`
 * sends WM_DESTROY synchronously, so it is issued by the router after the
 * controller borrow for the current message has been released.
 */
#[derive(Debug)]
pub(crate) struct Win32WindowHost {
    hwnd: HWND,
    teardown_pending: bool,
}

impl Win32WindowHost {
    pub(crate) fn new() -> Self {
        Self {
            hwnd: HWND_INVALID,
            teardown_pending: false,
        }
    }

    fn attach(&mut self, hwnd: HWND) {
        self.hwnd = hwnd;
    }

    fn take_pending_teardown(&mut self) -> bool {
        std::mem::take(&mut self.teardown_pending)
    }
}

impl WindowHost for Win32WindowHost {
    fn request_teardown(&mut self) -> WindowResult<()> {
        if self.hwnd.is_invalid() {
            return Err(DispatchError::InvalidHandle(
                "teardown requested before the native window was attached".to_string(),
            ));
        }
        log::debug!("Win32WindowHost: teardown of HWND {:?} queued.", self.hwnd);
        self.teardown_pending = true;
        Ok(())
    }

    fn signal_quit(&mut self, exit_code: i32) {
        log::debug!("Win32WindowHost: posting WM_QUIT with exit code {exit_code}.");
        unsafe { PostQuitMessage(exit_code) };
    }

    fn show_notice(&mut self, notice: &Notice) {
        let owner = (!self.hwnd.is_invalid()).then_some(self.hwnd);
        unsafe {
            let _ = MessageBoxW(
                owner,
                &HSTRING::from(notice.body.as_str()),
                &HSTRING::from(notice.title.as_str()),
                MB_OK | MB_ICONINFORMATION,
            );
        }
    }
}

struct WindowCreationContext {
    controller: RefCell<SampleController>,
    // Set by a WM_NCDESTROY that arrived while the controller was borrowed.
    release_pending: Cell<bool>,
}

/*
 * Registers the window class unless a class with the same name already exists.
 */
pub(crate) fn register_window_class(h_instance: HINSTANCE, class_name: &str) -> WindowResult<()> {
    let class_name_hstring = HSTRING::from(class_name);
    let class_name_pcwstr = PCWSTR(class_name_hstring.as_ptr());

    unsafe {
        let mut wc_test = WNDCLASSEXW::default();
        if GetClassInfoExW(Some(h_instance), class_name_pcwstr, &mut wc_test).is_ok() {
            log::debug!("Platform: Window class '{class_name}' already registered.");
            return Ok(());
        }

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(window_proc_router),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: h_instance,
            hIcon: LoadIconW(None, IDI_APPLICATION)?,
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            hbrBackground: HBRUSH((COLOR_WINDOW.0 + 1) as *mut c_void),
            lpszMenuName: PCWSTR::null(),
            lpszClassName: class_name_pcwstr,
            hIconSm: LoadIconW(None, IDI_APPLICATION)?,
        };

        if RegisterClassExW(&wc) == 0 {
            let error = GetLastError();
            log::error!("Platform: RegisterClassExW failed: {error:?}");
            Err(DispatchError::InitializationFailed(format!(
                "RegisterClassExW failed: {error:?}"
            )))
        } else {
            log::debug!("Platform: Window class '{class_name}' registered successfully.");
            Ok(())
        }
    }
}

/*
 * Creates the top-level window and hands ownership of `controller` to it. The
 * controller is attached to the HWND during WM_NCCREATE.
 */
pub(crate) fn create_native_window(
    h_instance: HINSTANCE,
    config: &WindowConfig,
    controller: SampleController,
    menu: HMENU,
) -> WindowResult<HWND> {
    let creation_context = Box::new(WindowCreationContext {
        controller: RefCell::new(controller),
        release_pending: Cell::new(false),
    });

    unsafe {
        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE(0),
            &HSTRING::from(config.class_name.as_str()),
            &HSTRING::from(config.title.as_str()),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            config.width,
            config.height,
            None,
            Some(menu),
            Some(h_instance),
            Some(Box::into_raw(creation_context) as *mut c_void),
        )?;
        log::debug!("Platform: created window '{}' as HWND {hwnd:?}.", config.title);
        Ok(hwnd)
    }
}

pub(crate) fn show_window(hwnd: HWND) {
    log::debug!("Platform: showing HWND {hwnd:?}.");
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = UpdateWindow(hwnd);
    }
}

/*
 * Runs `f` against the controller attached to `hwnd`. Fails if the window has no
 * controller or the controller is busy with another message.
 */
pub(crate) fn with_controller<R, F>(hwnd: HWND, f: F) -> WindowResult<R>
where
    F: FnOnce(&mut SampleController) -> WindowResult<R>,
{
    let context_ptr =
        unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const WindowCreationContext };
    let Some(context) = (unsafe { context_ptr.as_ref() }) else {
        return Err(DispatchError::InvalidHandle(format!(
            "no controller attached to HWND {hwnd:?}"
        )));
    };
    let mut controller = context.controller.try_borrow_mut().map_err(|_| {
        DispatchError::OperationFailed(format!("controller for HWND {hwnd:?} is busy"))
    })?;
    f(&mut controller)
}

/*
 * Window procedure shared by every window of the class. Retrieves the creation
 * context, lets `route_message` dispatch the message and executes the resulting
 * `RouteDecision` once the controller borrow has been released.
 *
 * The context may be freed by a nested WM_NCDESTROY during default processing or
 * teardown, so it is not touched after either of those has run.
 */
unsafe extern "system" fn window_proc_router(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let context_ptr = if msg == WM_NCCREATE {
        let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
        let context_raw_ptr = create_struct.lpCreateParams as *mut WindowCreationContext;
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, context_raw_ptr as isize) };
        if let Some(context) = unsafe { context_raw_ptr.as_ref() } {
            context.controller.borrow_mut().host_mut().attach(hwnd);
        }
        context_raw_ptr
    } else {
        unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut WindowCreationContext }
    };

    if context_ptr.is_null() {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }

    if msg == WM_NCDESTROY {
        release_context(hwnd, context_ptr);
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }

    let (decision, dispatched) =
        route_message(unsafe { &*context_ptr }, hwnd, msg, wparam, lparam);

    if dispatched && unsafe { (*context_ptr).release_pending.get() } {
        // The window died under this frame's borrow; it was the last user of the context.
        log::debug!("Releasing deferred controller for HWND {hwnd:?}.");
        let mut context = unsafe { Box::from_raw(context_ptr) };
        let controller = context.controller.get_mut();
        if !controller.state().is_terminal() {
            // WM_DESTROY went to default processing, so the loop was never told to stop.
            controller.host_mut().signal_quit(EXIT_CODE_SUCCESS);
        }
        drop(context);
        return execute_route(decision.route, hwnd, msg, wparam, lparam);
    }

    let result = execute_route(decision.route, hwnd, msg, wparam, lparam);
    if decision.teardown {
        destroy_native_window(hwnd);
    }
    result
}

/*
 * Handles WM_NCDESTROY, the last message a window receives. The context is freed
 * right away unless an outer frame still holds the controller, in which case
 * that frame frees it when it unwinds.
 */
fn release_context(hwnd: HWND, context_ptr: *mut WindowCreationContext) {
    unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) };
    let borrowed = unsafe { (*context_ptr).controller.try_borrow().is_err() };
    match release_on_final_message(borrowed) {
        ContextRelease::Now => {
            log::debug!("WM_NCDESTROY received for HWND {hwnd:?}. Releasing controller.");
            let _ = unsafe { Box::from_raw(context_ptr) };
        }
        ContextRelease::Deferred => {
            log::warn!(
                "WM_NCDESTROY for HWND {hwnd:?} while its controller is busy; deferring release."
            );
            unsafe { (*context_ptr).release_pending.set(true) };
        }
    }
}

/*
 * Translates one window message into an `Event` and hands it to the controller.
 * Returns the routing decision and whether this frame held the controller.
 */
fn route_message(
    context: &WindowCreationContext,
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> (RouteDecision, bool) {
    let Ok(mut controller) = context.controller.try_borrow_mut() else {
        log::trace!("Message 0x{msg:04X} for HWND {hwnd:?} arrived during a modal notice.");
        return (decide_route(msg, wparam.0, None, false), false);
    };
    let event = Event::from_raw(msg, wparam.0, lparam.0);
    let outcome = controller.handle_event(&event);
    let teardown = controller.host_mut().take_pending_teardown();
    drop(controller);

    (decide_route(msg, wparam.0, Some(outcome), teardown), true)
}

fn execute_route(
    route: MessageRoute,
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match route {
        MessageRoute::Handled(code) => LRESULT(code),
        MessageRoute::Swallow => LRESULT(0),
        MessageRoute::Default => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

/*
 * Calls `DestroyWindow`. WM_DESTROY and WM_NCDESTROY are delivered before this
 * returns. An already destroyed handle is not treated as an error.
 */
fn destroy_native_window(hwnd: HWND) {
    log::debug!("Calling DestroyWindow for HWND {hwnd:?}.");
    unsafe {
        if DestroyWindow(hwnd).is_err() {
            let last_error = GetLastError();
            if last_error.0 != ERROR_INVALID_WINDOW_HANDLE.0 {
                log::error!("DestroyWindow for HWND {hwnd:?} failed: {last_error:?}");
            } else {
                log::debug!(
                    "DestroyWindow for HWND {hwnd:?} reported invalid handle (already destroyed?)."
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teardown_before_attach_is_rejected() {
        let mut host = Win32WindowHost::new();

        let err = host.request_teardown().unwrap_err();

        assert!(matches!(err, DispatchError::InvalidHandle(_)));
        assert!(!host.take_pending_teardown());
    }

    #[test]
    fn teardown_is_deferred_until_taken_once() {
        // Arrange: dummy handle, never passed to Win32.
        let mut host = Win32WindowHost::new();
        host.attach(HWND(0x1234 as *mut c_void));

        // Act
        host.request_teardown().unwrap();

        // Assert
        assert!(host.take_pending_teardown());
        assert!(!host.take_pending_teardown());
    }
}
