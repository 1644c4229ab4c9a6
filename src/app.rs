/*
 * Application entry for the sample window on Windows. `WindowApp` registers the
 * window class, builds the menu bar, creates the window with its controller,
 * shows it and runs the message loop until the controller posts WM_QUIT.
 */
use crate::controller::WindowController;
use crate::error::{DispatchError, Result as WindowResult};
use crate::types::{ID_ABOUT, WindowConfig};
use crate::window_common::{
    SampleController, Win32WindowHost, create_native_window, register_window_class, show_window,
    with_controller,
};

use windows::{
    Win32::{
        Foundation::{GetLastError, HINSTANCE},
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{
            AppendMenuW, CreateMenu, CreatePopupMenu, DestroyMenu, DispatchMessageW, GetMessageW,
            HMENU, MB_ICONERROR, MB_OK, MF_POPUP, MF_STRING, MSG, MessageBoxW, TranslateMessage,
        },
    },
    core::{HSTRING, w},
};

#[derive(Debug)]
pub struct WindowApp {
    config: WindowConfig,
    h_instance: HINSTANCE,
}

impl WindowApp {
    pub fn new(config: WindowConfig) -> WindowResult<Self> {
        let module = unsafe { GetModuleHandleW(None)? };
        Ok(Self {
            config,
            h_instance: module.into(),
        })
    }

    /*
     * Creates and shows the window, then pumps messages. Returns the exit code
     * carried by WM_QUIT.
     */
    pub fn run(self) -> WindowResult<i32> {
        register_window_class(self.h_instance, &self.config.class_name)?;

        let controller = WindowController::new(Win32WindowHost::new(), self.config.notice.clone())?;
        let menu = build_menu_bar(&controller)?;
        let hwnd = match create_native_window(self.h_instance, &self.config, controller, menu) {
            Ok(hwnd) => hwnd,
            Err(err) => {
                unsafe {
                    let _ = DestroyMenu(menu);
                }
                return Err(err);
            }
        };

        show_window(hwnd);
        with_controller(hwnd, |controller| controller.mark_running())?;

        let exit_code = run_message_loop()?;
        log::debug!("WindowApp: message loop ended with exit code {exit_code}.");
        Ok(exit_code)
    }
}

/*
 * Reports a startup or loop failure to the user. The binary runs without a
 * console or logger, so this dialog is the only place the error surfaces.
 */
pub fn show_fatal_error(err: &DispatchError) {
    log::error!("WindowApp: {err}");
    unsafe {
        let _ = MessageBoxW(
            None,
            &HSTRING::from(err.to_string()),
            w!("MyWindow - Fatal Error"),
            MB_OK | MB_ICONERROR,
        );
    }
}

/*
 * Menu bar with a Help popup. The About item is only added when the controller's
 * message map has a handler for it.
 */
fn build_menu_bar(controller: &SampleController) -> WindowResult<HMENU> {
    unsafe {
        let menu_bar = CreateMenu()?;
        if controller.handles_command(ID_ABOUT) {
            let help_menu = CreatePopupMenu()?;
            AppendMenuW(
                help_menu,
                MF_STRING,
                ID_ABOUT.raw() as usize,
                w!("&About MyWindow..."),
            )?;
            AppendMenuW(menu_bar, MF_POPUP, help_menu.0 as usize, w!("&Help"))?;
        }
        Ok(menu_bar)
    }
}

fn run_message_loop() -> WindowResult<i32> {
    let mut msg = MSG::default();
    loop {
        let status = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        match status.0 {
            -1 => {
                let error = unsafe { GetLastError() };
                log::error!("WindowApp: GetMessageW failed: {error:?}");
                return Err(DispatchError::OperationFailed(format!(
                    "GetMessageW failed: {error:?}"
                )));
            }
            0 => break,
            _ => unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }
    Ok(msg.wParam.0 as i32)
}
