#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

#[cfg(target_os = "windows")]
fn main() -> std::process::ExitCode {
    use windispatch::{WindowApp, WindowConfig, process_exit_code, show_fatal_error};

    match WindowApp::new(WindowConfig::default()).and_then(WindowApp::run) {
        Ok(exit_code) => std::process::ExitCode::from(process_exit_code(exit_code)),
        Err(err) => {
            show_fatal_error(&err);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn main() -> std::process::ExitCode {
    eprintln!("windispatch: the sample window needs the Win32 host and only runs on Windows.");
    std::process::ExitCode::FAILURE
}
