/*
 * Platform-agnostic types for the message map: events delivered by the host,
 * handler patterns, the window lifecycle state and the outbound host interface.
 * Message codes mirror the Win32 values so the Windows host can forward raw
 * window messages without a translation table, while everything here stays
 * testable on any platform.
 */
use crate::error::Result;

pub const MSG_DESTROY: u32 = 0x0002;
pub const MSG_CLOSE: u32 = 0x0010;
pub const MSG_COMMAND: u32 = 0x0111;
pub const MSG_SYSCOMMAND: u32 = 0x0112;

/// System command sent by the caption close button and Alt+F4.
pub const SC_CLOSE: u16 = 0xF060;

/// Command id of the Help > About menu item.
pub const ID_ABOUT: CommandId = CommandId(0x9001);

/// Value returned to the host for every handled event.
pub const RESULT_SUCCESS: isize = 0;

/// Logical identifier of a menu item, accelerator or control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(pub u16);

impl CommandId {
    pub const fn raw(self) -> u16 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    SystemMessage,
    Command,
}

/*
 * Sub-code part of a handler pattern. `Exact` binds one command id, `Any` matches
 * every sub-code of the (category, code) pair. An exact entry always wins over a
 * wildcard for the same event.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubCodeMatch {
    Exact(CommandId),
    Any,
}

/// Raw message parameters, carried opaquely to the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventPayload {
    pub wparam: usize,
    pub lparam: isize,
}

/*
 * One notification from the host windowing system. Created per message, handed to
 * `WindowEventHandler::handle_event` by reference and dropped once it returns.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub category: EventCategory,
    pub code: u32,
    pub sub_code: Option<CommandId>,
    pub payload: EventPayload,
}

impl Event {
    pub fn system_message(code: u32) -> Self {
        Self {
            category: EventCategory::SystemMessage,
            code,
            sub_code: None,
            payload: EventPayload::default(),
        }
    }

    pub fn command(command_id: CommandId) -> Self {
        Self {
            category: EventCategory::Command,
            code: MSG_COMMAND,
            sub_code: Some(command_id),
            payload: EventPayload {
                wparam: command_id.raw() as usize,
                lparam: 0,
            },
        }
    }

    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = payload;
        self
    }

    /*
     * Builds an event from a raw window message. WM_COMMAND carries the command id
     * in the low word of `wparam` and the notification code in the high word.
     */
    pub fn from_raw(msg: u32, wparam: usize, lparam: isize) -> Self {
        let payload = EventPayload { wparam, lparam };
        if msg == MSG_COMMAND {
            Self {
                category: EventCategory::Command,
                code: msg,
                sub_code: Some(CommandId(loword(wparam))),
                payload,
            }
        } else {
            Self::system_message(msg).with_payload(payload)
        }
    }

    /// Notification code of a command event (0 for menus, 1 for accelerators).
    pub fn notification_code(&self) -> u16 {
        hiword(self.payload.wparam)
    }
}

#[inline]
pub(crate) fn loword(value: usize) -> u16 {
    (value & 0xFFFF) as u16
}

#[inline]
pub(crate) fn hiword(value: usize) -> u16 {
    ((value >> 16) & 0xFFFF) as u16
}

/*
 * Lifecycle phase of one window. Variants are declared in lifecycle order so the
 * derived `Ord` can be used to check that transitions only move forward.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WindowState {
    Created,
    Running,
    Closing,
    Destroyed,
}

impl WindowState {
    pub fn is_terminal(self) -> bool {
        self == WindowState::Destroyed
    }
}

/// Outcome reported back to the host for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    pub handled: bool,
    pub result_code: isize,
}

impl DispatchResult {
    pub fn handled() -> Self {
        Self {
            handled: true,
            result_code: RESULT_SUCCESS,
        }
    }

    pub fn unhandled() -> Self {
        Self {
            handled: false,
            result_code: RESULT_SUCCESS,
        }
    }
}

/// Text of the modal informational notice shown by the About command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Default for Notice {
    fn default() -> Self {
        Self {
            title: "About MyWindow".to_string(),
            body: "Sample ATL window".to_string(),
        }
    }
}

/*
 * Creation parameters for the sample window. The defaults reproduce the fixed
 * values of the sample; hosts may override the geometry and title.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub class_name: String,
    pub width: i32,
    pub height: i32,
    pub notice: Notice,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "MyWindow".to_string(),
            class_name: "MyWindowClass".to_string(),
            width: 640,
            height: 480,
            notice: Notice::default(),
        }
    }
}

/*
 * Outbound requests a controller issues to the host windowing system. The Win32
 * implementation lives in `window_common`; tests use a recording double.
 */
pub trait WindowHost {
    /// Asks the host to release the native window resource.
    fn request_teardown(&mut self) -> Result<()>;
    /// Asks the host event loop to stop with `exit_code`.
    fn signal_quit(&mut self, exit_code: i32);
    /// Shows a modal notice and returns once the user dismissed it.
    fn show_notice(&mut self, notice: &Notice);
}

/// The single capability every window type exposes to the host event loop.
pub trait WindowEventHandler {
    fn handle_event(&mut self, event: &Event) -> Result<DispatchResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_extracts_command_id_and_notification_code() {
        // Accelerator-originated command: notification code 1 in the high word.
        let wparam = (1usize << 16) | ID_ABOUT.raw() as usize;
        let event = Event::from_raw(MSG_COMMAND, wparam, 0);

        assert_eq!(event.category, EventCategory::Command);
        assert_eq!(event.code, MSG_COMMAND);
        assert_eq!(event.sub_code, Some(ID_ABOUT));
        assert_eq!(event.notification_code(), 1);
        assert_eq!(event.payload.wparam, wparam);
    }

    #[test]
    fn from_raw_keeps_system_messages_without_sub_code() {
        let event = Event::from_raw(MSG_CLOSE, 0x1234, -7);

        assert_eq!(event.category, EventCategory::SystemMessage);
        assert_eq!(event.code, MSG_CLOSE);
        assert_eq!(event.sub_code, None);
        assert_eq!(event.payload.lparam, -7);
    }

    #[test]
    fn window_states_are_ordered_by_lifecycle() {
        assert!(WindowState::Created < WindowState::Running);
        assert!(WindowState::Running < WindowState::Closing);
        assert!(WindowState::Closing < WindowState::Destroyed);
        assert!(WindowState::Destroyed.is_terminal());
        assert!(!WindowState::Closing.is_terminal());
    }

    #[test]
    fn default_config_carries_the_sample_notice() {
        let config = WindowConfig::default();
        assert_eq!(config.notice.title, "About MyWindow");
        assert_eq!(config.notice.body, "Sample ATL window");
    }
}
