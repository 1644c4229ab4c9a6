/*
 * Lifecycle controller for one window. It owns the window state and the message
 * map, and is the only place where the state changes. The host event loop hands
 * each incoming event to `handle_event`; the controller looks the event up in its
 * dispatch table and runs the bound handler, which may issue outbound requests
 * through the `WindowHost` it owns.
 *
 * Lifecycle: Created -> Running -> Closing -> Destroyed. Close is accepted from
 * Created or Running, destroy only from Closing, the About command from any state
 * but Destroyed. Out-of-order lifecycle events are returned as `OrderingViolation`
 * and leave the state untouched.
 */
use crate::dispatch_table::DispatchTable;
use crate::error::{DispatchError, Result};
use crate::types::{
    CommandId, DispatchResult, Event, EventCategory, ID_ABOUT, MSG_CLOSE, MSG_COMMAND,
    MSG_DESTROY, Notice, SubCodeMatch, WindowEventHandler, WindowHost, WindowState,
};

/// Exit code handed to the host loop when the window is destroyed.
pub const EXIT_CODE_SUCCESS: i32 = 0;

/*
 * Maps the WM_QUIT exit code to a process exit status. Codes outside `0..=255`
 * cannot be represented and become 255 rather than wrapping into a different
 * (possibly zero) status.
 */
pub fn process_exit_code(exit_code: i32) -> u8 {
    u8::try_from(exit_code).unwrap_or(u8::MAX)
}

pub type Handler<H> = fn(&mut WindowController<H>, &Event) -> Result<DispatchResult>;

pub struct WindowController<H: WindowHost> {
    state: WindowState,
    table: DispatchTable<Handler<H>>,
    host: H,
    notice: Notice,
}

impl<H: WindowHost> WindowController<H> {
    /*
     * Builds the message map and returns a controller in `Created`. A collision in
     * the message map aborts construction.
     */
    pub fn new(host: H, notice: Notice) -> Result<Self> {
        let table = Self::build_dispatch_table()?;
        Ok(Self {
            state: WindowState::Created,
            table,
            host,
            notice,
        })
    }

    fn build_dispatch_table() -> Result<DispatchTable<Handler<H>>> {
        let mut builder = DispatchTable::builder();
        builder
            .register(
                EventCategory::SystemMessage,
                MSG_CLOSE,
                SubCodeMatch::Any,
                Self::on_close as Handler<H>,
            )?
            .register(
                EventCategory::SystemMessage,
                MSG_DESTROY,
                SubCodeMatch::Any,
                Self::on_destroy as Handler<H>,
            )?
            .register(
                EventCategory::Command,
                MSG_COMMAND,
                SubCodeMatch::Exact(ID_ABOUT),
                Self::on_about as Handler<H>,
            )?;
        Ok(builder.build())
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn notice(&self) -> &Notice {
        &self.notice
    }

    pub fn handles_command(&self, command_id: CommandId) -> bool {
        self.table.handles_command(MSG_COMMAND, command_id)
    }

    /*
     * Moves a freshly created window to `Running` once the host has shown it.
     * Any other starting state is an ordering violation.
     */
    pub fn mark_running(&mut self) -> Result<()> {
        if self.state != WindowState::Created {
            log::warn!(
                "WindowController: mark_running ignored in state {:?}.",
                self.state
            );
            return Err(DispatchError::OrderingViolation {
                state: self.state,
                code: 0,
            });
        }
        self.advance_to(WindowState::Running);
        Ok(())
    }

    fn dispatch(&mut self, event: &Event) -> Result<DispatchResult> {
        if self.state.is_terminal() {
            log::trace!(
                "WindowController: event 0x{:04X} ignored, window already destroyed.",
                event.code
            );
            return Ok(DispatchResult::unhandled());
        }

        let Some(&handler) = self.table.lookup(event) else {
            if event.category == EventCategory::Command {
                log::debug!(
                    "WindowController: unhandled command id {:?} (notification code 0x{:X}).",
                    event.sub_code.map(CommandId::raw),
                    event.notification_code()
                );
            } else {
                log::trace!("WindowController: unhandled message 0x{:04X}.", event.code);
            }
            return Ok(DispatchResult::unhandled());
        };

        handler(self, event)
    }

    fn advance_to(&mut self, next: WindowState) {
        debug_assert!(
            next > self.state,
            "window state must only move forward ({:?} -> {next:?})",
            self.state
        );
        log::debug!("WindowController: state {:?} -> {next:?}.", self.state);
        self.state = next;
    }

    fn ordering_violation(&self, event: &Event) -> DispatchError {
        log::warn!(
            "WindowController: event 0x{:04X} out of order in state {:?}; ignoring.",
            event.code,
            self.state
        );
        DispatchError::OrderingViolation {
            state: self.state,
            code: event.code,
        }
    }

    fn on_close(&mut self, event: &Event) -> Result<DispatchResult> {
        if !matches!(self.state, WindowState::Created | WindowState::Running) {
            return Err(self.ordering_violation(event));
        }
        // Teardown failures are the host's to report; the window is closing regardless.
        if let Err(err) = self.host.request_teardown() {
            log::warn!("WindowController: teardown request failed: {err}");
        }
        self.advance_to(WindowState::Closing);
        Ok(DispatchResult::handled())
    }

    fn on_destroy(&mut self, event: &Event) -> Result<DispatchResult> {
        if self.state != WindowState::Closing {
            return Err(self.ordering_violation(event));
        }
        self.host.signal_quit(EXIT_CODE_SUCCESS);
        self.advance_to(WindowState::Destroyed);
        Ok(DispatchResult::handled())
    }

    fn on_about(&mut self, _event: &Event) -> Result<DispatchResult> {
        log::debug!("WindowController: showing '{}'.", self.notice.title);
        self.host.show_notice(&self.notice);
        Ok(DispatchResult::handled())
    }
}

impl<H: WindowHost> std::fmt::Debug for WindowController<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowController")
            .field("state", &self.state)
            .field("handlers", &self.table.len())
            .field("notice", &self.notice)
            .finish()
    }
}

impl<H: WindowHost> WindowEventHandler for WindowController<H> {
    fn handle_event(&mut self, event: &Event) -> Result<DispatchResult> {
        self.dispatch(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::WindowConfig;

    #[derive(Debug, Default)]
    struct RecordingHost {
        teardown_requests: usize,
        quit_codes: Vec<i32>,
        notices: Vec<Notice>,
        fail_teardown: bool,
    }

    impl WindowHost for RecordingHost {
        fn request_teardown(&mut self) -> Result<()> {
            self.teardown_requests += 1;
            if self.fail_teardown {
                return Err(DispatchError::InvalidHandle("no window".to_string()));
            }
            Ok(())
        }

        fn signal_quit(&mut self, exit_code: i32) {
            self.quit_codes.push(exit_code);
        }

        fn show_notice(&mut self, notice: &Notice) {
            self.notices.push(notice.clone());
        }
    }

    fn new_controller() -> WindowController<RecordingHost> {
        WindowController::new(RecordingHost::default(), Notice::default())
            .expect("built-in message map has no duplicates")
    }

    fn close() -> Event {
        Event::system_message(MSG_CLOSE)
    }

    fn destroy() -> Event {
        Event::system_message(MSG_DESTROY)
    }

    fn about() -> Event {
        Event::command(ID_ABOUT)
    }

    fn assert_no_side_effects(host: &RecordingHost) {
        assert_eq!(host.teardown_requests, 0);
        assert!(host.quit_codes.is_empty());
        assert!(host.notices.is_empty());
    }

    #[test]
    fn new_controller_starts_created_with_three_handlers() {
        let controller = new_controller();
        assert_eq!(controller.state(), WindowState::Created);
        assert_eq!(controller.table.len(), 3);
        assert!(controller.handles_command(ID_ABOUT));
    }

    #[test]
    fn unmatched_events_are_unhandled_and_leave_state() {
        // Arrange
        let mut controller = new_controller();
        controller.mark_running().unwrap();
        let events = [
            Event::system_message(0x0005), // WM_SIZE
            Event::system_message(0x000F), // WM_PAINT
            Event::command(CommandId(1)),
            Event::from_raw(MSG_COMMAND, 0xFFFF, 0),
        ];

        for event in events {
            // Act
            let result = controller.handle_event(&event).unwrap();
            // Assert
            assert_eq!(result, DispatchResult::unhandled());
            assert_eq!(controller.state(), WindowState::Running);
        }
        assert_no_side_effects(controller.host());
    }

    #[test]
    fn close_then_destroy_reaches_destroyed() {
        let mut controller = new_controller();

        let closed = controller.handle_event(&close()).unwrap();
        assert_eq!(closed, DispatchResult::handled());
        assert_eq!(controller.state(), WindowState::Closing);
        assert_eq!(controller.host().teardown_requests, 1);
        assert!(controller.host().quit_codes.is_empty());

        let destroyed = controller.handle_event(&destroy()).unwrap();
        assert_eq!(destroyed, DispatchResult::handled());
        assert_eq!(destroyed.result_code, 0);
        assert_eq!(controller.state(), WindowState::Destroyed);
        assert_eq!(controller.host().quit_codes, vec![EXIT_CODE_SUCCESS]);
    }

    #[test]
    fn close_is_accepted_from_running() {
        let mut controller = new_controller();
        controller.mark_running().unwrap();

        controller.handle_event(&close()).unwrap();

        assert_eq!(controller.state(), WindowState::Closing);
    }

    #[test]
    fn destroy_before_close_is_ordering_violation() {
        let mut controller = new_controller();

        let err = controller.handle_event(&destroy()).unwrap_err();

        assert_eq!(
            err,
            DispatchError::OrderingViolation {
                state: WindowState::Created,
                code: MSG_DESTROY,
            }
        );
        assert_eq!(controller.state(), WindowState::Created);
        assert_no_side_effects(controller.host());
    }

    #[test]
    fn second_close_is_ordering_violation() {
        let mut controller = new_controller();
        controller.handle_event(&close()).unwrap();

        let err = controller.handle_event(&close()).unwrap_err();

        assert!(matches!(
            err,
            DispatchError::OrderingViolation {
                state: WindowState::Closing,
                code: MSG_CLOSE,
            }
        ));
        assert_eq!(controller.state(), WindowState::Closing);
        assert_eq!(controller.host().teardown_requests, 1);
    }

    #[test]
    fn about_in_running_shows_notice_once() {
        let mut controller = new_controller();
        controller.mark_running().unwrap();

        let result = controller.handle_event(&about()).unwrap();

        assert_eq!(result, DispatchResult::handled());
        assert_eq!(controller.state(), WindowState::Running);
        let notices = &controller.host().notices;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "About MyWindow");
        assert_eq!(notices[0].body, "Sample ATL window");
    }

    #[test]
    fn about_is_accepted_while_closing() {
        let mut controller = new_controller();
        controller.handle_event(&close()).unwrap();

        let result = controller.handle_event(&about()).unwrap();

        assert!(result.handled);
        assert_eq!(controller.state(), WindowState::Closing);
        assert_eq!(controller.host().notices.len(), 1);
    }

    #[test]
    fn destroyed_window_ignores_every_event() {
        let mut controller = new_controller();
        controller.handle_event(&close()).unwrap();
        controller.handle_event(&destroy()).unwrap();

        for event in [close(), destroy(), about()] {
            let result = controller.handle_event(&event).unwrap();
            assert_eq!(result, DispatchResult::unhandled());
        }

        let host = controller.host();
        assert_eq!(controller.state(), WindowState::Destroyed);
        assert_eq!(host.teardown_requests, 1);
        assert_eq!(host.quit_codes.len(), 1);
        assert!(host.notices.is_empty());
    }

    #[test]
    fn failed_teardown_still_enters_closing() {
        let host = RecordingHost {
            fail_teardown: true,
            ..RecordingHost::default()
        };
        let mut controller = WindowController::new(host, Notice::default()).unwrap();

        let result = controller.handle_event(&close()).unwrap();

        assert!(result.handled);
        assert_eq!(controller.state(), WindowState::Closing);
    }

    #[test]
    fn mark_running_only_from_created() {
        let mut controller = new_controller();
        controller.mark_running().unwrap();
        assert_eq!(controller.state(), WindowState::Running);

        let err = controller.mark_running().unwrap_err();

        assert!(matches!(
            err,
            DispatchError::OrderingViolation {
                state: WindowState::Running,
                ..
            }
        ));
        assert_eq!(controller.state(), WindowState::Running);
    }

    #[test]
    fn notice_text_is_taken_from_window_config() {
        // The controller shows whatever notice the config carries; the default is the sample text.
        let config = WindowConfig::default();
        let mut controller =
            WindowController::new(RecordingHost::default(), config.notice.clone()).unwrap();

        controller.handle_event(&about()).unwrap();

        assert_eq!(controller.host().notices, vec![config.notice]);
        assert_eq!(controller.notice(), &Notice::default());
    }

    #[test]
    fn process_exit_code_keeps_representable_codes() {
        assert_eq!(process_exit_code(EXIT_CODE_SUCCESS), 0);
        assert_eq!(process_exit_code(3), 3);
        assert_eq!(process_exit_code(255), 255);
    }

    #[test]
    fn process_exit_code_never_wraps_to_success() {
        assert_eq!(process_exit_code(256), u8::MAX);
        assert_eq!(process_exit_code(-1), u8::MAX);
        assert_eq!(process_exit_code(i32::MIN), u8::MAX);
    }
}
