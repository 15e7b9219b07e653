// src/transmitter.rs
//
// Command transmitter.
// Encodes a command to its wire byte, writes it through the connection
// manager and moves the status tracker. Also owns the "last command"
// display with its self-clearing deadline.

use std::time::{Duration, Instant};

use crate::command::Command;
use crate::error::SendError;
use crate::serial::{ConnectionManager, SerialBackend};
use crate::status::StatusTracker;

/// How long the last sent command stays visible
pub const COMMAND_DISPLAY_WINDOW: Duration = Duration::from_secs(5);

// ============================================================================
// Command display
// ============================================================================

/// Last sent command plus the single pending clear.
/// Showing a new command replaces the pending deadline instead of queueing
/// another one, so a stale clear can never hide a newer command.
#[derive(Debug, Default)]
pub struct CommandDisplay {
    current: Option<Command>,
    clear_at: Option<Instant>,
}

impl CommandDisplay {
    pub fn current(&self) -> Option<Command> {
        self.current
    }

    /// Pending clear deadline, if any
    pub fn clear_at(&self) -> Option<Instant> {
        self.clear_at
    }

    /// The command as it should be shown at `now`. Hidden once the
    /// deadline has passed, even if `poll` has not run yet.
    pub fn visible(&self, now: Instant) -> Option<Command> {
        match self.clear_at {
            Some(deadline) if now >= deadline => None,
            _ => self.current,
        }
    }

    fn show(&mut self, cmd: Command, now: Instant) {
        self.current = Some(cmd);
        self.clear_at = Some(now + COMMAND_DISPLAY_WINDOW);
    }

    /// Fire the pending clear if its deadline has passed.
    /// Returns true when the display changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.clear_at {
            Some(deadline) if now >= deadline => {
                self.clear_at = None;
                self.current.take().is_some()
            }
            _ => false,
        }
    }
}

// ============================================================================
// Transmitter
// ============================================================================

#[derive(Debug, Default)]
pub struct CommandTransmitter {
    display: CommandDisplay,
}

impl CommandTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> &CommandDisplay {
        &self.display
    }

    pub fn last_command(&self) -> Option<Command> {
        self.display.current()
    }

    /// Last command as visible at `now`
    pub fn visible_command(&self, now: Instant) -> Option<Command> {
        self.display.visible(now)
    }

    /// Write `cmd` to the open connection.
    ///
    /// Mode commands set Ok with their label, Stop sets Idle, digits leave
    /// the status alone. Every successful send restarts the display window.
    pub fn send<B: SerialBackend>(
        &mut self,
        cmd: Command,
        connection: &mut ConnectionManager<B>,
        status: &mut StatusTracker,
        now: Instant,
    ) -> Result<(), SendError> {
        if !connection.is_open() {
            let err = SendError::NotConnected;
            status.set_error(err.to_string());
            return Err(err);
        }

        if let Err(err) = connection.write(&[cmd.wire_byte()]) {
            tlog!("[transmit] Failed to send '{}': {}", cmd, err);
            status.set_error(err.to_string());
            return Err(err);
        }

        self.display.show(cmd, now);

        match cmd {
            Command::Stop => status.set_idle(),
            Command::Digit(_) => {}
            _ => {
                if let Some(label) = cmd.label() {
                    status.set_ok(label);
                }
            }
        }

        Ok(())
    }

    /// Fire the display clear if due.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.display.poll(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortDescriptor;
    use crate::serial::{BaudRate, ConnectionConfig};
    use crate::status::Severity;
    use crate::testing::FakeBackend;

    fn connected(backend: &FakeBackend) -> (ConnectionManager<FakeBackend>, StatusTracker) {
        let mut manager = ConnectionManager::new(backend.clone());
        let mut status = StatusTracker::new();
        manager
            .open(
                ConnectionConfig::new(PortDescriptor::new("/dev/ttyUSB0"), BaudRate::DEFAULT),
                &mut status,
            )
            .unwrap();
        (manager, status)
    }

    #[test]
    fn test_send_when_closed_fails_without_touching_connection() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let mut manager = ConnectionManager::new(backend.clone());
        let mut status = StatusTracker::new();
        let mut tx = CommandTransmitter::new();
        let now = Instant::now();

        for cmd in Command::FUNCTIONS.into_iter().chain([Command::digit(1).unwrap()]) {
            assert_eq!(
                tx.send(cmd, &mut manager, &mut status, now),
                Err(SendError::NotConnected)
            );
        }

        assert!(!manager.is_open());
        assert!(backend.written().is_empty());
        assert_eq!(backend.open_count(), 0);
        assert_eq!(status.severity(), Severity::Error);
        assert_eq!(status.message(), "Port is not open!");
        assert!(status.take_alert());
        assert_eq!(tx.last_command(), None);
    }

    #[test]
    fn test_send_writes_single_ascii_byte() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let (mut manager, mut status) = connected(&backend);
        let mut tx = CommandTransmitter::new();
        let now = Instant::now();

        tx.send(Command::Play, &mut manager, &mut status, now).unwrap();
        tx.send(Command::digit(7).unwrap(), &mut manager, &mut status, now).unwrap();
        tx.send(Command::Stop, &mut manager, &mut status, now).unwrap();

        assert_eq!(backend.written(), b"P7S".to_vec());
    }

    #[test]
    fn test_mode_commands_set_labels() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let (mut manager, mut status) = connected(&backend);
        let mut tx = CommandTransmitter::new();
        let now = Instant::now();

        for (cmd, label) in [
            (Command::MicRecord, "MIC record"),
            (Command::RxRecord, "RX record"),
            (Command::Play, "Play"),
            (Command::Transmit, "Transmit"),
        ] {
            tx.send(cmd, &mut manager, &mut status, now).unwrap();
            assert_eq!(status.severity(), Severity::Ok);
            assert_eq!(status.message(), label);
        }
    }

    #[test]
    fn test_stop_after_any_function_is_idle() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let (mut manager, mut status) = connected(&backend);
        let mut tx = CommandTransmitter::new();
        let now = Instant::now();

        for cmd in Command::FUNCTIONS {
            tx.send(cmd, &mut manager, &mut status, now).unwrap();
            tx.send(Command::Stop, &mut manager, &mut status, now).unwrap();
            assert_eq!(status.severity(), Severity::Idle);
            assert_eq!(status.message(), "Idle");
        }
    }

    #[test]
    fn test_digits_leave_status_but_update_display() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let (mut manager, mut status) = connected(&backend);
        let mut tx = CommandTransmitter::new();
        let now = Instant::now();

        tx.send(Command::Transmit, &mut manager, &mut status, now).unwrap();
        tx.send(Command::digit(3).unwrap(), &mut manager, &mut status, now).unwrap();

        assert_eq!(status.message(), "Transmit");
        assert_eq!(status.severity(), Severity::Ok);
        assert_eq!(tx.last_command(), Some(Command::digit(3).unwrap()));
    }

    #[test]
    fn test_write_fault_reports_error() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let (mut manager, mut status) = connected(&backend);
        backend.fail_write("Broken pipe");
        let mut tx = CommandTransmitter::new();

        let result = tx.send(Command::MicRecord, &mut manager, &mut status, Instant::now());

        assert_eq!(result, Err(SendError::WriteFailed("Broken pipe".into())));
        assert_eq!(status.severity(), Severity::Error);
        assert_eq!(status.message(), "Send failed: Broken pipe");
        assert_eq!(tx.last_command(), None);
        assert!(manager.is_open());
    }

    #[test]
    fn test_display_clears_after_window() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let (mut manager, mut status) = connected(&backend);
        let mut tx = CommandTransmitter::new();
        let start = Instant::now();

        tx.send(Command::Play, &mut manager, &mut status, start).unwrap();
        assert!(!tx.poll(start + Duration::from_millis(4999)));
        assert_eq!(tx.last_command(), Some(Command::Play));

        assert!(tx.poll(start + COMMAND_DISPLAY_WINDOW));
        assert_eq!(tx.last_command(), None);
        assert_eq!(tx.display().clear_at(), None);
    }

    #[test]
    fn test_new_send_restarts_display_window() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let (mut manager, mut status) = connected(&backend);
        let mut tx = CommandTransmitter::new();
        let start = Instant::now();

        tx.send(Command::Play, &mut manager, &mut status, start).unwrap();
        let second = start + Duration::from_secs(3);
        tx.send(Command::digit(2).unwrap(), &mut manager, &mut status, second).unwrap();

        // The first deadline has passed but was replaced
        assert!(!tx.poll(start + Duration::from_secs(6)));
        assert_eq!(tx.last_command(), Some(Command::digit(2).unwrap()));

        assert!(tx.poll(second + COMMAND_DISPLAY_WINDOW));
        assert_eq!(tx.last_command(), None);
    }

    #[test]
    fn test_visible_command_hides_expired_display_without_poll() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let (mut manager, mut status) = connected(&backend);
        let mut tx = CommandTransmitter::new();
        let start = Instant::now();

        tx.send(Command::Play, &mut manager, &mut status, start).unwrap();
        assert_eq!(tx.visible_command(start + Duration::from_millis(4999)), Some(Command::Play));
        assert_eq!(tx.visible_command(start + COMMAND_DISPLAY_WINDOW), None);
        assert_eq!(tx.visible_command(start + Duration::from_secs(60)), None);

        // Nothing was polled, so the clear is still pending
        assert_eq!(tx.last_command(), Some(Command::Play));
        assert!(tx.display().clear_at().is_some());
    }
}
