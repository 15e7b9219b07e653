// src/controller.rs
//
// Controller: the application context behind the control panel.
//
// Owns the connection manager, transmitter, status tracker, settings and
// the current port/baud selection, and exposes the small set of actions a
// front-end calls in response to user input. Everything runs on the
// caller's thread.

use std::time::Instant;

use crate::clock::Clock;
use crate::command::{self, Command};
use crate::error::{ConnectionError, SendError};
use crate::ports::{self, HostOs, PortDescriptor};
use crate::serial::{BaudRate, ConnectionConfig, ConnectionManager, SerialBackend};
use crate::settings::{Settings, SettingsStore, Theme};
use crate::status::{Status, StatusTracker};
use crate::transmitter::CommandTransmitter;

pub struct Controller<B: SerialBackend, S: SettingsStore, C: Clock> {
    connection: ConnectionManager<B>,
    transmitter: CommandTransmitter,
    status: StatusTracker,
    store: S,
    clock: C,
    settings: Settings,
    host_os: HostOs,
    ports: Vec<PortDescriptor>,
    selected_port: Option<PortDescriptor>,
    selected_baud: BaudRate,
}

impl<B: SerialBackend, S: SettingsStore, C: Clock> Controller<B, S, C> {
    /// Build the controller for the current host OS.
    pub fn new(backend: B, store: S, clock: C) -> Self {
        Self::with_host_os(backend, store, clock, HostOs::current())
    }

    /// Load settings, enumerate ports and restore the previous selection.
    /// Without a stored port the default port heuristic picks one.
    pub fn with_host_os(backend: B, store: S, clock: C, host_os: HostOs) -> Self {
        let settings = store.load();
        let selected_baud = settings.baud.unwrap_or_default();
        let stored_port = settings
            .port
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PortDescriptor::new);

        let mut controller = Self {
            connection: ConnectionManager::new(backend),
            transmitter: CommandTransmitter::new(),
            status: StatusTracker::new(),
            store,
            clock,
            settings,
            host_os,
            ports: Vec::new(),
            selected_port: None,
            selected_baud,
        };

        controller.refresh_ports();
        match stored_port {
            Some(port) => controller.selected_port = Some(port),
            None if !controller.ports.is_empty() => {
                controller.choose_default_port();
            }
            None => {}
        }

        tlog!(
            "[controller] Started (port: {}, baud: {}, theme: {})",
            controller
                .selected_port
                .as_ref()
                .map(|p| p.as_str())
                .unwrap_or("<none>"),
            controller.selected_baud,
            controller.settings.theme.label()
        );
        controller
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn status(&self) -> &Status {
        self.status.current()
    }

    /// True once per alert cue (bell) raised since the last call
    pub fn take_alert(&mut self) -> bool {
        self.status.take_alert()
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        &self.ports
    }

    pub fn selected_port(&self) -> Option<&PortDescriptor> {
        self.selected_port.as_ref()
    }

    pub fn selected_baud(&self) -> BaudRate {
        self.selected_baud
    }

    pub fn theme(&self) -> Theme {
        self.settings.theme
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Command currently shown as "last command", already expired ones excluded
    pub fn last_command(&self) -> Option<Command> {
        self.transmitter.visible_command(self.clock.now())
    }

    pub fn backend(&self) -> &B {
        self.connection.backend()
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Re-enumerate ports. Keeps the selection; selects the first port when
    /// nothing is selected yet.
    pub fn refresh_ports(&mut self) -> &[PortDescriptor] {
        if !self.connection.backend().is_available() {
            self.ports.clear();
            self.status.set_error(ConnectionError::BackendUnavailable.to_string());
            return &self.ports;
        }

        self.ports = ports::list_ports(self.connection.backend());
        tlog!("[controller] Found {} serial port(s)", self.ports.len());

        if self.selected_port.is_none() {
            self.selected_port = self.ports.first().cloned();
        }
        &self.ports
    }

    /// Select the heuristic default among the last enumerated ports.
    pub fn choose_default_port(&mut self) -> PortDescriptor {
        let port = ports::choose_default(&self.ports, self.host_os);
        self.selected_port = Some(port.clone());
        port
    }

    pub fn select_port(&mut self, port: impl Into<String>) {
        let port = PortDescriptor::new(port.into().trim());
        self.settings.port = (!port.is_blank()).then(|| port.to_string());
        self.selected_port = Some(port);
        self.store.save(&self.settings);
    }

    pub fn select_baud(&mut self, baud: BaudRate) {
        self.selected_baud = baud;
        self.settings.baud = Some(baud);
        self.store.save(&self.settings);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
        self.store.save(&self.settings);
    }

    /// Open the selected port at the selected baud rate.
    /// On success the port and baud are remembered in the settings.
    pub fn open_with_current_selection(&mut self) -> Result<(), ConnectionError> {
        let port = self
            .selected_port
            .clone()
            .unwrap_or_else(|| PortDescriptor::new(""));
        let config = ConnectionConfig::new(port, self.selected_baud);

        if self.connection.is_open() {
            self.connection.close(&mut self.status);
        }
        self.connection.open(config.clone(), &mut self.status)?;

        self.settings.port = Some(config.port().to_string());
        self.settings.baud = Some(config.baud());
        self.store.save(&self.settings);
        Ok(())
    }

    pub fn close_connection(&mut self) {
        self.connection.close(&mut self.status);
    }

    /// One-button open/close using the current selection.
    pub fn toggle_connection(&mut self) -> Result<(), ConnectionError> {
        if self.connection.is_open() {
            self.close_connection();
            Ok(())
        } else {
            self.open_with_current_selection()
        }
    }

    /// Dispatch an input symbol (key press, button) to the device.
    pub fn send_command(&mut self, symbol: char) -> Result<(), SendError> {
        let cmd = command::dispatch(symbol).ok_or(SendError::UnknownSymbol(symbol))?;
        self.send(cmd)
    }

    pub fn send(&mut self, cmd: Command) -> Result<(), SendError> {
        let now = self.clock.now();
        self.transmitter.poll(now);
        self.transmitter
            .send(cmd, &mut self.connection, &mut self.status, now)
    }

    /// Run deferred work that is due. Returns true when the display changed.
    pub fn tick(&mut self) -> bool {
        self.transmitter.poll(self.clock.now())
    }

    /// When the next deferred action is due, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.transmitter.display().clear_at()
    }

    /// Release the device and persist settings. Call once before exit.
    pub fn shutdown(&mut self) {
        if self.connection.is_open() {
            self.connection.close(&mut self.status);
        }
        self.store.save(&self.settings);
        tlog!("[controller] Shut down");
    }
}
