// src/testing.rs
//
// Test doubles: a scripted serial backend and a manually stepped clock.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::ports::{PortDescriptor, PortDetails};
use crate::serial::{BackendError, ConnectionConfig, SerialBackend, SerialLink};

#[derive(Debug, Default)]
struct FakeState {
    available: bool,
    ports: Vec<String>,
    open_fault: Option<String>,
    write_fault: Option<String>,
    close_fault: Option<String>,
    written: Vec<u8>,
    opens: usize,
    closes: usize,
    live: usize,
}

/// Backend recording everything written; clones share state.
#[derive(Clone, Debug)]
pub struct FakeBackend {
    state: Rc<RefCell<FakeState>>,
}

impl FakeBackend {
    pub fn with_ports(ports: &[&str]) -> Self {
        let backend = Self {
            state: Rc::new(RefCell::new(FakeState {
                available: true,
                ..FakeState::default()
            })),
        };
        backend.set_ports(ports);
        backend
    }

    pub fn unavailable() -> Self {
        Self {
            state: Rc::new(RefCell::new(FakeState::default())),
        }
    }

    pub fn set_ports(&self, ports: &[&str]) {
        self.state.borrow_mut().ports = ports.iter().map(|p| p.to_string()).collect();
    }

    pub fn fail_open(&self, detail: &str) {
        self.state.borrow_mut().open_fault = Some(detail.to_string());
    }

    pub fn fail_write(&self, detail: &str) {
        self.state.borrow_mut().write_fault = Some(detail.to_string());
    }

    pub fn fail_close(&self, detail: &str) {
        self.state.borrow_mut().close_fault = Some(detail.to_string());
    }

    pub fn clear_faults(&self) {
        let mut state = self.state.borrow_mut();
        state.open_fault = None;
        state.write_fault = None;
        state.close_fault = None;
    }

    pub fn written(&self) -> Vec<u8> {
        self.state.borrow().written.clone()
    }

    pub fn open_count(&self) -> usize {
        self.state.borrow().opens
    }

    pub fn close_count(&self) -> usize {
        self.state.borrow().closes
    }

    /// Links opened and not yet closed
    pub fn live_links(&self) -> usize {
        self.state.borrow().live
    }
}

struct FakeLink {
    state: Rc<RefCell<FakeState>>,
}

impl SerialLink for FakeLink {
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(detail) = state.write_fault.clone() {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, detail));
        }
        state.written.extend_from_slice(bytes);
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        state.closes += 1;
        state.live = state.live.saturating_sub(1);
        match state.close_fault.clone() {
            Some(detail) => Err(detail),
            None => Ok(()),
        }
    }
}

impl SerialBackend for FakeBackend {
    fn is_available(&self) -> bool {
        self.state.borrow().available
    }

    fn available_ports(&self) -> Result<Vec<PortDetails>, BackendError> {
        let state = self.state.borrow();
        if !state.available {
            return Err(BackendError::Unavailable);
        }
        Ok(state
            .ports
            .iter()
            .map(|p| PortDetails::unknown(PortDescriptor::new(p.as_str())))
            .collect())
    }

    fn open(&self, _config: &ConnectionConfig) -> Result<Box<dyn SerialLink>, BackendError> {
        let mut state = self.state.borrow_mut();
        if !state.available {
            return Err(BackendError::Unavailable);
        }
        if let Some(detail) = state.open_fault.clone() {
            return Err(BackendError::Io(detail));
        }
        state.opens += 1;
        state.live += 1;
        Ok(Box::new(FakeLink {
            state: self.state.clone(),
        }))
    }
}

/// Clock that only moves when told to; clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed.get()
    }
}
