// src/status.rs
//
// Status tracker for the controller.
// Reflects connection/operation health as a severity plus a free-text message.
// Only the connection manager, the command transmitter and the controller
// move it between states; front-ends read it.

use serde::Serialize;

/// Severity shown next to the status message (drives the status dot colour)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Idle,
    Ok,
    Error,
}

/// Snapshot of the current status
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Status {
    pub message: String,
    pub severity: Severity,
}

impl Status {
    fn idle() -> Self {
        Self {
            message: "Idle".to_string(),
            severity: Severity::Idle,
        }
    }
}

#[derive(Debug)]
pub struct StatusTracker {
    current: Status,
    /// Set on every transition into Error; consumed once by the front-end
    alert_pending: bool,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self {
            current: Status::idle(),
            alert_pending: false,
        }
    }
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Status {
        &self.current
    }

    pub fn severity(&self) -> Severity {
        self.current.severity
    }

    pub fn message(&self) -> &str {
        &self.current.message
    }

    /// Returns true once per alert cue raised since the last call.
    pub fn take_alert(&mut self) -> bool {
        std::mem::replace(&mut self.alert_pending, false)
    }

    pub(crate) fn set_idle(&mut self) {
        self.current = Status::idle();
    }

    pub(crate) fn set_ok(&mut self, message: impl Into<String>) {
        self.current = Status {
            message: message.into(),
            severity: Severity::Ok,
        };
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.current = Status {
            message: message.into(),
            severity: Severity::Error,
        };
        self.alert_pending = true;
    }
}
