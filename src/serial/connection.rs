// src/serial/connection.rs
//
// Connection manager: sole owner of the serial link.
//
// At most one link exists at a time. Every lifecycle event is reflected in
// the status tracker passed in by the caller.

use super::backend::{BackendError, SerialBackend, SerialLink};
use super::config::ConnectionConfig;
use crate::error::{ConnectionError, SendError};
use crate::status::StatusTracker;

pub struct ConnectionManager<B: SerialBackend> {
    backend: B,
    link: Option<Box<dyn SerialLink>>,
    /// Config of the currently open link
    active: Option<ConnectionConfig>,
    /// Config of the most recent open attempt, reused by `toggle`
    last_config: Option<ConnectionConfig>,
}

impl<B: SerialBackend> ConnectionManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            link: None,
            active: None,
            last_config: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Config of the open connection, if any
    pub fn active_config(&self) -> Option<&ConnectionConfig> {
        self.active.as_ref()
    }

    pub fn last_config(&self) -> Option<&ConnectionConfig> {
        self.last_config.as_ref()
    }

    /// Open a link with `config`.
    ///
    /// Callers close an existing link first; if one is still held it is
    /// released here before the new one is opened.
    pub fn open(
        &mut self,
        config: ConnectionConfig,
        status: &mut StatusTracker,
    ) -> Result<(), ConnectionError> {
        self.last_config = Some(config.clone());

        if config.port().is_blank() {
            let err = ConnectionError::InvalidPort;
            status.set_error(err.to_string());
            return Err(err);
        }

        if let Some(stale) = self.link.take() {
            tlog!(
                "[connection] Releasing stale link on {} before reopening",
                self.active
                    .as_ref()
                    .map(|c| c.port().as_str())
                    .unwrap_or("?")
            );
            release(stale);
            self.active = None;
        }

        match self.backend.open(&config) {
            Ok(link) => {
                tlog!(
                    "[connection] Opened {} at {} baud (8-N-1, timeout {:?})",
                    config.port(),
                    config.baud(),
                    config.timeout()
                );
                status.set_ok(format!("Connected: {} @ {}", config.port(), config.baud()));
                self.link = Some(link);
                self.active = Some(config);
                Ok(())
            }
            Err(BackendError::Unavailable) => {
                tlog!("[connection] Cannot open {}: no serial backend", config.port());
                let err = ConnectionError::BackendUnavailable;
                status.set_error(err.to_string());
                Err(err)
            }
            Err(BackendError::Io(detail)) => {
                tlog!("[connection] Failed to open {}: {}", config.port(), detail);
                let err = ConnectionError::OpenFailed(detail);
                status.set_error(err.to_string());
                Err(err)
            }
        }
    }

    /// Close the link. Safe to call when nothing is open.
    /// The handle is always released; a fault while closing is only logged.
    pub fn close(&mut self, status: &mut StatusTracker) {
        if let Some(link) = self.link.take() {
            if let Some(config) = self.active.as_ref() {
                tlog!("[connection] Closing {}", config.port());
            }
            release(link);
        }
        self.active = None;
        status.set_idle();
    }

    /// Close if open, otherwise reopen with the last-known config.
    pub fn toggle(&mut self, status: &mut StatusTracker) -> Result<(), ConnectionError> {
        if self.is_open() {
            self.close(status);
            return Ok(());
        }

        match self.last_config.clone() {
            Some(config) => self.open(config, status),
            None => {
                let err = ConnectionError::InvalidPort;
                status.set_error(err.to_string());
                Err(err)
            }
        }
    }

    /// Write raw bytes to the open link.
    pub(crate) fn write(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        let link = self.link.as_mut().ok_or(SendError::NotConnected)?;
        link.write_bytes(bytes)
            .map_err(|e| SendError::WriteFailed(e.to_string()))
    }
}

fn release(link: Box<dyn SerialLink>) {
    if let Err(e) = link.close() {
        tlog!("[connection] Ignoring fault while closing port: {}", e);
    }
}
