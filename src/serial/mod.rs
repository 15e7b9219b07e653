// src/serial/mod.rs
//
// Serial connection layer.
//
// - config: baud rate set and connection parameters
// - backend: serialport-backed (or unavailable) port source
// - connection: single-owner connection manager

pub mod backend;
pub mod config;
pub mod connection;

pub use backend::{BackendError, DefaultBackend, SerialBackend, SerialLink, UnavailableBackend};
#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
pub use backend::NativeBackend;
pub use config::{BaudRate, ConnectionConfig, TIMEOUT};
pub use connection::ConnectionManager;
