// src/serial/backend.rs
//
// Serial backend abstraction.
// The connection manager and port enumerator only talk to these traits, so
// tests can substitute a fake device for the `serialport` crate.

use thiserror::Error;

use super::config::ConnectionConfig;
use crate::ports::PortDetails;

// ============================================================================
// Traits
// ============================================================================

/// Failure reported by a backend before a link exists
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// No serial support on this platform/build
    #[error("serial support is not available")]
    Unavailable,
    /// Lower-level failure (permission denied, device busy, not found, ...)
    #[error("{0}")]
    Io(String),
}

/// An open serial session
pub trait SerialLink {
    /// Write every byte and flush.
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()>;

    /// Release the device. The link is consumed even when this fails.
    fn close(self: Box<Self>) -> Result<(), String>;
}

/// Source of ports and links
pub trait SerialBackend {
    fn is_available(&self) -> bool;

    fn available_ports(&self) -> Result<Vec<PortDetails>, BackendError>;

    fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn SerialLink>, BackendError>;
}

// ============================================================================
// Native backend (serialport crate)
// ============================================================================

#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
mod native {
    use super::*;
    use crate::ports::PortDescriptor;
    use serialport::{DataBits, Parity, SerialPort, StopBits};
    use std::io::Write;

    /// Backend over the system serial ports
    #[derive(Clone, Copy, Debug, Default)]
    pub struct NativeBackend;

    struct NativeLink {
        port: Box<dyn SerialPort>,
    }

    impl SerialLink for NativeLink {
        fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
            self.port.write_all(bytes).and_then(|_| self.port.flush())
        }

        fn close(mut self: Box<Self>) -> Result<(), String> {
            // serialport closes the handle on drop; flush reports any pending fault
            self.port
                .flush()
                .map_err(|e| format!("Failed to flush on close: {}", e))
        }
    }

    impl SerialBackend for NativeBackend {
        fn is_available(&self) -> bool {
            true
        }

        fn available_ports(&self) -> Result<Vec<PortDetails>, BackendError> {
            let ports = serialport::available_ports()
                .map_err(|e| BackendError::Io(format!("Failed to enumerate ports: {}", e)))?;

            Ok(ports
                .into_iter()
                .map(|p| {
                    let port = PortDescriptor::new(p.port_name);
                    match p.port_type {
                        serialport::SerialPortType::UsbPort(info) => PortDetails {
                            port,
                            port_type: "USB".to_string(),
                            manufacturer: info.manufacturer,
                            product: info.product,
                            serial_number: info.serial_number,
                            vid: Some(info.vid),
                            pid: Some(info.pid),
                        },
                        serialport::SerialPortType::BluetoothPort => PortDetails {
                            port_type: "Bluetooth".to_string(),
                            ..PortDetails::unknown(port)
                        },
                        serialport::SerialPortType::PciPort => PortDetails {
                            port_type: "PCI".to_string(),
                            ..PortDetails::unknown(port)
                        },
                        serialport::SerialPortType::Unknown => PortDetails::unknown(port),
                    }
                })
                .collect())
        }

        fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn SerialLink>, BackendError> {
            let port = serialport::new(config.port().as_str(), config.baud().value())
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .timeout(config.timeout())
                .open()
                .map_err(|e| BackendError::Io(e.to_string()))?;

            Ok(Box::new(NativeLink { port }))
        }
    }
}

#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
pub use native::NativeBackend;

// ============================================================================
// Unavailable backend
// ============================================================================

/// Backend for builds without serial support. Lists nothing, opens nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableBackend;

impl SerialBackend for UnavailableBackend {
    fn is_available(&self) -> bool {
        false
    }

    fn available_ports(&self) -> Result<Vec<PortDetails>, BackendError> {
        Err(BackendError::Unavailable)
    }

    fn open(&self, _config: &ConnectionConfig) -> Result<Box<dyn SerialLink>, BackendError> {
        Err(BackendError::Unavailable)
    }
}

/// Backend used by the front-ends on this platform
#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
pub type DefaultBackend = NativeBackend;
#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
pub type DefaultBackend = UnavailableBackend;
