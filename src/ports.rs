// src/ports.rs
//
// Serial port enumeration and default port selection.
//
// Enumeration goes through the injected serial backend and never fails:
// a missing backend or an enumeration error yields an empty list.
// Default selection is a pure per-OS heuristic over the enumerated names.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::serial::SerialBackend;

// ============================================================================
// Types
// ============================================================================

/// Device path or name of a serial port (`/dev/ttyUSB0`, `COM3`, ...)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PortDescriptor(String);

impl PortDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the name is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PortDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PortDescriptor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Information about an available serial port
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PortDetails {
    pub port: PortDescriptor,
    pub port_type: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

impl PortDetails {
    /// Details for a port the backend knows nothing else about
    pub fn unknown(port: PortDescriptor) -> Self {
        Self {
            port,
            port_type: "Unknown".to_string(),
            manufacturer: None,
            product: None,
            serial_number: None,
            vid: None,
            pid: None,
        }
    }
}

/// Operating system family used by the default port heuristic
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostOs {
    MacOs,
    Linux,
    Windows,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else if cfg!(target_os = "linux") {
            HostOs::Linux
        } else {
            HostOs::Windows
        }
    }

    /// Name returned when no port is enumerated at all
    pub fn placeholder_port(self) -> &'static str {
        match self {
            HostOs::MacOs => "/dev/cu.usbserial",
            HostOs::Linux => "/dev/ttyUSB0",
            HostOs::Windows => "COM3",
        }
    }
}

// ============================================================================
// Enumeration
// ============================================================================

/// List available port names. Empty when the backend is missing or fails.
pub fn list_ports<B: SerialBackend + ?Sized>(backend: &B) -> Vec<PortDescriptor> {
    list_port_details(backend)
        .into_iter()
        .map(|d| d.port)
        .collect()
}

/// List available ports with USB metadata where the backend provides it.
pub fn list_port_details<B: SerialBackend + ?Sized>(backend: &B) -> Vec<PortDetails> {
    match backend.available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            tlog!("[ports] Failed to enumerate ports: {}", e);
            Vec::new()
        }
    }
}

// ============================================================================
// Default selection
// ============================================================================

static MAC_USB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)usb(serial|modem)").expect("valid macOS USB pattern"));
static LINUX_USB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/dev/tty(USB|ACM)\d+").expect("valid Linux USB pattern"));
static WINDOWS_COM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^COM\d+$").expect("valid COM pattern"));

/// USB serial/modem devices sort ahead of other calling units, then by name.
fn mac_rank(port: &PortDescriptor) -> (bool, &str) {
    (!MAC_USB_RE.is_match(port.as_str()), port.as_str())
}

/// Pick a sensible default port for `os` from the enumerated `ports`.
///
/// - macOS: `/dev/cu.*` devices, USB serial/modem names first, then by name
/// - Linux: `/dev/ttyUSB<N>` / `/dev/ttyACM<N>` devices, by name
/// - Windows: `COM<N>` in enumeration order
///
/// Falls back to the first enumerated port, then to a per-OS placeholder.
pub fn choose_default(ports: &[PortDescriptor], os: HostOs) -> PortDescriptor {
    let preferred: Option<&PortDescriptor> = match os {
        HostOs::MacOs => ports
            .iter()
            .filter(|p| p.as_str().contains("/dev/cu."))
            .min_by(|a, b| mac_rank(a).cmp(&mac_rank(b))),
        HostOs::Linux => ports
            .iter()
            .filter(|p| LINUX_USB_RE.is_match(p.as_str()))
            .min(),
        HostOs::Windows => ports.iter().find(|p| WINDOWS_COM_RE.is_match(p.as_str())),
    };

    preferred
        .or_else(|| ports.first())
        .cloned()
        .unwrap_or_else(|| PortDescriptor::new(os.placeholder_port()))
}

// ============================================================================
// Tests
// ============================================================================
