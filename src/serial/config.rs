// src/serial/config.rs
//
// Connection parameters: the fixed baud rate set and the immutable
// configuration handed to the connection manager on open.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::ports::PortDescriptor;

/// Read timeout applied to every connection
pub const TIMEOUT: Duration = Duration::from_secs(1);

/// Baud rates offered by the controller
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BaudRate(u32);

impl BaudRate {
    pub const ALL: [BaudRate; 10] = [
        BaudRate(300),
        BaudRate(600),
        BaudRate(1200),
        BaudRate(2400),
        BaudRate(4800),
        BaudRate(9600),
        BaudRate(19200),
        BaudRate(38400),
        BaudRate(57600),
        BaudRate(115200),
    ];

    pub const DEFAULT: BaudRate = BaudRate(9600);

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.0 == value)
            .ok_or_else(|| format!("Unsupported baud rate: {}", value))
    }
}

impl From<BaudRate> for u32 {
    fn from(b: BaudRate) -> u32 {
        b.0
    }
}

impl std::str::FromStr for BaudRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid baud rate: {}", s.trim()))?;
        Self::try_from(value)
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters of a single connection. Framing is always 8-N-1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    port: PortDescriptor,
    baud: BaudRate,
    timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(port: PortDescriptor, baud: BaudRate) -> Self {
        Self {
            port,
            baud,
            timeout: TIMEOUT,
        }
    }

    pub fn port(&self) -> &PortDescriptor {
        &self.port
    }

    pub fn baud(&self) -> BaudRate {
        self.baud
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
