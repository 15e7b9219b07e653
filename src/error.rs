// src/error.rs
//
// Errors surfaced by the connection manager and command transmitter.
// Messages are shown to the user as-is, so they say what failed and,
// where it helps, what to do next.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// No port selected
    #[error("Choose a serial port first.")]
    InvalidPort,

    /// Serial support is missing from this build or platform
    #[error("Serial support not available on this system.")]
    BackendUnavailable,

    /// Permission denied, device busy, device not found, ...
    #[error("Open failed: {0}")]
    OpenFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("Port is not open!")]
    NotConnected,

    #[error("Send failed: {0}")]
    WriteFailed(String),

    /// Symbol has no command bound to it; nothing was sent
    #[error("No command bound to {0:?}")]
    UnknownSymbol(char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ConnectionError::InvalidPort.to_string(),
            "Choose a serial port first."
        );
        assert_eq!(
            ConnectionError::OpenFailed("Permission denied".into()).to_string(),
            "Open failed: Permission denied"
        );
        assert_eq!(SendError::NotConnected.to_string(), "Port is not open!");
        assert_eq!(
            SendError::WriteFailed("Broken pipe".into()).to_string(),
            "Send failed: Broken pipe"
        );
        assert_eq!(SendError::UnknownSymbol('x').to_string(), "No command bound to 'x'");
    }
}
