#[macro_use]
pub mod logging;

pub mod clock;
pub mod command;
pub mod console;
pub mod controller;
pub mod error;
pub mod ports;
pub mod serial;
pub mod settings;
pub mod status;
pub mod transmitter;

#[cfg(test)]
mod testing;

pub use command::{Command, Slot};
pub use controller::Controller;
pub use error::{ConnectionError, SendError};
pub use ports::{HostOs, PortDescriptor, PortDetails};
pub use serial::{BaudRate, ConnectionConfig};
pub use settings::{Settings, SettingsStore, Theme};
pub use status::{Severity, Status};

/// Run the console controller on stdin/stdout until `:quit` or end of input.
pub fn run() {
    let _log_guard = logging::default_log_dir().and_then(|dir| match logging::init_file_logging(&dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            tlog!("[setup] {}", e);
            None
        }
    });

    let store = settings::JsonFileStore::default_location();
    let mut controller = Controller::new(serial::DefaultBackend::default(), store, clock::SystemClock);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = console::run(&mut controller, stdin.lock(), stdout.lock()) {
        tlog!("[console] Terminal I/O failed: {}", e);
    }

    controller.shutdown();
}
