// src/console.rs
//
// Line-oriented console front-end for the controller.
//
// Plain lines are treated as key presses (`M`, `r`, `12`); lines starting
// with `:` are panel actions. After every line the status, the last
// command and any alert bell are printed.

use std::io::{BufRead, Write};

use crate::clock::Clock;
use crate::controller::Controller;
use crate::error::SendError;
use crate::ports;
use crate::serial::{BaudRate, SerialBackend};
use crate::settings::{SettingsStore, Theme};
use crate::status::Severity;

const HELP: &str = "\
Keys:     M R P T S (MIC record, RX record, Play, Transmit, Stop), 0-9 memory slots
Actions:  :open  :close  :toggle  :ports  :default  :port NAME  :baud N
          :theme light|dark  :status  :help  :quit";

/// One parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleInput {
    Empty,
    Keys(String),
    Open,
    Close,
    Toggle,
    Ports,
    DefaultPort,
    Port(String),
    Baud(String),
    Theme(String),
    Status,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str) -> ConsoleInput {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleInput::Empty;
    }

    let Some(action) = line.strip_prefix(':') else {
        return ConsoleInput::Keys(line.to_string());
    };

    let (name, arg) = match action.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim().to_string()),
        None => (action, String::new()),
    };

    match name.to_lowercase().as_str() {
        "open" => ConsoleInput::Open,
        "close" => ConsoleInput::Close,
        "toggle" => ConsoleInput::Toggle,
        "ports" => ConsoleInput::Ports,
        "default" => ConsoleInput::DefaultPort,
        "port" => ConsoleInput::Port(arg),
        "baud" => ConsoleInput::Baud(arg),
        "theme" => ConsoleInput::Theme(arg),
        "status" => ConsoleInput::Status,
        "help" | "?" => ConsoleInput::Help,
        "quit" | "q" | "exit" => ConsoleInput::Quit,
        _ => ConsoleInput::Unknown(line.to_string()),
    }
}

/// Drive `controller` from `input` until `:quit` or end of input.
/// The caller is responsible for `Controller::shutdown`.
pub fn run<B, S, C, R, W>(
    controller: &mut Controller<B, S, C>,
    input: R,
    mut out: W,
) -> std::io::Result<()>
where
    B: SerialBackend,
    S: SettingsStore,
    C: Clock,
    R: BufRead,
    W: Write,
{
    writeln!(out, "JUMA Voice Memory Controller")?;
    writeln!(out, "{}", HELP)?;
    write_ports(controller, &mut out)?;
    write_status(controller, &mut out)?;

    for line in input.lines() {
        let line = line?;
        controller.tick();

        match parse_line(&line) {
            ConsoleInput::Empty => continue,
            ConsoleInput::Quit => break,
            ConsoleInput::Help => writeln!(out, "{}", HELP)?,
            ConsoleInput::Status => {}
            ConsoleInput::Keys(keys) => {
                for symbol in keys.chars().filter(|c| !c.is_whitespace()) {
                    match controller.send_command(symbol) {
                        Err(SendError::UnknownSymbol(c)) => {
                            writeln!(out, "Ignoring key {:?}", c)?;
                        }
                        // Status carries the failure; stop on the first one
                        Err(_) => break,
                        Ok(()) => {}
                    }
                }
            }
            ConsoleInput::Open => {
                let _ = controller.open_with_current_selection();
            }
            ConsoleInput::Close => controller.close_connection(),
            ConsoleInput::Toggle => {
                let _ = controller.toggle_connection();
            }
            ConsoleInput::Ports => {
                controller.refresh_ports();
                write_ports(controller, &mut out)?;
            }
            ConsoleInput::DefaultPort => {
                controller.refresh_ports();
                let port = controller.choose_default_port();
                writeln!(out, "Selected port: {}", port)?;
            }
            ConsoleInput::Port(name) => {
                controller.select_port(name);
                writeln!(
                    out,
                    "Selected port: {}",
                    controller.selected_port().map(|p| p.as_str()).unwrap_or("")
                )?;
            }
            ConsoleInput::Baud(value) => match value.parse::<BaudRate>() {
                Ok(baud) => {
                    controller.select_baud(baud);
                    writeln!(out, "Baud: {}", baud)?;
                }
                Err(e) => writeln!(out, "{} (choose one of {})", e, baud_list())?,
            },
            ConsoleInput::Theme(value) => match value.parse::<Theme>() {
                Ok(theme) => {
                    controller.set_theme(theme);
                    writeln!(out, "Theme: {}", theme.label())?;
                }
                Err(e) => writeln!(out, "{}", e)?,
            },
            ConsoleInput::Unknown(text) => {
                writeln!(out, "Unknown action {} (try :help)", text)?;
            }
        }

        write_status(controller, &mut out)?;
    }

    out.flush()
}

fn baud_list() -> String {
    BaudRate::ALL
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_ports<B, S, C, W>(controller: &Controller<B, S, C>, out: &mut W) -> std::io::Result<()>
where
    B: SerialBackend,
    S: SettingsStore,
    C: Clock,
    W: Write,
{
    let details = ports::list_port_details(controller.backend());
    if details.is_empty() {
        writeln!(out, "No serial ports found")?;
    }
    for d in details {
        let marker = if controller.selected_port() == Some(&d.port) { "*" } else { " " };
        match (&d.manufacturer, &d.product) {
            (Some(m), Some(p)) => writeln!(out, "{} {} [{}] {} {}", marker, d.port, d.port_type, m, p)?,
            _ => writeln!(out, "{} {} [{}]", marker, d.port, d.port_type)?,
        }
    }
    writeln!(
        out,
        "Port: {}  Baud: {}",
        controller.selected_port().map(|p| p.as_str()).unwrap_or("<none>"),
        controller.selected_baud()
    )
}

fn write_status<B, S, C, W>(controller: &mut Controller<B, S, C>, out: &mut W) -> std::io::Result<()>
where
    B: SerialBackend,
    S: SettingsStore,
    C: Clock,
    W: Write,
{
    if controller.take_alert() {
        write!(out, "\x07")?;
    }
    let status = controller.status();
    let tag = match status.severity {
        Severity::Idle => "IDLE",
        Severity::Ok => "OK",
        Severity::Error => "ERR",
    };
    let last = controller
        .last_command()
        .map(|c| c.to_string())
        .unwrap_or_default();
    writeln!(out, "Status: [{}] {}  Command: {}", tag, status.message, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::HostOs;
    use crate::settings::{MemoryStore, Settings};
    use crate::testing::{FakeBackend, ManualClock};

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   "), ConsoleInput::Empty);
        assert_eq!(parse_line("MR5"), ConsoleInput::Keys("MR5".into()));
        assert_eq!(parse_line(":open"), ConsoleInput::Open);
        assert_eq!(parse_line(":OPEN"), ConsoleInput::Open);
        assert_eq!(parse_line(":port  /dev/ttyUSB1 "), ConsoleInput::Port("/dev/ttyUSB1".into()));
        assert_eq!(parse_line(":baud 19200"), ConsoleInput::Baud("19200".into()));
        assert_eq!(parse_line(":theme dark"), ConsoleInput::Theme("dark".into()));
        assert_eq!(parse_line(":q"), ConsoleInput::Quit);
        assert_eq!(parse_line(":frobnicate"), ConsoleInput::Unknown(":frobnicate".into()));
    }

    fn run_script(script: &str, backend: &FakeBackend, store: &MemoryStore) -> String {
        let mut controller = Controller::with_host_os(
            backend.clone(),
            store.clone(),
            ManualClock::new(),
            HostOs::Linux,
        );
        let mut out = Vec::new();
        run(&mut controller, script.as_bytes(), &mut out).unwrap();
        controller.shutdown();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_session_sends_keys_and_releases_port() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let store = MemoryStore::new(Settings::default());

        let out = run_script(":open\nm\n12\ns\n:quit\nP\n", &backend, &store);

        assert_eq!(backend.written(), b"M12S".to_vec());
        assert_eq!(backend.live_links(), 0);
        assert!(out.contains("Status: [OK] Connected: /dev/ttyUSB0 @ 9600"));
        assert!(out.contains("Status: [OK] MIC record  Command: M"));
        assert!(out.contains("Status: [IDLE] Idle  Command: S"));
    }

    #[test]
    fn test_session_rings_bell_when_not_open() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let store = MemoryStore::new(Settings::default());

        let out = run_script("T\n", &backend, &store);

        assert!(out.contains("\x07Status: [ERR] Port is not open!"));
        assert!(backend.written().is_empty());
    }

    #[test]
    fn test_session_updates_settings() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let store = MemoryStore::new(Settings::default());

        let out = run_script(":baud 38400\n:baud 12\n:theme dark\n:port /dev/ttyACM3\n", &backend, &store);

        let saved = store.snapshot();
        assert_eq!(saved.baud.map(|b| b.value()), Some(38400));
        assert_eq!(saved.theme, Theme::Dark);
        assert_eq!(saved.port.as_deref(), Some("/dev/ttyACM3"));
        assert!(out.contains("Unsupported baud rate: 12"));
    }

    #[test]
    fn test_session_reports_ignored_keys() {
        let backend = FakeBackend::with_ports(&["/dev/ttyUSB0"]);
        let store = MemoryStore::new(Settings::default());

        let out = run_script(":open\nx\n", &backend, &store);

        assert!(out.contains("Ignoring key 'x'"));
        assert!(backend.written().is_empty());
    }
}
