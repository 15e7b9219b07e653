// tools/vmc_cli/main.rs
//
// One-shot command line access to the voice memory controller:
// list ports, show the default port, or open a port and send a few keys.
// Does not touch the saved panel settings.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use juma_vmc_lib::clock::SystemClock;
use juma_vmc_lib::ports::{self, HostOs};
use juma_vmc_lib::serial::DefaultBackend;
use juma_vmc_lib::settings::{MemoryStore, Settings};
use juma_vmc_lib::{BaudRate, Controller};

#[derive(Parser)]
#[command(name = "vmc_cli", about = "JUMA voice memory controller CLI")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List serial ports (default port marked with *)
    Ports,
    /// Print the port the controller would pick by default
    DefaultPort,
    /// Open a port, send each symbol as one command, then close
    Send {
        /// Serial port (defaults to the auto-detected port)
        #[arg(short, long)]
        port: Option<String>,
        /// Baud rate
        #[arg(short, long, default_value_t = 9600)]
        baud: u32,
        /// Command symbols, e.g. "M" or "P3"
        symbols: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let backend = DefaultBackend::default();

    match cli.command {
        Cmd::Ports => {
            let details = ports::list_port_details(&backend);
            let names: Vec<_> = details.iter().map(|d| d.port.clone()).collect();
            let default = ports::choose_default(&names, HostOs::current());
            for d in &details {
                let marker = if d.port == default { "*" } else { " " };
                match (d.vid, d.pid) {
                    (Some(vid), Some(pid)) => println!(
                        "{} {:<28} {:<10} {:04x}:{:04x} {}",
                        marker,
                        d.port,
                        d.port_type,
                        vid,
                        pid,
                        d.product.as_deref().unwrap_or("")
                    ),
                    _ => println!("{} {:<28} {}", marker, d.port, d.port_type),
                }
            }
            if details.is_empty() {
                eprintln!("No serial ports found");
            }
            ExitCode::SUCCESS
        }
        Cmd::DefaultPort => {
            let names = ports::list_ports(&backend);
            println!("{}", ports::choose_default(&names, HostOs::current()));
            ExitCode::SUCCESS
        }
        Cmd::Send {
            port,
            baud,
            symbols,
        } => {
            let baud = match BaudRate::try_from(baud) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
            };

            let mut controller = Controller::new(backend, MemoryStore::new(Settings::default()), SystemClock);
            match port {
                Some(p) => controller.select_port(p),
                None => {
                    controller.choose_default_port();
                }
            }
            controller.select_baud(baud);

            let mut ok = controller.open_with_current_selection().is_ok();
            println!("{}", controller.status().message);

            if ok {
                for symbol in symbols.chars().filter(|c| !c.is_whitespace()) {
                    if let Err(e) = controller.send_command(symbol) {
                        eprintln!("{}", e);
                        ok = false;
                        break;
                    }
                    println!("{} -> {}", symbol, controller.status().message);
                }
            }

            controller.shutdown();
            if ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
