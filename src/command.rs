// src/command.rs
//
// Voice memory commands and their wire encoding.
// Each command is exactly one ASCII byte on the wire: M R P T S 0-9.

use serde::Serialize;
use std::fmt;

/// A command understood by the voice memory unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Command {
    MicRecord,
    RxRecord,
    Play,
    Transmit,
    Stop,
    /// Memory slot selection
    Digit(Slot),
}

/// Memory slot number. Only 0..=9 can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Slot(u8);

impl Slot {
    pub fn new(n: u8) -> Option<Slot> {
        (n <= 9).then_some(Slot(n))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Input symbol to command table. Letters are listed in both cases so a
/// front-end can forward raw key presses.
const DISPATCH_TABLE: &[(char, Command)] = &[
    ('M', Command::MicRecord),
    ('m', Command::MicRecord),
    ('R', Command::RxRecord),
    ('r', Command::RxRecord),
    ('P', Command::Play),
    ('p', Command::Play),
    ('T', Command::Transmit),
    ('t', Command::Transmit),
    ('S', Command::Stop),
    ('s', Command::Stop),
    ('0', Command::Digit(Slot(0))),
    ('1', Command::Digit(Slot(1))),
    ('2', Command::Digit(Slot(2))),
    ('3', Command::Digit(Slot(3))),
    ('4', Command::Digit(Slot(4))),
    ('5', Command::Digit(Slot(5))),
    ('6', Command::Digit(Slot(6))),
    ('7', Command::Digit(Slot(7))),
    ('8', Command::Digit(Slot(8))),
    ('9', Command::Digit(Slot(9))),
];

/// Look up the command bound to an input symbol.
pub fn dispatch(symbol: char) -> Option<Command> {
    DISPATCH_TABLE
        .iter()
        .find(|(key, _)| *key == symbol)
        .map(|(_, cmd)| *cmd)
}

impl Command {
    /// The five function commands, in panel order
    pub const FUNCTIONS: [Command; 5] = [
        Command::MicRecord,
        Command::RxRecord,
        Command::Play,
        Command::Transmit,
        Command::Stop,
    ];

    /// Build a digit command; `None` for anything above 9.
    pub fn digit(n: u8) -> Option<Command> {
        Slot::new(n).map(Command::Digit)
    }

    /// The single ASCII byte sent to the device.
    pub fn wire_byte(self) -> u8 {
        match self {
            Command::MicRecord => b'M',
            Command::RxRecord => b'R',
            Command::Play => b'P',
            Command::Transmit => b'T',
            Command::Stop => b'S',
            Command::Digit(slot) => b'0' + slot.value(),
        }
    }

    pub fn symbol(self) -> char {
        self.wire_byte() as char
    }

    /// Human label for commands that put the unit into a mode.
    /// Stop and digits have none.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Command::MicRecord => Some("MIC record"),
            Command::RxRecord => Some("RX record"),
            Command::Play => Some("Play"),
            Command::Transmit => Some("Transmit"),
            Command::Stop | Command::Digit(_) => None,
        }
    }

    pub fn is_digit(self) -> bool {
        matches!(self, Command::Digit(_))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
