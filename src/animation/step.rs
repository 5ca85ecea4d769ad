//! Atomic animation steps
//!
//! Every [`AnimationStep`] carries all of the data it needs. Executing one
//! never consults the trace again; the only state it reads is the display
//! model itself, and only for register transfers whose value the trace does
//! not spell out (MDR to CIR, memory to MDR).

use crate::machine::{Flag, Register};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationStep {
    /// Append a line to the commentary
    Notify(String),

    /// Replace the shown contents of a register
    SetRegister { register: Register, value: String },

    /// Move a value from one register into another, flashing both.
    ///
    /// `value: None` copies whatever `from` currently holds.
    MoveRegister {
        from: Register,
        to: Register,
        value: Option<String>,
    },

    /// Flash the cells `[address, address + size)` and load them into the MDR
    ReadMemory { address: usize, size: usize },

    /// Write `bytes` into memory starting at `address`
    WriteMemory { address: usize, bytes: Vec<u8> },

    /// Raise one comparison flag and clear the other two
    SetFlag(Flag),

    /// Turn persistent emphasis on a register on or off
    Emphasize { register: Register, on: bool },
}

impl fmt::Display for AnimationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimationStep::Notify(text) => write!(f, "notify \"{}\"", text),
            AnimationStep::SetRegister { register, value } => {
                write!(f, "set {} = {}", register, value)
            }
            AnimationStep::MoveRegister { from, to, value } => match value {
                Some(value) => write!(f, "move {} -> {} ({})", from, to, value),
                None => write!(f, "move {} -> {}", from, to),
            },
            AnimationStep::ReadMemory { address, size } => {
                write!(f, "read {} byte(s) at {} into MDR", size, address)
            }
            AnimationStep::WriteMemory { address, bytes } => {
                write!(f, "write {:?} at {}", bytes, address)
            }
            AnimationStep::SetFlag(flag) => write!(f, "set flag {}", flag.code()),
            AnimationStep::Emphasize { register, on } => {
                write!(f, "{} {}", if *on { "bold" } else { "unbold" }, register)
            }
        }
    }
}

/// Shorthand for building a notification step
pub fn notify(text: impl Into<String>) -> AnimationStep {
    AnimationStep::Notify(text.into())
}
