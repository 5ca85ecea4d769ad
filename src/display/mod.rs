//! Display surface and step rendering
//!
//! [`DisplaySurface`] is the small set of primitives a front-end has to offer:
//! set the text of a named element, set its emphasis, read or write memory
//! cells, and append commentary. [`render_step`] interprets one
//! [`AnimationStep`] against any surface. [`view::MachineView`] is the
//! in-memory model the terminal UI draws from.

pub mod view;

pub use view::MachineView;

use crate::animation::step::AnimationStep;
use crate::machine::{Flag, Register};
use tracing::warn;

/// A visual element addressable by name or address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Register(Register),
    Flag(Flag),
    Memory(usize),
}

/// An element that shows text rather than a memory cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Register(Register),
    Flag(Flag),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Normal,
    /// Stays until explicitly reset
    Bold,
    /// Lasts until the next step is rendered
    Flash,
}

pub trait DisplaySurface {
    /// Set the shown text of a register or flag
    fn set_text(&mut self, field: Field, text: String);

    /// Current shown text of a register or flag
    fn text(&self, field: Field) -> String;

    fn set_emphasis(&mut self, element: Element, emphasis: Emphasis);

    /// Returns `false` when the address is outside the memory grid
    fn write_byte(&mut self, address: usize, value: u8) -> bool;

    fn read_byte(&self, address: usize) -> Option<u8>;

    fn notify(&mut self, text: &str);

    /// Called before each step is rendered; clears transient emphasis
    fn begin_step(&mut self) {}
}

/// Format a memory cell the way the memory grid shows it
pub fn format_cell(value: u8) -> String {
    format!("{:03}", value)
}

/// Execute one step against a display surface
pub fn render_step<D: DisplaySurface + ?Sized>(step: &AnimationStep, surface: &mut D) {
    surface.begin_step();

    match step {
        AnimationStep::Notify(text) => surface.notify(text),

        AnimationStep::SetRegister { register, value } => {
            surface.set_text(Field::Register(*register), value.clone());
        }

        AnimationStep::MoveRegister { from, to, value } => {
            let value = match value {
                Some(value) => value.clone(),
                None => surface.text(Field::Register(*from)),
            };
            surface.set_emphasis(Element::Register(*from), Emphasis::Flash);
            surface.set_emphasis(Element::Register(*to), Emphasis::Flash);
            surface.set_text(Field::Register(*to), value);
        }

        AnimationStep::ReadMemory { address, size } => {
            let mut cells = Vec::new();
            for addr in (0..*size).map_while(|offset| address.checked_add(offset)) {
                match surface.read_byte(addr) {
                    Some(byte) => {
                        surface.set_emphasis(Element::Memory(addr), Emphasis::Flash);
                        cells.push(format_cell(byte));
                    }
                    None => {
                        warn!(address = addr, "read past end of memory");
                        break;
                    }
                }
            }
            surface.set_emphasis(Element::Register(Register::Mdr), Emphasis::Flash);
            surface.set_text(Field::Register(Register::Mdr), cells.join(","));
        }

        AnimationStep::WriteMemory { address, bytes } => {
            for (offset, byte) in bytes.iter().enumerate() {
                let Some(addr) = address.checked_add(offset) else {
                    warn!(address, offset, "write address overflows");
                    break;
                };
                if !surface.write_byte(addr, *byte) {
                    warn!(address = addr, "write past end of memory");
                    break;
                }
                surface.set_emphasis(Element::Memory(addr), Emphasis::Flash);
            }
        }

        AnimationStep::SetFlag(raised) => {
            for flag in Flag::ALL {
                let text = if flag == *raised { "1" } else { "0" };
                surface.set_text(Field::Flag(flag), text.to_string());
            }
        }

        AnimationStep::Emphasize { register, on } => {
            let emphasis = if *on { Emphasis::Bold } else { Emphasis::Normal };
            surface.set_emphasis(Element::Register(*register), emphasis);
        }
    }
}
