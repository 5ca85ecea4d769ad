//! Interpreter trace protocol
//!
//! - [`event`]: typed events and the JSON field wrapper [`event::Datum`]
//! - [`decoder`]: line splitting, tag dispatch and field parsing
//!
//! # Line format
//!
//! ```text
//! config {"memorykb": 1}
//! mem 0 12 255 ...
//! data
//! fetch <pc> <opcode> <opbyte> <operand1:json> <operand2:json>
//! decode <name>
//! exec_func <funcname> <args...>
//! found_global ["name", "type", initial]
//! ```

pub mod decoder;
pub mod event;

pub use decoder::{decode_line, DecoderStats, EventDecoder};
pub use event::{Datum, DecodedEvent, ExecPayload, FetchEvent, GlobalVariable, MemoryDump};
