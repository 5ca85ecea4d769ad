//! Typed trace events
//!
//! A [`DecodedEvent`] is the result of decoding one trace line. Exactly one
//! variant is active per line; lines with an unrecognised tag never become an
//! event at all.

use crate::machine::Register;
use serde_json::Value;

/// One decoded line of the interpreter's trace protocol
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    /// `config {...}`: machine configuration, carries the memory size
    Config { memory_kb: usize },
    /// `mem b0 b1 ...`: contiguous memory dump starting at address 0
    MemoryDump(MemoryDump),
    /// `data`: an environment snapshot is ready to be fetched out of band
    Environment,
    /// `fetch pc opcode opbyte op1 op2`
    Fetch(FetchEvent),
    /// `decode name`
    Decode { name: String },
    /// `exec_func name args...`
    Exec(ExecPayload),
    /// `found_global [name, type, initial]`, printed by the compiler front-end
    Global(GlobalVariable),
}

impl DecodedEvent {
    /// Protocol tag this event was decoded from
    pub fn tag(&self) -> &'static str {
        match self {
            DecodedEvent::Config { .. } => "config",
            DecodedEvent::MemoryDump(_) => "mem",
            DecodedEvent::Environment => "data",
            DecodedEvent::Fetch(_) => "fetch",
            DecodedEvent::Decode { .. } => "decode",
            DecodedEvent::Exec(_) => "exec_func",
            DecodedEvent::Global(_) => "found_global",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryDump {
    pub bytes: Vec<u8>,
}

impl MemoryDump {
    /// `(offset, value)` pairs, offsets counted from address 0
    pub fn cells(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.bytes.iter().copied().enumerate()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchEvent {
    pub pc: u64,
    pub opcode: String,
    pub opbyte: String,
    pub operand1: Datum,
    pub operand2: Datum,
}

impl FetchEvent {
    /// Length in bytes of the fetched instruction: opcode, operand byte, operands
    pub fn instruction_len(&self) -> usize {
        2 + self.operand1.len() + self.operand2.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVariable {
    pub name: String,
    pub ty: String,
    pub initial: Datum,
}

/// Payload of an `exec_func` line, one variant per operation name
#[derive(Debug, Clone, PartialEq)]
pub enum ExecPayload {
    Cmp {
        lhs: String,
        rhs: String,
        result: String,
    },
    Jmp {
        kind: String,
        address: String,
        performed: bool,
    },
    MovReg {
        register: Register,
        size: usize,
        source_type: String,
        source: Datum,
        content: Datum,
    },
    MovMem {
        dest: usize,
        size: usize,
        source_type: String,
        source: Datum,
        content: Datum,
    },
    LeaReg {
        register: Register,
        address: Datum,
    },
    LeaMem {
        dest: usize,
        address: Datum,
    },
    Arithmetic {
        op: String,
        kind: String,
        dest_type: String,
        dest: String,
        op1: Datum,
        op2: Datum,
        result: String,
    },
}

impl ExecPayload {
    pub fn name(&self) -> &'static str {
        match self {
            ExecPayload::Cmp { .. } => "cmp",
            ExecPayload::Jmp { .. } => "jmp",
            ExecPayload::MovReg { .. } => "mov_reg",
            ExecPayload::MovMem { .. } => "mov_mem",
            ExecPayload::LeaReg { .. } => "lea_reg",
            ExecPayload::LeaMem { .. } => "lea_mem",
            ExecPayload::Arithmetic { .. } => "arithmetic",
        }
    }
}

/// A JSON-encoded field of a trace line: operand descriptors, register
/// contents, immediates and addresses
#[derive(Debug, Clone, PartialEq)]
pub struct Datum(pub Value);

impl Datum {
    /// Length of a list or string datum, zero for scalars
    pub fn len(&self) -> usize {
        match &self.0 {
            Value::Array(items) => items.len(),
            Value::String(s) => s.chars().count(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display text: lists are comma joined, strings are unquoted
    pub fn text(&self) -> String {
        fn render(value: &Value) -> String {
            match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
                other => other.to_string(),
            }
        }
        render(&self.0)
    }

    /// Integer value of a number or numeric string
    pub fn as_integer(&self) -> Option<i64> {
        match &self.0 {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Byte values of a list datum; `None` if any element is not a byte
    pub fn bytes(&self) -> Option<Vec<u8>> {
        match &self.0 {
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect(),
            _ => None,
        }
    }
}

impl From<Value> for Datum {
    fn from(value: Value) -> Self {
        Datum(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_datum_text_matches_list_rendering() {
        assert_eq!(Datum(json!([1, 2, 3])).text(), "1,2,3");
        assert_eq!(Datum(json!("eax")).text(), "eax");
        assert_eq!(Datum(json!(42)).text(), "42");
        assert_eq!(Datum(Value::Null).text(), "");
    }

    #[test]
    fn test_datum_bytes_rejects_out_of_range() {
        assert_eq!(Datum(json!([0, 255])).bytes(), Some(vec![0, 255]));
        assert_eq!(Datum(json!([256])).bytes(), None);
        assert_eq!(Datum(json!(7)).bytes(), None);
    }

    #[test]
    fn test_datum_integer_out_of_range_is_none() {
        assert_eq!(Datum(json!(-3)).as_integer(), Some(-3));
        assert_eq!(Datum(json!(" 12 ")).as_integer(), Some(12));
        assert_eq!(Datum(json!(9223372036854775807u64)).as_integer(), Some(i64::MAX));
        assert_eq!(Datum(json!(18446744073709551615u64)).as_integer(), None);
    }

    #[test]
    fn test_instruction_len_counts_operand_bytes() {
        let fetch = FetchEvent {
            pc: 0,
            opcode: "1".into(),
            opbyte: "0".into(),
            operand1: Datum(json!([1, 0, 0, 0])),
            operand2: Datum(json!([])),
        };
        assert_eq!(fetch.instruction_len(), 6);
    }
}
