//! Trace line decoder
//!
//! Converts the raw text emitted by the interpreter into [`DecodedEvent`]s.
//! Lines are dispatched on their leading tag; the remaining fields are split on
//! whitespace, except that whitespace nested inside JSON brackets or strings
//! does not split a field (`[1, 2]` is one field).
//!
//! A line that fails to decode is logged and dropped whole. A line with an
//! unrecognised tag is not an error: it is counted and ignored.

use super::event::{Datum, DecodedEvent, ExecPayload, FetchEvent, GlobalVariable, MemoryDump};
use crate::errors::DecodeError;
use crate::machine::{Register, MAX_MEMORY_KB};
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, warn};

/// Running totals of what the decoder has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub decoded: usize,
    pub ignored: usize,
    pub malformed: usize,
}

#[derive(Debug, Default)]
pub struct EventDecoder {
    stats: DecoderStats,
}

impl EventDecoder {
    pub fn new() -> Self {
        EventDecoder::default()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Decode a chunk of interpreter output that may hold several lines.
    ///
    /// Events come back in the order their lines appear. Malformed and
    /// unrecognised lines contribute nothing.
    pub fn decode(&mut self, raw: &str) -> Vec<DecodedEvent> {
        let mut events = Vec::new();
        for line in raw.split('\n') {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            match decode_line(line) {
                Ok(Some(event)) => {
                    self.stats.decoded += 1;
                    events.push(event);
                }
                Ok(None) => {
                    self.stats.ignored += 1;
                    debug!(line, "ignoring unrecognised trace line");
                }
                Err(err) => {
                    self.stats.malformed += 1;
                    warn!(line, error = %err, "dropping malformed trace line");
                }
            }
        }
        events
    }
}

/// Decode a single line. `Ok(None)` means the tag is not one we handle.
pub fn decode_line(line: &str) -> Result<Option<DecodedEvent>, DecodeError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(DecodeError::EmptyLine);
    }
    let (tag, rest) = match line.split_once(char::is_whitespace) {
        Some((tag, rest)) => (tag, rest.trim()),
        None => (line, ""),
    };

    let event = match tag {
        "config" => decode_config(rest)?,
        "mem" => decode_memory(rest)?,
        "data" => DecodedEvent::Environment,
        "fetch" => decode_fetch(rest)?,
        "decode" => DecodedEvent::Decode {
            name: Fields::new(tag, rest).text("name")?,
        },
        "exec_func" => match decode_exec(rest)? {
            Some(payload) => DecodedEvent::Exec(payload),
            None => return Ok(None),
        },
        "found_global" => decode_global(rest)?,
        _ => return Ok(None),
    };
    Ok(Some(event))
}

#[derive(Deserialize)]
struct ConfigPayload {
    memorykb: usize,
}

fn decode_config(rest: &str) -> Result<DecodedEvent, DecodeError> {
    let payload: ConfigPayload =
        serde_json::from_str(rest).map_err(|e| DecodeError::InvalidConfig(e.to_string()))?;
    if payload.memorykb > MAX_MEMORY_KB {
        return Err(DecodeError::InvalidConfig(format!(
            "memorykb {} exceeds the {} KB limit",
            payload.memorykb, MAX_MEMORY_KB
        )));
    }
    Ok(DecodedEvent::Config {
        memory_kb: payload.memorykb,
    })
}

fn decode_memory(rest: &str) -> Result<DecodedEvent, DecodeError> {
    let bytes = rest
        .split_whitespace()
        .enumerate()
        .map(|(offset, value)| {
            value.parse::<u8>().map_err(|_| DecodeError::InvalidByte {
                offset,
                value: value.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedEvent::MemoryDump(MemoryDump { bytes }))
}

fn decode_fetch(rest: &str) -> Result<DecodedEvent, DecodeError> {
    let mut fields = Fields::new("fetch", rest);
    Ok(DecodedEvent::Fetch(FetchEvent {
        pc: fields.integer("pc")?,
        opcode: fields.text("opcode")?,
        opbyte: fields.text("opbyte")?,
        operand1: fields.json("operand1")?,
        operand2: fields.json("operand2")?,
    }))
}

fn decode_global(rest: &str) -> Result<DecodedEvent, DecodeError> {
    let invalid = |message: String| DecodeError::InvalidJson {
        tag: "found_global".to_string(),
        field: "global",
        value: rest.to_string(),
        message,
    };
    let (name, ty, initial): (String, String, serde_json::Value) =
        serde_json::from_str(rest).map_err(|e| invalid(e.to_string()))?;
    Ok(DecodedEvent::Global(GlobalVariable {
        name,
        ty,
        initial: Datum(initial),
    }))
}

fn decode_exec(rest: &str) -> Result<Option<ExecPayload>, DecodeError> {
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    if name.is_empty() {
        return Err(DecodeError::MissingField {
            tag: "exec_func".to_string(),
            field: "funcname",
        });
    }
    let mut fields = Fields::new(name, args);

    let payload = match name {
        "cmp" => ExecPayload::Cmp {
            lhs: fields.text("arg1")?,
            rhs: fields.text("arg2")?,
            result: fields.text("result")?,
        },
        "jmp" => ExecPayload::Jmp {
            kind: fields.text("type")?,
            address: fields.text("address")?,
            performed: fields.text("performed")? == "true",
        },
        "mov_reg" => ExecPayload::MovReg {
            register: fields.register("regname")?,
            size: fields.integer("size")?,
            source_type: fields.text("srctype")?,
            source: fields.json("srcdata")?,
            content: fields.json("srccontent")?,
        },
        "mov_mem" => ExecPayload::MovMem {
            dest: fields.integer("destaddr")?,
            size: fields.integer("size")?,
            source_type: fields.text("srctype")?,
            source: fields.json("srcdata")?,
            content: fields.json("srccontent")?,
        },
        "lea_reg" => ExecPayload::LeaReg {
            register: fields.register("regname")?,
            address: fields.json("addr")?,
        },
        "lea_mem" => ExecPayload::LeaMem {
            dest: fields.integer("destaddr")?,
            address: fields.json("addr")?,
        },
        "arithmetic" => ExecPayload::Arithmetic {
            op: fields.text("opname")?,
            kind: fields.text("type")?,
            dest_type: fields.text("desttype")?,
            dest: fields.text("dest")?,
            op1: fields.json("op1")?,
            op2: fields.json("op2")?,
            result: fields.text("res")?,
        },
        _ => return Ok(None),
    };
    Ok(Some(payload))
}

/// Positional field reader that names the missing or malformed field in errors
struct Fields<'a> {
    tag: &'a str,
    fields: std::vec::IntoIter<&'a str>,
}

impl<'a> Fields<'a> {
    fn new(tag: &'a str, rest: &'a str) -> Self {
        Fields {
            tag,
            fields: split_fields(rest).into_iter(),
        }
    }

    fn raw(&mut self, field: &'static str) -> Result<&'a str, DecodeError> {
        self.fields.next().ok_or_else(|| DecodeError::MissingField {
            tag: self.tag.to_string(),
            field,
        })
    }

    fn text(&mut self, field: &'static str) -> Result<String, DecodeError> {
        self.raw(field).map(str::to_string)
    }

    fn integer<T: FromStr>(&mut self, field: &'static str) -> Result<T, DecodeError> {
        let value = self.raw(field)?;
        value.parse().map_err(|_| DecodeError::InvalidInteger {
            tag: self.tag.to_string(),
            field,
            value: value.to_string(),
        })
    }

    fn json(&mut self, field: &'static str) -> Result<Datum, DecodeError> {
        let value = self.raw(field)?;
        serde_json::from_str(value)
            .map(Datum)
            .map_err(|e| DecodeError::InvalidJson {
                tag: self.tag.to_string(),
                field,
                value: value.to_string(),
                message: e.to_string(),
            })
    }

    fn register(&mut self, field: &'static str) -> Result<Register, DecodeError> {
        self.raw(field)?.parse()
    }
}

/// Split on whitespace that is not nested inside JSON brackets or strings
fn split_fields(input: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start: Option<usize> = None;

    for (i, c) in input.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    fields.push(&input[s..i]);
                }
                continue;
            }
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        fields.push(&input[s..]);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_fields_keeps_json_together() {
        assert_eq!(
            split_fields(r#"eax 4 reg "ebx" [1, 2, 3]"#),
            vec!["eax", "4", "reg", "\"ebx\"", "[1, 2, 3]"]
        );
        assert_eq!(split_fields(r#"  "a b"  {"k": [1, 2]} "#), vec!["\"a b\"", r#"{"k": [1, 2]}"#]);
        assert!(split_fields("   ").is_empty());
    }

    #[test]
    fn test_decode_config() {
        let event = decode_line(r#"config {"memorykb": 2, "name": "x"}"#).unwrap();
        assert_eq!(event, Some(DecodedEvent::Config { memory_kb: 2 }));
        assert!(matches!(
            decode_line("config {}"),
            Err(DecodeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_decode_config_rejects_oversized_memory() {
        let line = format!(r#"config {{"memorykb": {}}}"#, MAX_MEMORY_KB);
        assert!(decode_line(&line).unwrap().is_some());
        assert!(matches!(
            decode_line(r#"config {"memorykb": 18446744073709551615}"#),
            Err(DecodeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_decode_takes_one_mnemonic() {
        assert_eq!(
            decode_line("decode MOV x").unwrap(),
            Some(DecodedEvent::Decode {
                name: "MOV".to_string()
            })
        );
        assert!(matches!(
            decode_line("decode"),
            Err(DecodeError::MissingField { field: "name", .. })
        ));
    }

    #[test]
    fn test_decode_memory_dump() {
        let event = decode_line("mem 001 2 255").unwrap().unwrap();
        match event {
            DecodedEvent::MemoryDump(dump) => {
                assert_eq!(dump.cells().collect::<Vec<_>>(), vec![(0, 1), (1, 2), (2, 255)]);
            }
            other => panic!("Expected memory dump, got {:?}", other),
        }
        assert!(matches!(
            decode_line("mem 1 256"),
            Err(DecodeError::InvalidByte { offset: 1, .. })
        ));
    }

    #[test]
    fn test_decode_fetch() {
        let event = decode_line("fetch 12 5 3 [1, 0] []").unwrap().unwrap();
        match event {
            DecodedEvent::Fetch(fetch) => {
                assert_eq!(fetch.pc, 12);
                assert_eq!(fetch.opcode, "5");
                assert_eq!(fetch.opbyte, "3");
                assert_eq!(fetch.operand1, Datum(json!([1, 0])));
                assert_eq!(fetch.instruction_len(), 4);
            }
            other => panic!("Expected fetch, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_fetch_missing_operand_is_an_error() {
        assert_eq!(
            decode_line("fetch 12 5 3 []"),
            Err(DecodeError::MissingField {
                tag: "fetch".to_string(),
                field: "operand2",
            })
        );
        assert!(matches!(
            decode_line("fetch x 5 3 [] []"),
            Err(DecodeError::InvalidInteger { field: "pc", .. })
        ));
    }

    #[test]
    fn test_decode_exec_variants() {
        assert_eq!(
            decode_line("exec_func jmp e 50 false").unwrap(),
            Some(DecodedEvent::Exec(ExecPayload::Jmp {
                kind: "e".to_string(),
                address: "50".to_string(),
                performed: false,
            }))
        );
        assert_eq!(
            decode_line(r#"exec_func mov_reg eax 4 reg "ebx" [7, 0, 0, 0]"#).unwrap(),
            Some(DecodedEvent::Exec(ExecPayload::MovReg {
                register: Register::Eax,
                size: 4,
                source_type: "reg".to_string(),
                source: Datum(json!("ebx")),
                content: Datum(json!([7, 0, 0, 0])),
            }))
        );
        assert_eq!(
            decode_line("exec_func lea_mem 20 16").unwrap(),
            Some(DecodedEvent::Exec(ExecPayload::LeaMem {
                dest: 20,
                address: Datum(json!(16)),
            }))
        );
    }

    #[test]
    fn test_decode_exec_bad_json_drops_line() {
        assert!(matches!(
            decode_line("exec_func lea_reg eax [1,"),
            Err(DecodeError::InvalidJson { field: "addr", .. })
        ));
        assert!(matches!(
            decode_line("exec_func lea_reg r42 1"),
            Err(DecodeError::UnknownRegister(_))
        ));
    }

    #[test]
    fn test_unknown_tags_are_ignored() {
        assert_eq!(decode_line("hello world").unwrap(), None);
        assert_eq!(decode_line("exec_func push 1 2").unwrap(), None);
    }

    #[test]
    fn test_found_global() {
        let event = decode_line(r#"found_global ["count", "int", "5"]"#).unwrap();
        assert_eq!(
            event,
            Some(DecodedEvent::Global(GlobalVariable {
                name: "count".to_string(),
                ty: "int".to_string(),
                initial: Datum(json!("5")),
            }))
        );
    }

    #[test]
    fn test_decode_splits_multi_line_chunks_in_order() {
        let mut decoder = EventDecoder::new();
        let events = decoder.decode("decode ADD\r\nexec_func cmp 1 2 n\n\nbogus\nfetch\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].tag(), "decode");
        assert_eq!(events[1].tag(), "exec_func");
        assert_eq!(
            decoder.stats(),
            DecoderStats {
                decoded: 2,
                ignored: 1,
                malformed: 1,
            }
        );
    }
}
