//! Expansion of decoded events into animation steps
//!
//! [`StepCompiler::compile`] is a pure function of the event: it either returns
//! the complete step sequence for the micro-operation or an error, never a
//! partial sequence. Appending the result to the queue is the caller's job.

use super::step::{notify, AnimationStep};
use crate::errors::{CompileError, UnknownTag};
use crate::machine::{integer_to_bytes, Flag, Register, ADDRESS_WIDTH, MAX_TRANSFER_BYTES};
use crate::protocol::{Datum, DecodedEvent, ExecPayload, FetchEvent};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct StepCompiler;

impl StepCompiler {
    pub fn new() -> Self {
        StepCompiler
    }

    /// Compile one event into its ordered step sequence.
    ///
    /// Configuration, memory dumps and environment requests load state rather
    /// than animate it, so they compile to nothing here.
    pub fn compile(&self, event: &DecodedEvent) -> Result<Vec<AnimationStep>, CompileError> {
        match event {
            DecodedEvent::Fetch(fetch) => compile_fetch(fetch),
            DecodedEvent::Decode { name } => Ok(vec![notify(format!("Decoded as {}", name))]),
            DecodedEvent::Exec(payload) => compile_exec(payload),
            DecodedEvent::Global(global) => Ok(vec![notify(format!(
                "Found global variable {} of type {}, initial {}",
                global.name,
                global.ty,
                global.initial.text()
            ))]),
            DecodedEvent::Config { .. } | DecodedEvent::MemoryDump(_) | DecodedEvent::Environment => {
                Ok(Vec::new())
            }
        }
    }
}

/// PC -> MAR -> MDR -> CIR
fn compile_fetch(fetch: &FetchEvent) -> Result<Vec<AnimationStep>, CompileError> {
    let address = usize::try_from(fetch.pc).map_err(|_| CompileError::InvalidDatum {
        what: "program counter",
        value: fetch.pc.to_string(),
    })?;
    let size = fetch.instruction_len();
    check_transfer(address, size, "instruction")?;
    let pc = fetch.pc.to_string();

    Ok(vec![
        notify("Incrementing PC"),
        AnimationStep::SetRegister {
            register: Register::Pc,
            value: pc.clone(),
        },
        notify("Moving PC to MAR"),
        AnimationStep::MoveRegister {
            from: Register::Pc,
            to: Register::Mar,
            value: Some(pc),
        },
        notify("Reading memory"),
        AnimationStep::ReadMemory {
            address,
            size,
        },
        notify("Moving MAR to CIR"),
        AnimationStep::MoveRegister {
            from: Register::Mdr,
            to: Register::Cir,
            value: None,
        },
    ])
}

fn compile_exec(payload: &ExecPayload) -> Result<Vec<AnimationStep>, CompileError> {
    match payload {
        ExecPayload::Cmp { lhs, rhs, result } => {
            let flag = Flag::from_code(result).ok_or_else(|| UnknownTag::new("comparison result", result))?;
            Ok(vec![
                notify(format!("Comparing {} to {}: {}", lhs, rhs, flag.label())),
                AnimationStep::SetFlag(flag),
            ])
        }

        ExecPayload::Jmp {
            kind,
            address,
            performed,
        } => {
            let condition = jump_condition(kind).ok_or_else(|| UnknownTag::new("jump type", kind))?;
            let mut steps = Vec::with_capacity(2);
            if *performed {
                steps.push(AnimationStep::SetRegister {
                    register: Register::Pc,
                    value: address.clone(),
                });
            }
            steps.push(notify(format!(
                "Jump{} to {} - {}",
                condition,
                address,
                if *performed { "done" } else { "not done" }
            )));
            Ok(steps)
        }

        ExecPayload::MovReg {
            register,
            size,
            source_type,
            source,
            content,
        } => match source_type.as_str() {
            "reg" => {
                let src = source_register(source)?;
                Ok(vec![
                    notify(format!("Reading register {}", src)),
                    AnimationStep::Emphasize { register: src, on: true },
                    AnimationStep::SetRegister {
                        register: *register,
                        value: content.text(),
                    },
                    AnimationStep::Emphasize { register: src, on: false },
                ])
            }
            "maddr" => {
                let address = address_of(source, "source address")?;
                check_transfer(address, *size, "memory read")?;
                Ok(vec![
                    notify(format!("Reading from memory address {}", address)),
                    AnimationStep::SetRegister {
                        register: Register::Mar,
                        value: address.to_string(),
                    },
                    AnimationStep::ReadMemory { address, size: *size },
                    AnimationStep::Emphasize {
                        register: Register::Mdr,
                        on: true,
                    },
                    AnimationStep::SetRegister {
                        register: *register,
                        value: content.text(),
                    },
                    AnimationStep::Emphasize {
                        register: Register::Mdr,
                        on: false,
                    },
                ])
            }
            "immediate" => Ok(vec![
                notify(format!("Given immediate value {}", source.text())),
                AnimationStep::SetRegister {
                    register: *register,
                    value: content.text(),
                },
            ]),
            other => Err(UnknownTag::new("move source type", other).into()),
        },

        ExecPayload::MovMem {
            dest,
            size,
            source_type,
            source,
            content,
        } => match source_type.as_str() {
            "reg" => {
                let src = source_register(source)?;
                check_transfer(*dest, *size, "memory write")?;
                let bytes = content_bytes(content, *size)?;
                check_transfer(*dest, bytes.len(), "memory write")?;
                Ok(vec![
                    notify(format!("Reading register {}", src)),
                    AnimationStep::Emphasize { register: src, on: true },
                    AnimationStep::WriteMemory {
                        address: *dest,
                        bytes,
                    },
                    AnimationStep::Emphasize { register: src, on: false },
                ])
            }
            "immediate" => {
                let value = source.as_integer().ok_or_else(|| CompileError::InvalidDatum {
                    what: "immediate value",
                    value: source.text(),
                })?;
                check_transfer(*dest, *size, "memory write")?;
                Ok(vec![
                    notify(format!("Given immediate value {}", value)),
                    AnimationStep::WriteMemory {
                        address: *dest,
                        bytes: integer_to_bytes(value, *size),
                    },
                ])
            }
            other => Err(UnknownTag::new("move source type", other).into()),
        },

        ExecPayload::LeaReg { register, address } => Ok(vec![
            notify(format!("Load effective address {} to {}", address.text(), register)),
            AnimationStep::SetRegister {
                register: *register,
                value: address.text(),
            },
        ]),

        ExecPayload::LeaMem { dest, address } => {
            let value = address.as_integer().ok_or_else(|| CompileError::InvalidDatum {
                what: "effective address",
                value: address.text(),
            })?;
            check_transfer(*dest, ADDRESS_WIDTH, "memory write")?;
            Ok(vec![
                notify(format!("Load effective address {} to {}", value, dest)),
                AnimationStep::WriteMemory {
                    address: *dest,
                    bytes: integer_to_bytes(value, ADDRESS_WIDTH),
                },
            ])
        }

        // Arithmetic is not animated yet; the interpreter's follow-up
        // environment snapshot still shows its result.
        ExecPayload::Arithmetic { op, .. } => {
            debug!(op = op.as_str(), "arithmetic is not animated");
            Ok(Vec::new())
        }
    }
}

/// Suffix describing when a jump of the given type is taken
fn jump_condition(kind: &str) -> Option<&'static str> {
    match kind {
        "always" => Some(""),
        "e" => Some(" if equal"),
        "ne" => Some(" if not equal"),
        "lt" => Some(" if less than"),
        "le" => Some(" if less than or equal to"),
        "gt" => Some(" if greater than"),
        "ge" => Some(" if greater than or equal to"),
        _ => None,
    }
}

fn source_register(source: &Datum) -> Result<Register, CompileError> {
    source
        .text()
        .parse()
        .map_err(|_| UnknownTag::new("register", source.text()).into())
}

/// `size` bytes from `address` must be a plausible single transfer that does
/// not run past the end of the address space
fn check_transfer(address: usize, size: usize, what: &'static str) -> Result<(), CompileError> {
    if size > MAX_TRANSFER_BYTES || address.checked_add(size).is_none() {
        return Err(CompileError::InvalidDatum {
            what,
            value: format!("{} bytes at {}", size, address),
        });
    }
    Ok(())
}

fn address_of(datum: &Datum, what: &'static str) -> Result<usize, CompileError> {
    datum
        .as_integer()
        .and_then(|a| usize::try_from(a).ok())
        .ok_or_else(|| CompileError::InvalidDatum {
            what,
            value: datum.text(),
        })
}

/// Register contents as bytes: a byte list as given, an integer encoded to `size` bytes
fn content_bytes(content: &Datum, size: usize) -> Result<Vec<u8>, CompileError> {
    content
        .bytes()
        .or_else(|| content.as_integer().map(|v| integer_to_bytes(v, size)))
        .ok_or_else(|| CompileError::InvalidDatum {
            what: "register contents",
            value: content.text(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode_line;
    use pretty_assertions::assert_eq;

    fn compile(line: &str) -> Result<Vec<AnimationStep>, CompileError> {
        let event = decode_line(line)
            .expect("line should decode")
            .expect("line should be recognised");
        StepCompiler::new().compile(&event)
    }

    #[test]
    fn test_fetch_expands_to_fixed_cycle() {
        let steps = compile("fetch 10 3 1 [1, 0, 0, 0] [2]").unwrap();
        assert_eq!(
            steps,
            vec![
                notify("Incrementing PC"),
                AnimationStep::SetRegister {
                    register: Register::Pc,
                    value: "10".to_string()
                },
                notify("Moving PC to MAR"),
                AnimationStep::MoveRegister {
                    from: Register::Pc,
                    to: Register::Mar,
                    value: Some("10".to_string())
                },
                notify("Reading memory"),
                AnimationStep::ReadMemory { address: 10, size: 7 },
                notify("Moving MAR to CIR"),
                AnimationStep::MoveRegister {
                    from: Register::Mdr,
                    to: Register::Cir,
                    value: None
                },
            ]
        );
    }

    #[test]
    fn test_decode_is_one_notification() {
        assert_eq!(compile("decode MOV").unwrap(), vec![notify("Decoded as MOV")]);
    }

    #[test]
    fn test_cmp_greater_than() {
        assert_eq!(
            compile("exec_func cmp 5 3 p").unwrap(),
            vec![
                notify("Comparing 5 to 3: greater than"),
                AnimationStep::SetFlag(Flag::Greater)
            ]
        );
    }

    #[test]
    fn test_cmp_bad_result_is_unknown_tag() {
        assert_eq!(
            compile("exec_func cmp 5 3 q"),
            Err(CompileError::UnknownTag(UnknownTag::new("comparison result", "q")))
        );
    }

    #[test]
    fn test_jump_taken_sets_pc_first() {
        assert_eq!(
            compile("exec_func jmp always 100 true").unwrap(),
            vec![
                AnimationStep::SetRegister {
                    register: Register::Pc,
                    value: "100".to_string()
                },
                notify("Jump to 100 - done"),
            ]
        );
    }

    #[test]
    fn test_jump_not_taken() {
        assert_eq!(
            compile("exec_func jmp e 50 false").unwrap(),
            vec![notify("Jump if equal to 50 - not done")]
        );
        assert_eq!(
            compile("exec_func jmp ge 8 false").unwrap(),
            vec![notify("Jump if greater than or equal to to 8 - not done")]
        );
    }

    #[test]
    fn test_jump_unknown_type() {
        assert!(matches!(
            compile("exec_func jmp foo 1 true"),
            Err(CompileError::UnknownTag(ref tag)) if tag.tag == "foo"
        ));
    }

    #[test]
    fn test_mov_reg_from_register() {
        assert_eq!(
            compile(r#"exec_func mov_reg eax 4 reg "ebx" 42"#).unwrap(),
            vec![
                notify("Reading register ebx"),
                AnimationStep::Emphasize {
                    register: Register::Ebx,
                    on: true
                },
                AnimationStep::SetRegister {
                    register: Register::Eax,
                    value: "42".to_string()
                },
                AnimationStep::Emphasize {
                    register: Register::Ebx,
                    on: false
                },
            ]
        );
    }

    #[test]
    fn test_mov_reg_from_memory_carries_content() {
        let steps = compile("exec_func mov_reg ecx 2 maddr 30 [5, 6]").unwrap();
        assert_eq!(
            steps,
            vec![
                notify("Reading from memory address 30"),
                AnimationStep::SetRegister {
                    register: Register::Mar,
                    value: "30".to_string()
                },
                AnimationStep::ReadMemory { address: 30, size: 2 },
                AnimationStep::Emphasize {
                    register: Register::Mdr,
                    on: true
                },
                AnimationStep::SetRegister {
                    register: Register::Ecx,
                    value: "5,6".to_string()
                },
                AnimationStep::Emphasize {
                    register: Register::Mdr,
                    on: false
                },
            ]
        );
    }

    #[test]
    fn test_mov_reg_immediate() {
        assert_eq!(
            compile("exec_func mov_reg edx 4 immediate 9 9").unwrap(),
            vec![
                notify("Given immediate value 9"),
                AnimationStep::SetRegister {
                    register: Register::Edx,
                    value: "9".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_mov_mem_writes_bytes() {
        assert_eq!(
            compile(r#"exec_func mov_mem 40 2 reg "eax" [1, 2]"#).unwrap()[2],
            AnimationStep::WriteMemory {
                address: 40,
                bytes: vec![1, 2]
            }
        );
        assert_eq!(
            compile("exec_func mov_mem 40 2 immediate 258 null").unwrap(),
            vec![
                notify("Given immediate value 258"),
                AnimationStep::WriteMemory {
                    address: 40,
                    bytes: vec![2, 1]
                },
            ]
        );
        assert!(matches!(
            compile("exec_func mov_mem 40 2 maddr 1 1"),
            Err(CompileError::UnknownTag(_))
        ));
    }

    #[test]
    fn test_lea_variants() {
        assert_eq!(
            compile("exec_func lea_reg esi 64").unwrap(),
            vec![
                notify("Load effective address 64 to esi"),
                AnimationStep::SetRegister {
                    register: Register::Esi,
                    value: "64".to_string()
                },
            ]
        );
        assert_eq!(
            compile("exec_func lea_mem 12 300").unwrap(),
            vec![
                notify("Load effective address 300 to 12"),
                AnimationStep::WriteMemory {
                    address: 12,
                    bytes: vec![44, 1, 0, 0]
                },
            ]
        );
    }

    #[test]
    fn test_found_global_is_one_notification() {
        assert_eq!(
            compile(r#"found_global ["count", "int", [1, 2]]"#).unwrap(),
            vec![notify("Found global variable count of type int, initial 1,2")]
        );
    }

    #[test]
    fn test_oversized_transfers_are_rejected() {
        let lines = [
            "fetch 18446744073709551615 1 0 [] []",
            "exec_func mov_reg eax 18446744073709551615 maddr 0 0",
            "exec_func mov_reg eax 4 maddr 18446744073709551615 0",
            "exec_func mov_mem 0 18446744073709551615 immediate 1 null",
            "exec_func mov_mem 18446744073709551615 4 reg \"eax\" [1, 2, 3, 4]",
            "exec_func lea_mem 18446744073709551614 16",
        ];
        for line in lines {
            assert!(
                matches!(compile(line), Err(CompileError::InvalidDatum { .. })),
                "{} should not compile",
                line
            );
        }
        assert_eq!(
            compile("exec_func mov_mem 0 8 immediate 1 null").unwrap().len(),
            2
        );
    }

    #[test]
    fn test_arithmetic_compiles_to_nothing() {
        assert_eq!(
            compile("exec_func arithmetic add int reg eax 1 2 3").unwrap(),
            Vec::new()
        );
    }

    #[test]
    fn test_state_loads_compile_to_nothing() {
        assert!(compile("data").unwrap().is_empty());
        assert!(compile("mem 1 2 3").unwrap().is_empty());
    }
}
