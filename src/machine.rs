//! Names of the visible machine elements
//!
//! The trace protocol and the display both address registers and comparison
//! flags by name. This module is the shared vocabulary: [`Register`] covers the
//! four fetch-cycle registers plus the eight general registers, [`Flag`] the
//! three mutually exclusive comparison flags.

use crate::errors::DecodeError;
use std::fmt;
use std::str::FromStr;

/// Number of memory cells shown per row of the memory grid
pub const MEMORY_ROW_WIDTH: usize = 10;

/// Width in bytes of an address written to memory by `lea_mem`
pub const ADDRESS_WIDTH: usize = 4;

/// Largest single memory transfer a trace line may describe
pub const MAX_TRANSFER_BYTES: usize = 64;

/// Largest memory grid a `config` line may ask for
pub const MAX_MEMORY_KB: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register {
    Pc,
    Mar,
    Mdr,
    Cir,
    Eax,
    Ebx,
    Ecx,
    Edx,
    Esi,
    Edi,
    Ebp,
    Esp,
}

impl Register {
    /// The general registers in the order the environment snapshot lists them
    pub const GENERAL: [Register; 8] = [
        Register::Eax,
        Register::Ebx,
        Register::Ecx,
        Register::Edx,
        Register::Esi,
        Register::Edi,
        Register::Ebp,
        Register::Esp,
    ];

    /// The registers taking part in the fetch cycle
    pub const CONTROL: [Register; 4] = [Register::Pc, Register::Mar, Register::Mdr, Register::Cir];

    pub fn name(self) -> &'static str {
        match self {
            Register::Pc => "PC",
            Register::Mar => "MAR",
            Register::Mdr => "MDR",
            Register::Cir => "CIR",
            Register::Eax => "eax",
            Register::Ebx => "ebx",
            Register::Ecx => "ecx",
            Register::Edx => "edx",
            Register::Esi => "esi",
            Register::Edi => "edi",
            Register::Ebp => "ebp",
            Register::Esp => "esp",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Register {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pc" => Ok(Register::Pc),
            "mar" => Ok(Register::Mar),
            "mdr" => Ok(Register::Mdr),
            "cir" => Ok(Register::Cir),
            "eax" => Ok(Register::Eax),
            "ebx" => Ok(Register::Ebx),
            "ecx" => Ok(Register::Ecx),
            "edx" => Ok(Register::Edx),
            "esi" => Ok(Register::Esi),
            "edi" => Ok(Register::Edi),
            "ebp" => Ok(Register::Ebp),
            "esp" => Ok(Register::Esp),
            _ => Err(DecodeError::UnknownRegister(s.to_string())),
        }
    }
}

/// Comparison flags: equal, negative (less than), positive (greater than)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Equal,
    Less,
    Greater,
}

impl Flag {
    pub const ALL: [Flag; 3] = [Flag::Equal, Flag::Less, Flag::Greater];

    /// Map a comparison result code (`e`, `n`, `p`) to its flag
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "e" => Some(Flag::Equal),
            "n" => Some(Flag::Less),
            "p" => Some(Flag::Greater),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Flag::Equal => "e",
            Flag::Less => "n",
            Flag::Greater => "p",
        }
    }

    /// Human readable relation, as used in comparison notifications
    pub fn label(self) -> &'static str {
        match self {
            Flag::Equal => "equal",
            Flag::Less => "less than",
            Flag::Greater => "greater than",
        }
    }
}

/// Little-endian byte encoding of `value`, truncated or zero-extended to `width`
pub fn integer_to_bytes(value: i64, width: usize) -> Vec<u8> {
    let le = value.to_le_bytes();
    (0..width)
        .map(|i| if i < le.len() { le[i] } else if value < 0 { 0xff } else { 0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_names_round_trip_case_insensitively() {
        assert_eq!("EAX".parse::<Register>().unwrap(), Register::Eax);
        assert_eq!("mdr".parse::<Register>().unwrap(), Register::Mdr);
        assert!(matches!(
            "r9".parse::<Register>(),
            Err(DecodeError::UnknownRegister(ref s)) if s == "r9"
        ));
    }

    #[test]
    fn test_flag_codes() {
        assert_eq!(Flag::from_code("p"), Some(Flag::Greater));
        assert_eq!(Flag::from_code("x"), None);
        assert_eq!(Flag::Less.label(), "less than");
    }

    #[test]
    fn test_integer_to_bytes_is_little_endian() {
        assert_eq!(integer_to_bytes(0x0102, 4), vec![0x02, 0x01, 0, 0]);
        assert_eq!(integer_to_bytes(300, 1), vec![44]);
        assert_eq!(integer_to_bytes(-1, 2), vec![0xff, 0xff]);
    }
}
