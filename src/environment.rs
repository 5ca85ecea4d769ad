//! Out-of-band environment snapshots
//!
//! When the interpreter prints `data` it has written its full state to a JSON
//! file. An [`EnvironmentSource`] retrieves that state; the default source
//! reads it from disk.

use crate::errors::EnvironmentError;
use crate::machine::{Flag, Register};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Full machine state as written by the interpreter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvironmentSnapshot {
    pub pc: i64,
    pub genregs: GeneralRegisters,
    pub cmp: ComparisonFlags,
    pub memory: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneralRegisters {
    pub eax: i64,
    pub ebx: i64,
    pub ecx: i64,
    pub edx: i64,
    pub esi: i64,
    pub edi: i64,
    pub ebp: i64,
    pub esp: i64,
}

impl GeneralRegisters {
    pub fn get(&self, register: Register) -> Option<i64> {
        match register {
            Register::Eax => Some(self.eax),
            Register::Ebx => Some(self.ebx),
            Register::Ecx => Some(self.ecx),
            Register::Edx => Some(self.edx),
            Register::Esi => Some(self.esi),
            Register::Edi => Some(self.edi),
            Register::Ebp => Some(self.ebp),
            Register::Esp => Some(self.esp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComparisonFlags {
    pub p: i64,
    pub e: i64,
    pub n: i64,
}

impl ComparisonFlags {
    pub fn get(&self, flag: Flag) -> i64 {
        match flag {
            Flag::Equal => self.e,
            Flag::Less => self.n,
            Flag::Greater => self.p,
        }
    }
}

impl EnvironmentSnapshot {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Somewhere an environment snapshot can be fetched from
pub trait EnvironmentSource {
    fn fetch(&mut self) -> Result<EnvironmentSnapshot, EnvironmentError>;
}

/// Reads the snapshot the interpreter writes next to itself
#[derive(Debug, Clone)]
pub struct EnvironmentFile {
    path: PathBuf,
}

impl EnvironmentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EnvironmentFile { path: path.into() }
    }
}

impl EnvironmentSource for EnvironmentFile {
    fn fetch(&mut self) -> Result<EnvironmentSnapshot, EnvironmentError> {
        let text = fs::read_to_string(&self.path).map_err(|source| EnvironmentError::Read {
            path: self.path.clone(),
            source,
        })?;
        EnvironmentSnapshot::from_json(&text).map_err(|source| EnvironmentError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}
