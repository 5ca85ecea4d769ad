//! Error types for the trace pipeline
//!
//! Each failure domain gets its own enum:
//!
//! - [`DecodeError`]: a trace line could not be turned into a [`DecodedEvent`]
//! - [`UnknownTag`]: a recognised event carried an unrecognised sub-operation
//! - [`CompileError`]: an event could not be expanded into steps
//! - [`ProcessError`]: the external interpreter could not be driven
//! - [`EnvironmentError`]: an environment snapshot could not be fetched
//! - [`ConfigError`]: `properties.json` or the CLI did not yield a usable config
//!
//! Decode and tag errors are recovered where they occur: the line is logged and
//! dropped. Process errors end the session.
//!
//! [`DecodedEvent`]: crate::protocol::event::DecodedEvent

use std::path::PathBuf;
use thiserror::Error;

/// A trace line that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty trace line")]
    EmptyLine,

    #[error("'{tag}' line is missing field '{field}'")]
    MissingField { tag: String, field: &'static str },

    #[error("'{tag}' field '{field}' is not an integer: '{value}'")]
    InvalidInteger {
        tag: String,
        field: &'static str,
        value: String,
    },

    #[error("'{tag}' field '{field}' is not valid JSON ({message}): '{value}'")]
    InvalidJson {
        tag: String,
        field: &'static str,
        value: String,
        message: String,
    },

    #[error("memory value {value} at offset {offset} does not fit in a byte")]
    InvalidByte { offset: usize, value: String },

    #[error("unknown register '{0}'")]
    UnknownRegister(String),

    #[error("invalid config payload: {0}")]
    InvalidConfig(String),
}

/// An unrecognised sub-operation inside a recognised event category
///
/// Raised by the step compiler for a bad comparison result, jump type or move
/// source; the event compiles to no steps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {category} '{tag}'")]
pub struct UnknownTag {
    pub category: &'static str,
    pub tag: String,
}

impl UnknownTag {
    pub fn new(category: &'static str, tag: impl Into<String>) -> Self {
        UnknownTag {
            category,
            tag: tag.into(),
        }
    }
}

/// Reasons an event compiles to no animation steps
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    UnknownTag(#[from] UnknownTag),

    #[error("{what} is not usable here: '{value}'")]
    InvalidDatum { what: &'static str, value: String },
}

/// Failures talking to the external interpreter process
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch interpreter '{}': {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("interpreter {0} pipe is unavailable")]
    MissingPipe(&'static str),

    #[error("failed to send '{command}' to interpreter: {source}")]
    Write {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("interpreter has exited")]
    Exited,

    #[error("an interpreter session is already running")]
    AlreadyRunning,
}

/// Problems fetching an environment snapshot
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("failed to read environment '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid environment snapshot in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Problems loading `properties.json` or resolving the CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no interpreter executable configured")]
    MissingInterpreter,
}
