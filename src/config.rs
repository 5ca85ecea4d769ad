//! Runtime configuration
//!
//! Settings come from `properties.json` and the command line; command-line
//! values win.
//!
//! ```json
//! { "interpreter": "./interpreter", "env_file": "env.json", "tick_ms": 1000, "debug_level": 2 }
//! ```

use crate::errors::ConfigError;
use crate::session::LaunchSpec;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PROPERTIES: &str = "properties.json";
pub const DEFAULT_ENV_FILE: &str = "env.json";
pub const DEFAULT_LOG_FILE: &str = "cpuviz.log";
pub const DEFAULT_TICK_MS: u64 = 1000;
pub const DEFAULT_DEBUG_LEVEL: u8 = 2;

/// Visualize a bytecode program running on an external interpreter
#[derive(Debug, Clone, Parser)]
#[command(name = "cpuviz", version, about)]
pub struct Cli {
    /// Bytecode file to run
    pub bytecode: PathBuf,

    /// Properties file naming the interpreter executable
    #[arg(long, default_value = DEFAULT_PROPERTIES)]
    pub properties: PathBuf,

    /// Interpreter executable (overrides the properties file)
    #[arg(long)]
    pub interpreter: Option<PathBuf>,

    /// Environment snapshot written by the interpreter
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Milliseconds between animation steps while playing
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Trace detail level passed to the interpreter
    #[arg(long)]
    pub debug_level: Option<u8>,

    /// Log file (the terminal is taken by the UI)
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Log filter, e.g. `debug` or `cpuviz::animation=trace`
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Contents of `properties.json`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Properties {
    pub interpreter: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub tick_ms: Option<u64>,
    pub debug_level: Option<u8>,
}

impl Properties {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub interpreter: PathBuf,
    pub bytecode: PathBuf,
    pub env_file: PathBuf,
    pub tick: Duration,
    pub debug_level: u8,
}

impl AppConfig {
    /// Resolve the CLI against its properties file.
    ///
    /// A missing properties file is only an error when it was named
    /// explicitly.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let properties = if cli.properties.exists() || cli.properties != Path::new(DEFAULT_PROPERTIES) {
            Properties::load(&cli.properties)?
        } else {
            Properties::default()
        };
        Self::resolve(cli, properties)
    }

    pub fn resolve(cli: &Cli, properties: Properties) -> Result<Self, ConfigError> {
        let interpreter = cli
            .interpreter
            .clone()
            .or(properties.interpreter)
            .ok_or(ConfigError::MissingInterpreter)?;
        Ok(AppConfig {
            interpreter,
            bytecode: cli.bytecode.clone(),
            env_file: cli
                .env_file
                .clone()
                .or(properties.env_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE)),
            tick: Duration::from_millis(cli.tick_ms.or(properties.tick_ms).unwrap_or(DEFAULT_TICK_MS)),
            debug_level: cli
                .debug_level
                .or(properties.debug_level)
                .unwrap_or(DEFAULT_DEBUG_LEVEL),
        })
    }

    pub fn launch_spec(&self) -> LaunchSpec {
        LaunchSpec::interactive(&self.interpreter, self.debug_level, &self.bytecode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_overrides_properties() {
        let cli = Cli::parse_from(["cpuviz", "prog.bin", "--tick-ms", "250", "--interpreter", "./other"]);
        let properties = Properties {
            interpreter: Some(PathBuf::from("./interp")),
            env_file: Some(PathBuf::from("state.json")),
            tick_ms: Some(900),
            debug_level: None,
        };
        let config = AppConfig::resolve(&cli, properties).unwrap();
        assert_eq!(config.interpreter, PathBuf::from("./other"));
        assert_eq!(config.env_file, PathBuf::from("state.json"));
        assert_eq!(config.tick, Duration::from_millis(250));
        assert_eq!(config.debug_level, DEFAULT_DEBUG_LEVEL);
    }

    #[test]
    fn test_missing_interpreter() {
        let cli = Cli::parse_from(["cpuviz", "prog.bin"]);
        assert!(matches!(
            AppConfig::resolve(&cli, Properties::default()),
            Err(ConfigError::MissingInterpreter)
        ));
    }

    #[test]
    fn test_load_properties_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"interpreter": "/opt/interp", "tick_ms": 40}}"#).unwrap();

        let properties_path = file.path().to_string_lossy().to_string();
        let cli = Cli::parse_from(["cpuviz", "prog.bin", "--properties", properties_path.as_str()]);
        let config = AppConfig::from_cli(&cli).unwrap();
        assert_eq!(config.interpreter, PathBuf::from("/opt/interp"));
        assert_eq!(config.tick, Duration::from_millis(40));
        assert_eq!(
            config.launch_spec().args,
            vec!["-i", "-d", "2", "-f", "prog.bin"]
        );
    }

    #[test]
    fn test_explicit_properties_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let missing = missing.to_string_lossy().to_string();
        let cli = Cli::parse_from(["cpuviz", "prog.bin", "--properties", missing.as_str()]);
        assert!(matches!(AppConfig::from_cli(&cli), Err(ConfigError::Read { .. })));
    }
}
