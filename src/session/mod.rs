//! External interpreter process
//!
//! [`InterpreterSession`] launches the interpreter and turns its output into
//! typed [`SessionMessage`]s on a channel. Reader threads only forward lines;
//! decoding, queueing and playback all stay on the thread that polls the
//! channel.

use crate::animation::driver::{Command, CommandSink};
use crate::errors::ProcessError;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, Command as ProcessCommand, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, info, warn};

/// Output of the interpreter process, in arrival order per stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMessage {
    /// One line of trace protocol from stdout
    TraceLine(String),
    /// One line from stderr
    Diagnostic(String),
    /// The process has exited; `code` is `None` when killed by a signal
    ProcessExited { code: Option<i32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    Stopped,
}

/// Program and arguments used to launch the interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        LaunchSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Interactive tracing of a bytecode file: `-i -d <level> -f <file>`
    pub fn interactive(program: impl Into<PathBuf>, debug_level: u8, bytecode: &Path) -> Self {
        LaunchSpec::new(program)
            .arg("-i")
            .arg("-d")
            .arg(debug_level.to_string())
            .arg("-f")
            .arg(bytecode.to_string_lossy())
    }
}

#[derive(Debug)]
pub struct InterpreterSession {
    state: SessionState,
    stdin: Option<ChildStdin>,
}

impl InterpreterSession {
    pub fn new() -> Self {
        InterpreterSession {
            state: SessionState::NotStarted,
            stdin: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Launch the interpreter and return the channel its output arrives on
    pub fn start(&mut self, spec: &LaunchSpec) -> Result<Receiver<SessionMessage>, ProcessError> {
        if self.state == SessionState::Running {
            return Err(ProcessError::AlreadyRunning);
        }

        info!(program = %spec.program.display(), args = ?spec.args, "starting interpreter");
        let mut child = ProcessCommand::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                path: spec.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(ProcessError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(ProcessError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(ProcessError::MissingPipe("stderr"))?;

        let (tx, rx) = mpsc::channel();

        let diagnostics = tx.clone();
        thread::spawn(move || forward_lines(stderr, &diagnostics, SessionMessage::Diagnostic));

        thread::spawn(move || {
            forward_lines(stdout, &tx, SessionMessage::TraceLine);
            let code = match child.wait() {
                Ok(status) => status.code(),
                Err(err) => {
                    warn!(error = %err, "failed to reap interpreter");
                    None
                }
            };
            let _ = tx.send(SessionMessage::ProcessExited { code });
        });

        self.stdin = Some(stdin);
        self.state = SessionState::Running;
        Ok(rx)
    }

    /// Record that the process has gone; closes its stdin
    pub fn mark_exited(&mut self, code: Option<i32>) {
        info!(?code, "interpreter exited");
        self.stdin = None;
        self.state = SessionState::Stopped;
    }
}

impl Default for InterpreterSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSink for InterpreterSession {
    fn send(&mut self, command: Command) -> Result<(), ProcessError> {
        let stdin = match (&self.state, self.stdin.as_mut()) {
            (SessionState::Running, Some(stdin)) => stdin,
            _ => return Err(ProcessError::Exited),
        };
        debug!(%command, "sending command");
        writeln!(stdin, "{}", command)
            .and_then(|()| stdin.flush())
            .map_err(|source| ProcessError::Write {
                command: command.to_string(),
                source,
            })
    }
}

fn forward_lines<R: Read>(
    reader: R,
    tx: &Sender<SessionMessage>,
    wrap: fn(String) -> SessionMessage,
) {
    for line in BufReader::new(reader).lines() {
        match line {
            Ok(line) => {
                if tx.send(wrap(line)).is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!(error = %err, "interpreter output stream failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_launch_arguments() {
        let spec = LaunchSpec::interactive("/bin/interp", 2, Path::new("prog.bin"));
        assert_eq!(spec.program, PathBuf::from("/bin/interp"));
        assert_eq!(spec.args, vec!["-i", "-d", "2", "-f", "prog.bin"]);
    }

    #[test]
    fn test_commands_before_start_fail() {
        let mut session = InterpreterSession::new();
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(matches!(session.send(Command::Step), Err(ProcessError::Exited)));
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let mut session = InterpreterSession::new();
        let spec = LaunchSpec::new("/definitely/not/an/interpreter");
        assert!(matches!(session.start(&spec), Err(ProcessError::Spawn { .. })));
        assert_eq!(session.state(), SessionState::NotStarted);
    }
}
