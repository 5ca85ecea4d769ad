// Process-level tests for the interpreter session
#![cfg(unix)]

use cpuviz::animation::{Command, CommandSink};
use cpuviz::session::{InterpreterSession, LaunchSpec, SessionMessage};
use pretty_assertions::assert_eq;
use std::sync::mpsc::Receiver;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn next_trace_line(messages: &Receiver<SessionMessage>) -> String {
    loop {
        match messages.recv_timeout(TIMEOUT).expect("no output from process") {
            SessionMessage::TraceLine(line) => return line,
            SessionMessage::Diagnostic(_) => continue,
            other => panic!("Unexpected message: {:?}", other),
        }
    }
}

#[test]
fn test_commands_reach_process_stdin() {
    // cat echoes each command back as a trace line
    let mut session = InterpreterSession::new();
    let messages = session.start(&LaunchSpec::new("cat")).unwrap();
    assert!(session.is_running());

    session.send(Command::Env).unwrap();
    session.send(Command::Step).unwrap();

    assert_eq!(next_trace_line(&messages), "env");
    assert_eq!(next_trace_line(&messages), "step");

    // Closing stdin lets cat exit
    session.mark_exited(None);
    let exit = loop {
        match messages.recv_timeout(TIMEOUT).unwrap() {
            SessionMessage::ProcessExited { code } => break code,
            _ => continue,
        }
    };
    assert_eq!(exit, Some(0));
    assert!(session.send(Command::Step).is_err());
}

#[test]
fn test_exit_is_reported() {
    let mut session = InterpreterSession::new();
    let messages = session.start(&LaunchSpec::new("true")).unwrap();

    let mut exit = None;
    while let Ok(message) = messages.recv_timeout(TIMEOUT) {
        if let SessionMessage::ProcessExited { code } = message {
            exit = Some(code);
            break;
        }
    }
    assert_eq!(exit, Some(Some(0)));
}

#[test]
fn test_stderr_is_forwarded_as_diagnostics() {
    let mut session = InterpreterSession::new();
    let spec = LaunchSpec::new("sh").arg("-c").arg("echo oops >&2");
    let messages = session.start(&spec).unwrap();

    let mut diagnostics = Vec::new();
    while let Ok(message) = messages.recv_timeout(TIMEOUT) {
        match message {
            SessionMessage::Diagnostic(line) => diagnostics.push(line),
            SessionMessage::ProcessExited { .. } => {
                // stderr may still be in flight
                if let Ok(SessionMessage::Diagnostic(line)) =
                    messages.recv_timeout(Duration::from_millis(500))
                {
                    diagnostics.push(line);
                }
                break;
            }
            SessionMessage::TraceLine(_) => {}
        }
    }
    assert_eq!(diagnostics, vec!["oops".to_string()]);
}
