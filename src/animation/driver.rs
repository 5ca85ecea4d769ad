//! Queue-draining playback driver
//!
//! Each call to [`PlaybackDriver::drive`] does one thing: render the next
//! queued step, or, when the queue is empty, ask the interpreter for more
//! trace. Only one request is ever outstanding; the driver waits for the
//! answer to refill the queue before asking again.

use super::queue::AnimationQueue;
use super::step::AnimationStep;
use crate::display::{render_step, DisplaySurface};
use crate::errors::ProcessError;
use std::fmt;
use tracing::{debug, info};

/// Commands understood by the interpreter's stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Execute one instruction and trace it
    Step,
    /// Write the environment snapshot
    Env,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Step => "step",
            Command::Env => "env",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where driver commands go; the interpreter session in production
pub trait CommandSink {
    fn send(&mut self, command: Command) -> Result<(), ProcessError>;
}

impl CommandSink for Vec<Command> {
    fn send(&mut self, command: Command) -> Result<(), ProcessError> {
        self.push(command);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Steps are queued, or nothing has been requested yet
    Idle,
    /// A step request is outstanding and no steps have arrived
    AwaitingTrace,
    /// The interpreter is gone; only queued steps remain
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveOutcome {
    /// A queued step was rendered
    Stepped(AnimationStep),
    /// The queue was empty, `env` and `step` were sent
    Requested,
    /// The queue is empty and a request is already outstanding
    Waiting,
    /// The queue is empty and the interpreter has stopped
    Finished,
}

#[derive(Debug)]
pub struct PlaybackDriver {
    state: DriverState,
    requests: usize,
}

impl PlaybackDriver {
    pub fn new() -> Self {
        PlaybackDriver {
            state: DriverState::Idle,
            requests: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Number of `step` requests issued so far
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// No further requests will be issued; queued steps can still be drained
    pub fn stop(&mut self) {
        if self.state != DriverState::Stopped {
            info!("playback driver stopped");
        }
        self.state = DriverState::Stopped;
    }

    /// Render one step, or request more trace if there is nothing to render
    pub fn drive<D, S>(
        &mut self,
        queue: &mut AnimationQueue,
        display: &mut D,
        sink: &mut S,
    ) -> Result<DriveOutcome, ProcessError>
    where
        D: DisplaySurface + ?Sized,
        S: CommandSink + ?Sized,
    {
        if let Some(step) = queue.pop() {
            if self.state == DriverState::AwaitingTrace {
                self.state = DriverState::Idle;
            }
            debug!(step = %step, remaining = queue.len(), "rendering step");
            render_step(&step, display);
            return Ok(DriveOutcome::Stepped(step));
        }

        match self.state {
            DriverState::Stopped => Ok(DriveOutcome::Finished),
            DriverState::AwaitingTrace => Ok(DriveOutcome::Waiting),
            DriverState::Idle => {
                let sent = sink.send(Command::Env).and_then(|()| sink.send(Command::Step));
                if let Err(err) = sent {
                    self.stop();
                    return Err(err);
                }
                self.requests += 1;
                self.state = DriverState::AwaitingTrace;
                debug!(request = self.requests, "queue empty, requested next step");
                Ok(DriveOutcome::Requested)
            }
        }
    }
}

impl Default for PlaybackDriver {
    fn default() -> Self {
        Self::new()
    }
}
